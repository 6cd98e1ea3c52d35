use thiserror::Error;

use crate::plugin::Hook;

/// Engine-level errors using thiserror for structured error handling.
///
/// Each enum covers one collaborator of the frame engine. They provide
/// context and can be chained with anyhow in the binary.

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open frame source: {path}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode frame: {path}")]
    DecodeFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Frame source contains no frames: {0}")]
    Empty(String),
}

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("Matcher {matcher} found no frame to inspect")]
    NoFrame { matcher: &'static str },

    #[error("Matcher {matcher} could not read region: {reason}")]
    Region {
        matcher: &'static str,
        reason: String,
    },

    #[error("Matcher {matcher} failed: {reason}")]
    Failed {
        matcher: &'static str,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin {plugin} failed in {hook}: {message}")]
    HookFailed {
        plugin: String,
        hook: Hook,
        message: String,
    },

    #[error("Plugin {plugin} panicked in {hook}: {message}")]
    Panicked {
        plugin: String,
        hook: Hook,
        message: String,
    },

    #[error("Plugin I/O failed")]
    Io(#[from] std::io::Error),

    #[error("Plugin serialization failed")]
    Serialize(#[from] serde_json::Error),
}

impl PluginError {
    /// Shorthand for a hook failure raised by plugin code
    pub fn hook(plugin: impl Into<String>, hook: Hook, message: impl Into<String>) -> Self {
        PluginError::HookFailed {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Frame source failed")]
    Source(#[from] SourceError),

    #[error("Plugin dispatch aborted")]
    Plugin(#[from] PluginError),

    #[error("Invalid engine configuration")]
    Config(#[from] ConfigError),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
