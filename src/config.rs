use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::plugin::HookPolicy;
use crate::scenes::SceneLayout;

const APP_DIR: &str = "inklog";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames read per iteration; only the last one is processed
    pub decimation_factor: u32,

    /// Minimum seconds between two confirmed match starts
    pub start_cooldown_secs: f64,

    /// Minimum seconds between two result captures
    pub result_cooldown_secs: f64,

    /// Frames read per round while draining the start overlay
    pub start_drain_reads: u32,

    /// Frames re-read before analyzing a result screen
    pub stabilization_reads: u32,

    /// Wait before polling again when no frame is available
    pub pending_backoff_ms: u64,

    /// Sleep between checks while the engine is paused
    pub pause_poll_ms: u64,

    /// Per-hook failure isolation
    pub hook_policy: HookPolicy,

    /// Capture rate assumed for image-sequence replays
    pub replay_fps: f64,

    /// Collect per-iteration latency statistics
    pub collect_timings: bool,

    /// Regions and colors for the probe matchers
    pub scenes: SceneLayout,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decimation_factor: 12,
            start_cooldown_secs: 10.0,
            result_cooldown_secs: 60.0,
            start_drain_reads: 3,
            stabilization_reads: 10,
            pending_backoff_ms: 1000,
            pause_poll_ms: 250,
            hook_policy: HookPolicy::default(),
            replay_fps: 24.0,
            collect_timings: false,
            scenes: SceneLayout::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration, creating the default file if it doesn't exist.
    ///
    /// `path` of `None` uses the platform config directory.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if config_path.exists() {
            let config = Self::load_from(&config_path)?;
            tracing::info!("Loaded config from: {}", config_path.display());
            Ok(config)
        } else {
            let config = EngineConfig::default();
            config.save_to(&config_path)?;
            tracing::info!("Created default config at: {}", config_path.display());
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: EngineConfig =
            serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source,
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;

        Ok(())
    }

    /// `<config dir>/inklog/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Directory for log files, next to the config
    pub fn log_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimation_factor == 0 {
            return Err(ConfigError::Invalid("decimation_factor must be at least 1".to_string()));
        }
        if self.start_drain_reads == 0 {
            return Err(ConfigError::Invalid("start_drain_reads must be at least 1".to_string()));
        }
        if self.stabilization_reads == 0 {
            return Err(ConfigError::Invalid("stabilization_reads must be at least 1".to_string()));
        }
        for (name, secs) in [
            ("start_cooldown_secs", self.start_cooldown_secs),
            ("result_cooldown_secs", self.result_cooldown_secs),
        ] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-negative duration, got {}",
                    name, secs
                )));
            }
        }
        if !(self.replay_fps > 0.0) {
            return Err(ConfigError::Invalid("replay_fps must be positive".to_string()));
        }
        for (name, region) in self.scenes.regions() {
            if !region.is_valid() {
                return Err(ConfigError::Invalid(format!(
                    "scene region {} is outside the frame: {:?}",
                    name, region
                )));
            }
        }
        Ok(())
    }

    pub fn start_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.start_cooldown_secs)
    }

    pub fn result_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.result_cooldown_secs)
    }

    pub fn pending_backoff(&self) -> Duration {
        Duration::from_millis(self.pending_backoff_ms)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }
}
