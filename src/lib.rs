//! Frame-processing engine for game video.
//!
//! Reads frames from a [`source::FrameSource`], detects match start,
//! in-progress play and the result screen with [`scenes`] matchers,
//! accumulates per-match statistics in a [`context::SessionContext`] and
//! notifies [`plugin::Plugin`]s at each lifecycle point.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod frame;
pub mod messaging;
pub mod plugin;
pub mod plugins;
pub mod scenes;
pub mod source;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::EngineConfig;
pub use context::{ContextSnapshot, SessionContext};
pub use engine::{FrameEngine, RunSummary, StepOutcome, StopReason};
pub use error::{AppResult, EngineError};
pub use frame::Frame;
pub use plugin::{Hook, HookPolicy, HookSet, Plugin, PluginRegistry};
