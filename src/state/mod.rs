/// State management module
///
/// Gameplay phase tracking and the stop/pause handle shared with other
/// threads.

pub mod control;
pub mod phase;

// Re-export commonly used types
pub use control::EngineControl;
pub use phase::{GameplayPhase, PhaseMachine, TransitionError};
