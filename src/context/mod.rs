/// Session context module
///
/// Holds the engine's shared state and the sanitized copies handed to other
/// threads.
///
/// ## Ownership
///
/// ```text
/// FrameEngine (owns SessionContext, &mut)
///   ├── Scene matchers   (&EngineState, &mut GameState)
///   ├── Plugins          (&SessionContext)
///   └── Other threads    (ContextSnapshot, owned copy)
/// ```

pub mod helpers;
pub mod session;
pub mod snapshot;

// Re-export commonly used types
pub use session::{
    EngineState, EventTimeline, GameState, LivesSample, MapId, PlayerEntry, RuleId,
    SessionContext, TowerSample,
};
pub use snapshot::{ContextSnapshot, EngineSnapshot};
