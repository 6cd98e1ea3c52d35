/// Scene matcher module
///
/// Provides the matcher roles the frame engine consults each iteration.
///
/// ## Architecture
///
/// ```text
/// FrameEngine
///   ├── InGameMatcher        every frame (timer icon, life counts)
///   ├── ProgressTracker      every in-game frame
///   ├── GameStartMatcher     while waiting, start cooldown open
///   └── ResultDetailMatcher  while waiting, result cooldown open
/// ```
///
/// The `Probe*` implementations compare mean region colors against a
/// configurable `SceneLayout`.

pub mod layout;
pub mod matcher;
pub mod probe;
pub mod probe_matchers;

// Re-export commonly used types
pub use layout::{SceneLayout, Signature};
pub use matcher::{
    current_frame, GameStartMatcher, InGameMatcher, ProgressTracker, ResultDetailMatcher,
    SceneMatcher, Scenes,
};
pub use probe::{ColorProbe, Region};
pub use probe_matchers::{
    probe_scenes, ProbeInGameMatcher, ProbeResultMatcher, ProbeStartMatcher, ProbeTowerTracker,
};
