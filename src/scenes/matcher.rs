/// Scene matcher traits
///
/// Defines the four matcher roles the engine consults. Every detection call
/// gets the engine namespace by shared reference (the frame is read-only)
/// and the game namespace by mutable reference, so a positive match can
/// record what it recognized.
use crate::context::{EngineState, GameState, LivesSample, TowerSample};
use crate::error::MatcherError;
use crate::frame::Frame;

/// Common matcher behavior
pub trait SceneMatcher: Send {
    /// Get matcher name (for logging)
    fn name(&self) -> &'static str;

    /// Drop any per-session accumulation
    fn reset(&mut self, _game: &mut GameState) {}
}

/// Match-start overlay (stage and rule announcement)
pub trait GameStartMatcher: SceneMatcher {
    /// May set map and rule on a positive match
    fn detect(&mut self, engine: &EngineState, game: &mut GameState)
        -> Result<bool, MatcherError>;
}

/// In-progress play (timer icon) and per-team life counts
pub trait InGameMatcher: SceneMatcher {
    fn detect(&mut self, engine: &EngineState, game: &mut GameState)
        -> Result<bool, MatcherError>;

    fn lives(&mut self, engine: &EngineState, game: &mut GameState)
        -> Result<LivesSample, MatcherError>;
}

/// Result-detail screen
pub trait ResultDetailMatcher: SceneMatcher {
    /// Cheap check for the result screen
    fn detect(&mut self, engine: &EngineState, game: &mut GameState)
        -> Result<bool, MatcherError>;

    /// Full analysis pass; writes players, won and related fields
    fn analyze(&mut self, engine: &EngineState, game: &mut GameState)
        -> Result<(), MatcherError>;
}

/// Objective progress tracker
pub trait ProgressTracker: SceneMatcher {
    fn detect(
        &mut self,
        engine: &EngineState,
        game: &mut GameState,
    ) -> Result<Option<TowerSample>, MatcherError>;
}

/// The matcher set an engine runs with
pub struct Scenes {
    pub start: Box<dyn GameStartMatcher>,
    pub in_game: Box<dyn InGameMatcher>,
    pub result: Box<dyn ResultDetailMatcher>,
    pub tower: Box<dyn ProgressTracker>,
}

impl Scenes {
    pub fn new(
        start: Box<dyn GameStartMatcher>,
        in_game: Box<dyn InGameMatcher>,
        result: Box<dyn ResultDetailMatcher>,
        tower: Box<dyn ProgressTracker>,
    ) -> Self {
        Self {
            start,
            in_game,
            result,
            tower,
        }
    }
}

/// The current frame, or `NoFrame` for the named matcher
pub fn current_frame<'a>(
    engine: &'a EngineState,
    matcher: &'static str,
) -> Result<&'a Frame, MatcherError> {
    engine.frame().ok_or(MatcherError::NoFrame { matcher })
}
