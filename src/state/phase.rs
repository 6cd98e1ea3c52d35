/// Gameplay phase state machine
///
/// Tracks where the engine believes the player is. The phase follows the
/// in-progress detection from iteration to iteration, with a transient
/// `ResultCapture` phase while a result screen is being processed.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the engine is in the gameplay cycle
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum GameplayPhase {
    /// Menus, lobby, overlays
    Waiting,

    /// A match is in progress
    InGame,

    /// The result screen is being stabilized and analyzed
    ResultCapture,
}

impl GameplayPhase {
    pub fn is_waiting(&self) -> bool {
        matches!(self, GameplayPhase::Waiting)
    }

    pub fn is_in_game(&self) -> bool {
        matches!(self, GameplayPhase::InGame)
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameplayPhase::Waiting => "Waiting",
            GameplayPhase::InGame => "In game",
            GameplayPhase::ResultCapture => "Capturing result",
        }
    }
}

impl Default for GameplayPhase {
    fn default() -> Self {
        GameplayPhase::Waiting
    }
}

impl std::fmt::Display for GameplayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Rejected phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// A result capture is in progress and must finish first
    CaptureInProgress,

    /// Result capture can only begin from `Waiting`
    NotWaiting(GameplayPhase),

    /// No result capture to finish
    NotCapturing(GameplayPhase),
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::CaptureInProgress => {
                write!(f, "Cannot change phase while a result capture is in progress")
            }
            TransitionError::NotWaiting(phase) => {
                write!(f, "Result capture requires Waiting, current phase is {}", phase)
            }
            TransitionError::NotCapturing(phase) => {
                write!(f, "No result capture to finish, current phase is {}", phase)
            }
        }
    }
}

impl std::error::Error for TransitionError {}

/// Phase plus the clock reading when it was entered
#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    phase: GameplayPhase,
    since: Duration,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GameplayPhase {
        self.phase
    }

    /// Time spent in the current phase
    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.since)
    }

    /// Follow the in-progress detection
    ///
    /// Returns the previous phase when it changed.
    pub fn sync(&mut self, in_game: bool, now: Duration) -> Result<Option<GameplayPhase>, TransitionError> {
        let target = if in_game {
            GameplayPhase::InGame
        } else {
            GameplayPhase::Waiting
        };

        match self.phase {
            GameplayPhase::ResultCapture => Err(TransitionError::CaptureInProgress),
            current if current == target => Ok(None),
            current => {
                self.enter(target, now);
                Ok(Some(current))
            }
        }
    }

    pub fn begin_result(&mut self, now: Duration) -> Result<(), TransitionError> {
        match self.phase {
            GameplayPhase::Waiting => {
                self.enter(GameplayPhase::ResultCapture, now);
                Ok(())
            }
            other => Err(TransitionError::NotWaiting(other)),
        }
    }

    pub fn finish_result(&mut self, now: Duration) -> Result<(), TransitionError> {
        match self.phase {
            GameplayPhase::ResultCapture => {
                self.enter(GameplayPhase::Waiting, now);
                Ok(())
            }
            other => Err(TransitionError::NotCapturing(other)),
        }
    }

    fn enter(&mut self, phase: GameplayPhase, now: Duration) {
        tracing::debug!("Phase {} -> {}", self.phase, phase);
        self.phase = phase;
        self.since = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Duration = Duration::ZERO;

    #[test]
    fn test_phase_predicates() {
        assert!(GameplayPhase::default().is_waiting());
        assert!(GameplayPhase::InGame.is_in_game());
        assert!(!GameplayPhase::ResultCapture.is_waiting());
    }

    #[test]
    fn test_sync_follows_detection() {
        let mut sm = PhaseMachine::new();

        assert_eq!(sm.sync(false, T0), Ok(None));
        assert_eq!(sm.sync(true, Duration::from_secs(1)), Ok(Some(GameplayPhase::Waiting)));
        assert_eq!(sm.phase(), GameplayPhase::InGame);
        assert_eq!(sm.elapsed(Duration::from_secs(4)), Duration::from_secs(3));

        assert_eq!(sm.sync(true, Duration::from_secs(2)), Ok(None));
        assert_eq!(sm.sync(false, Duration::from_secs(3)), Ok(Some(GameplayPhase::InGame)));
        assert!(sm.phase().is_waiting());
    }

    #[test]
    fn test_result_capture_cycle() {
        let mut sm = PhaseMachine::new();

        sm.begin_result(T0).unwrap();
        assert_eq!(sm.phase(), GameplayPhase::ResultCapture);

        // Cannot be pulled out of a capture by detection
        assert_eq!(sm.sync(true, T0), Err(TransitionError::CaptureInProgress));
        assert!(sm.begin_result(T0).is_err());

        sm.finish_result(T0).unwrap();
        assert!(sm.phase().is_waiting());
        assert_eq!(
            sm.finish_result(T0),
            Err(TransitionError::NotCapturing(GameplayPhase::Waiting))
        );
    }

    #[test]
    fn test_result_capture_requires_waiting() {
        let mut sm = PhaseMachine::new();
        sm.sync(true, T0).unwrap();

        assert_eq!(
            sm.begin_result(T0),
            Err(TransitionError::NotWaiting(GameplayPhase::InGame))
        );

        sm.sync(false, T0).unwrap();
        assert!(sm.begin_result(T0).is_ok());
    }
}
