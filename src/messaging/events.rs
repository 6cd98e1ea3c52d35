/// Event types published by the engine
///
/// Events represent things that have happened (past tense).
/// They are broadcast to all subscribers and carry owned snapshots, never
/// the live context.
use std::sync::Arc;

use crate::context::ContextSnapshot;
use crate::plugin::{Hook, Key};

/// Engine events
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A match start was confirmed and the start overlay drained
    GameStarted(Arc<ContextSnapshot>),

    /// Result screen analyzed; players and outcome are available
    ResultAnalyzed(Arc<ContextSnapshot>),

    /// Final per-game result
    ResultReady(Arc<ContextSnapshot>),

    /// Session is about to be cleared for the next match
    GameReset(Arc<ContextSnapshot>),

    /// A key was injected through `onFrameNext`
    KeyPressed { key: Key, frame_sequence: Option<u64> },

    /// The frame source reported end of stream
    StreamEnded,
}

impl EngineEvent {
    /// Snapshot carried by the event, if any
    pub fn snapshot(&self) -> Option<&ContextSnapshot> {
        match self {
            EngineEvent::GameStarted(s)
            | EngineEvent::ResultAnalyzed(s)
            | EngineEvent::ResultReady(s)
            | EngineEvent::GameReset(s) => Some(s),
            _ => None,
        }
    }

    /// Hook that produced the event
    pub fn hook(&self) -> Option<Hook> {
        match self {
            EngineEvent::GameStarted(_) => Some(Hook::OnGameStart),
            EngineEvent::ResultAnalyzed(_) => Some(Hook::OnGameIndividualResultAnalyze),
            EngineEvent::ResultReady(_) => Some(Hook::OnGameIndividualResult),
            EngineEvent::GameReset(_) => Some(Hook::OnGameReset),
            EngineEvent::KeyPressed { .. } => Some(Hook::OnKeyPress),
            EngineEvent::StreamEnded => None,
        }
    }
}
