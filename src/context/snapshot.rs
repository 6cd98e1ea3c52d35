/// Sanitized deep copy of the session context
///
/// Consumers on other threads never read the live context. They receive a
/// snapshot that owns all of its data and leaves out the frame buffer.
use serde::{Deserialize, Serialize};

use super::session::{GameState, SessionContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub in_game: bool,
    pub msec: Option<f64>,
    pub epoch_time: Option<f64>,
    pub source_file: Option<String>,
    pub frames_processed: u64,
    /// Sequence number of the frame the engine held at capture time
    pub frame_sequence: Option<u64>,
    pub frame_size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub engine: EngineSnapshot,
    pub game: GameState,
}

impl ContextSnapshot {
    pub fn capture(ctx: &SessionContext) -> Self {
        let frame = ctx.engine.frame();
        Self {
            engine: EngineSnapshot {
                in_game: ctx.engine.in_game,
                msec: ctx.engine.msec,
                epoch_time: ctx.engine.epoch_time,
                source_file: ctx.engine.source_file.clone(),
                frames_processed: ctx.engine.frames_processed,
                frame_sequence: frame.map(|f| f.sequence),
                frame_size: frame.map(|f| f.dimensions()),
            },
            game: ctx.game.clone(),
        }
    }
}

impl From<&SessionContext> for ContextSnapshot {
    fn from(ctx: &SessionContext) -> Self {
        Self::capture(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MapId;
    use crate::frame::Frame;

    #[test]
    fn test_snapshot_is_detached() {
        let mut ctx = SessionContext::new();
        ctx.engine.set_frame(Frame::solid(16, 9, [1, 2, 3], 42));
        ctx.game.lives_track.push([4, 4]);
        ctx.game.map = Some(MapId::new("hokke"));

        let snapshot = ContextSnapshot::capture(&ctx);

        ctx.game.lives_track.push([3, 4]);
        ctx.game.map = None;

        assert_eq!(snapshot.game.lives_track, vec![[4, 4]]);
        assert_eq!(snapshot.game.map, Some(MapId::new("hokke")));
        assert_eq!(snapshot.engine.frame_sequence, Some(42));
        assert_eq!(snapshot.engine.frame_size, Some((16, 9)));
    }

    #[test]
    fn test_snapshot_serializes_without_pixels() {
        let mut ctx = SessionContext::new();
        ctx.engine.set_frame(Frame::solid(4, 4, [255, 255, 255], 0));

        let json = serde_json::to_value(ContextSnapshot::from(&ctx)).unwrap();
        assert!(json["engine"].get("frame").is_none());
        assert_eq!(json["engine"]["frame_size"], serde_json::json!([4, 4]));
    }
}
