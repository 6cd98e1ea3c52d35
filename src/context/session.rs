/// Session context model
///
/// The single mutable record threaded through the engine. It has two
/// namespaces: `engine` (transient per-iteration state owned by the frame
/// engine) and `game` (state accumulated over one match session).
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Identifier of a stage recognized at match start
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(pub String);

/// Identifier of a rule recognized at match start
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl MapId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `[team1_count, team2_count]` of players alive in one frame
pub type LivesSample = [u32; 2];

/// One progress-tracker reading
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TowerSample {
    /// Marker position, -1.0 (team 2 goal) to 1.0 (team 1 goal)
    pub pos: f32,
    /// Furthest position toward team 1 since the tracker was reset
    pub max: f32,
    /// Furthest position toward team 2 since the tracker was reset
    pub min: f32,
}

/// Per-player result data written by the result-detail analysis
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// `true` for the local player
    pub me: bool,
    /// 1 or 2
    pub team: u8,
    pub score: Option<u32>,
    pub kills: Option<u32>,
    pub deaths: Option<u32>,
    pub rank: Option<String>,
    /// Title prefix, as shown on the scoreboard
    pub prefix: Option<String>,
    /// Title suffix, as shown on the scoreboard
    pub gender: Option<String>,
}

/// Engine namespace
///
/// Only the frame engine writes here. The frame itself is exposed through
/// `frame()` and can only be replaced from inside the crate.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    frame: Option<Frame>,
    /// Last in-progress detection result
    pub in_game: bool,
    /// Playback clock of the current frame, in milliseconds
    pub msec: Option<f64>,
    /// Unix time in seconds of playback position zero
    pub epoch_time: Option<f64>,
    /// Identity of the current input stream
    pub source_file: Option<String>,
    /// Frames handed to matchers so far
    pub frames_processed: u64,
}

impl EngineState {
    /// The most recently acquired frame
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub(crate) fn set_frame(&mut self, frame: Frame) {
        if frame.msec.is_some() {
            self.msec = frame.msec;
        }
        self.frame = Some(frame);
    }
}

/// Keyed event timeline: `key -> [(game_offset_msec, value)]`
pub type EventTimeline = BTreeMap<String, Vec<(Option<f64>, serde_json::Value)>>;

/// Game namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub map: Option<MapId>,
    pub rule: Option<RuleId>,
    pub lives_track: Vec<LivesSample>,
    pub tower_track: Vec<TowerSample>,
    pub players: Option<Vec<PlayerEntry>>,
    pub won: Option<bool>,
    /// Result dispatches completed during this engine run
    pub index: u32,
    /// `engine.msec` at the confirmed match start
    pub start_offset_msec: Option<f64>,
    /// Unix time in seconds when the result screen was captured
    pub end_time: Option<f64>,
    pub events: EventTimeline,
}

impl GameState {
    /// Set map and rule for the current session
    ///
    /// Each field is written at most once per session; returns `false` and
    /// leaves the context untouched if either is already set.
    pub fn set_stage(&mut self, map: Option<MapId>, rule: Option<RuleId>) -> bool {
        if self.map.is_some() || self.rule.is_some() {
            tracing::debug!(
                "Ignoring stage update {:?}/{:?}: already set to {:?}/{:?}",
                map,
                rule,
                self.map,
                self.rule
            );
            return false;
        }
        self.map = map;
        self.rule = rule;
        true
    }

    /// Clear everything accumulated for a session
    ///
    /// Both tracks are replaced in the same call. `index` survives because
    /// it counts sessions across the whole run.
    pub fn reset_session(&mut self) {
        let index = self.index;
        *self = GameState {
            index,
            ..GameState::default()
        };
    }

    /// Null the result-specific fields after a result dispatch
    ///
    /// Tracks are kept until the next confirmed start.
    pub fn clear_result_fields(&mut self) {
        self.map = None;
        self.rule = None;
        self.won = None;
        self.players = None;
    }
}

/// The shared session context
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub engine: EngineState,
    pub game: GameState,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the Unix epoch for the current frame
    ///
    /// Uses the playback clock when the stream has a known epoch, the wall
    /// clock otherwise.
    pub fn game_time(&self) -> f64 {
        match self.engine.epoch_time {
            Some(epoch) => epoch + self.engine.msec.unwrap_or(0.0) / 1000.0,
            None => chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }

    /// Milliseconds elapsed since the confirmed match start
    pub fn game_offset_msec(&self) -> Option<f64> {
        match (self.engine.msec, self.game.start_offset_msec) {
            (Some(msec), Some(start)) => Some(msec - start),
            _ => None,
        }
    }

    /// Record `value` under `key` at the current game offset
    ///
    /// Two events with the same key at the same offset collapse into one,
    /// keeping the latest value.
    pub fn add_event(&mut self, key: &str, value: serde_json::Value) {
        let offset = self.game_offset_msec();
        let events = self.game.events.entry(key.to_string()).or_default();

        match events.last_mut() {
            Some(last) if last.0 == offset => last.1 = value,
            _ => events.push((offset, value)),
        }
    }
}
