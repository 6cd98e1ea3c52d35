/// Hook names, capability sets and failure policy
use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Lifecycle points at which plugins are notified
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Hook {
    OnFrameRead,
    OnGameStart,
    OnGameIndividualResultAnalyze,
    OnGameIndividualResult,
    OnGameReset,
    OnFrameNext,
    OnKeyPress,
}

impl Hook {
    pub const ALL: [Hook; 7] = [
        Hook::OnFrameRead,
        Hook::OnGameStart,
        Hook::OnGameIndividualResultAnalyze,
        Hook::OnGameIndividualResult,
        Hook::OnGameReset,
        Hook::OnFrameNext,
        Hook::OnKeyPress,
    ];

    /// Canonical hook name
    pub fn name(&self) -> &'static str {
        match self {
            Hook::OnFrameRead => "onFrameRead",
            Hook::OnGameStart => "onGameStart",
            Hook::OnGameIndividualResultAnalyze => "onGameIndividualResultAnalyze",
            Hook::OnGameIndividualResult => "onGameIndividualResult",
            Hook::OnGameReset => "onGameReset",
            Hook::OnFrameNext => "onFrameNext",
            Hook::OnKeyPress => "onKeyPress",
        }
    }

    pub fn flag(&self) -> HookSet {
        match self {
            Hook::OnFrameRead => HookSet::FRAME_READ,
            Hook::OnGameStart => HookSet::GAME_START,
            Hook::OnGameIndividualResultAnalyze => HookSet::RESULT_ANALYZE,
            Hook::OnGameIndividualResult => HookSet::RESULT,
            Hook::OnGameReset => HookSet::GAME_RESET,
            Hook::OnFrameNext => HookSet::FRAME_NEXT,
            Hook::OnKeyPress => HookSet::KEY_PRESS,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Hooks a plugin implements, declared once at registration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HookSet: u8 {
        const FRAME_READ = 1 << 0;
        const GAME_START = 1 << 1;
        const RESULT_ANALYZE = 1 << 2;
        const RESULT = 1 << 3;
        const GAME_RESET = 1 << 4;
        const FRAME_NEXT = 1 << 5;
        const KEY_PRESS = 1 << 6;
    }
}

impl HookSet {
    pub fn has(&self, hook: Hook) -> bool {
        self.contains(hook.flag())
    }
}

impl FromIterator<Hook> for HookSet {
    fn from_iter<I: IntoIterator<Item = Hook>>(iter: I) -> Self {
        iter.into_iter()
            .fold(HookSet::empty(), |set, hook| set | hook.flag())
    }
}

/// Per-hook failure policy
///
/// An isolated hook logs and drops a failing plugin's error, then carries on
/// with the next plugin. A non-isolated hook stops the dispatch and hands the
/// error to the engine, which ends the run.
///
/// The default keeps `onGameStart` non-isolated, matching the engine's
/// historical behavior. That asymmetry is most likely an accident; set
/// `"onGameStart": true` to isolate it like every other hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookPolicy {
    overrides: BTreeMap<Hook, bool>,
}

impl HookPolicy {
    /// Every hook isolated
    pub fn all_isolated() -> Self {
        Self {
            overrides: BTreeMap::new(),
        }
    }

    pub fn isolates(&self, hook: Hook) -> bool {
        self.overrides.get(&hook).copied().unwrap_or(true)
    }

    pub fn set(&mut self, hook: Hook, isolate: bool) -> &mut Self {
        self.overrides.insert(hook, isolate);
        self
    }

    pub fn with(mut self, hook: Hook, isolate: bool) -> Self {
        self.set(hook, isolate);
        self
    }
}

impl Default for HookPolicy {
    fn default() -> Self {
        Self::all_isolated().with(Hook::OnGameStart, false)
    }
}
