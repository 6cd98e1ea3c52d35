/// Console output plugin
///
/// Logs one line at match start and a result summary per game. Optionally
/// writes each summary as pretty JSON to a file named from a template
/// (see `file_name_for`).
use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::context::helpers::{end_time, file_name_for, my_entry, player_title, win_lose_text};
use crate::context::SessionContext;
use crate::error::PluginError;
use crate::plugin::{Hook, HookSet, Plugin};

/// What the console prints for one game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub map: Option<String>,
    pub rule: Option<String>,
    pub result: String,
    pub kills: Option<u32>,
    pub deaths: Option<u32>,
    pub title: Option<String>,
    pub end_time: String,
    pub lives_samples: usize,
    pub tower_samples: usize,
}

impl ResultSummary {
    pub fn from_context(ctx: &SessionContext) -> Self {
        let game = &ctx.game;
        let me = my_entry(game);

        Self {
            map: game.map.as_ref().map(|m| m.as_str().to_string()),
            rule: game.rule.as_ref().map(|r| r.as_str().to_string()),
            result: win_lose_text(game.won, "win", "lose", "unknown").to_string(),
            kills: me.and_then(|p| p.kills),
            deaths: me.and_then(|p| p.deaths),
            title: player_title(me),
            end_time: end_time(game).format("%Y-%m-%d %H:%M:%S").to_string(),
            lives_samples: game.lives_track.len(),
            tower_samples: game.tower_track.len(),
        }
    }

    /// One-line human readable form
    pub fn line(&self) -> String {
        let mut line = format!(
            "{} {} / {}: {}",
            self.end_time,
            self.map.as_deref().unwrap_or("?"),
            self.rule.as_deref().unwrap_or("?"),
            self.result
        );
        if let (Some(k), Some(d)) = (self.kills, self.deaths) {
            line.push_str(&format!(" ({}k/{}d)", k, d));
        }
        if let Some(title) = &self.title {
            line.push_str(&format!(" [{}]", title));
        }
        line
    }
}

pub struct ConsolePlugin {
    summary_template: Option<String>,
    last_summary: Option<ResultSummary>,
}

impl ConsolePlugin {
    pub fn new() -> Self {
        Self {
            summary_template: None,
            last_summary: None,
        }
    }

    /// Also write each summary to a file; `__INPUT_FILE__` in the template
    /// is replaced with the stream name
    pub fn with_summary_file(mut self, template: impl Into<String>) -> Self {
        self.summary_template = Some(template.into());
        self
    }

    pub fn last_summary(&self) -> Option<&ResultSummary> {
        self.last_summary.as_ref()
    }

    fn write_summary(&self, ctx: &SessionContext, summary: &ResultSummary) -> Result<(), PluginError> {
        let Some(template) = &self.summary_template else {
            return Ok(());
        };

        let path = PathBuf::from(file_name_for(template, ctx));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        tracing::debug!("Wrote result summary to {}", path.display());
        Ok(())
    }
}

impl Default for ConsolePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ConsolePlugin {
    fn name(&self) -> &str {
        "console"
    }

    fn hooks(&self) -> HookSet {
        [Hook::OnGameStart, Hook::OnGameIndividualResult, Hook::OnGameReset]
            .into_iter()
            .collect()
    }

    fn on_game_start(&mut self, ctx: &SessionContext) -> Result<(), PluginError> {
        tracing::info!(
            "Game start: {} / {}",
            ctx.game.map.as_ref().map_or("?", |m| m.as_str()),
            ctx.game.rule.as_ref().map_or("?", |r| r.as_str()),
        );
        Ok(())
    }

    fn on_game_individual_result(&mut self, ctx: &SessionContext) -> Result<(), PluginError> {
        let summary = ResultSummary::from_context(ctx);
        tracing::info!("Game result: {}", summary.line());
        self.write_summary(ctx, &summary)?;
        self.last_summary = Some(summary);
        Ok(())
    }

    fn on_game_reset(&mut self, ctx: &SessionContext) -> Result<(), PluginError> {
        tracing::debug!("Game {} reset", ctx.game.index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MapId, PlayerEntry, RuleId};

    fn finished_game() -> SessionContext {
        let mut ctx = SessionContext::new();
        ctx.game.map = Some(MapId::new("hokke"));
        ctx.game.rule = Some(RuleId::new("nawabari"));
        ctx.game.won = Some(true);
        ctx.game.lives_track = vec![[4, 4], [4, 3]];
        ctx.game.end_time = Some(1_435_000_000.0);
        ctx.game.players = Some(vec![PlayerEntry {
            me: true,
            team: 1,
            kills: Some(5),
            deaths: Some(2),
            prefix: Some("イカした".to_string()),
            gender: Some("ボーイ".to_string()),
            ..Default::default()
        }]);
        ctx
    }

    #[test]
    fn test_summary_from_context() {
        let summary = ResultSummary::from_context(&finished_game());
        assert_eq!(summary.map.as_deref(), Some("hokke"));
        assert_eq!(summary.result, "win");
        assert_eq!(summary.kills, Some(5));
        assert_eq!(summary.title.as_deref(), Some("イカしたボーイ"));
        assert_eq!(summary.lives_samples, 2);
        assert!(summary.line().contains("hokke / nawabari: win (5k/2d)"));
    }

    #[test]
    fn test_summary_of_empty_context() {
        let summary = ResultSummary::from_context(&SessionContext::new());
        assert_eq!(summary.result, "unknown");
        assert!(summary.line().contains("? / ?: unknown"));
    }

    #[test]
    fn test_summary_file_uses_index_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("__INPUT_FILE__.json");
        let mut plugin = ConsolePlugin::new().with_summary_file(template.to_string_lossy());

        let mut ctx = finished_game();
        ctx.engine.source_file = Some("replay".to_string());
        plugin.on_game_individual_result(&ctx).unwrap();

        ctx.game.index = 1;
        plugin.on_game_individual_result(&ctx).unwrap();

        assert!(dir.path().join("replay.json").exists());
        let second = fs::read_to_string(dir.path().join("replay-1.json")).unwrap();
        assert!(second.contains("\"result\": \"win\""));
        assert!(plugin.last_summary().is_some());
    }
}
