/// Read-only helpers over the session context used by output plugins
use std::path::Path;

use chrono::{DateTime, Local, TimeZone};

use super::session::{GameState, PlayerEntry, SessionContext};

const INPUT_FILE_MACRO: &str = "__INPUT_FILE__";

/// The local player's entry, if result analysis found one
pub fn my_entry(game: &GameState) -> Option<&PlayerEntry> {
    game.players.as_ref()?.iter().find(|p| p.me)
}

/// Player title built from prefix and gender
///
/// Returns `None` unless both parts are present. Every possessive particle
/// in the prefix is removed.
pub fn player_title(entry: Option<&PlayerEntry>) -> Option<String> {
    let entry = entry?;
    let prefix = entry.prefix.as_deref()?;
    let gender = entry.gender.as_deref()?;
    Some(format!("{}{}", prefix.replace('の', ""), gender))
}

pub fn win_lose_text<'a>(
    won: Option<bool>,
    win_text: &'a str,
    lose_text: &'a str,
    unknown_text: &'a str,
) -> &'a str {
    match won {
        Some(true) => win_text,
        Some(false) => lose_text,
        None => unknown_text,
    }
}

/// Result capture time, falling back to now
pub fn end_time(game: &GameState) -> DateTime<Local> {
    game.end_time
        .and_then(|t| Local.timestamp_millis_opt((t * 1000.0) as i64).single())
        .unwrap_or_else(Local::now)
}

/// Expand an output file name template for the current game
///
/// `__INPUT_FILE__` becomes the source stream identity when known. From the
/// second game on, `-<index>` is inserted before the extension.
pub fn file_name_for(template: &str, ctx: &SessionContext) -> String {
    if template.is_empty() {
        return String::new();
    }

    let name = match ctx.engine.source_file.as_deref() {
        Some(source) => template.replace(INPUT_FILE_MACRO, source),
        None => template.to_string(),
    };

    let index = ctx.game.index;
    if index == 0 {
        return name;
    }

    let path = Path::new(&name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            let file = format!("{}-{}.{}", stem.to_string_lossy(), index, ext.to_string_lossy());
            path.with_file_name(file).to_string_lossy().into_owned()
        }
        _ => format!("{}-{}", name, index),
    }
}
