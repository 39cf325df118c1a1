//! Loading levels from files, stdin or inline share codes.

use std::{
    fs,
    io::{self, Read},
};

use anyhow::{Context, Result};
use laser_maze_core::LevelDescriptor;

use crate::share_code;

/// Argument value that reads from standard input.
const STDIN_SOURCE: &str = "-";

/// Reads the raw text behind a level argument: `-` for stdin, an inline
/// share code, or a file path.
pub(crate) fn read_source(source: &str) -> Result<String> {
    if source == STDIN_SOURCE {
        let mut text = String::new();
        let _ = io::stdin()
            .read_to_string(&mut text)
            .context("failed to read level from stdin")?;
        return Ok(text);
    }
    if share_code::is_share_code(source) {
        return Ok(source.to_owned());
    }
    fs::read_to_string(source).with_context(|| format!("failed to read level file '{source}'"))
}

/// Parses level text given either as JSON or as a share code.
pub(crate) fn parse_level(text: &str) -> Result<LevelDescriptor> {
    if share_code::is_share_code(text) {
        return share_code::decode(text).context("failed to decode share code");
    }
    serde_json::from_str(text).context("failed to parse level JSON")
}

/// Loads and validates the level named by a command-line argument.
pub(crate) fn load_level(source: &str) -> Result<LevelDescriptor> {
    let text = read_source(source)?;
    let level = parse_level(&text)?;
    level
        .validate()
        .with_context(|| format!("level from '{source}' is not playable"))?;
    log::debug!(
        "loaded {}x{} level {:?} with {} items and {} emitters",
        level.grid.width,
        level.grid.height,
        level.name,
        level.items.len(),
        level.emitters.len()
    );
    Ok(level)
}
