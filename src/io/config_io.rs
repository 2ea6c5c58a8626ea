use std::fs;
use std::path::{Path, PathBuf};

use crate::io::board_io::BoardIoError;
use crate::model::config::BoardConfig;

/// Discover the corkboard workspace by walking up from the given directory,
/// looking for a `corkboard/` subdirectory.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, BoardIoError> {
    let mut current = start.to_path_buf();
    loop {
        let board_dir = current.join("corkboard");
        if board_dir.is_dir() && board_dir.join("corkboard.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(BoardIoError::NotAWorkspace);
        }
    }
}

/// Read `corkboard/corkboard.toml`. A missing file yields the defaults;
/// a file that exists but does not parse is an error.
pub fn read_config(board_dir: &Path) -> Result<BoardConfig, BoardIoError> {
    let config_path = board_dir.join("corkboard.toml");
    if !config_path.exists() {
        return Ok(BoardConfig::default());
    }
    let config_text = fs::read_to_string(&config_path).map_err(|e| BoardIoError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: BoardConfig = toml::from_str(&config_text)?;
    Ok(config)
}

/// Write the config back to `corkboard/corkboard.toml`.
pub fn write_config(board_dir: &Path, config: &BoardConfig) -> Result<(), BoardIoError> {
    let config_path = board_dir.join("corkboard.toml");
    let content = toml::to_string_pretty(config)?;
    fs::write(&config_path, content).map_err(|e| BoardIoError::ReadError {
        path: config_path,
        source: e,
    })?;
    Ok(())
}
