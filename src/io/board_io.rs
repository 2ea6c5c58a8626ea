use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::model::board::BoardState;

/// Error type for board document and config I/O
#[derive(Debug, thiserror::Error)]
pub enum BoardIoError {
    #[error("not a corkboard workspace: no corkboard/ directory found")]
    NotAWorkspace,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not parse corkboard.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not serialize corkboard.toml: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),
    #[error("could not serialize board: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Path of the board document for a given id.
pub fn board_path(dir: &Path, board_id: &str) -> PathBuf {
    dir.join(format!("{board_id}.board.json"))
}

/// Read and parse a board document.
pub fn load_board(path: &Path) -> Result<BoardState, BoardIoError> {
    let content = fs::read_to_string(path).map_err(|e| BoardIoError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| BoardIoError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a board, falling back to an empty one rather than crashing.
///
/// A missing file is a fresh start. A document that fails validation is
/// moved aside to a `.corrupt-<timestamp>` sibling so nothing is lost,
/// a warning is logged, and an empty board takes its place.
pub fn load_or_default(path: &Path, board_id: &str) -> BoardState {
    match load_board(path) {
        Ok(state) => state,
        Err(BoardIoError::ReadError { source, .. })
            if source.kind() == io::ErrorKind::NotFound =>
        {
            BoardState::new(board_id)
        }
        Err(err) => {
            let backup = path.with_extension(format!(
                "corrupt-{}",
                Utc::now().format("%Y%m%dT%H%M%S")
            ));
            if let Err(rename_err) = fs::rename(path, &backup) {
                warn!(%rename_err, "could not back up unreadable board document");
            }
            warn!(%err, backup = %backup.display(), "board document could not be loaded; starting empty");
            BoardState::new(board_id)
        }
    }
}

/// Serialize and write the board document atomically (temp file + rename),
/// so a crash mid-write never leaves a truncated document.
pub fn save_board(path: &Path, state: &BoardState) -> Result<(), BoardIoError> {
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(path, content.as_bytes())?;
    Ok(())
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
