use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::note::Note;
use super::task::Task;

/// A task removed from its note but kept recoverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedTask {
    pub task: Task,
    /// Note the task was removed from; restore fails gracefully when it
    /// no longer exists
    pub original_note_id: String,
    pub archived_at: DateTime<Utc>,
}

/// Search scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    Global,
    Note,
}

/// Current search filter settings, stored in state and evaluated at
/// query time by `ops::search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchState {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub scope: SearchScope,
    /// Target note when scope is `Note`
    #[serde(default)]
    pub note_id: Option<String>,
}

/// Transient drag-and-drop state; presence means a drag is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub task_id: String,
    pub source_note_id: String,
}

/// The snapshot payload captured by undo entries and version snapshots:
/// notes and archive only, no history-of-history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoardData {
    pub notes: Vec<Note>,
    #[serde(default)]
    pub archived_tasks: Vec<ArchivedTask>,
}

/// A named point-in-time checkpoint, distinct from step-level undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub data: BoardData,
}

/// The root aggregate for one user workspace.
///
/// Owned and mutated exclusively by the reducer; everything else receives
/// read-only views. `dragged_task` is UI-transient and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub board_id: String,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub archived_tasks: Vec<ArchivedTask>,
    #[serde(skip)]
    pub dragged_task: Option<DragState>,
    #[serde(default)]
    pub search: SearchState,
    /// Append-only log of named snapshots, oldest first
    #[serde(default)]
    pub version_history: Vec<VersionSnapshot>,
    #[serde(default)]
    pub undo_stack: Vec<BoardData>,
    #[serde(default)]
    pub redo_stack: Vec<BoardData>,
}

impl BoardState {
    /// Create an empty board.
    pub fn new(board_id: impl Into<String>) -> Self {
        BoardState {
            board_id: board_id.into(),
            notes: Vec::new(),
            archived_tasks: Vec::new(),
            dragged_task: None,
            search: SearchState::default(),
            version_history: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == note_id)
    }

    pub fn note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == note_id)
    }

    /// Capture the snapshot payload (notes + archive).
    pub fn data(&self) -> BoardData {
        BoardData {
            notes: self.notes.clone(),
            archived_tasks: self.archived_tasks.clone(),
        }
    }

    /// Replace notes and archive from a snapshot payload.
    pub fn apply_data(&mut self, data: BoardData) {
        self.notes = data.notes;
        self.archived_tasks = data.archived_tasks;
    }
}
