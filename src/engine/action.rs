use chrono::{DateTime, Utc};

use crate::model::board::{BoardState, SearchScope};
use crate::model::note::{NoteColor, TextSize};
use crate::model::task::Priority;
use crate::ops::task_ops::InsertPosition;

/// The full action vocabulary accepted by the reducer. UI layers translate
/// input events into these; nothing mutates board state any other way.
#[derive(Debug, Clone)]
pub enum Action {
    // Note CRUD
    AddNote {
        title: Option<String>,
        color: Option<NoteColor>,
    },
    /// Cascades the note's tasks to the archive rather than hard-deleting
    DeleteNote {
        note_id: String,
    },
    RenameNote {
        note_id: String,
        title: String,
    },
    RecolorNote {
        note_id: String,
        color: NoteColor,
    },
    ResizeNoteText {
        note_id: String,
        size: TextSize,
    },
    RepositionNote {
        note_id: String,
        x: f64,
        y: f64,
    },

    // Task CRUD
    AddTask {
        note_id: String,
        text: String,
        position: InsertPosition,
    },
    UpdateTaskText {
        note_id: String,
        task_id: String,
        text: String,
    },
    SetTaskPriority {
        note_id: String,
        task_id: String,
        priority: Priority,
    },
    ToggleTaskComplete {
        note_id: String,
        task_id: String,
    },
    IndentTask {
        note_id: String,
        task_id: String,
    },
    OutdentTask {
        note_id: String,
        task_id: String,
    },
    /// Reorder within a note
    MoveTask {
        note_id: String,
        task_id: String,
        target_index: usize,
    },
    /// Delete = archive
    DeleteTask {
        note_id: String,
        task_id: String,
    },

    // Archive
    RestoreTask {
        task_id: String,
    },
    /// Permanently discard an archived task
    PurgeArchivedTask {
        task_id: String,
    },

    // Drag-and-drop mini state machine
    StartDrag {
        task_id: String,
        source_note_id: String,
    },
    /// `target_index`: the drop-computed position when the UI has one,
    /// otherwise the task appends to the end of the target note
    DropOnNote {
        target_note_id: String,
        target_index: Option<usize>,
    },
    CancelDrag,

    // Search
    SetSearchTerm {
        term: String,
    },
    SetSearchScope {
        scope: SearchScope,
        note_id: Option<String>,
    },
    ClearSearch,

    // History
    Undo,
    Redo,
    SaveVersionSnapshot {
        description: String,
    },
    RestoreVersion {
        timestamp: DateTime<Utc>,
    },
    /// Explicit retention: keep only the newest `keep` snapshots
    PruneVersions {
        keep: usize,
    },

    /// Wholesale hydration from persistence; never undoable
    LoadBoard {
        state: Box<BoardState>,
    },
}

impl Action {
    /// Actions that push the pre-action state onto the undo stack when
    /// they apply. Transient UI actions, search edits, history traversal,
    /// and hydration are excluded.
    pub fn is_undoable(&self) -> bool {
        match self {
            Action::AddNote { .. }
            | Action::DeleteNote { .. }
            | Action::RenameNote { .. }
            | Action::RecolorNote { .. }
            | Action::ResizeNoteText { .. }
            | Action::RepositionNote { .. }
            | Action::AddTask { .. }
            | Action::UpdateTaskText { .. }
            | Action::SetTaskPriority { .. }
            | Action::ToggleTaskComplete { .. }
            | Action::IndentTask { .. }
            | Action::OutdentTask { .. }
            | Action::MoveTask { .. }
            | Action::DeleteTask { .. }
            | Action::RestoreTask { .. }
            | Action::PurgeArchivedTask { .. }
            | Action::DropOnNote { .. }
            | Action::RestoreVersion { .. } => true,

            Action::StartDrag { .. }
            | Action::CancelDrag
            | Action::SetSearchTerm { .. }
            | Action::SetSearchScope { .. }
            | Action::ClearSearch
            | Action::Undo
            | Action::Redo
            | Action::SaveVersionSnapshot { .. }
            | Action::PruneVersions { .. }
            | Action::LoadBoard { .. } => false,
        }
    }

    /// Actions that never touch persisted state; the store skips the
    /// persistence bridge for these.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Action::StartDrag { .. }
                | Action::CancelDrag
                | Action::SetSearchTerm { .. }
                | Action::SetSearchScope { .. }
                | Action::ClearSearch
        )
    }

    /// Stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddNote { .. } => "add_note",
            Action::DeleteNote { .. } => "delete_note",
            Action::RenameNote { .. } => "rename_note",
            Action::RecolorNote { .. } => "recolor_note",
            Action::ResizeNoteText { .. } => "resize_note_text",
            Action::RepositionNote { .. } => "reposition_note",
            Action::AddTask { .. } => "add_task",
            Action::UpdateTaskText { .. } => "update_task_text",
            Action::SetTaskPriority { .. } => "set_task_priority",
            Action::ToggleTaskComplete { .. } => "toggle_task_complete",
            Action::IndentTask { .. } => "indent_task",
            Action::OutdentTask { .. } => "outdent_task",
            Action::MoveTask { .. } => "move_task",
            Action::DeleteTask { .. } => "delete_task",
            Action::RestoreTask { .. } => "restore_task",
            Action::PurgeArchivedTask { .. } => "purge_archived_task",
            Action::StartDrag { .. } => "start_drag",
            Action::DropOnNote { .. } => "drop_on_note",
            Action::CancelDrag => "cancel_drag",
            Action::SetSearchTerm { .. } => "set_search_term",
            Action::SetSearchScope { .. } => "set_search_scope",
            Action::ClearSearch => "clear_search",
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::SaveVersionSnapshot { .. } => "save_version_snapshot",
            Action::RestoreVersion { .. } => "restore_version",
            Action::PruneVersions { .. } => "prune_versions",
            Action::LoadBoard { .. } => "load_board",
        }
    }
}
