use chrono::{DateTime, Utc};

use crate::model::board::{BoardData, BoardState, VersionSnapshot};

/// Bounded depth of the step-level undo stack; oldest entries are evicted
/// first once the cap is reached.
pub const UNDO_STACK_LIMIT: usize = 100;

/// Failure outcomes of explicit user-initiated recovery actions. These are
/// reported, not thrown: the user asked for a restore and needs to know it
/// did not happen.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RestoreError {
    #[error("no version snapshot at {0}")]
    VersionNotFound(DateTime<Utc>),
    #[error("task {task_id} cannot be restored: note {note_id} no longer exists")]
    OriginalNoteMissing { task_id: String, note_id: String },
    #[error("no archived task with id {0}")]
    NotArchived(String),
}

// ---------------------------------------------------------------------------
// Undo / redo
// ---------------------------------------------------------------------------

/// Record the pre-action snapshot. Evicts FIFO at the cap and clears the
/// redo stack (a new edit invalidates redo history).
pub fn push_undo(state: &mut BoardState, previous: BoardData) {
    state.undo_stack.push(previous);
    if state.undo_stack.len() > UNDO_STACK_LIMIT {
        let excess = state.undo_stack.len() - UNDO_STACK_LIMIT;
        state.undo_stack.drain(..excess);
    }
    state.redo_stack.clear();
}

/// Pop the most recent undo entry and restore it, pushing the superseded
/// state onto the redo stack. Returns false when there is nothing to undo.
pub fn undo(state: &mut BoardState) -> bool {
    let Some(previous) = state.undo_stack.pop() else {
        return false;
    };
    state.redo_stack.push(state.data());
    state.apply_data(previous);
    true
}

/// Reverse of `undo`. Returns false when there is nothing to redo.
pub fn redo(state: &mut BoardState) -> bool {
    let Some(next) = state.redo_stack.pop() else {
        return false;
    };
    state.undo_stack.push(state.data());
    state.apply_data(next);
    true
}

// ---------------------------------------------------------------------------
// Version snapshots
// ---------------------------------------------------------------------------

/// Append a named checkpoint of the current notes and archive.
pub fn save_version(state: &mut BoardState, description: &str, timestamp: DateTime<Utc>) {
    let snapshot = VersionSnapshot {
        timestamp,
        description: description.to_string(),
        data: state.data(),
    };
    state.version_history.push(snapshot);
}

/// Replace live notes/archive with the snapshot taken at `timestamp`.
///
/// History is never rewritten: the restored-from entry and everything
/// after it stay in the log, and a notice entry recording the restore is
/// appended. The caller is responsible for making the restore itself
/// undoable (the reducer pushes the pre-restore state first).
pub fn restore_version(state: &mut BoardState, timestamp: DateTime<Utc>) -> Result<(), RestoreError> {
    let snapshot = state
        .version_history
        .iter()
        .find(|v| v.timestamp == timestamp)
        .cloned()
        .ok_or(RestoreError::VersionNotFound(timestamp))?;

    state.apply_data(snapshot.data);
    let notice = VersionSnapshot {
        timestamp: Utc::now(),
        description: format!(
            "restored board to snapshot \"{}\" from {}",
            snapshot.description,
            snapshot.timestamp.to_rfc3339()
        ),
        data: state.data(),
    };
    state.version_history.push(notice);
    Ok(())
}

/// Keep only the newest `keep` snapshots. Only ever runs on explicit user
/// action; returns how many entries were dropped.
pub fn prune_versions(state: &mut BoardState, keep: usize) -> usize {
    if state.version_history.len() <= keep {
        return 0;
    }
    let drop = state.version_history.len() - keep;
    state.version_history.drain(..drop);
    drop
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::note::{Note, NoteColor};

    fn board_with_note(title: &str) -> BoardState {
        let mut board = BoardState::new("board-1");
        board.notes.push(Note::new(title, NoteColor::Yellow));
        board
    }

    // --- Undo stack ---

    #[test]
    fn undo_restores_previous_data() {
        let mut board = board_with_note("First");
        let before = board.data();

        board.notes.push(Note::new("Second", NoteColor::Pink));
        push_undo(&mut board, before);

        assert!(undo(&mut board));
        assert_eq!(board.notes.len(), 1);
        assert_eq!(board.notes[0].title, "First");
    }

    #[test]
    fn redo_reapplies_undone_data() {
        let mut board = board_with_note("First");
        let before = board.data();
        board.notes.push(Note::new("Second", NoteColor::Pink));
        push_undo(&mut board, before);

        undo(&mut board);
        assert!(redo(&mut board));
        assert_eq!(board.notes.len(), 2);
    }

    #[test]
    fn undo_on_empty_stack_is_refused() {
        let mut board = board_with_note("Only");
        assert!(!undo(&mut board));
        assert_eq!(board.notes.len(), 1);
    }

    #[test]
    fn push_clears_redo() {
        let mut board = board_with_note("First");
        let before = board.data();
        board.notes.push(Note::new("Second", NoteColor::Pink));
        push_undo(&mut board, before);
        undo(&mut board);
        assert_eq!(board.redo_stack.len(), 1);

        let before = board.data();
        board.notes.push(Note::new("Third", NoteColor::Blue));
        push_undo(&mut board, before);
        assert!(board.redo_stack.is_empty());
        assert!(!redo(&mut board));
    }

    #[test]
    fn stack_limit_evicts_oldest_first() {
        let mut board = board_with_note("Base");
        for i in 0..=UNDO_STACK_LIMIT {
            let mut data = board.data();
            data.notes[0].title = format!("edit {i}");
            push_undo(&mut board, data);
        }
        assert_eq!(board.undo_stack.len(), UNDO_STACK_LIMIT);
        // Entry 0 was evicted; the oldest survivor is edit 1
        assert_eq!(board.undo_stack[0].notes[0].title, "edit 1");
    }

    // --- Version snapshots ---

    #[test]
    fn save_version_appends() {
        let mut board = board_with_note("Work");
        let t = Utc::now();
        save_version(&mut board, "before cleanup", t);
        assert_eq!(board.version_history.len(), 1);
        assert_eq!(board.version_history[0].description, "before cleanup");
        assert_eq!(board.version_history[0].timestamp, t);
    }

    #[test]
    fn restore_version_replaces_data_and_appends_notice() {
        let mut board = board_with_note("Work");
        let t = Utc::now();
        save_version(&mut board, "checkpoint", t);

        board.notes.clear();
        restore_version(&mut board, t).unwrap();

        assert_eq!(board.notes.len(), 1);
        assert_eq!(board.notes[0].title, "Work");
        // Original entry intact, notice appended after it
        assert_eq!(board.version_history.len(), 2);
        assert_eq!(board.version_history[0].timestamp, t);
        assert!(board.version_history[1].description.contains("checkpoint"));
    }

    #[test]
    fn restore_unknown_timestamp_fails_without_change() {
        let mut board = board_with_note("Work");
        let bogus = Utc::now();
        let err = restore_version(&mut board, bogus).unwrap_err();
        assert_eq!(err, RestoreError::VersionNotFound(bogus));
        assert_eq!(board.notes.len(), 1);
        assert!(board.version_history.is_empty());
    }

    #[test]
    fn restore_does_not_erase_newer_entries() {
        let mut board = board_with_note("Work");
        let t1 = Utc::now();
        save_version(&mut board, "first", t1);
        board.notes.push(Note::new("Later", NoteColor::Green));
        let t2 = Utc::now();
        save_version(&mut board, "second", t2);

        restore_version(&mut board, t1).unwrap();
        let descriptions: Vec<&str> = board
            .version_history
            .iter()
            .map(|v| v.description.as_str())
            .collect();
        assert!(descriptions.contains(&"first"));
        assert!(descriptions.contains(&"second"));
    }

    #[test]
    fn prune_keeps_newest() {
        let mut board = board_with_note("Work");
        for i in 0..5 {
            save_version(&mut board, &format!("v{i}"), Utc::now());
        }
        let dropped = prune_versions(&mut board, 2);
        assert_eq!(dropped, 3);
        let descriptions: Vec<&str> = board
            .version_history
            .iter()
            .map(|v| v.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["v3", "v4"]);

        // Pruning below the current count is a no-op
        assert_eq!(prune_versions(&mut board, 10), 0);
    }
}
