use chrono::Utc;

use crate::model::board::{ArchivedTask, BoardState, DragState, SearchScope, SearchState};
use crate::ops::{note_ops, task_ops};

use super::action::Action;
use super::history::{self, RestoreError};

/// How the reducer resolved an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State changed
    Applied,
    /// Stale reference or nothing to do; state returned unchanged
    Ignored,
    /// Explicit recovery action that could not complete
    Failed(RestoreError),
}

/// A reducer step: the new state plus how the action resolved.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub state: BoardState,
    pub outcome: Outcome,
}

/// The single mutation point: map (state, action) to a new state.
///
/// Pure and synchronous; the input state is never mutated, so readers
/// holding the previous value observe a stable snapshot. Undoable actions
/// that actually applied push the pre-action data onto the undo stack
/// (which clears the redo stack).
pub fn reduce(state: &BoardState, action: &Action) -> Reduction {
    let mut next = state.clone();
    let outcome = apply(&mut next, action);
    if outcome == Outcome::Applied && action.is_undoable() {
        history::push_undo(&mut next, state.data());
    }
    Reduction {
        state: next,
        outcome,
    }
}

fn apply(state: &mut BoardState, action: &Action) -> Outcome {
    match action {
        // --- Note CRUD ---
        Action::AddNote { title, color } => {
            state
                .notes
                .push(note_ops::create_note(title.as_deref(), *color));
            Outcome::Applied
        }
        Action::DeleteNote { note_id } => delete_note(state, note_id),
        Action::RenameNote { note_id, title } => {
            with_note(state, note_id, |n| note_ops::rename(n, title))
        }
        Action::RecolorNote { note_id, color } => {
            with_note(state, note_id, |n| note_ops::recolor(n, *color))
        }
        Action::ResizeNoteText { note_id, size } => {
            with_note(state, note_id, |n| note_ops::resize_text(n, *size))
        }
        Action::RepositionNote { note_id, x, y } => {
            with_note(state, note_id, |n| note_ops::reposition(n, *x, *y))
        }

        // --- Task CRUD ---
        Action::AddTask {
            note_id,
            text,
            position,
        } => {
            let task = crate::model::task::Task::new(text.clone());
            with_tasks(state, note_id, |tasks| task_ops::insert(tasks, task, position))
        }
        Action::UpdateTaskText {
            note_id,
            task_id,
            text,
        } => with_tasks(state, note_id, |tasks| {
            task_ops::update_text(tasks, task_id, text)
        }),
        Action::SetTaskPriority {
            note_id,
            task_id,
            priority,
        } => with_tasks(state, note_id, |tasks| {
            task_ops::set_priority(tasks, task_id, *priority)
        }),
        Action::ToggleTaskComplete { note_id, task_id } => with_tasks(state, note_id, |tasks| {
            task_ops::toggle_complete(tasks, task_id)
        }),
        Action::IndentTask { note_id, task_id } => {
            with_tasks(state, note_id, |tasks| task_ops::indent(tasks, task_id))
        }
        Action::OutdentTask { note_id, task_id } => {
            with_tasks(state, note_id, |tasks| task_ops::outdent(tasks, task_id))
        }
        Action::MoveTask {
            note_id,
            task_id,
            target_index,
        } => with_tasks(state, note_id, |tasks| {
            task_ops::reorder(tasks, task_id, *target_index)
        }),
        Action::DeleteTask { note_id, task_id } => delete_task(state, note_id, task_id),

        // --- Archive ---
        Action::RestoreTask { task_id } => restore_task(state, task_id),
        Action::PurgeArchivedTask { task_id } => {
            let before = state.archived_tasks.len();
            state.archived_tasks.retain(|a| a.task.id != *task_id);
            if state.archived_tasks.len() == before {
                Outcome::Ignored
            } else {
                Outcome::Applied
            }
        }

        // --- Drag and drop ---
        Action::StartDrag {
            task_id,
            source_note_id,
        } => {
            let exists = state
                .note(source_note_id)
                .is_some_and(|n| n.task(task_id).is_some());
            if !exists {
                return Outcome::Ignored;
            }
            state.dragged_task = Some(DragState {
                task_id: task_id.clone(),
                source_note_id: source_note_id.clone(),
            });
            Outcome::Applied
        }
        Action::DropOnNote {
            target_note_id,
            target_index,
        } => drop_on_note(state, target_note_id, *target_index),
        Action::CancelDrag => {
            if state.dragged_task.take().is_none() {
                return Outcome::Ignored;
            }
            Outcome::Applied
        }

        // --- Search ---
        Action::SetSearchTerm { term } => {
            state.search.term = term.clone();
            state.search.is_active = !term.trim().is_empty();
            Outcome::Applied
        }
        Action::SetSearchScope { scope, note_id } => {
            state.search.scope = *scope;
            state.search.note_id = match scope {
                SearchScope::Note => note_id.clone(),
                SearchScope::Global => None,
            };
            Outcome::Applied
        }
        Action::ClearSearch => {
            state.search = SearchState::default();
            Outcome::Applied
        }

        // --- History ---
        Action::Undo => {
            if history::undo(state) {
                Outcome::Applied
            } else {
                Outcome::Ignored
            }
        }
        Action::Redo => {
            if history::redo(state) {
                Outcome::Applied
            } else {
                Outcome::Ignored
            }
        }
        Action::SaveVersionSnapshot { description } => {
            history::save_version(state, description, Utc::now());
            Outcome::Applied
        }
        Action::RestoreVersion { timestamp } => {
            match history::restore_version(state, *timestamp) {
                Ok(()) => Outcome::Applied,
                Err(err) => Outcome::Failed(err),
            }
        }
        Action::PruneVersions { keep } => {
            let dropped = history::prune_versions(state, *keep);
            if dropped == 0 {
                Outcome::Ignored
            } else {
                tracing::info!(dropped, keep, "pruned version snapshots");
                Outcome::Applied
            }
        }

        // --- Hydration ---
        Action::LoadBoard { state: loaded } => {
            *state = (**loaded).clone();
            state.dragged_task = None;
            Outcome::Applied
        }
    }
}

// ---------------------------------------------------------------------------
// Note helpers
// ---------------------------------------------------------------------------

/// Replace a note with a pure-setter result; missing id is ignored.
fn with_note(
    state: &mut BoardState,
    note_id: &str,
    f: impl FnOnce(&crate::model::note::Note) -> crate::model::note::Note,
) -> Outcome {
    let Some(note) = state.note_mut(note_id) else {
        return Outcome::Ignored;
    };
    *note = f(note);
    Outcome::Applied
}

/// Run a pure task-sequence op against a note; unchanged output (missing
/// task id, capped indent) resolves to Ignored.
fn with_tasks(
    state: &mut BoardState,
    note_id: &str,
    f: impl FnOnce(&[crate::model::task::Task]) -> Vec<crate::model::task::Task>,
) -> Outcome {
    let Some(note) = state.note_mut(note_id) else {
        return Outcome::Ignored;
    };
    let next = f(&note.tasks);
    if next == note.tasks {
        return Outcome::Ignored;
    }
    note.tasks = next;
    note.updated_at = Utc::now();
    Outcome::Applied
}

/// Deleting a note moves its tasks to the archive so the deletion is
/// recoverable.
fn delete_note(state: &mut BoardState, note_id: &str) -> Outcome {
    let Some(idx) = state.notes.iter().position(|n| n.id == note_id) else {
        return Outcome::Ignored;
    };
    let note = state.notes.remove(idx);
    let archived_at = Utc::now();
    for task in note.tasks {
        state.archived_tasks.push(ArchivedTask {
            task,
            original_note_id: note.id.clone(),
            archived_at,
        });
    }
    Outcome::Applied
}

fn delete_task(state: &mut BoardState, note_id: &str, task_id: &str) -> Outcome {
    let Some(note) = state.note_mut(note_id) else {
        return Outcome::Ignored;
    };
    let (rest, removed) = task_ops::remove(&note.tasks, task_id);
    let Some(task) = removed else {
        return Outcome::Ignored;
    };
    note.tasks = rest;
    note.updated_at = Utc::now();
    let original_note_id = note.id.clone();
    state.archived_tasks.push(ArchivedTask {
        task,
        original_note_id,
        archived_at: Utc::now(),
    });
    Outcome::Applied
}

/// Restore an archived task to the end of its original note. Fields are
/// restored verbatim except that the indent level is clamped when the
/// append position would break the indent invariant.
fn restore_task(state: &mut BoardState, task_id: &str) -> Outcome {
    let Some(idx) = state.archived_tasks.iter().position(|a| a.task.id == task_id) else {
        return Outcome::Failed(RestoreError::NotArchived(task_id.to_string()));
    };
    let note_id = state.archived_tasks[idx].original_note_id.clone();
    if state.note(&note_id).is_none() {
        return Outcome::Failed(RestoreError::OriginalNoteMissing {
            task_id: task_id.to_string(),
            note_id,
        });
    }

    let mut task = state.archived_tasks.remove(idx).task;
    let note = state
        .note_mut(&note_id)
        .expect("note existence checked above");
    task.indent_level = task.indent_level.min(task_ops::max_append_level(&note.tasks));
    note.tasks.push(task);
    note.updated_at = Utc::now();
    Outcome::Applied
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

/// Complete a drag: `dragging → idle`. Same-note drops degenerate into a
/// reorder; a vanished source or target resolves to idle with no task
/// movement.
fn drop_on_note(
    state: &mut BoardState,
    target_note_id: &str,
    target_index: Option<usize>,
) -> Outcome {
    let Some(drag) = state.dragged_task.take() else {
        return Outcome::Ignored;
    };

    if state.note(target_note_id).is_none() {
        // Fail-safe: the drag ends, nothing moves
        return Outcome::Ignored;
    }

    if drag.source_note_id == target_note_id {
        let note = state
            .note_mut(target_note_id)
            .expect("target existence checked above");
        let target = target_index.unwrap_or(note.tasks.len().saturating_sub(1));
        let next = task_ops::reorder(&note.tasks, &drag.task_id, target);
        if next == note.tasks {
            return Outcome::Ignored;
        }
        note.tasks = next;
        note.updated_at = Utc::now();
        return Outcome::Applied;
    }

    // Cross-note move: remove from source, insert into target
    let removed = {
        let Some(source) = state.note_mut(&drag.source_note_id) else {
            return Outcome::Ignored;
        };
        let (rest, removed) = task_ops::remove(&source.tasks, &drag.task_id);
        let Some(task) = removed else {
            return Outcome::Ignored;
        };
        source.tasks = rest;
        source.updated_at = Utc::now();
        task
    };

    let target = state
        .note_mut(target_note_id)
        .expect("target existence checked above");
    let mut tasks = target.tasks.clone();
    let idx = target_index.unwrap_or(tasks.len()).min(tasks.len());
    tasks.insert(idx, removed);
    task_ops::normalize_levels(&mut tasks);
    target.tasks = tasks;
    target.updated_at = Utc::now();
    Outcome::Applied
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::note::NoteColor;
    use crate::model::task::Task;

    fn dispatch(state: BoardState, action: Action) -> (BoardState, Outcome) {
        let r = reduce(&state, &action);
        (r.state, r.outcome)
    }

    fn board_with_tasks(note_title: &str, texts: &[&str]) -> BoardState {
        let mut state = BoardState::new("board-1");
        let (state2, _) = dispatch(
            state,
            Action::AddNote {
                title: Some(note_title.into()),
                color: Some(NoteColor::Yellow),
            },
        );
        state = state2;
        let note_id = state.notes[0].id.clone();
        for text in texts {
            let (next, _) = dispatch(
                state,
                Action::AddTask {
                    note_id: note_id.clone(),
                    text: (*text).into(),
                    position: crate::ops::task_ops::InsertPosition::End,
                },
            );
            state = next;
        }
        state
    }

    fn task_id_of(state: &BoardState, note_idx: usize, text: &str) -> String {
        state.notes[note_idx]
            .tasks
            .iter()
            .find(|t| t.text == text)
            .map(|t| t.id.clone())
            .unwrap()
    }

    // --- Purity / outcomes ---

    #[test]
    fn reduce_never_mutates_input() {
        let state = board_with_tasks("Work", &["a"]);
        let before = state.clone();
        let note_id = state.notes[0].id.clone();
        let _ = reduce(
            &state,
            &Action::RenameNote {
                note_id,
                title: "Renamed".into(),
            },
        );
        assert_eq!(state, before);
    }

    #[test]
    fn unknown_note_id_is_ignored() {
        let state = board_with_tasks("Work", &[]);
        let (next, outcome) = dispatch(
            state.clone(),
            Action::RenameNote {
                note_id: "note-gone".into(),
                title: "x".into(),
            },
        );
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(next, state);
    }

    #[test]
    fn ignored_actions_do_not_push_undo() {
        let state = board_with_tasks("Work", &["a"]);
        let depth = state.undo_stack.len();
        let note_id = state.notes[0].id.clone();
        let (next, outcome) = dispatch(
            state,
            Action::UpdateTaskText {
                note_id,
                task_id: "task-gone".into(),
                text: "x".into(),
            },
        );
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(next.undo_stack.len(), depth);
    }

    #[test]
    fn applied_undoable_action_pushes_undo_and_clears_redo() {
        let state = board_with_tasks("Work", &["a"]);
        let (state, _) = dispatch(state, Action::Undo);
        assert!(!state.redo_stack.is_empty());

        let (state, outcome) = dispatch(
            state,
            Action::AddNote {
                title: None,
                color: None,
            },
        );
        assert_eq!(outcome, Outcome::Applied);
        assert!(state.redo_stack.is_empty());
    }

    // --- Note cascade ---

    #[test]
    fn delete_note_archives_its_tasks() {
        let state = board_with_tasks("Work", &["a", "b"]);
        let note_id = state.notes[0].id.clone();
        let (state, outcome) = dispatch(state, Action::DeleteNote { note_id: note_id.clone() });
        assert_eq!(outcome, Outcome::Applied);
        assert!(state.notes.is_empty());
        assert_eq!(state.archived_tasks.len(), 2);
        assert!(state
            .archived_tasks
            .iter()
            .all(|a| a.original_note_id == note_id));
    }

    // --- Archive / restore ---

    #[test]
    fn restore_task_fails_when_note_gone() {
        let state = board_with_tasks("Work", &["a"]);
        let note_id = state.notes[0].id.clone();
        let task_id = task_id_of(&state, 0, "a");
        let (state, _) = dispatch(
            state,
            Action::DeleteTask {
                note_id: note_id.clone(),
                task_id: task_id.clone(),
            },
        );
        let (state, _) = dispatch(state, Action::DeleteNote { note_id });
        let (state, outcome) = dispatch(state, Action::RestoreTask { task_id: task_id.clone() });
        assert!(matches!(
            outcome,
            Outcome::Failed(RestoreError::OriginalNoteMissing { .. })
        ));
        // The archived task is kept for a later purge or undo
        assert!(state.archived_tasks.iter().any(|a| a.task.id == task_id));
    }

    #[test]
    fn restore_unknown_task_fails_distinguishably() {
        let state = board_with_tasks("Work", &[]);
        let (_, outcome) = dispatch(
            state,
            Action::RestoreTask {
                task_id: "task-gone".into(),
            },
        );
        assert_eq!(
            outcome,
            Outcome::Failed(RestoreError::NotArchived("task-gone".into()))
        );
    }

    #[test]
    fn purge_discards_archived_task() {
        let state = board_with_tasks("Work", &["a"]);
        let note_id = state.notes[0].id.clone();
        let task_id = task_id_of(&state, 0, "a");
        let (state, _) = dispatch(state, Action::DeleteTask { note_id, task_id: task_id.clone() });
        let (state, outcome) = dispatch(state, Action::PurgeArchivedTask { task_id });
        assert_eq!(outcome, Outcome::Applied);
        assert!(state.archived_tasks.is_empty());
    }

    // --- Drag state machine ---

    #[test]
    fn drag_lifecycle_idle_dragging_idle() {
        let state = board_with_tasks("Work", &["a"]);
        let note_id = state.notes[0].id.clone();
        let task_id = task_id_of(&state, 0, "a");

        let (state, outcome) = dispatch(
            state,
            Action::StartDrag {
                task_id: task_id.clone(),
                source_note_id: note_id.clone(),
            },
        );
        assert_eq!(outcome, Outcome::Applied);
        assert!(state.dragged_task.is_some());

        let (state, outcome) = dispatch(state, Action::CancelDrag);
        assert_eq!(outcome, Outcome::Applied);
        assert!(state.dragged_task.is_none());
        // Task ownership untouched
        assert_eq!(state.notes[0].tasks.len(), 1);
    }

    #[test]
    fn drop_without_drag_is_ignored() {
        let state = board_with_tasks("Work", &["a"]);
        let note_id = state.notes[0].id.clone();
        let (_, outcome) = dispatch(
            state,
            Action::DropOnNote {
                target_note_id: note_id,
                target_index: None,
            },
        );
        assert_eq!(outcome, Outcome::Ignored);
    }

    #[test]
    fn drop_on_vanished_note_clears_drag_without_movement() {
        let state = board_with_tasks("Work", &["a"]);
        let note_id = state.notes[0].id.clone();
        let task_id = task_id_of(&state, 0, "a");
        let (state, _) = dispatch(
            state,
            Action::StartDrag {
                task_id,
                source_note_id: note_id,
            },
        );
        let (state, outcome) = dispatch(
            state,
            Action::DropOnNote {
                target_note_id: "note-gone".into(),
                target_index: None,
            },
        );
        assert_eq!(outcome, Outcome::Ignored);
        assert!(state.dragged_task.is_none());
        assert_eq!(state.notes[0].tasks.len(), 1);
    }

    #[test]
    fn cross_note_drop_appends_to_target() {
        let mut state = board_with_tasks("Work", &["a", "b"]);
        let (next, _) = dispatch(
            state,
            Action::AddNote {
                title: Some("Home".into()),
                color: None,
            },
        );
        state = next;
        let source_id = state.notes[0].id.clone();
        let target_id = state.notes[1].id.clone();
        let task_id = task_id_of(&state, 0, "a");

        let (state, _) = dispatch(
            state,
            Action::StartDrag {
                task_id: task_id.clone(),
                source_note_id: source_id,
            },
        );
        let (state, outcome) = dispatch(
            state,
            Action::DropOnNote {
                target_note_id: target_id,
                target_index: None,
            },
        );
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(state.notes[0].tasks.len(), 1);
        assert_eq!(state.notes[1].tasks.len(), 1);
        assert_eq!(state.notes[1].tasks[0].id, task_id);
        assert!(state.dragged_task.is_none());
    }

    #[test]
    fn same_note_drop_reorders() {
        let state = board_with_tasks("Work", &["a", "b", "c"]);
        let note_id = state.notes[0].id.clone();
        let task_id = task_id_of(&state, 0, "c");
        let (state, _) = dispatch(
            state,
            Action::StartDrag {
                task_id,
                source_note_id: note_id.clone(),
            },
        );
        let (state, outcome) = dispatch(
            state,
            Action::DropOnNote {
                target_note_id: note_id,
                target_index: Some(0),
            },
        );
        assert_eq!(outcome, Outcome::Applied);
        let texts: Vec<&str> = state.notes[0].tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }

    // --- Search state ---

    #[test]
    fn search_term_sets_active_flag() {
        let state = board_with_tasks("Work", &[]);
        let (state, _) = dispatch(
            state,
            Action::SetSearchTerm {
                term: "milk".into(),
            },
        );
        assert!(state.search.is_active);

        let (state, _) = dispatch(state, Action::SetSearchTerm { term: "  ".into() });
        assert!(!state.search.is_active);

        let (state, _) = dispatch(state, Action::ClearSearch);
        assert_eq!(state.search, SearchState::default());
    }

    #[test]
    fn global_scope_drops_note_id() {
        let state = board_with_tasks("Work", &[]);
        let (state, _) = dispatch(
            state,
            Action::SetSearchScope {
                scope: SearchScope::Note,
                note_id: Some("note-1".into()),
            },
        );
        assert_eq!(state.search.note_id.as_deref(), Some("note-1"));
        let (state, _) = dispatch(
            state,
            Action::SetSearchScope {
                scope: SearchScope::Global,
                note_id: Some("note-1".into()),
            },
        );
        assert!(state.search.note_id.is_none());
    }

    // --- History wiring ---

    #[test]
    fn undo_on_empty_stack_is_ignored() {
        let state = BoardState::new("board-1");
        let (_, outcome) = dispatch(state, Action::Undo);
        assert_eq!(outcome, Outcome::Ignored);
    }

    #[test]
    fn restore_version_is_undoable() {
        let state = board_with_tasks("Work", &["a"]);
        let (state, _) = dispatch(
            state,
            Action::SaveVersionSnapshot {
                description: "checkpoint".into(),
            },
        );
        let ts = state.version_history[0].timestamp;
        let note_id = state.notes[0].id.clone();
        let (state, _) = dispatch(state, Action::DeleteNote { note_id });
        assert!(state.notes.is_empty());

        let (state, outcome) = dispatch(state, Action::RestoreVersion { timestamp: ts });
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(state.notes.len(), 1);

        // The restore itself can be undone
        let (state, _) = dispatch(state, Action::Undo);
        assert!(state.notes.is_empty());
    }

    #[test]
    fn load_board_replaces_wholesale_without_undo() {
        let state = board_with_tasks("Work", &["a"]);
        let replacement = board_with_tasks("Other", &[]);
        let depth = replacement.undo_stack.len();
        let (state, outcome) = dispatch(
            state,
            Action::LoadBoard {
                state: Box::new(replacement.clone()),
            },
        );
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(state.notes[0].title, "Other");
        // Stack comes from the loaded document, not from this action
        assert_eq!(state.undo_stack.len(), depth);
    }
}
