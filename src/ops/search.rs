use indexmap::IndexMap;

use crate::model::board::{BoardState, SearchScope, SearchState};
use crate::model::note::Note;

/// Matches within a single note, in original task order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteMatch {
    /// The note title itself matched the term
    pub title_matched: bool,
    /// Ids of matching tasks, in array order (never resorted by relevance)
    pub task_ids: Vec<String>,
}

/// Result of evaluating a search over a board. When `active` is false the
/// result is "unfiltered": every note and every task is listed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResults {
    pub active: bool,
    /// Note id → matches, preserving note display order
    pub matches: IndexMap<String, NoteMatch>,
}

impl SearchResults {
    /// Whether a note should be shown under this result.
    pub fn shows_note(&self, note_id: &str) -> bool {
        !self.active || self.matches.contains_key(note_id)
    }

    /// Whether a task should be shown under this result.
    pub fn shows_task(&self, note_id: &str, task_id: &str) -> bool {
        if !self.active {
            return true;
        }
        self.matches
            .get(note_id)
            .is_some_and(|m| m.task_ids.iter().any(|id| id == task_id))
    }
}

/// Evaluate a search over the board. Pure: the board is never mutated, and
/// identical inputs always produce identical results. Cost is O(total task
/// count), cheap enough to run on every keystroke for a hand-entered board.
///
/// Matching is case-insensitive substring against task text and note
/// titles. An empty or whitespace-only term is inactive (no filter).
pub fn search(board: &BoardState, query: &SearchState) -> SearchResults {
    let term = query.term.trim().to_lowercase();
    if term.is_empty() {
        return unfiltered(board);
    }

    let mut matches = IndexMap::new();
    for note in &board.notes {
        if query.scope == SearchScope::Note && query.note_id.as_deref() != Some(note.id.as_str()) {
            continue;
        }
        let title_matched = note.title.to_lowercase().contains(&term);
        let task_ids: Vec<String> = note
            .tasks
            .iter()
            .filter(|t| t.text.to_lowercase().contains(&term))
            .map(|t| t.id.clone())
            .collect();
        if title_matched || !task_ids.is_empty() {
            matches.insert(
                note.id.clone(),
                NoteMatch {
                    title_matched,
                    task_ids,
                },
            );
        }
    }

    SearchResults {
        active: true,
        matches,
    }
}

/// The inactive result: everything visible.
fn unfiltered(board: &BoardState) -> SearchResults {
    let mut matches = IndexMap::new();
    for note in &board.notes {
        matches.insert(note.id.clone(), all_of(note));
    }
    SearchResults {
        active: false,
        matches,
    }
}

fn all_of(note: &Note) -> NoteMatch {
    NoteMatch {
        title_matched: true,
        task_ids: note.tasks.iter().map(|t| t.id.clone()).collect(),
    }
}
