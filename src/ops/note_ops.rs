use chrono::Utc;

use crate::model::note::{Note, NoteColor, Position, TextSize};

/// Create a note with optional title and color. Note deletion lives in
/// the reducer because it cascades the contained tasks to the archive.
pub fn create_note(title: Option<&str>, color: Option<NoteColor>) -> Note {
    Note::new(title.unwrap_or("Untitled"), color.unwrap_or_default())
}

pub fn rename(note: &Note, title: &str) -> Note {
    touched(note, |n| n.title = title.to_string())
}

pub fn recolor(note: &Note, color: NoteColor) -> Note {
    touched(note, |n| n.color = color)
}

pub fn resize_text(note: &Note, size: TextSize) -> Note {
    touched(note, |n| n.text_size = size)
}

pub fn reposition(note: &Note, x: f64, y: f64) -> Note {
    touched(note, |n| n.position = Position { x, y })
}

/// Pure setter scaffold: clone, edit, touch `updated_at`.
fn touched(note: &Note, f: impl FnOnce(&mut Note)) -> Note {
    let mut next = note.clone();
    f(&mut next);
    next.updated_at = Utc::now();
    next
}
