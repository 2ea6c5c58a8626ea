use serde::Serialize;

use crate::model::board::{ArchivedTask, VersionSnapshot};
use crate::model::note::{Note, Position, TextSize};
use crate::model::task::{Priority, Task};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub indent_level: usize,
}

#[derive(Serialize)]
pub struct NoteJson {
    pub id: String,
    pub title: String,
    pub color: String,
    pub text_size: TextSize,
    pub position: Position,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct BoardJson {
    pub board_id: String,
    pub notes: Vec<NoteJson>,
}

#[derive(Serialize)]
pub struct ArchivedTaskJson {
    pub task: TaskJson,
    pub original_note_id: String,
    pub archived_at: String,
}

#[derive(Serialize)]
pub struct SearchNoteJson {
    pub note_id: String,
    pub title: String,
    pub title_matched: bool,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct SearchJson {
    pub term: String,
    pub notes: Vec<SearchNoteJson>,
}

#[derive(Serialize)]
pub struct SnapshotJson {
    pub timestamp: String,
    pub description: String,
    pub notes: usize,
    pub tasks: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        text: task.text.clone(),
        completed: task.completed,
        priority: task.priority,
        indent_level: task.indent_level,
    }
}

pub fn note_to_json(note: &Note) -> NoteJson {
    NoteJson {
        id: note.id.clone(),
        title: note.title.clone(),
        color: note.color.name().to_string(),
        text_size: note.text_size,
        position: note.position,
        tasks: note.tasks.iter().map(task_to_json).collect(),
    }
}

pub fn archived_to_json(entry: &ArchivedTask) -> ArchivedTaskJson {
    ArchivedTaskJson {
        task: task_to_json(&entry.task),
        original_note_id: entry.original_note_id.clone(),
        archived_at: entry.archived_at.to_rfc3339(),
    }
}

pub fn snapshot_to_json(snapshot: &VersionSnapshot) -> SnapshotJson {
    SnapshotJson {
        timestamp: snapshot.timestamp.to_rfc3339(),
        description: snapshot.description.clone(),
        notes: snapshot.data.notes.len(),
        tasks: snapshot.data.notes.iter().map(|n| n.tasks.len()).sum(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single task as a one-line summary, indented to its level
pub fn format_task_line(task: &Task) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let prefix = "  ".repeat(task.indent_level);
    let priority_str = match task.priority {
        Priority::None => String::new(),
        p => format!(" !{}", p.label()),
    };
    format!("{}[{}] {}{}", prefix, check, task.text, priority_str)
}

/// Format a note listing header
pub fn format_note_header(note: &Note) -> String {
    format!("== {} ({}) [{}] ==", note.title, note.id, note.color.name())
}

/// Format a note with all its tasks
pub fn format_note_listing(note: &Note) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format_note_header(note));
    for task in &note.tasks {
        lines.push(format_task_line(task));
    }
    lines
}

/// Format one archive entry as a one-line summary
pub fn format_archive_line(entry: &ArchivedTask, original_title: Option<&str>) -> String {
    let check = if entry.task.completed { 'x' } else { ' ' };
    let from = match original_title {
        Some(title) => format!("from \"{}\"", title),
        None => format!("from {} (note gone)", entry.original_note_id),
    };
    format!(
        "[{}] {} ({})  {}  archived {}",
        check,
        entry.task.text,
        entry.task.id,
        from,
        entry.archived_at.format("%Y-%m-%d %H:%M")
    )
}

/// Format one snapshot as a one-line summary
pub fn format_snapshot_line(snapshot: &VersionSnapshot) -> String {
    let tasks: usize = snapshot.data.notes.iter().map(|n| n.tasks.len()).sum();
    format!(
        "{}  {} ({} notes, {} tasks)",
        snapshot.timestamp.to_rfc3339(),
        snapshot.description,
        snapshot.data.notes.len(),
        tasks
    )
}
