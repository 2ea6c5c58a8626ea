use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ident;
use super::task::Task;

/// Preset note colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Pink,
    Blue,
    Green,
    Purple,
    Orange,
}

impl NoteColor {
    pub fn parse_color(s: &str) -> Option<NoteColor> {
        match s {
            "yellow" => Some(NoteColor::Yellow),
            "pink" => Some(NoteColor::Pink),
            "blue" => Some(NoteColor::Blue),
            "green" => Some(NoteColor::Green),
            "purple" => Some(NoteColor::Purple),
            "orange" => Some(NoteColor::Orange),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NoteColor::Yellow => "yellow",
            NoteColor::Pink => "pink",
            NoteColor::Blue => "blue",
            NoteColor::Green => "green",
            NoteColor::Purple => "purple",
            NoteColor::Orange => "orange",
        }
    }
}

/// Note text size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TextSize {
    pub fn parse_size(s: &str) -> Option<TextSize> {
        match s {
            "small" => Some(TextSize::Small),
            "medium" => Some(TextSize::Medium),
            "large" => Some(TextSize::Large),
            _ => None,
        }
    }
}

/// Canvas placement of a note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A titled container of an ordered task sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub color: NoteColor,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub text_size: TextSize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create an empty note with a generated id.
    pub fn new(title: impl Into<String>, color: NoteColor) -> Self {
        let now = Utc::now();
        Note {
            id: ident::note_id(),
            title: title.into(),
            color,
            tasks: Vec::new(),
            position: Position::default(),
            text_size: TextSize::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}
