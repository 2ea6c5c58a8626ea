use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ident;

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    /// Short label used in list output
    pub fn label(self) -> &'static str {
        match self {
            Priority::None => "-",
            Priority::Low => "low",
            Priority::Medium => "med",
            Priority::High => "high",
        }
    }

    /// Parse a priority name as typed on the command line
    pub fn parse_priority(s: &str) -> Option<Priority> {
        match s {
            "none" | "-" => Some(Priority::None),
            "low" => Some(Priority::Low),
            "medium" | "med" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// A single to-do item within a note.
///
/// Hierarchy is derived from `indent_level` adjacency: a task nests under
/// the nearest preceding task with `indent_level - 1`. There are no parent
/// pointers, and array position is the only order key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// User content
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Nesting depth (0 = top-level); never more than one deeper than the
    /// task immediately before it in the sequence
    #[serde(default)]
    pub indent_level: usize,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new top-level task with a generated id.
    pub fn new(text: impl Into<String>) -> Self {
        Task {
            id: ident::task_id(),
            text: text.into(),
            completed: false,
            priority: Priority::None,
            indent_level: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
