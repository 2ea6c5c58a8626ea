use uuid::Uuid;

/// Generated ids carry a type prefix so a bare id in a log line or a CLI
/// argument is self-describing.
pub fn note_id() -> String {
    format!("note-{}", Uuid::new_v4())
}

pub fn task_id() -> String {
    format!("task-{}", Uuid::new_v4())
}
