pub mod note_ops;
pub mod search;
pub mod task_ops;
