use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cork", about = concat!("[#] corkboard v", env!("CARGO_PKG_VERSION"), " - sticky notes with task lists"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a corkboard workspace in the current directory
    Init(InitArgs),
    /// List all notes and their tasks
    Notes,
    /// Note management
    Note(NoteCmd),
    /// Task management
    Task(TaskCmd),
    /// List archived tasks
    Archive,
    /// Restore an archived task to its original note
    Restore(RestoreArgs),
    /// Permanently discard an archived task
    Purge(PurgeArgs),
    /// Search notes and tasks by substring
    Search(SearchArgs),
    /// Undo the last change
    Undo,
    /// Redo the last undone change
    Redo,
    /// Manage version snapshots
    Snapshot(SnapshotCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board id (default: "board"); doubles as the document file stem
    #[arg(long)]
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Note management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct NoteCmd {
    #[command(subcommand)]
    pub action: NoteAction,
}

#[derive(Subcommand)]
pub enum NoteAction {
    /// Add a new note
    Add(NoteAddArgs),
    /// Delete a note (its tasks go to the archive)
    Rm(NoteRefArg),
    /// Rename a note
    Rename(NoteRenameArgs),
    /// Change a note's color
    Color(NoteColorArgs),
    /// Move a note on the canvas
    Move(NoteMoveArgs),
    /// Change a note's text size
    TextSize(NoteTextSizeArgs),
}

#[derive(Args)]
pub struct NoteAddArgs {
    /// Note title (default: "Untitled")
    pub title: Option<String>,
    /// Color (yellow, pink, blue, green, purple, orange)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct NoteRefArg {
    /// Note id or title
    pub note: String,
}

#[derive(Args)]
pub struct NoteRenameArgs {
    /// Note id or title
    pub note: String,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct NoteColorArgs {
    /// Note id or title
    pub note: String,
    /// Color (yellow, pink, blue, green, purple, orange)
    pub color: String,
}

#[derive(Args)]
pub struct NoteMoveArgs {
    /// Note id or title
    pub note: String,
    /// Canvas x coordinate
    pub x: f64,
    /// Canvas y coordinate
    pub y: f64,
}

#[derive(Args)]
pub struct NoteTextSizeArgs {
    /// Note id or title
    pub note: String,
    /// Size (small, medium, large)
    pub size: String,
}

// ---------------------------------------------------------------------------
// Task management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TaskCmd {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to a note
    Add(TaskAddArgs),
    /// Edit a task's text
    Edit(TaskEditArgs),
    /// Toggle a task's completion
    Done(TaskRefArgs),
    /// Set a task's priority
    Priority(TaskPriorityArgs),
    /// Indent a task one level
    Indent(TaskRefArgs),
    /// Outdent a task one level
    Outdent(TaskRefArgs),
    /// Move a task (reorder, or drag to another note with --to)
    Mv(TaskMvArgs),
    /// Delete a task (moves it to the archive)
    Rm(TaskRefArgs),
}

#[derive(Args)]
pub struct TaskAddArgs {
    /// Note id or title
    pub note: String,
    /// Task text
    pub text: String,
    /// Insert after this task instead of appending
    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Args)]
pub struct TaskEditArgs {
    /// Note id or title
    pub note: String,
    /// Task id or text
    pub task: String,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct TaskRefArgs {
    /// Note id or title
    pub note: String,
    /// Task id or text
    pub task: String,
}

#[derive(Args)]
pub struct TaskPriorityArgs {
    /// Note id or title
    pub note: String,
    /// Task id or text
    pub task: String,
    /// Priority (none, low, medium, high)
    pub priority: String,
}

#[derive(Args)]
pub struct TaskMvArgs {
    /// Note id or title
    pub note: String,
    /// Task id or text
    pub task: String,
    /// Numeric position within the note (0-indexed)
    pub position: Option<usize>,
    /// Drop onto a different note
    #[arg(long)]
    pub to: Option<String>,
    /// Position within the target note (default: append)
    #[arg(long)]
    pub at: Option<usize>,
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RestoreArgs {
    /// Archived task id or text
    pub task: String,
}

#[derive(Args)]
pub struct PurgeArgs {
    /// Archived task id or text
    pub task: String,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SearchArgs {
    /// Substring to search for (case-insensitive)
    pub term: String,
    /// Limit search to one note
    #[arg(long)]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Version snapshots
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SnapshotCmd {
    #[command(subcommand)]
    pub action: SnapshotAction,
}

#[derive(Subcommand)]
pub enum SnapshotAction {
    /// Save a named snapshot of the current board
    Save(SnapshotSaveArgs),
    /// List saved snapshots
    List,
    /// Restore the board to a snapshot (appends a restore-point first)
    Restore(SnapshotRestoreArgs),
    /// Keep only the newest N snapshots
    Prune(SnapshotPruneArgs),
}

#[derive(Args)]
pub struct SnapshotSaveArgs {
    /// Snapshot description
    pub description: String,
}

#[derive(Args)]
pub struct SnapshotRestoreArgs {
    /// Snapshot timestamp (RFC 3339, as shown by `snapshot list`)
    pub timestamp: String,
}

#[derive(Args)]
pub struct SnapshotPruneArgs {
    /// Snapshots to keep (default: history.version_keep from config)
    #[arg(long)]
    pub keep: Option<usize>,
}
