use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Global override for the workspace directory (set by -C flag)
static WORKSPACE_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::engine::{Action, Outcome, Store};
use crate::io::bridge::PersistenceBridge;
use crate::io::{board_io, config_io};
use crate::model::board::{BoardState, SearchScope};
use crate::model::config::BoardConfig;
use crate::model::note::{NoteColor, TextSize};
use crate::model::task::Priority;
use crate::ops::task_ops::InsertPosition;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    // Store -C override for open_session()
    if let Some(ref dir) = cli.workspace_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        WORKSPACE_DIR_OVERRIDE.lock().unwrap().replace(abs);
    }

    match cli.command {
        // Init is handled before workspace discovery
        Commands::Init(args) => cmd_init(args),

        // Read commands
        Commands::Notes => cmd_notes(json),
        Commands::Archive => cmd_archive(json),
        Commands::Search(args) => cmd_search(args, json),

        // Write commands
        Commands::Note(cmd) => match cmd.action {
            NoteAction::Add(args) => cmd_note_add(args),
            NoteAction::Rm(args) => cmd_note_rm(args),
            NoteAction::Rename(args) => cmd_note_rename(args),
            NoteAction::Color(args) => cmd_note_color(args),
            NoteAction::Move(args) => cmd_note_move(args),
            NoteAction::TextSize(args) => cmd_note_text_size(args),
        },
        Commands::Task(cmd) => match cmd.action {
            TaskAction::Add(args) => cmd_task_add(args),
            TaskAction::Edit(args) => cmd_task_edit(args),
            TaskAction::Done(args) => cmd_task_done(args),
            TaskAction::Priority(args) => cmd_task_priority(args),
            TaskAction::Indent(args) => cmd_task_indent(args),
            TaskAction::Outdent(args) => cmd_task_outdent(args),
            TaskAction::Mv(args) => cmd_task_mv(args),
            TaskAction::Rm(args) => cmd_task_rm(args),
        },
        Commands::Restore(args) => cmd_restore(args),
        Commands::Purge(args) => cmd_purge(args),
        Commands::Undo => cmd_undo(),
        Commands::Redo => cmd_redo(),
        Commands::Snapshot(cmd) => match cmd.action {
            SnapshotAction::Save(args) => cmd_snapshot_save(args),
            SnapshotAction::List => cmd_snapshot_list(json),
            SnapshotAction::Restore(args) => cmd_snapshot_restore(args),
            SnapshotAction::Prune(args) => cmd_snapshot_prune(args),
        },
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct Session {
    store: Store,
    config: BoardConfig,
}

/// Discover the workspace, load config and board, and wire up the
/// debounced persistence bridge.
fn open_session() -> Result<Session, Box<dyn std::error::Error>> {
    let start = match WORKSPACE_DIR_OVERRIDE.lock().unwrap().as_ref() {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let root = config_io::discover_workspace(&start)?;
    let board_dir = root.join("corkboard");
    let config = config_io::read_config(&board_dir)?;

    let path = board_io::board_path(&board_dir, &config.board.id);
    let state = board_io::load_or_default(&path, &config.board.id);
    let bridge = PersistenceBridge::start(
        path,
        Duration::from_millis(config.persistence.debounce_ms),
        config.persistence.retries,
    );

    Ok(Session {
        store: Store::with_bridge(state, bridge),
        config,
    })
}

/// Flush pending writes and surface any persistence failure.
fn commit(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session.store.flush();
    if let Some(err) = session.store.persistence_error() {
        return Err(format!("board not saved: {}", err).into());
    }
    Ok(())
}

/// Report a dispatch outcome: Ignored prints a notice, Failed is an error.
fn expect_applied(
    outcome: Outcome,
    ignored_msg: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Outcome::Applied => Ok(()),
        Outcome::Ignored => {
            println!("{}", ignored_msg);
            Ok(())
        }
        Outcome::Failed(err) => Err(err.to_string().into()),
    }
}

// ---------------------------------------------------------------------------
// Reference resolution
// ---------------------------------------------------------------------------

/// Resolve a note reference (exact id, id prefix, or title match) to an id.
fn resolve_note(state: &BoardState, query: &str) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(note) = state.note(query) {
        return Ok(note.id.clone());
    }
    let by_title: Vec<_> = state
        .notes
        .iter()
        .filter(|n| n.title.eq_ignore_ascii_case(query))
        .collect();
    if by_title.len() == 1 {
        return Ok(by_title[0].id.clone());
    }
    if by_title.len() > 1 {
        return Err(format!("ambiguous note title \"{}\"", query).into());
    }
    let by_prefix: Vec<_> = state
        .notes
        .iter()
        .filter(|n| n.id.starts_with(query))
        .collect();
    match by_prefix.len() {
        1 => Ok(by_prefix[0].id.clone()),
        0 => Err(format!("no note matching \"{}\"", query).into()),
        _ => Err(format!("ambiguous note \"{}\"", query).into()),
    }
}

/// Resolve a task reference within a note (exact id, id prefix, or text
/// match) to an id.
fn resolve_task(
    state: &BoardState,
    note_id: &str,
    query: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let note = state
        .note(note_id)
        .ok_or_else(|| format!("no note matching \"{}\"", note_id))?;
    if let Some(task) = note.task(query) {
        return Ok(task.id.clone());
    }
    let by_text: Vec<_> = note
        .tasks
        .iter()
        .filter(|t| t.text.eq_ignore_ascii_case(query))
        .collect();
    if by_text.len() == 1 {
        return Ok(by_text[0].id.clone());
    }
    if by_text.len() > 1 {
        return Err(format!("ambiguous task text \"{}\"", query).into());
    }
    let by_prefix: Vec<_> = note
        .tasks
        .iter()
        .filter(|t| t.id.starts_with(query))
        .collect();
    match by_prefix.len() {
        1 => Ok(by_prefix[0].id.clone()),
        0 => Err(format!("no task matching \"{}\" in \"{}\"", query, note.title).into()),
        _ => Err(format!("ambiguous task \"{}\"", query).into()),
    }
}

/// Resolve an archived task reference to an id.
fn resolve_archived(
    state: &BoardState,
    query: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let matches: Vec<_> = state
        .archived_tasks
        .iter()
        .filter(|a| {
            a.task.id == query
                || a.task.id.starts_with(query)
                || a.task.text.eq_ignore_ascii_case(query)
        })
        .collect();
    match matches.len() {
        1 => Ok(matches[0].task.id.clone()),
        0 => Err(format!("no archived task matching \"{}\"", query).into()),
        _ => Err(format!("ambiguous archived task \"{}\"", query).into()),
    }
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Create `corkboard/` with a default config and an empty board document.
pub fn init_workspace(root: &Path, board_id: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    let board_dir = root.join("corkboard");
    if board_dir.is_dir() {
        return Err("corkboard workspace already exists in ./corkboard/".into());
    }
    std::fs::create_dir_all(&board_dir)?;

    let mut config = BoardConfig::default();
    if let Some(id) = board_id {
        config.board.id = id.to_string();
    }
    config_io::write_config(&board_dir, &config)?;

    let path = board_io::board_path(&board_dir, &config.board.id);
    let state = BoardState::new(config.board.id.clone());
    board_io::save_board(&path, &state)?;

    Ok(config.board.id)
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let id = init_workspace(&cwd, args.id.as_deref())?;
    println!("Initialized corkboard workspace (board \"{}\")", id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_notes(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;
    let state = session.store.state();

    if json {
        let out = BoardJson {
            board_id: state.board_id.clone(),
            notes: state.notes.iter().map(note_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if state.notes.is_empty() {
        println!("(no notes)");
        return Ok(());
    }
    for (i, note) in state.notes.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_note_listing(note) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_archive(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;
    let state = session.store.state();

    if json {
        let out: Vec<_> = state.archived_tasks.iter().map(archived_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if state.archived_tasks.is_empty() {
        println!("(archive is empty)");
        return Ok(());
    }
    for entry in &state.archived_tasks {
        let title = state.note(&entry.original_note_id).map(|n| n.title.as_str());
        println!("{}", format_archive_line(entry, title));
    }
    Ok(())
}

fn cmd_search(args: SearchArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    if let Some(ref note_ref) = args.note {
        let note_id = resolve_note(session.store.state(), note_ref)?;
        session.store.dispatch(Action::SetSearchScope {
            scope: SearchScope::Note,
            note_id: Some(note_id),
        });
    }
    session.store.dispatch(Action::SetSearchTerm {
        term: args.term.clone(),
    });

    let results = session.store.search();
    let state = session.store.state();

    if json {
        let notes = results
            .matches
            .iter()
            .filter_map(|(note_id, m)| {
                let note = state.note(note_id)?;
                Some(SearchNoteJson {
                    note_id: note_id.clone(),
                    title: note.title.clone(),
                    title_matched: m.title_matched,
                    tasks: note
                        .tasks
                        .iter()
                        .filter(|t| m.task_ids.iter().any(|id| *id == t.id))
                        .map(task_to_json)
                        .collect(),
                })
            })
            .collect();
        let out = SearchJson {
            term: args.term,
            notes,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if !results.active || results.matches.is_empty() {
        println!("(no matches)");
        return Ok(());
    }
    for (note_id, m) in &results.matches {
        let Some(note) = state.note(note_id) else {
            continue;
        };
        println!("{}", format_note_header(note));
        for task in &note.tasks {
            if m.task_ids.iter().any(|id| *id == task.id) {
                println!("{}", format_task_line(task));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Note commands
// ---------------------------------------------------------------------------

fn cmd_note_add(args: NoteAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let color = match args.color.as_deref() {
        Some(s) => Some(parse_color_arg(s)?),
        None => None,
    };
    let mut session = open_session()?;
    session.store.dispatch(Action::AddNote {
        title: args.title.clone(),
        color,
    });
    let note = session
        .store
        .state()
        .notes
        .last()
        .ok_or("note was not created")?;
    println!("Added note \"{}\" ({})", note.title, note.id);
    commit(&mut session)
}

fn cmd_note_rm(args: NoteRefArg) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let archived = session
        .store
        .state()
        .note(&note_id)
        .map(|n| n.tasks.len())
        .unwrap_or(0);
    let outcome = session.store.dispatch(Action::DeleteNote { note_id });
    expect_applied(outcome, "note not found")?;
    if archived > 0 {
        println!("Deleted note ({} tasks moved to archive)", archived);
    } else {
        println!("Deleted note");
    }
    commit(&mut session)
}

fn cmd_note_rename(args: NoteRenameArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let outcome = session.store.dispatch(Action::RenameNote {
        note_id,
        title: args.title.clone(),
    });
    expect_applied(outcome, "no change")?;
    println!("Renamed note to \"{}\"", args.title);
    commit(&mut session)
}

fn cmd_note_color(args: NoteColorArgs) -> Result<(), Box<dyn std::error::Error>> {
    let color = parse_color_arg(&args.color)?;
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let outcome = session.store.dispatch(Action::RecolorNote { note_id, color });
    expect_applied(outcome, "no change")?;
    println!("Recolored note to {}", color.name());
    commit(&mut session)
}

fn cmd_note_move(args: NoteMoveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let outcome = session.store.dispatch(Action::RepositionNote {
        note_id,
        x: args.x,
        y: args.y,
    });
    expect_applied(outcome, "no change")?;
    println!("Moved note to ({}, {})", args.x, args.y);
    commit(&mut session)
}

fn cmd_note_text_size(args: NoteTextSizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let size = TextSize::parse_size(&args.size)
        .ok_or_else(|| format!("unknown size '{}' (expected: small, medium, large)", args.size))?;
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let outcome = session
        .store
        .dispatch(Action::ResizeNoteText { note_id, size });
    expect_applied(outcome, "no change")?;
    println!("Set text size to {}", args.size);
    commit(&mut session)
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_task_add(args: TaskAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let position = match args.after.as_deref() {
        Some(after) => {
            let after_id = resolve_task(session.store.state(), &note_id, after)?;
            InsertPosition::After(after_id)
        }
        None => InsertPosition::End,
    };
    let outcome = session.store.dispatch(Action::AddTask {
        note_id,
        text: args.text.clone(),
        position,
    });
    expect_applied(outcome, "note not found")?;
    println!("Added task \"{}\"", args.text);
    commit(&mut session)
}

fn cmd_task_edit(args: TaskEditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let task_id = resolve_task(session.store.state(), &note_id, &args.task)?;
    let outcome = session.store.dispatch(Action::UpdateTaskText {
        note_id,
        task_id,
        text: args.text.clone(),
    });
    expect_applied(outcome, "no change")?;
    println!("Updated task text");
    commit(&mut session)
}

fn cmd_task_done(args: TaskRefArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let task_id = resolve_task(session.store.state(), &note_id, &args.task)?;
    let outcome = session.store.dispatch(Action::ToggleTaskComplete {
        note_id: note_id.clone(),
        task_id: task_id.clone(),
    });
    expect_applied(outcome, "task not found")?;
    let completed = session
        .store
        .state()
        .note(&note_id)
        .and_then(|n| n.task(&task_id))
        .is_some_and(|t| t.completed);
    println!(
        "Task marked {}",
        if completed { "done" } else { "not done" }
    );
    commit(&mut session)
}

fn cmd_task_priority(args: TaskPriorityArgs) -> Result<(), Box<dyn std::error::Error>> {
    let priority = Priority::parse_priority(&args.priority).ok_or_else(|| {
        format!(
            "unknown priority '{}' (expected: none, low, medium, high)",
            args.priority
        )
    })?;
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let task_id = resolve_task(session.store.state(), &note_id, &args.task)?;
    let outcome = session.store.dispatch(Action::SetTaskPriority {
        note_id,
        task_id,
        priority,
    });
    expect_applied(outcome, "no change")?;
    println!("Set priority to {}", priority.label());
    commit(&mut session)
}

fn cmd_task_indent(args: TaskRefArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let task_id = resolve_task(session.store.state(), &note_id, &args.task)?;
    let outcome = session.store.dispatch(Action::IndentTask { note_id, task_id });
    expect_applied(outcome, "cannot indent further")?;
    commit(&mut session)
}

fn cmd_task_outdent(args: TaskRefArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let task_id = resolve_task(session.store.state(), &note_id, &args.task)?;
    let outcome = session.store.dispatch(Action::OutdentTask { note_id, task_id });
    expect_applied(outcome, "already at top level")?;
    commit(&mut session)
}

fn cmd_task_mv(args: TaskMvArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let task_id = resolve_task(session.store.state(), &note_id, &args.task)?;

    // Cross-note move goes through the drag machinery
    if let Some(ref target_ref) = args.to {
        let target_note_id = resolve_note(session.store.state(), target_ref)?;
        session.store.dispatch(Action::StartDrag {
            task_id,
            source_note_id: note_id,
        });
        let outcome = session.store.dispatch(Action::DropOnNote {
            target_note_id,
            target_index: args.at,
        });
        expect_applied(outcome, "target note vanished; nothing moved")?;
        println!("Moved task to \"{}\"", target_ref);
        return commit(&mut session);
    }

    let target_index = args
        .position
        .ok_or("give a position, or --to <note> for a cross-note move")?;
    let outcome = session.store.dispatch(Action::MoveTask {
        note_id,
        task_id,
        target_index,
    });
    expect_applied(outcome, "no change")?;
    commit(&mut session)
}

fn cmd_task_rm(args: TaskRefArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let note_id = resolve_note(session.store.state(), &args.note)?;
    let task_id = resolve_task(session.store.state(), &note_id, &args.task)?;
    let outcome = session.store.dispatch(Action::DeleteTask { note_id, task_id });
    expect_applied(outcome, "task not found")?;
    println!("Task moved to archive (restore with `cork restore`)");
    commit(&mut session)
}

// ---------------------------------------------------------------------------
// Archive commands
// ---------------------------------------------------------------------------

fn cmd_restore(args: RestoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let task_id = resolve_archived(session.store.state(), &args.task)?;
    let outcome = session.store.dispatch(Action::RestoreTask { task_id });
    expect_applied(outcome, "nothing restored")?;
    println!("Task restored");
    commit(&mut session)
}

fn cmd_purge(args: PurgeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let task_id = resolve_archived(session.store.state(), &args.task)?;
    let outcome = session.store.dispatch(Action::PurgeArchivedTask { task_id });
    expect_applied(outcome, "nothing purged")?;
    println!("Archived task permanently discarded");
    commit(&mut session)
}

// ---------------------------------------------------------------------------
// History commands
// ---------------------------------------------------------------------------

fn cmd_undo() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let outcome = session.store.dispatch(Action::Undo);
    if outcome == Outcome::Applied {
        println!("Undone");
    }
    expect_applied(outcome, "nothing to undo")?;
    commit(&mut session)
}

fn cmd_redo() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let outcome = session.store.dispatch(Action::Redo);
    if outcome == Outcome::Applied {
        println!("Redone");
    }
    expect_applied(outcome, "nothing to redo")?;
    commit(&mut session)
}

fn cmd_snapshot_save(args: SnapshotSaveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let outcome = session.store.dispatch(Action::SaveVersionSnapshot {
        description: args.description.clone(),
    });
    expect_applied(outcome, "snapshot not saved")?;
    let saved = session
        .store
        .state()
        .version_history
        .last()
        .ok_or("snapshot not saved")?;
    println!("Saved snapshot {}", saved.timestamp.to_rfc3339());
    commit(&mut session)
}

fn cmd_snapshot_list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;
    let history = &session.store.state().version_history;

    if json {
        let out: Vec<_> = history.iter().map(snapshot_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("(no snapshots)");
        return Ok(());
    }
    for snapshot in history {
        println!("{}", format_snapshot_line(snapshot));
    }
    Ok(())
}

fn cmd_snapshot_restore(args: SnapshotRestoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&args.timestamp)
        .map_err(|e| format!("invalid timestamp '{}': {}", args.timestamp, e))?
        .with_timezone(&Utc);
    let mut session = open_session()?;
    let outcome = session.store.dispatch(Action::RestoreVersion { timestamp });
    expect_applied(outcome, "nothing restored")?;
    println!("Board restored to snapshot {}", args.timestamp);
    commit(&mut session)
}

fn cmd_snapshot_prune(args: SnapshotPruneArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let keep = args.keep.unwrap_or(session.config.history.version_keep);
    let before = session.store.state().version_history.len();
    let outcome = session.store.dispatch(Action::PruneVersions { keep });
    expect_applied(outcome, "nothing pruned")?;
    let after = session.store.state().version_history.len();
    println!("Pruned {} snapshots ({} kept)", before - after, after);
    commit(&mut session)
}

// ---------------------------------------------------------------------------
// Arg parsing helpers
// ---------------------------------------------------------------------------

fn parse_color_arg(s: &str) -> Result<NoteColor, Box<dyn std::error::Error>> {
    NoteColor::parse_color(s).ok_or_else(|| {
        format!(
            "unknown color '{}' (expected: yellow, pink, blue, green, purple, orange)",
            s
        )
        .into()
    })
}
