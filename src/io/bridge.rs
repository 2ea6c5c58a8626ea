use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::model::board::BoardState;

use super::board_io;

enum Message {
    /// A newer committed state; supersedes any pending one
    State(Box<BoardState>),
    /// Write whatever is pending, then acknowledge
    Flush(mpsc::Sender<()>),
    Shutdown,
}

/// Debounced, strictly-downstream persister.
///
/// Observes committed states and writes the latest one to disk after a
/// quiet period, coalescing keystroke-level updates into a single write.
/// A pending write is superseded by a newer state, never queued behind it.
/// Failures are retried with backoff and surfaced via `last_error()`; the
/// live state is never rolled back on a persistence failure.
pub struct PersistenceBridge {
    tx: mpsc::Sender<Message>,
    handle: Option<JoinHandle<()>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl PersistenceBridge {
    /// Start the background writer for the given document path.
    pub fn start(path: PathBuf, debounce: Duration, retries: u32) -> Self {
        let (tx, rx) = mpsc::channel();
        let last_error = Arc::new(Mutex::new(None));
        let worker_error = Arc::clone(&last_error);

        let handle = thread::spawn(move || {
            run_worker(rx, path, debounce, retries, worker_error);
        });

        PersistenceBridge {
            tx,
            handle: Some(handle),
            last_error,
        }
    }

    /// Hand the bridge a newly committed state. Non-blocking; the write
    /// happens after the debounce window.
    pub fn notify(&self, state: BoardState) {
        let _ = self.tx.send(Message::State(Box::new(state)));
    }

    /// Write any pending state now and wait for the disk write to finish.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// The most recent persistence failure, if the latest write failed.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|g| g.clone())
    }
}

impl Drop for PersistenceBridge {
    fn drop(&mut self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    rx: mpsc::Receiver<Message>,
    path: PathBuf,
    debounce: Duration,
    retries: u32,
    last_error: Arc<Mutex<Option<String>>>,
) {
    let mut pending: Option<Box<BoardState>> = None;

    loop {
        // Block while idle; once a state is pending, wake at the debounce
        // deadline to flush it.
        let message = if pending.is_some() {
            match rx.recv_timeout(debounce) {
                Ok(m) => Some(m),
                Err(mpsc::RecvTimeoutError::Timeout) => None,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(m) => Some(m),
                Err(_) => break,
            }
        };

        match message {
            Some(Message::State(state)) => {
                // Supersede: only the latest state is ever flushed
                pending = Some(state);
            }
            Some(Message::Flush(ack)) => {
                if let Some(state) = pending.take() {
                    write_with_retry(&path, &state, retries, &last_error);
                }
                let _ = ack.send(());
            }
            Some(Message::Shutdown) => break,
            None => {
                // Debounce window elapsed
                if let Some(state) = pending.take() {
                    write_with_retry(&path, &state, retries, &last_error);
                }
            }
        }
    }

    // Never drop a committed state on the way out
    if let Some(state) = pending.take() {
        write_with_retry(&path, &state, retries, &last_error);
    }
}

fn write_with_retry(
    path: &Path,
    state: &BoardState,
    retries: u32,
    last_error: &Arc<Mutex<Option<String>>>,
) {
    let attempts = retries.max(1);
    let mut backoff = Duration::from_millis(50);

    for attempt in 1..=attempts {
        match board_io::save_board(path, state) {
            Ok(()) => {
                debug!(path = %path.display(), "board saved");
                if let Ok(mut guard) = last_error.lock() {
                    *guard = None;
                }
                return;
            }
            Err(err) if attempt < attempts => {
                warn!(attempt, %err, "board save failed, retrying");
                thread::sleep(backoff);
                backoff *= 4;
            }
            Err(err) => {
                error!(%err, path = %path.display(), "board save failed; giving up until next change");
                if let Ok(mut guard) = last_error.lock() {
                    *guard = Some(err.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::note::{Note, NoteColor};
    use tempfile::TempDir;

    fn board_titled(title: &str) -> BoardState {
        let mut board = BoardState::new("board-1");
        board.notes.push(Note::new(title, NoteColor::Yellow));
        board
    }

    #[test]
    fn flush_writes_pending_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let bridge = PersistenceBridge::start(path.clone(), Duration::from_secs(60), 3);

        bridge.notify(board_titled("Work"));
        bridge.flush();

        let loaded = board_io::load_board(&path).unwrap();
        assert_eq!(loaded.notes[0].title, "Work");
    }

    #[test]
    fn rapid_updates_coalesce_to_latest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let bridge = PersistenceBridge::start(path.clone(), Duration::from_secs(60), 3);

        for i in 0..20 {
            bridge.notify(board_titled(&format!("edit {i}")));
        }
        bridge.flush();

        let loaded = board_io::load_board(&path).unwrap();
        assert_eq!(loaded.notes[0].title, "edit 19");
    }

    #[test]
    fn debounce_fires_without_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let bridge = PersistenceBridge::start(path.clone(), Duration::from_millis(20), 3);

        bridge.notify(board_titled("Work"));
        // Wait past the quiet period
        thread::sleep(Duration::from_millis(200));

        let loaded = board_io::load_board(&path).unwrap();
        assert_eq!(loaded.notes[0].title, "Work");
        drop(bridge);
    }

    #[test]
    fn shutdown_flushes_pending_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let bridge = PersistenceBridge::start(path.clone(), Duration::from_secs(60), 3);

        bridge.notify(board_titled("Last words"));
        drop(bridge);

        let loaded = board_io::load_board(&path).unwrap();
        assert_eq!(loaded.notes[0].title, "Last words");
    }

    #[test]
    fn write_failure_is_surfaced_not_fatal() {
        // Point the bridge at a directory path so every write fails
        let dir = TempDir::new().unwrap();
        let bridge = PersistenceBridge::start(dir.path().to_path_buf(), Duration::from_secs(60), 2);

        bridge.notify(board_titled("Doomed"));
        bridge.flush();

        assert!(bridge.last_error().is_some());
    }
}
