use serde::{Deserialize, Serialize};

/// Parsed corkboard.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BoardConfig {
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardSection {
    /// Board id; doubles as the document file stem
    #[serde(default = "default_board_id")]
    pub id: String,
}

impl Default for BoardSection {
    fn default() -> Self {
        BoardSection {
            id: default_board_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistenceConfig {
    /// Quiet period before a pending state change is flushed to disk
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Write attempts before giving up on a save (retried with backoff)
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            debounce_ms: default_debounce_ms(),
            retries: default_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryConfig {
    /// Default snapshot count kept by `snapshot prune`
    #[serde(default = "default_version_keep")]
    pub version_keep: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            version_keep: default_version_keep(),
        }
    }
}

fn default_board_id() -> String {
    "board".to_string()
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_retries() -> u32 {
    3
}

fn default_version_keep() -> usize {
    50
}
