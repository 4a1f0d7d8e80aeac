//! Configuration for the character store and mutation coordinator.

use std::env;
use std::path::PathBuf;

/// Logical key of the single character record.
pub const CHARACTER_KEY: &str = "character";

/// Environment variable overriding [`SheetConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "SHEET_DATA_DIR";

/// Environment variable overriding [`SheetConfig::record_key`].
pub const RECORD_KEY_ENV: &str = "SHEET_RECORD_KEY";

/// Configuration for a character sheet.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    /// Key the character record is stored under.
    pub record_key: String,

    /// Directory used by the file-backed store.
    pub data_dir: PathBuf,

    /// Write records as indented JSON.
    pub pretty: bool,

    /// Buffered mutation events per subscriber before lagging.
    pub event_capacity: usize,
}

impl SheetConfig {
    pub fn new() -> Self {
        Self {
            record_key: CHARACTER_KEY.to_string(),
            data_dir: PathBuf::from("saves"),
            pretty: false,
            event_capacity: 64,
        }
    }

    /// Defaults overridden by `SHEET_DATA_DIR` and `SHEET_RECORD_KEY` when set.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(dir) = env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(key) = env::var(RECORD_KEY_ENV) {
            if !key.trim().is_empty() {
                config.record_key = key;
            }
        }
        config
    }

    pub fn with_record_key(mut self, key: impl Into<String>) -> Self {
        self.record_key = key.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self::new()
    }
}
