//! Character persistence.
//!
//! The character lives in a single record of a durable key-value store.
//! [`CharacterStore`] reads that record (creating it from the default
//! character on first use) and overwrites it on save. Backends implement
//! [`DurableStore`]; a process-local [`MemoryStore`] and a JSON-file
//! [`FileStore`] are provided.

use crate::character::{default_character, Character, SchemaError};
use crate::config::SheetConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("storage error: {0}")]
    Storage(#[from] io::Error),
}

impl StoreError {
    pub fn is_storage(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, StoreError::Schema(_))
    }
}

/// A durable key-value surface holding serialized records.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    async fn put(&self, key: &str, value: String) -> io::Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> io::Result<()>;
}

// ============================================================================
// Backends
// ============================================================================

/// In-process store. Values live as long as the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under `key`, bypassing the async interface.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Seed a raw value, e.g. a record written by another client.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.raw(key))
    }

    async fn put(&self, key: &str, value: String) -> io::Result<()> {
        self.insert_raw(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Store writing one `<key>.json` file per record under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    ///
    /// The mapping is not injective: `"a.b"` and `"a_b"` share one file, so
    /// keys that differ only in replaced characters address the same record.
    pub fn record_path(&self, key: &str) -> PathBuf {
        let sanitized = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        self.dir.join(format!("{sanitized}.json"))
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.record_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, key: &str, value: String) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.record_path(key), value).await
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.record_path(key)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Character Store
// ============================================================================

/// Load/save adapter for the single character record.
#[derive(Clone)]
pub struct CharacterStore {
    backend: Arc<dyn DurableStore>,
    key: String,
    pretty: bool,
}

impl CharacterStore {
    /// Wrap a backend using the record key and format from `config`.
    pub fn new(backend: Arc<dyn DurableStore>, config: &SheetConfig) -> Self {
        Self {
            backend,
            key: config.record_key.clone(),
            pretty: config.pretty,
        }
    }

    /// A store over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), &SheetConfig::default())
    }

    /// A store over a [`FileStore`] rooted at `config.data_dir`.
    pub fn file(config: &SheetConfig) -> Self {
        Self::new(Arc::new(FileStore::new(config.data_dir.clone())), config)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the character, creating and storing the default one if no record exists.
    pub async fn load(&self) -> Result<Character, StoreError> {
        match self.backend.get(&self.key).await? {
            Some(json) => {
                let character = Character::from_json(&json)?;
                tracing::debug!(key = %self.key, name = %character.name, "loaded character");
                Ok(character)
            }
            None => {
                let character = default_character();
                tracing::info!(key = %self.key, name = %character.name, "no stored character, writing default");
                self.save(&character).await?;
                Ok(character)
            }
        }
    }

    /// Overwrite the stored record.
    ///
    /// A character that would not load back (see [`Character::validate`])
    /// is rejected with [`StoreError::Schema`] and the stored record is left
    /// untouched.
    pub async fn save(&self, character: &Character) -> Result<(), StoreError> {
        character.validate()?;
        let json = if self.pretty {
            serde_json::to_string_pretty(character)
        } else {
            serde_json::to_string(character)
        }
        .map_err(SchemaError::from)?;

        self.backend.put(&self.key, json).await.map_err(|e| {
            tracing::warn!(key = %self.key, error = %e, "character write rejected");
            StoreError::Storage(e)
        })?;
        tracing::debug!(key = %self.key, "saved character");
        Ok(())
    }

    pub async fn exists(&self) -> Result<bool, StoreError> {
        Ok(self.backend.get(&self.key).await?.is_some())
    }

    /// Delete the stored record. The next [`load`](Self::load) recreates the default.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(&self.key).await?;
        tracing::info!(key = %self.key, "cleared character record");
        Ok(())
    }
}

impl std::fmt::Debug for CharacterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterStore")
            .field("key", &self.key)
            .field("pretty", &self.pretty)
            .finish_non_exhaustive()
    }
}
