//! Persisted reading position per document.
//!
//! Records are stored under the cache directory using a hash of the source
//! name as the directory name to avoid filesystem issues. Each record is a
//! tiny TOML file. The most recently saved source name is kept alongside so
//! the binary can reopen it.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const PROGRESS_FILE: &str = "progress.toml";
const LAST_SOURCE_FILE: &str = "last_source.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub source_name: String,
    pub chapter_index: usize,
    pub page_index: usize,
    pub word_cursor: usize,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ProgressRecord {
    pub fn new(source_name: &str, chapter_index: usize, page_index: usize, word_cursor: usize) -> Self {
        Self {
            source_name: source_name.to_string(),
            chapter_index,
            page_index,
            word_cursor,
            timestamp: now_millis(),
        }
    }
}

/// Keyed by source name; last write wins.
pub trait ProgressStore: Send {
    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError>;
    fn load(&self, source_name: &str) -> Result<Option<ProgressRecord>, StoreError>;

    /// Source name of the most recent save, if the store remembers it.
    fn last_source(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }
}

pub struct FileProgressStore {
    root: PathBuf,
}

impl FileProgressStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn hash_dir(&self, source_name: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(source_name.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.root.join(hash)
    }

    fn progress_path(&self, source_name: &str) -> PathBuf {
        self.hash_dir(source_name).join(PROGRESS_FILE)
    }
}

#[derive(Serialize, Deserialize)]
struct LastSource {
    source_name: String,
}

impl ProgressStore for FileProgressStore {
    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        let path = self.progress_path(&record.source_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string(record)?)?;

        let last = LastSource {
            source_name: record.source_name.clone(),
        };
        fs::write(self.root.join(LAST_SOURCE_FILE), toml::to_string(&last)?)?;
        Ok(())
    }

    fn load(&self, source_name: &str) -> Result<Option<ProgressRecord>, StoreError> {
        let path = self.progress_path(source_name);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let record: ProgressRecord = toml::from_str(&data)?;
        Ok(Some(record))
    }

    fn last_source(&self) -> Result<Option<String>, StoreError> {
        let data = match fs::read_to_string(self.root.join(LAST_SOURCE_FILE)) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let last: LastSource = toml::from_str(&data)?;
        Ok(Some(last.source_name))
    }
}

/// Volatile store, used by tests and when persistence is unavailable.
#[derive(Default)]
pub struct MemoryProgressStore {
    records: Mutex<HashMap<String, ProgressRecord>>,
    last: Mutex<Option<String>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        if let Ok(mut records) = self.records.lock() {
            records.insert(record.source_name.clone(), record.clone());
        }
        if let Ok(mut last) = self.last.lock() {
            *last = Some(record.source_name.clone());
        }
        Ok(())
    }

    fn load(&self, source_name: &str) -> Result<Option<ProgressRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .ok()
            .and_then(|records| records.get(source_name).cloned()))
    }

    fn last_source(&self) -> Result<Option<String>, StoreError> {
        Ok(self.last.lock().ok().and_then(|last| last.clone()))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
