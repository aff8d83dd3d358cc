use std::path::PathBuf;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use super::MemoryEntry;
use crate::error::StorageError;

/// Durable backing for the resolution memory. Entries are only ever appended.
#[async_trait]
pub trait DurableAppendStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<MemoryEntry>, StorageError>;

    /// Append `entries` and make them durable. Readers must never observe a
    /// partially written entry.
    async fn append_and_save(&self, entries: &[MemoryEntry]) -> Result<(), StorageError>;
}

/// Append-only JSON Lines file.
///
/// Each append is a single write of complete lines made while holding the
/// writer lock, so concurrent appends in one process never interleave. A
/// trailing line without its newline is an append still in flight and is
/// skipped by readers.
pub struct JsonlStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }
}

#[async_trait]
impl DurableAppendStore for JsonlStore {
    async fn load_all(&self) -> Result<Vec<MemoryEntry>, StorageError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let complete = match contents.rfind('\n') {
            Some(end) => &contents[..=end],
            None => "",
        };

        let mut entries = Vec::new();
        for (line_no, line) in complete.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MemoryEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(path = %self.path.display(), line = line_no + 1, error = %e, "Skipping corrupt memory line");
                }
            }
        }
        Ok(entries)
    }

    async fn append_and_save(&self, entries: &[MemoryEntry]) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut buf = String::new();
        for entry in entries {
            buf.push_str(&serde_json::to_string(entry)?);
            buf.push('\n');
        }

        let _guard = self.writer.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.sync_data().await?;
        Ok(())
    }
}

/// Volatile store for tests and the offline demo.
#[derive(Default)]
pub struct InMemoryStore {
    entries: StdMutex<Vec<MemoryEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableAppendStore for InMemoryStore {
    async fn load_all(&self) -> Result<Vec<MemoryEntry>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))?;
        Ok(entries.clone())
    }

    async fn append_and_save(&self, new_entries: &[MemoryEntry]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))?;
        entries.extend_from_slice(new_entries);
        Ok(())
    }
}
