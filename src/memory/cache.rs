use tracing::{info, warn};

use super::similarity::{MATCH_THRESHOLD, SimilarityIndex};
use super::store::DurableAppendStore;
use super::MemoryEntry;
use crate::error::StorageError;

/// Similarity lookup and append-only persistence of past resolutions.
///
/// Every lookup reads the durable store, so concurrent sessions see each
/// other's appends on their next lookup.
pub struct MemoryCache<S> {
    store: S,
    threshold: f64,
}

impl<S: DurableAppendStore> MemoryCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            threshold: MATCH_THRESHOLD,
        }
    }

    /// Closest stored entry for `query`, if it scores at least the threshold.
    ///
    /// A store that cannot be read counts as "no match".
    pub async fn find(&self, query: &str) -> Option<MemoryEntry> {
        let entries = match self.store.load_all().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Memory lookup could not read store, treating as miss");
                return None;
            }
        };
        SimilarityIndex::with_threshold(&entries, self.threshold)
            .find(query)
            .cloned()
    }

    /// Persist a new resolution for `query`.
    pub async fn store(&self, query: &str, resolution: &str) -> Result<MemoryEntry, StorageError> {
        let entry = MemoryEntry::record(query, resolution);
        self.store.append_and_save(std::slice::from_ref(&entry)).await?;
        info!(id = %entry.id, keywords = entry.keywords.len(), "Stored resolution in memory");
        Ok(entry)
    }

    /// All stored entries, oldest first.
    pub async fn list(&self) -> Result<Vec<MemoryEntry>, StorageError> {
        self.store.load_all().await
    }
}
