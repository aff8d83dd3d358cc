//! Resolution memory: previously solved tickets and the similarity search
//! that short-circuits repeated diagnostics.

mod cache;
pub mod similarity;
mod store;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use cache::MemoryCache;
pub use similarity::{MATCH_THRESHOLD, SimilarityIndex};
pub use store::{DurableAppendStore, InMemoryStore, JsonlStore};

/// A stored query/resolution pair. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub query: String,
    pub resolution: String,
    pub keywords: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(id: String, query: &str, resolution: &str) -> Self {
        Self {
            id,
            query: query.to_string(),
            resolution: resolution.to_string(),
            keywords: similarity::keywords(query),
            created_at: Utc::now(),
        }
    }

    /// A new entry with a fresh unique identifier.
    pub fn record(query: &str, resolution: &str) -> Self {
        Self::new(format!("mem_{}", Uuid::new_v4().simple()), query, resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_computes_keywords_and_unique_ids() {
        let a = MemoryEntry::record("Cannot reach host 10.0.0.5", "Restarted gateway service");
        let b = MemoryEntry::record("Cannot reach host 10.0.0.5", "Restarted gateway service");
        assert!(a.id.starts_with("mem_"));
        assert_ne!(a.id, b.id);
        assert!(a.keywords.contains("reach"));
        assert!(a.keywords.contains("10.0.0.5"));
    }

    #[test]
    fn entry_serialization_roundtrip() {
        let entry = MemoryEntry::record("VPN tunnel drops", "Raised MTU");
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: MemoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
