//! Keyword extraction and Jaccard scoring.
//!
//! Pure and deterministic: tokenize → score → threshold. Nothing here knows
//! about storage or about the workflow.

use std::collections::BTreeSet;

use tracing::debug;

use super::MemoryEntry;

/// Minimum Jaccard score (inclusive) for a stored entry to count as a match.
pub const MATCH_THRESHOLD: f64 = 0.3;

const STRIP_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}'];

/// Extract the keyword set of a text.
///
/// Lower-cases, splits on whitespace, trims the punctuation set from both
/// ends of each token and drops tokens of three characters or fewer.
pub fn keywords(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|token| token.trim_matches(STRIP_CHARS))
        .filter(|token| token.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

/// `|a ∩ b| / |a ∪ b|`, defined as 0 when either side is empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Similarity between two raw texts.
pub fn score(a: &str, b: &str) -> f64 {
    jaccard(&keywords(a), &keywords(b))
}

/// Nearest-neighbour search over stored entries, in insertion order.
pub struct SimilarityIndex<'a> {
    entries: &'a [MemoryEntry],
    threshold: f64,
}

impl<'a> SimilarityIndex<'a> {
    pub fn new(entries: &'a [MemoryEntry]) -> Self {
        Self::with_threshold(entries, MATCH_THRESHOLD)
    }

    pub fn with_threshold(entries: &'a [MemoryEntry], threshold: f64) -> Self {
        Self { entries, threshold }
    }

    /// Best-scoring entry at or above the threshold. On equal scores the
    /// entry stored first wins.
    pub fn find(&self, query: &str) -> Option<&'a MemoryEntry> {
        let query_keywords = keywords(query);
        if query_keywords.is_empty() {
            return None;
        }

        let mut best: Option<(&'a MemoryEntry, f64)> = None;
        for entry in self.entries {
            let s = jaccard(&query_keywords, &entry.keywords);
            if s > best.map_or(0.0, |(_, b)| b) {
                best = Some((entry, s));
            }
        }

        match best {
            Some((entry, s)) if s >= self.threshold => {
                debug!(id = %entry.id, score = s, "Memory match");
                Some(entry)
            }
            Some((entry, s)) => {
                debug!(id = %entry.id, score = s, threshold = self.threshold, "Best memory below threshold");
                None
            }
            None => None,
        }
    }
}
