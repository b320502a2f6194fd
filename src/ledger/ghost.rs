//! Eviction ghost log
//!
//! A bounded record of recently evicted hashes and the rank (last-access
//! sequence) each held at eviction time. Used only for admission decisions —
//! never for retrieval. The rank of the single most recent eviction is the
//! comparison baseline: if this machine just evicted something younger than
//! what a peer now offers, the offer is almost certainly not worth admitting.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// Default number of ghost entries retained
pub const DEFAULT_GHOST_CAPACITY: usize = 1024;

/// Metadata retained about a hash after its bytes are evicted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostEntry {
    /// The evicted content
    pub hash: ContentHash,
    /// Last-access sequence the entry held immediately before eviction
    pub rank: u64,
}

/// Bounded FIFO of the most recent evictions
///
/// A hash appears at most once; recording it again moves it to the
/// most-recent position with the new rank. The oldest ghost is silently
/// dropped when the log is full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostLog {
    entries: VecDeque<GhostEntry>,
    capacity: usize,
}

impl GhostLog {
    /// Create an empty log with the given capacity (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record an eviction, replacing any prior ghost for the same hash
    pub fn record_eviction(&mut self, hash: ContentHash, rank: u64) {
        self.entries.retain(|g| g.hash != hash);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(GhostEntry { hash, rank });
    }

    /// Rank of the single most recent eviction overall, if any
    pub fn last_eviction_rank(&self) -> Option<u64> {
        self.entries.back().map(|g| g.rank)
    }

    /// Whether a ghost exists for `hash`
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.entries.iter().any(|g| g.hash == *hash)
    }

    /// Number of retained ghosts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &GhostEntry> {
        self.entries.iter()
    }
}

impl Default for GhostLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_GHOST_CAPACITY)
    }
}
