//! Local content ledger
//!
//! Per-machine record of which hashes are held locally, their size, and
//! their insertion/last-access order. Sequence numbers come from one
//! monotonic per-machine counter and are never reused; ascending
//! `access_seq` order is the eviction order.
//!
//! The ledger is pure bookkeeping — bytes live in the [`crate::store`], and
//! all mutation goes through the protocol handler's critical sections.

pub mod ghost;
pub mod index;

pub use ghost::{GhostEntry, GhostLog};
pub use index::CacheIndex;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// A single ledger record: one per locally held hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Content this entry describes
    pub hash: ContentHash,

    /// Blob size in bytes
    pub size_bytes: u64,

    /// Sequence number assigned at insertion
    pub insert_seq: u64,

    /// Sequence number of the most recent access (insertion counts)
    pub access_seq: u64,

    /// When the entry was created
    pub inserted_at: DateTime<Utc>,
}

/// The local content ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    entries: HashMap<ContentHash, LedgerEntry>,
    /// Next sequence number to hand out. Starts at 1; 0 is never a valid rank.
    next_seq: u64,
    /// Running sum of entry sizes
    used_bytes: u64,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 1,
            used_bytes: 0,
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Whether the ledger holds an entry for `hash`
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.entries.contains_key(hash)
    }

    /// Look up the entry for `hash`
    pub fn get(&self, hash: &ContentHash) -> Option<&LedgerEntry> {
        self.entries.get(hash)
    }

    /// Record a successful insertion.
    ///
    /// Re-inserting a present hash refreshes its access sequence and size
    /// instead of creating a duplicate — one entry per hash, always.
    pub fn record_insertion(&mut self, hash: ContentHash, size_bytes: u64) -> LedgerEntry {
        let seq = self.take_seq();

        if let Some(existing) = self.entries.get_mut(&hash) {
            self.used_bytes = self.used_bytes - existing.size_bytes + size_bytes;
            existing.size_bytes = size_bytes;
            existing.access_seq = seq;
            return existing.clone();
        }

        let entry = LedgerEntry {
            hash,
            size_bytes,
            insert_seq: seq,
            access_seq: seq,
            inserted_at: Utc::now(),
        };
        self.used_bytes += size_bytes;
        self.entries.insert(hash, entry.clone());
        entry
    }

    /// Refresh the last-access sequence for `hash`.
    ///
    /// Returns false when the hash is not present.
    pub fn touch(&mut self, hash: &ContentHash) -> bool {
        let seq = self.next_seq;
        match self.entries.get_mut(hash) {
            Some(entry) => {
                entry.access_seq = seq;
                self.next_seq += 1;
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `hash`, returning it if present
    pub fn remove(&mut self, hash: &ContentHash) -> Option<LedgerEntry> {
        let removed = self.entries.remove(hash);
        if let Some(ref entry) = removed {
            self.used_bytes -= entry.size_bytes;
        }
        removed
    }

    /// Sum of sizes of all held entries
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    /// Number of held entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sequence number that will be assigned next
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Iterate over all entries (unordered)
    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values()
    }

    /// Evict entries in ascending last-access order until `bytes_needed` more
    /// bytes would fit under `capacity_bytes`.
    ///
    /// Entries for which `is_pinned` returns true are never chosen. Returns
    /// exactly the evicted entries; an empty result (store already has room,
    /// or nothing evictable) is not an error. Callers record each returned
    /// entry in the ghost log and remove its bytes from the store.
    pub fn evict_oldest(
        &mut self,
        bytes_needed: u64,
        capacity_bytes: u64,
        is_pinned: impl Fn(&ContentHash) -> bool,
    ) -> Vec<LedgerEntry> {
        let target = capacity_bytes.saturating_sub(bytes_needed);
        if self.used_bytes <= target {
            return Vec::new();
        }

        let mut candidates: Vec<(u64, ContentHash)> = self
            .entries
            .values()
            .filter(|e| !is_pinned(&e.hash))
            .map(|e| (e.access_seq, e.hash))
            .collect();
        candidates.sort_unstable();

        let mut evicted = Vec::new();
        for (_, hash) in candidates {
            if self.used_bytes <= target {
                break;
            }
            if let Some(entry) = self.remove(&hash) {
                evicted.push(entry);
            }
        }
        evicted
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
