//! Per-hash mutual exclusion
//!
//! Concurrent requests for the same hash serialize on a per-hash async
//! mutex; requests for different hashes never contend. Lock slots are
//! created on demand and removed again once idle, so the table stays
//! proportional to in-flight work, not to cache size.
//!
//! A hash whose slot is currently held (or awaited) is "pinned": eviction
//! never selects it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::hash::ContentHash;

/// Table of per-hash locks
#[derive(Debug, Default)]
pub struct LockTable {
    slots: DashMap<ContentHash, Arc<Mutex<()>>>,
}

impl LockTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Acquire the lock for `hash`, waiting behind any in-flight operation
    /// on the same hash.
    pub async fn acquire(&self, hash: ContentHash) -> HashGuard<'_> {
        let slot = self
            .slots
            .entry(hash)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = slot.clone().lock_owned().await;
        HashGuard {
            table: self,
            hash,
            slot: Some(slot),
            guard: Some(guard),
        }
    }

    /// Whether an operation currently holds (or awaits) the lock for `hash`
    pub fn is_pinned(&self, hash: &ContentHash) -> bool {
        self.slots
            .get(hash)
            .map(|slot| Arc::strong_count(slot.value()) > 1)
            .unwrap_or(false)
    }

    /// Number of live lock slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots are live
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Held per-hash lock; releasing it retires the slot when no one else waits
pub struct HashGuard<'a> {
    table: &'a LockTable,
    hash: ContentHash,
    slot: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl HashGuard<'_> {
    /// The hash this guard serializes
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }
}

impl Drop for HashGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.slot.take();
        // Retire the slot only if no other operation holds or awaits it.
        self.table
            .slots
            .remove_if(&self.hash, |_, slot| Arc::strong_count(slot) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashAlgorithm;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn h(data: &[u8]) -> ContentHash {
        ContentHash::digest_of(HashAlgorithm::Sha256, data)
    }

    #[tokio::test]
    async fn same_hash_serializes() {
        let table = Arc::new(LockTable::new());
        let running = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let table = table.clone();
            let running = running.clone();
            let max_seen = max_seen.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = table.acquire(h(b"contended")).await;
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_hashes_run_in_parallel() {
        let table = Arc::new(LockTable::new());

        let guard_a = table.acquire(h(b"a")).await;
        // Acquiring b must not block behind a.
        let guard_b = tokio::time::timeout(Duration::from_millis(100), table.acquire(h(b"b")))
            .await
            .expect("different hash should not contend");

        drop(guard_a);
        drop(guard_b);
    }

    #[tokio::test]
    async fn held_hash_is_pinned() {
        let table = LockTable::new();
        assert!(!table.is_pinned(&h(b"x")));

        let guard = table.acquire(h(b"x")).await;
        assert!(table.is_pinned(&h(b"x")));
        assert_eq!(guard.hash(), &h(b"x"));

        drop(guard);
        assert!(!table.is_pinned(&h(b"x")));
    }

    #[tokio::test]
    async fn idle_slots_are_retired() {
        let table = LockTable::new();

        let guard = table.acquire(h(b"once")).await;
        assert_eq!(table.len(), 1);
        drop(guard);

        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn slot_survives_while_waiter_queued() {
        let table = Arc::new(LockTable::new());
        let guard = table.acquire(h(b"busy")).await;

        let waiter = {
            let table = table.clone();
            tokio::spawn(async move {
                let _guard = table.acquire(h(b"busy")).await;
            })
        };

        // Give the waiter time to enqueue, then release.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(table.is_pinned(&h(b"busy")));
        drop(guard);

        waiter.await.unwrap();
        assert!(table.is_empty());
    }
}
