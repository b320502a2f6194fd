//! Peer transfer protocol handlers
//!
//! The three request surfaces a machine exposes to its peers: copy (pull
//! named content into yourself), push (accept content offered to you) and
//! delete (drop content you hold). The handler consults the admission
//! policy before any push bytes move, drives transfers through the byte
//! store, and keeps the ledger/ghost-log pair consistent with what is
//! actually on disk.
//!
//! Concurrency: operations for the same hash serialize on the per-hash
//! lock table; operations for different hashes run fully in parallel. The
//! cache index lock is synchronous and never held across an await.
//!
//! Push lifecycle: admission → Rejected (terminal) | Accepting → Writing →
//! Committed, or Aborted on cancellation/failure with all state rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::admission::{self, RejectionReason};
use crate::error::{PeerCacheError, PeerCacheResult};
use crate::hash::ContentHash;
use crate::journal::Journal;
use crate::ledger::{CacheIndex, LedgerEntry};
use crate::peers::{ContentFetcher, PeerAddr, PeerNotifier};
use crate::protocol::cancel::CancelToken;
use crate::protocol::locks::LockTable;
use crate::protocol::outcome::{
    CopyOutcome, DeleteOptions, DeleteOutcome, PeerFailure, PushOutcome,
};
use crate::store::ByteStore;

/// Behavioural settings for a handler instance
pub struct HandlerSettings {
    /// Whether this machine accepts pushes at all
    pub push_enabled: bool,
    /// Peers notified on purge deletes
    pub peers: Vec<PeerAddr>,
    /// Directory where fetched content lands before ingest
    pub staging_dir: PathBuf,
}

/// The peer transfer protocol handler
///
/// One instance per machine, shared (`Arc`) across all concurrent inbound
/// requests. Owns the only mutable process-wide state: the cache index.
pub struct TransferHandler {
    store: Arc<dyn ByteStore>,
    fetcher: Arc<dyn ContentFetcher>,
    notifier: Arc<dyn PeerNotifier>,
    index: Mutex<CacheIndex>,
    index_path: PathBuf,
    journal: Journal,
    locks: LockTable,
    settings: HandlerSettings,
}

impl TransferHandler {
    /// Create a handler over the given collaborators and loaded index
    pub fn new(
        store: Arc<dyn ByteStore>,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn PeerNotifier>,
        index: CacheIndex,
        index_path: PathBuf,
        journal: Journal,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            notifier,
            index: Mutex::new(index),
            index_path,
            journal,
            locks: LockTable::new(),
            settings,
        }
    }

    /// Synchronous admission pre-check for a prospective push.
    ///
    /// Returns whether the push would be accepted, along with the reason.
    /// Callers use this before initiating an expensive transfer.
    pub fn can_accept_content(
        &self,
        hash: &ContentHash,
        incoming_rank: Option<u64>,
    ) -> (bool, RejectionReason) {
        let reason = self.admission_check(hash, incoming_rank);
        (reason.is_accepted(), reason)
    }

    /// Pull the named content into the local store.
    ///
    /// The request carries no bytes; it means "you should now hold this".
    /// Already-held content succeeds immediately as a no-op (refreshing its
    /// access order). Cancellation before commit leaves no trace.
    pub async fn handle_copy_request(
        &self,
        hash: ContentHash,
        cancel: &CancelToken,
    ) -> PeerCacheResult<CopyOutcome> {
        let _guard = self.locks.acquire(hash).await;
        if cancel.is_cancelled() {
            return Err(PeerCacheError::Cancelled { operation: "copy" });
        }

        let held = self.index.lock().ledger.contains(&hash);
        if held {
            if !self.store.contains(&hash).await {
                return Err(PeerCacheError::inconsistent(
                    hash,
                    "ledger entry present but bytes missing",
                ));
            }
            self.index.lock().ledger.touch(&hash);
            self.persist_index().await?;
            debug!(hash = %hash.short(), "Copy request is a no-op, content held");
            self.journal
                .record("copy.noop", &serde_json::json!({ "hash": hash }))
                .await;
            return Ok(CopyOutcome {
                already_present: true,
                bytes_copied: 0,
            });
        }

        let fetched = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(PeerCacheError::Cancelled { operation: "copy" });
            }
            res = self.fetcher.fetch(&hash, &self.settings.staging_dir) => res?,
        };

        let result = self.commit_from(&hash, &fetched, "copy", cancel).await;
        let _ = fs::remove_file(&fetched).await;
        let bytes_copied = result?;

        info!(hash = %hash.short(), bytes = bytes_copied, "Copy request completed");
        self.journal
            .record(
                "copy.completed",
                &serde_json::json!({ "hash": hash, "bytes": bytes_copied }),
            )
            .await;
        Ok(CopyOutcome {
            already_present: false,
            bytes_copied,
        })
    }

    /// Accept (or reject) content a peer pushes at this machine.
    ///
    /// Admission runs before any bytes move; a rejection carries the reason
    /// and transfers nothing. An accepted push may first evict older
    /// content to make room, recording each eviction in the ghost log.
    pub async fn handle_push_file(
        &self,
        hash: ContentHash,
        source: &Path,
        incoming_rank: Option<u64>,
        cancel: &CancelToken,
    ) -> PeerCacheResult<PushOutcome> {
        let _guard = self.locks.acquire(hash).await;
        if cancel.is_cancelled() {
            return Err(PeerCacheError::Cancelled { operation: "push" });
        }

        let decision = self.admission_check(&hash, incoming_rank);
        if !decision.is_accepted() {
            debug!(hash = %hash.short(), reason = %decision, "Push rejected");
            self.journal
                .record(
                    "push.rejected",
                    &serde_json::json!({ "hash": hash, "reason": decision }),
                )
                .await;
            return Ok(PushOutcome::Rejected { reason: decision });
        }

        let bytes_written = self.commit_from(&hash, source, "push", cancel).await?;

        info!(hash = %hash.short(), bytes = bytes_written, "Push committed");
        self.journal
            .record(
                "push.committed",
                &serde_json::json!({
                    "hash": hash,
                    "bytes": bytes_written,
                    "rank": incoming_rank,
                }),
            )
            .await;
        Ok(PushOutcome::Committed { bytes_written })
    }

    /// Remove the local copy of `hash`.
    ///
    /// Explicit deletes never touch the ghost log — they are not evictions
    /// and must not influence future admission decisions. With
    /// `PurgeAllKnownCopies`, configured peers are notified best-effort and
    /// individual failures are collected, not fatal.
    pub async fn handle_delete(
        &self,
        hash: ContentHash,
        options: DeleteOptions,
        cancel: &CancelToken,
    ) -> PeerCacheResult<DeleteOutcome> {
        let _guard = self.locks.acquire(hash).await;
        if cancel.is_cancelled() {
            return Err(PeerCacheError::Cancelled { operation: "delete" });
        }

        let bytes_present = self.store.remove(&hash).await?;
        let removed_entry = self.index.lock().ledger.remove(&hash);
        if removed_entry.is_some() {
            self.persist_index().await?;
        }

        let removed_local = bytes_present || removed_entry.is_some();
        let bytes_freed = removed_entry.map(|e| e.size_bytes).unwrap_or(0);

        let mut peer_failures = Vec::new();
        if options.is_purge() {
            peer_failures = self.notify_peers_delete(&hash).await;
        }

        info!(
            hash = %hash.short(),
            removed_local,
            purge = options.is_purge(),
            "Delete handled"
        );
        self.journal
            .record(
                if options.is_purge() { "delete.purge" } else { "delete.local" },
                &serde_json::json!({
                    "hash": hash,
                    "removed_local": removed_local,
                    "peer_failures": peer_failures.len(),
                }),
            )
            .await;

        Ok(DeleteOutcome {
            removed_local,
            bytes_freed,
            peer_failures,
        })
    }

    /// Snapshot of the current index, for inspection tools
    pub fn index_snapshot(&self) -> CacheIndex {
        self.index.lock().clone()
    }

    /// The byte store behind this handler
    pub fn store(&self) -> &dyn ByteStore {
        self.store.as_ref()
    }

    fn admission_check(&self, hash: &ContentHash, incoming_rank: Option<u64>) -> RejectionReason {
        let mut index = self.index.lock();
        let CacheIndex { ledger, ghosts } = &mut *index;
        admission::decide(
            ledger,
            ghosts,
            self.settings.push_enabled,
            hash,
            incoming_rank,
        )
    }

    /// Stream `source` into the store as `hash` and record the ledger entry.
    ///
    /// This is the shared Writing→Committed tail of push and copy. On any
    /// failure or observed cancellation the store and ledger are left
    /// exactly as they were.
    async fn commit_from(
        &self,
        hash: &ContentHash,
        source: &Path,
        operation: &'static str,
        cancel: &CancelToken,
    ) -> PeerCacheResult<u64> {
        let size = fs::metadata(source)
            .await
            .map_err(|e| PeerCacheError::SourceUnreadable {
                path: source.to_path_buf(),
                source: e,
            })?
            .len();

        self.reserve_capacity(size).await?;

        let written = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = self.store.remove(hash).await;
                return Err(PeerCacheError::Cancelled { operation });
            }
            res = self.store.write(hash, source) => res?,
        };

        self.index.lock().ledger.record_insertion(*hash, written);
        if let Err(e) = self.persist_index().await {
            self.index.lock().ledger.remove(hash);
            let _ = self.store.remove(hash).await;
            return Err(e);
        }
        Ok(written)
    }

    /// Make room for `incoming_bytes`, evicting in last-access order.
    ///
    /// Eviction, ghost recording and space accounting happen under one
    /// index lock acquisition so concurrent transfers competing for the
    /// same freed capacity stay correct. Hashes pinned by in-flight
    /// operations are never candidates.
    async fn reserve_capacity(&self, incoming_bytes: u64) -> PeerCacheResult<Vec<LedgerEntry>> {
        let capacity = self.store.capacity_bytes();
        if incoming_bytes > capacity {
            return Err(PeerCacheError::transfer(
                format!(
                    "blob of {} bytes exceeds store capacity of {} bytes",
                    incoming_bytes, capacity
                ),
                std::io::Error::other("insufficient capacity"),
            ));
        }

        let (evicted, still_short) = {
            let mut index = self.index.lock();
            let CacheIndex { ledger, ghosts } = &mut *index;
            let evicted =
                ledger.evict_oldest(incoming_bytes, capacity, |h| self.locks.is_pinned(h));
            for entry in &evicted {
                ghosts.record_eviction(entry.hash, entry.access_seq);
            }
            let still_short = ledger.used_bytes() + incoming_bytes > capacity;
            (evicted, still_short)
        };

        for entry in &evicted {
            if let Err(e) = self.store.remove(&entry.hash).await {
                warn!(hash = %entry.hash.short(), "Failed to remove evicted blob: {}", e);
            }
            debug!(hash = %entry.hash.short(), rank = entry.access_seq, "Evicted");
            self.journal
                .record(
                    "eviction",
                    &serde_json::json!({ "hash": entry.hash, "rank": entry.access_seq }),
                )
                .await;
        }
        if !evicted.is_empty() {
            self.persist_index().await?;
        }

        if still_short {
            return Err(PeerCacheError::transfer(
                "insufficient capacity after eviction, remaining entries are pinned".to_string(),
                std::io::Error::other("insufficient capacity"),
            ));
        }
        Ok(evicted)
    }

    async fn notify_peers_delete(&self, hash: &ContentHash) -> Vec<PeerFailure> {
        let notifications = self.settings.peers.iter().map(|peer| async move {
            (peer, self.notifier.notify_delete(peer, hash).await)
        });

        let mut failures = Vec::new();
        for (peer, result) in join_all(notifications).await {
            if let Err(e) = result {
                warn!(peer = %peer, "Peer delete notification failed: {}", e);
                failures.push(PeerFailure {
                    peer: peer.to_string(),
                    reason: e.to_string(),
                });
            }
        }
        failures
    }

    async fn persist_index(&self) -> PeerCacheResult<()> {
        let snapshot = self.index.lock().clone();
        snapshot.save(&self.index_path).await
    }
}
