//! Byte storage abstraction
//!
//! Provides a trait for the physical blob storage consumed by the protocol
//! handlers. The handlers never touch disk themselves; they hold a
//! `dyn ByteStore` so deployments can swap the backing medium.

pub mod fs;

pub use fs::FsByteStore;

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::PeerCacheResult;
use crate::hash::ContentHash;

/// Abstract blob store interface
///
/// `write` must be atomic from the caller's perspective: either the full
/// blob is durable and verified against `hash`, or nothing is. Implementors
/// are responsible for cleaning up partial state on failure or cancellation.
#[async_trait]
pub trait ByteStore: Send + Sync {
    /// Ingest the file at `source` as the blob named by `hash`.
    ///
    /// Returns the number of bytes written. Fails with a digest mismatch if
    /// the source bytes do not hash to `hash`.
    async fn write(&self, hash: &ContentHash, source: &Path) -> PeerCacheResult<u64>;

    /// Read the full blob for `hash`
    async fn read(&self, hash: &ContentHash) -> PeerCacheResult<Bytes>;

    /// Remove the blob for `hash`. Returns whether bytes were present.
    async fn remove(&self, hash: &ContentHash) -> PeerCacheResult<bool>;

    /// Whether bytes for `hash` are durably present
    async fn contains(&self, hash: &ContentHash) -> bool;

    /// Total capacity in bytes this store is allowed to occupy
    fn capacity_bytes(&self) -> u64;

    /// Bytes currently occupied
    fn used_bytes(&self) -> u64;
}
