//! Filesystem byte store
//!
//! Content-addressed on-disk layout:
//!
//! ```text
//! <root>/blobs/<algo>/<xx>/<hex>    committed blobs (xx = first digest byte)
//! <root>/staging/<uuid>.part        in-flight writes
//! ```
//!
//! Writes stream through a staging file, verify the digest, then rename into
//! place — a crash or cancellation mid-write never leaves a committed blob.
//! Usage accounting is an atomic counter seeded by a directory walk at open.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PeerCacheError, PeerCacheResult};
use crate::hash::{ContentHash, HashAlgorithm};
use crate::store::ByteStore;

const WRITE_CHUNK: usize = 64 * 1024;

/// Incremental digest over either supported algorithm
enum Hasher {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn new(algo: HashAlgorithm) -> Self {
        match algo {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self, algo: HashAlgorithm) -> ContentHash {
        let digest: [u8; 32] = match self {
            Self::Sha256(h) => h.finalize().into(),
            Self::Blake3(h) => *h.finalize().as_bytes(),
        };
        ContentHash::new(algo, digest)
    }
}

/// Removes the staging file unless the write committed
struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl StagingGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Content-addressed blob store on the local filesystem
pub struct FsByteStore {
    root: PathBuf,
    capacity_bytes: u64,
    used_bytes: AtomicU64,
}

impl FsByteStore {
    /// Open (or initialize) a store rooted at `root` with the given capacity.
    ///
    /// Sweeps any staging leftovers from a previous crash and seeds the usage
    /// counter from the committed blobs on disk.
    pub async fn open(root: impl Into<PathBuf>, capacity_bytes: u64) -> PeerCacheResult<Self> {
        let root = root.into();

        for dir in [root.join("blobs"), root.join("staging")] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| PeerCacheError::DirCreate {
                    path: dir.clone(),
                    source: e,
                })?;
        }

        let swept = sweep_staging(&root.join("staging")).await;
        if swept > 0 {
            warn!("Swept {} stale staging file(s)", swept);
        }

        let used = walk_usage(&root.join("blobs"))
            .map_err(|e| PeerCacheError::io("scanning blob directory", e))?;
        debug!(
            used_bytes = used,
            capacity_bytes, "Opened blob store at {}",
            root.display()
        );

        Ok(Self {
            root,
            capacity_bytes,
            used_bytes: AtomicU64::new(used),
        })
    }

    /// Path of the committed blob for `hash`
    pub fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.hex();
        self.root
            .join("blobs")
            .join(hash.algorithm().as_str())
            .join(&hex[..2])
            .join(hex)
    }

    /// Directory used for in-flight writes
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    async fn stage_from(&self, hash: &ContentHash, source: &Path) -> PeerCacheResult<(PathBuf, u64)> {
        let mut reader = fs::File::open(source)
            .await
            .map_err(|e| PeerCacheError::SourceUnreadable {
                path: source.to_path_buf(),
                source: e,
            })?;

        let staged = self
            .staging_dir()
            .join(format!("{}.part", Uuid::new_v4().simple()));
        let mut guard = StagingGuard::new(staged.clone());

        let mut writer = fs::File::create(&staged)
            .await
            .map_err(|e| PeerCacheError::transfer("creating staging file", e))?;

        let mut hasher = Hasher::new(hash.algorithm());
        let mut total: u64 = 0;
        let mut buf = vec![0u8; WRITE_CHUNK];

        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| PeerCacheError::transfer("reading push source", e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            writer
                .write_all(&buf[..n])
                .await
                .map_err(|e| PeerCacheError::transfer("writing staging file", e))?;
            total += n as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| PeerCacheError::transfer("flushing staging file", e))?;
        writer
            .sync_all()
            .await
            .map_err(|e| PeerCacheError::transfer("syncing staging file", e))?;
        drop(writer);

        let actual = hasher.finalize(hash.algorithm());
        if actual != *hash {
            // Guard removes the staged bytes on return.
            return Err(PeerCacheError::DigestMismatch {
                expected: hash.to_string(),
                actual: actual.to_string(),
            });
        }

        guard.disarm();
        Ok((staged, total))
    }
}

#[async_trait]
impl ByteStore for FsByteStore {
    async fn write(&self, hash: &ContentHash, source: &Path) -> PeerCacheResult<u64> {
        let (staged, size) = self.stage_from(hash, source).await?;
        let mut guard = StagingGuard::new(staged.clone());

        let dest = self.blob_path(hash);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PeerCacheError::transfer("creating blob directory", e))?;
        }

        let already_present = fs::try_exists(&dest).await.unwrap_or(false);

        fs::rename(&staged, &dest)
            .await
            .map_err(|e| PeerCacheError::transfer("committing blob", e))?;
        guard.disarm();

        if !already_present {
            self.used_bytes.fetch_add(size, Ordering::SeqCst);
        }
        debug!(hash = %hash.short(), size, "Committed blob");
        Ok(size)
    }

    async fn read(&self, hash: &ContentHash) -> PeerCacheResult<Bytes> {
        let path = self.blob_path(hash);
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PeerCacheError::ContentNotFound(hash.to_string()))
            }
            Err(e) => Err(PeerCacheError::transfer("reading blob", e)),
        }
    }

    async fn remove(&self, hash: &ContentHash) -> PeerCacheResult<bool> {
        let path = self.blob_path(hash);
        let size = match fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(PeerCacheError::transfer("inspecting blob", e)),
        };

        fs::remove_file(&path)
            .await
            .map_err(|e| PeerCacheError::transfer("removing blob", e))?;
        let _ = self
            .used_bytes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_sub(size))
            });
        debug!(hash = %hash.short(), size, "Removed blob");
        Ok(true)
    }

    async fn contains(&self, hash: &ContentHash) -> bool {
        fs::try_exists(self.blob_path(hash)).await.unwrap_or(false)
    }

    fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    fn used_bytes(&self) -> u64 {
        self.used_bytes.load(Ordering::SeqCst)
    }
}

/// Delete leftover `.part` files, returning how many were removed
async fn sweep_staging(staging: &Path) -> usize {
    let mut removed = 0;
    let Ok(mut entries) = fs::read_dir(staging).await else {
        return 0;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if fs::remove_file(entry.path()).await.is_ok() {
            removed += 1;
        }
    }
    removed
}

/// Sum file sizes under `dir` recursively (startup only)
fn walk_usage(dir: &Path) -> std::io::Result<u64> {
    let mut total = 0;
    if !dir.exists() {
        return Ok(0);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            total += walk_usage(&entry.path())?;
        } else {
            total += meta.len();
        }
    }
    Ok(total)
}
