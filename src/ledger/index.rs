//! Durable cache index
//!
//! The ledger and ghost log persist together as one JSON snapshot so that
//! admission state survives process restart. Writes go through a temp file
//! and rename; a crash mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{PeerCacheError, PeerCacheResult};
use crate::ledger::{GhostLog, Ledger};

/// Combined ledger + ghost-log state, the only process-wide mutable state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheIndex {
    /// Locally held content
    pub ledger: Ledger,
    /// Recently evicted content, for admission decisions
    pub ghosts: GhostLog,
}

impl CacheIndex {
    /// Create an empty index with the given ghost-log capacity
    pub fn new(ghost_capacity: usize) -> Self {
        Self {
            ledger: Ledger::new(),
            ghosts: GhostLog::with_capacity(ghost_capacity),
        }
    }

    /// Load the index from `path`, or create a fresh one if no file exists.
    ///
    /// `ghost_capacity` only applies to a fresh index; a loaded snapshot
    /// keeps the capacity it was written with.
    pub async fn load_or_default(path: &Path, ghost_capacity: usize) -> PeerCacheResult<Self> {
        if !path.exists() {
            debug!("No cache index at {}, starting empty", path.display());
            return Ok(Self::new(ghost_capacity));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PeerCacheError::io(format!("reading cache index {}", path.display()), e))?;

        let index: CacheIndex = serde_json::from_str(&content)?;
        debug!(
            entries = index.ledger.len(),
            ghosts = index.ghosts.len(),
            "Loaded cache index from {}",
            path.display()
        );
        Ok(index)
    }

    /// Save the index to `path` atomically (temp file + rename)
    pub async fn save(&self, path: &Path) -> PeerCacheResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PeerCacheError::DirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        let tmp = Self::staging_path(path);

        fs::write(&tmp, content)
            .await
            .map_err(|e| PeerCacheError::IndexPersist(format!("writing {}: {}", tmp.display(), e)))?;

        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(PeerCacheError::IndexPersist(format!(
                "renaming {} into place: {}",
                tmp.display(),
                e
            )));
        }

        Ok(())
    }

    fn staging_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index.json".to_string());
        name.push_str(&format!(".{}.tmp", Uuid::new_v4().simple()));
        path.with_file_name(name)
    }
}
