//! Configuration schema for peercache
//!
//! Configuration is stored at `~/.config/peercache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PeerCacheResult;
use crate::ledger::ghost::DEFAULT_GHOST_CAPACITY;
use crate::peers::PeerAddr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Blob store settings
    pub store: StoreConfig,

    /// Admission policy settings
    pub admission: AdmissionConfig,

    /// Known peers
    pub peers: PeersConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable the transfer journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            journal: true,
        }
    }
}

/// Blob store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store root directory (defaults to the state directory)
    pub root: Option<PathBuf>,

    /// Total bytes the store may occupy
    pub capacity_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: None,
            capacity_bytes: 10 * 1024 * 1024 * 1024, // 10 GB
        }
    }
}

/// Admission policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Accept pushes from peers (false makes this machine pull-only)
    pub push_enabled: bool,

    /// Number of recent evictions remembered for admission decisions
    pub ghost_log_capacity: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            push_enabled: true,
            ghost_log_capacity: DEFAULT_GHOST_CAPACITY,
        }
    }
}

/// Known-peer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeersConfig {
    /// Peer addresses as `host:port` strings
    pub addresses: Vec<String>,
}

impl PeersConfig {
    /// Parse all configured addresses, failing on the first invalid one
    pub fn parse(&self) -> PeerCacheResult<Vec<PeerAddr>> {
        self.addresses.iter().map(|s| s.parse()).collect()
    }
}
