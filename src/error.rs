//! Error types for peercache
//!
//! All modules use `PeerCacheResult<T>` as their return type. Expected
//! business outcomes (push rejections) are values, not errors — see
//! `protocol::outcome`. Only faults live here.

use std::path::PathBuf;
use thiserror::Error;

use crate::admission::RejectionReason;

/// Result type alias for peercache operations
pub type PeerCacheResult<T> = Result<T, PeerCacheError>;

/// All errors that can occur in peercache
#[derive(Error, Debug)]
pub enum PeerCacheError {
    // Policy errors
    #[error("push rejected by admission policy: {reason}")]
    RejectedByPolicy { reason: RejectionReason },

    // Transfer errors
    #[error("transfer failed: {context}")]
    TransferFailure {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("digest mismatch for {expected}: received bytes hash to {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("{operation} cancelled before commit")]
    Cancelled { operation: &'static str },

    // Invariant violations
    #[error("inconsistent state for {hash}: {detail}")]
    InconsistentState { hash: String, detail: String },

    // Content identity errors
    #[error("invalid content hash '{input}': {reason}")]
    HashInvalid { input: String, reason: String },

    // Peer errors
    #[error("invalid peer address '{input}': {reason}")]
    PeerAddrInvalid { input: String, reason: String },

    #[error("peer {peer} rejected delete notification: {reason}")]
    PeerNotify { peer: String, reason: String },

    #[error("content fetch not available: {0}")]
    FetchUnavailable(String),

    // Configuration errors
    #[error("invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("failed to create directory {path}: {source}")]
    DirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Store errors
    #[error("content not found in store: {0}")]
    ContentNotFound(String),

    #[error("push source not readable: {path}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Index errors
    #[error("failed to persist cache index: {0}")]
    IndexPersist(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl PeerCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a transfer failure with context
    pub fn transfer(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::TransferFailure {
            context: context.into(),
            source,
        }
    }

    /// Create an inconsistent-state error for a hash
    pub fn inconsistent(hash: impl ToString, detail: impl Into<String>) -> Self {
        Self::InconsistentState {
            hash: hash.to_string(),
            detail: detail.into(),
        }
    }

    /// Whether the caller may retry the operation with backoff.
    ///
    /// Policy rejections and clean cancellations are terminal for the same
    /// request; transfer faults are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransferFailure { .. } | Self::SourceUnreadable { .. } | Self::Io { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound(_) => Some("Run: peercache init"),
            Self::InconsistentState { .. } => Some("Run: peercache verify"),
            Self::RejectedByPolicy { .. } => {
                Some("The peer declined this content; do not retry the same push")
            }
            _ => None,
        }
    }
}
