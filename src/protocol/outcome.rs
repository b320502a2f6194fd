//! Operation outcomes
//!
//! Every handler returns a typed outcome on success; faults use
//! [`crate::error::PeerCacheError`]. A push rejection is an expected
//! business outcome and therefore a value, not an error.

use serde::{Deserialize, Serialize};

use crate::admission::RejectionReason;

/// Result of a copy request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOutcome {
    /// The content was already held; no bytes moved
    pub already_present: bool,
    /// Bytes fetched and committed (0 when already present)
    pub bytes_copied: u64,
}

/// Result of a push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PushOutcome {
    /// Bytes were streamed in, verified and recorded
    Committed { bytes_written: u64 },
    /// The admission policy declined the push; no bytes moved
    Rejected { reason: RejectionReason },
}

impl PushOutcome {
    /// Whether the push stored bytes
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// The rejection reason, `Accepted` if the push committed
    pub fn rejection_reason(&self) -> RejectionReason {
        match self {
            Self::Committed { .. } => RejectionReason::Accepted,
            Self::Rejected { reason } => *reason,
        }
    }
}

/// A failed best-effort peer notification during a purge delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerFailure {
    /// Peer that could not be notified
    pub peer: String,
    /// What went wrong
    pub reason: String,
}

/// Result of a delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// A local ledger entry or blob existed and was removed
    pub removed_local: bool,
    /// Bytes freed locally
    pub bytes_freed: u64,
    /// Peers that failed to acknowledge a purge notification (non-fatal)
    pub peer_failures: Vec<PeerFailure>,
}

/// Scope of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    /// Remove only this machine's copy
    #[default]
    LocalOnly,
    /// Also notify peers known to hold the hash, best-effort
    PurgeAllKnownCopies,
}

/// Configuration bundle for a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Exactly one scope mode is active per call
    pub scope: DeleteScope,
}

impl DeleteOptions {
    /// Delete only the local copy
    pub fn local_only() -> Self {
        Self {
            scope: DeleteScope::LocalOnly,
        }
    }

    /// Delete locally and propagate to known peers
    pub fn purge() -> Self {
        Self {
            scope: DeleteScope::PurgeAllKnownCopies,
        }
    }

    /// Whether peer propagation is requested
    pub fn is_purge(&self) -> bool {
        self.scope == DeleteScope::PurgeAllKnownCopies
    }
}
