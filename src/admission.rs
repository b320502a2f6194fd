//! Admission policy for peer pushes
//!
//! Decides, before any bytes move, whether this machine should accept
//! content a peer wants to push. The decision reads the ledger and the
//! ghost log; its only permitted side effect is refreshing the last-access
//! sequence of content that is already held. It never fails — every check
//! produces exactly one [`RejectionReason`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::ledger::{GhostLog, Ledger};

/// Outcome of an admission check
///
/// `Accepted` is the sentinel for "no reason to reject"; the remaining
/// variants tell the peer why the push will not be taken. A rejected push is
/// not a fault and should not be retried as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No rejection — the push may proceed
    Accepted,
    /// This machine already holds the content
    ContentAvailableLocally,
    /// The offered content is older than the most recently evicted content
    OlderThanLastEvictedContent,
    /// Pushes are disabled on this machine
    NotSupported,
}

impl RejectionReason {
    /// Whether this reason permits the transfer
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Accepted => "accepted",
            Self::ContentAvailableLocally => "content available locally",
            Self::OlderThanLastEvictedContent => "older than last evicted content",
            Self::NotSupported => "not supported",
        };
        write!(f, "{}", s)
    }
}

/// Decide whether to admit a push of `hash` with the peer-supplied rank.
///
/// Rules, in order:
/// 1. Already held → `ContentAvailableLocally` (and the entry is touched).
/// 2. Pushes disabled → `NotSupported`.
/// 3. Ghost baseline exists and `incoming_rank` is strictly lower →
///    `OlderThanLastEvictedContent`.
/// 4. Otherwise `Accepted`.
///
/// With an empty ghost log, or no rank supplied by the peer, rule 3 is
/// skipped: without a baseline there is nothing to compare age against.
pub fn decide(
    ledger: &mut Ledger,
    ghosts: &GhostLog,
    push_enabled: bool,
    hash: &ContentHash,
    incoming_rank: Option<u64>,
) -> RejectionReason {
    if ledger.contains(hash) {
        ledger.touch(hash);
        return RejectionReason::ContentAvailableLocally;
    }

    if !push_enabled {
        return RejectionReason::NotSupported;
    }

    if let (Some(baseline), Some(rank)) = (ghosts.last_eviction_rank(), incoming_rank) {
        if rank < baseline {
            return RejectionReason::OlderThanLastEvictedContent;
        }
    }

    RejectionReason::Accepted
}
