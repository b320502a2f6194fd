//! Wire-level request and response shapes
//!
//! The serde types an RPC transport exchanges with the protocol handlers.
//! Transport framing and encoding are out of scope; these shapes are
//! format-independent and stable across peers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::admission::RejectionReason;
use crate::error::PeerCacheError;
use crate::hash::ContentHash;
use crate::protocol::{CopyOutcome, DeleteOptions, DeleteOutcome, PushOutcome};

/// Ask a machine to pull the named content into itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRequest {
    pub hash: ContentHash,
}

/// Offer content to a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushFileRequest {
    pub hash: ContentHash,
    /// Where the receiving store can read the bytes from
    pub source_location: PathBuf,
    /// The pusher's view of the content's age; absent when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
}

/// Pre-check whether a push would be admitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanAcceptRequest {
    pub hash: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
}

/// Ask a machine to remove content it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub hash: ContentHash,
    #[serde(default)]
    pub options: DeleteOptions,
}

/// Uniform operation response: success or diagnostic, with a rejection
/// reason side-channel for pushes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<RejectionReason>,
    /// Bytes moved or freed, when the operation has a byte count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

impl OperationResponse {
    /// Response for a copy result
    pub fn from_copy(result: &Result<CopyOutcome, PeerCacheError>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                diagnostic: None,
                rejection_reason: None,
                bytes: Some(outcome.bytes_copied),
            },
            Err(e) => Self::failure(e),
        }
    }

    /// Response for a push result
    pub fn from_push(result: &Result<PushOutcome, PeerCacheError>) -> Self {
        match result {
            Ok(PushOutcome::Committed { bytes_written }) => Self {
                success: true,
                diagnostic: None,
                rejection_reason: Some(RejectionReason::Accepted),
                bytes: Some(*bytes_written),
            },
            Ok(PushOutcome::Rejected { reason }) => Self {
                success: false,
                diagnostic: Some(format!("push rejected: {}", reason)),
                rejection_reason: Some(*reason),
                bytes: None,
            },
            Err(e) => Self::failure(e),
        }
    }

    /// Response for a delete result
    pub fn from_delete(result: &Result<DeleteOutcome, PeerCacheError>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                diagnostic: None,
                rejection_reason: None,
                bytes: Some(outcome.bytes_freed),
            },
            Err(e) => Self::failure(e),
        }
    }

    fn failure(e: &PeerCacheError) -> Self {
        Self {
            success: false,
            diagnostic: Some(e.to_string()),
            rejection_reason: match e {
                PeerCacheError::RejectedByPolicy { reason } => Some(*reason),
                _ => None,
            },
            bytes: None,
        }
    }
}

/// Response to a [`CanAcceptRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanAcceptResponse {
    pub accepted: bool,
    pub rejection_reason: RejectionReason,
}

impl CanAcceptResponse {
    /// Build from the handler's pre-check tuple
    pub fn new(accepted: bool, rejection_reason: RejectionReason) -> Self {
        Self {
            accepted,
            rejection_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashAlgorithm;

    fn h(data: &[u8]) -> ContentHash {
        ContentHash::digest_of(HashAlgorithm::Sha256, data)
    }

    #[test]
    fn push_request_roundtrip() {
        let req = PushFileRequest {
            hash: h(b"blob"),
            source_location: PathBuf::from("/spool/blob.bin"),
            rank: Some(17),
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: PushFileRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn push_request_rank_is_optional() {
        let json = format!(
            "{{\"hash\":\"{}\",\"source_location\":\"/spool/x\"}}",
            h(b"blob")
        );
        let req: PushFileRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.rank, None);
    }

    #[test]
    fn delete_request_defaults_to_local_scope() {
        let json = format!("{{\"hash\":\"{}\"}}", h(b"blob"));
        let req: DeleteRequest = serde_json::from_str(&json).unwrap();
        assert!(!req.options.is_purge());
    }

    #[test]
    fn committed_push_response() {
        let resp =
            OperationResponse::from_push(&Ok(PushOutcome::Committed { bytes_written: 128 }));
        assert!(resp.success);
        assert_eq!(resp.rejection_reason, Some(RejectionReason::Accepted));
        assert_eq!(resp.bytes, Some(128));
    }

    #[test]
    fn rejected_push_response_carries_reason() {
        let resp = OperationResponse::from_push(&Ok(PushOutcome::Rejected {
            reason: RejectionReason::OlderThanLastEvictedContent,
        }));
        assert!(!resp.success);
        assert_eq!(
            resp.rejection_reason,
            Some(RejectionReason::OlderThanLastEvictedContent)
        );
        assert!(resp.diagnostic.unwrap().contains("older than"));
    }

    #[test]
    fn fault_response_has_diagnostic() {
        let err = PeerCacheError::Cancelled { operation: "push" };
        let resp = OperationResponse::from_push(&Err(err));
        assert!(!resp.success);
        assert!(resp.diagnostic.unwrap().contains("cancelled"));
        assert_eq!(resp.rejection_reason, None);
    }

    #[test]
    fn copy_and_delete_responses() {
        let copy = OperationResponse::from_copy(&Ok(CopyOutcome {
            already_present: false,
            bytes_copied: 9,
        }));
        assert!(copy.success);
        assert_eq!(copy.bytes, Some(9));

        let delete = OperationResponse::from_delete(&Ok(DeleteOutcome {
            removed_local: true,
            bytes_freed: 9,
            peer_failures: vec![],
        }));
        assert!(delete.success);
        assert_eq!(delete.bytes, Some(9));
    }
}
