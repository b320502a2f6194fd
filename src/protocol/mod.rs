//! Peer transfer protocol
//!
//! Everything a machine needs to answer its three peer-facing request
//! surfaces — copy, push and delete — plus the concurrency primitives
//! the handlers are built on: per-hash locks and cooperative cancellation.
//!
//! # Flow
//!
//! | Request | Gate | Effect |
//! |---------|------|--------|
//! | copy    | none (self-initiated pull) | fetch + ledger entry |
//! | push    | admission policy, before bytes move | write + ledger entry, evicting as needed |
//! | delete  | none | ledger + bytes removed, no ghost entry |

pub mod cancel;
pub mod handler;
pub mod locks;
pub mod outcome;

pub use cancel::{CancelSource, CancelToken};
pub use handler::{HandlerSettings, TransferHandler};
pub use locks::{HashGuard, LockTable};
pub use outcome::{
    CopyOutcome, DeleteOptions, DeleteOutcome, DeleteScope, PeerFailure, PushOutcome,
};
