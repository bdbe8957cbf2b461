//! Nimbus deployment record
//!
//! Stores what `up` actually created - resource identifiers and output
//! attributes - so `preview` can diff against reality and `destroy` knows
//! what to delete without re-discovery. Not a reconciliation engine: the
//! record is bookkeeping, resource lifecycle stays with the cloud.
//!
//! The record lives in a backend (local JSON file or S3) behind the
//! `StateBackend` trait, with expiring locks to serialize concurrent runs.

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendError, BackendResult, StateBackend};
pub use backends::create_backend;
pub use lock::LockInfo;
pub use state::{ResourceRecord, StateFile};
