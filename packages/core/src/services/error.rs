//! Service Layer Error Types
//!
//! Error types for the write-transport seam. The decode engine itself never
//! fails a whole batch; these errors describe what the native store's
//! writer can report back.

use thiserror::Error;

/// Errors reported by the native store's record writer
///
/// Raised by [`RecordWriter`](crate::services::RecordWriter)
/// implementations; the write service folds them into per-item failures
/// rather than propagating them past the batch boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    /// The store is not bound or not reachable
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected the submitted records
    #[error("store rejected the write: {reason}")]
    Rejected { reason: String },

    /// The store returned a different number of ids than records submitted
    #[error("store returned {returned} ids for {submitted} records")]
    IdCountMismatch { submitted: usize, returned: usize },
}

impl WriteError {
    /// Create a store unavailable error
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a rejected error
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
