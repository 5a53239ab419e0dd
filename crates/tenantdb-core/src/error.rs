//! Domain error types.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed driver error carried through unchanged.
pub type BackendError = Box<dyn StdError + Send + Sync + 'static>;

/// Top-level error type carried by every repository outcome.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An entity or aggregate was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A caller precondition was not met (e.g. an empty tenant identifier).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The filter event stream broke the compiler contract.
    #[error("filter contract violation: {0}")]
    ContractViolation(String),

    /// The filter, sort or paging arguments could not be interpreted.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// An event was appended at a sequence number that already exists.
    #[error(
        "concurrency conflict on aggregate {aggregate_id} of tenant {tenant_id}: sequence number {sequence_number} already exists"
    )]
    ConcurrencyConflict {
        /// The tenant owning the aggregate.
        tenant_id: String,
        /// The aggregate that had the conflict.
        aggregate_id: String,
        /// The sequence number that collided.
        sequence_number: u64,
    },

    /// A validation error in request payloads.
    #[error("validation error: {0}")]
    Validation(String),

    /// The storage backend reported an error.
    #[error("backend error: {0}")]
    Backend(#[source] BackendError),

    /// An encoding or decoding failure inside the data-access layer.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Wraps a driver error without altering it.
    pub fn backend(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    /// Returns `true` for the not-found kind.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Infrastructure(format!("serialization failed: {err}"))
    }
}
