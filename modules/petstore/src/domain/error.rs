//! Domain-level errors for the petstore services.

use petstore_db::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Storage-layer failure, already classified by condition.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Payload rejected before any storage work.
    #[error("validation error: {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}
