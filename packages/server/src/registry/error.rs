use common::{ContentHash, StorageError};
use thiserror::Error;

use super::fetch::FetchError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("No local file and no known contributor link for dataset {0}")]
    NoSource(String),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Why a contributor's copy was not accepted.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Error fetching contributor file: {0}")]
    Fetch(#[from] FetchError),

    #[error("File hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        expected: ContentHash,
        actual: ContentHash,
    },
}
