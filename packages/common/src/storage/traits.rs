use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Storage for locally hosted files, addressed by a flat file name.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under `name`, replacing any previous content.
    async fn put(&self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes of a file.
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(name).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a file as a streaming async reader.
    async fn get_stream(&self, name: &str) -> Result<BoxReader, StorageError>;

    /// Check whether a file exists.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Get the size of a file in bytes.
    async fn size(&self, name: &str) -> Result<u64, StorageError>;
}

/// Reject names that could escape the store root or break response headers.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(|c| c.is_control());
    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
