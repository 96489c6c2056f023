use std::collections::HashMap;
use std::io::Cursor;
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::StorageError;
use super::traits::{BoxReader, FileStore, validate_name};

/// In-memory file store, used where a disk-backed store is unnecessary.
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StorageError {
        StorageError::Io(std::io::Error::other("memory store lock poisoned"))
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        validate_name(name)?;
        let mut files = self.files.write().map_err(|_| Self::poisoned())?;
        files.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_stream(&self, name: &str) -> Result<BoxReader, StorageError> {
        validate_name(name)?;
        let files = self.files.read().map_err(|_| Self::poisoned())?;
        let data = files
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        validate_name(name)?;
        let files = self.files.read().map_err(|_| Self::poisoned())?;
        Ok(files.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        validate_name(name)?;
        let mut files = self.files.write().map_err(|_| Self::poisoned())?;
        Ok(files.remove(name).is_some())
    }

    async fn size(&self, name: &str) -> Result<u64, StorageError> {
        validate_name(name)?;
        let files = self.files.read().map_err(|_| Self::poisoned())?;
        files
            .get(name)
            .map(|data| data.len() as u64)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }
}
