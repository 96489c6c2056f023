pub mod storage;

pub use storage::{ContentHash, StorageError};
