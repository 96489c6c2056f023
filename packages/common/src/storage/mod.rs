mod error;
mod hash;
mod json;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StorageError;
pub use hash::ContentHash;
pub use json::JsonFileStore;
pub use traits::{BoxReader, FileStore, validate_name};
