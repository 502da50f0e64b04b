mod error;
mod memory;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use memory::MemoryObjectStore;
pub use traits::{ObjectStore, object_key};
