pub mod gateway;
pub mod json_store;
pub mod kv;
pub mod schema;

pub use gateway::{Gateway, Snapshot};
pub use json_store::JsonStore;
pub use kv::{KeyValueStore, MemoryStore, StorageError, StorageResult};
