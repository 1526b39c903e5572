//! Adapters Layer - implementations of the outbound ports.

pub mod file_storage;
pub mod memory;

pub use file_storage::FsFileStorage;
pub use memory::{InMemoryFileStorage, RecordingDispatch, RecordingSink};
