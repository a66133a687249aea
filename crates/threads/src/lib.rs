//! Thread store implementations for Gena.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::FileThreadStore;
pub use in_memory::InMemoryThreadStore;
