mod file;
pub mod keys;
mod kv;

pub use file::FileStore;
pub use kv::{KvStore, MemoryStore};
