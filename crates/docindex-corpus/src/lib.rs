//! docindex-corpus
//!
//! Durable per-page corpus snapshot: an `ObjectStore` filesystem
//! implementation plus the idempotent archiver that feeds it.

pub mod archiver;
pub mod fs_store;

pub use archiver::CorpusArchiver;
pub use fs_store::FsObjectStore;
