//! docindex-core
//!
//! Domain types, capability traits, errors, and configuration shared by the
//! extraction, embedding, corpus, and backend crates.

pub mod analysis;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
