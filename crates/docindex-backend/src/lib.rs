//! docindex-backend
//!
//! Interchangeable index targets behind `IndexBackend`: LanceDB (vectors,
//! merge-insert upsert through a resilient connection) and Tantivy (text,
//! delete-then-add upsert), plus the batching writer and the backend
//! registry the pipeline selects from.

pub mod lance;
pub mod registry;
pub mod resilient;
pub mod tantivy;
pub mod writer;

pub use lance::LanceBackend;
pub use registry::{BackendKind, BackendRegistry, IngestTarget, TargetFactory};
pub use resilient::{ReconnectPolicy, ResilientConnection};
pub use self::tantivy::TantivyBackend;
pub use writer::BatchingWriter;
