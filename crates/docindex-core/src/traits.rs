use async_trait::async_trait;

use crate::error::Result;
use crate::types::{FlushReport, IndexDocument};

/// Layout analysis for a raw document byte stream.
///
/// Implementations return per-page content spans plus detected table
/// geometry; the pipeline treats them as opaque external capabilities.
/// Any analyzer error is fatal for the whole file, no partial pages.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, bytes: &[u8]) -> Result<crate::analysis::AnalyzeResult>;
}

/// Embedding generation for section text and image references.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hashed:d1536`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Whether `embed_image` is available on this provider.
    fn supports_images(&self) -> bool {
        false
    }
    /// Compute embeddings for a batch of input texts, one vector per input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    /// Compute an embedding for an image reference (URL or path).
    async fn embed_image(&self, image_ref: &str) -> Result<Vec<f32>> {
        let _ = image_ref;
        Err(crate::error::Error::InvalidConfig(
            "image embeddings are not supported by this provider".to_string(),
        ))
    }
}

/// Durable object store used for the raw per-page corpus snapshot.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool>;
    async fn upload(&self, name: &str, bytes: &[u8], content_type: &str) -> Result<()>;
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>>;
    async fn delete(&self, name: &str) -> Result<()>;
}

/// A search/vector-store target the pipeline can commit documents to.
///
/// Upserts are keyed on the document id, so re-delivery is safe and order
/// across sections of the same file does not matter.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// Create the target index/table if it does not already exist.
    /// Existing indexes are an informational no-op, never an error.
    async fn ensure_index(&self) -> Result<()>;
    /// Commit one batch of documents, reporting per-batch accounting.
    /// Failures inside a batch are counted, not retried.
    async fn upsert_batch(&self, docs: Vec<IndexDocument>) -> Result<FlushReport>;
    /// Remove every document that came from `source_file`, returning the
    /// number of documents removed.
    async fn remove_file(&self, source_file: &str) -> Result<usize>;
}
