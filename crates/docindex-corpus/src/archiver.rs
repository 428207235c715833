use std::sync::Arc;
use tracing::debug;

use docindex_core::error::Result;
use docindex_core::traits::ObjectStore;

/// Persists raw per-page text into the durable corpus, idempotently.
///
/// Re-running ingestion on the same file never duplicates or overwrites
/// corpus objects: an existing object with the same name is treated as
/// success and only logged.
pub struct CorpusArchiver {
    store: Arc<dyn ObjectStore>,
}

impl CorpusArchiver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn archive(&self, name: &str, text: &str) -> Result<()> {
        if self.store.exists(name).await? {
            debug!(object = name, "corpus object already archived, skipping");
            return Ok(());
        }
        self.store.upload(name, text.as_bytes(), "text/plain").await
    }
}
