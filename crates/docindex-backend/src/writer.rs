use std::sync::Arc;
use tracing::{debug, warn};

use docindex_core::error::Result;
use docindex_core::traits::IndexBackend;
use docindex_core::types::{FlushReport, IndexDocument};

/// Accumulates upsert actions and commits them in bounded batches.
///
/// A flush happens when the buffer reaches `batch_size` and once more at
/// end of stream via `finish`. Failed items inside a flush are reported,
/// never retried here.
pub struct BatchingWriter {
    backend: Arc<dyn IndexBackend>,
    batch_size: usize,
    buffer: Vec<IndexDocument>,
    total: FlushReport,
    flushes: usize,
}

impl BatchingWriter {
    pub fn new(backend: Arc<dyn IndexBackend>, batch_size: usize) -> Self {
        Self { backend, batch_size, buffer: Vec::new(), total: FlushReport::default(), flushes: 0 }
    }

    /// Queue one document; returns the flush report when this push filled
    /// the batch.
    pub async fn upsert(&mut self, doc: IndexDocument) -> Result<Option<FlushReport>> {
        self.buffer.push(doc);
        if self.buffer.len() >= self.batch_size {
            return Ok(Some(self.flush().await?));
        }
        Ok(None)
    }

    pub async fn flush(&mut self) -> Result<FlushReport> {
        if self.buffer.is_empty() {
            return Ok(FlushReport::default());
        }
        let docs = std::mem::take(&mut self.buffer);
        let report = self.backend.upsert_batch(docs).await?;
        if report.succeeded < report.attempted {
            warn!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                "partial batch failure"
            );
        } else {
            debug!(count = report.succeeded, "flushed batch");
        }
        self.total.merge(report);
        self.flushes += 1;
        Ok(report)
    }

    /// Flush the remainder and return cumulative accounting.
    pub async fn finish(mut self) -> Result<FlushReport> {
        self.flush().await?;
        Ok(self.total)
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn total(&self) -> FlushReport {
        self.total
    }
}
