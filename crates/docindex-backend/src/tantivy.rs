//! Tantivy index backend.
//!
//! Upsert is delete-by-id followed by add, committed per flush, with
//! per-document accounting. Embeddings are stored alongside the text
//! fields as JSON so documents round-trip through this backend too.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::OnceLock;
use tantivy::collector::Count;
use tantivy::query::TermQuery;
use tantivy::schema::{Field, IndexRecordOption, Schema, STORED, STRING, TEXT};
use tantivy::{doc, Index, Term};
use tracing::{info, warn};

use docindex_core::error::{Error, Result};
use docindex_core::traits::IndexBackend;
use docindex_core::types::{FlushReport, IndexDocument};

const WRITER_HEAP_BYTES: usize = 50_000_000;

pub struct TantivyBackend {
    index_dir: PathBuf,
    schema: Schema,
    fields: Fields,
    index: OnceLock<Index>,
}

#[derive(Clone, Copy)]
struct Fields {
    id: Field,
    content: Field,
    category: Field,
    sourcepage: Field,
    sourcefile: Field,
    embedding: Field,
}

impl TantivyBackend {
    pub fn new(index_dir: PathBuf) -> Result<Self> {
        let (schema, fields) = build_schema()?;
        Ok(Self { index_dir, schema, fields, index: OnceLock::new() })
    }

    fn open_index(&self) -> Result<&Index> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }
        let index = if self.index_dir.join("meta.json").exists() {
            Index::open_in_dir(&self.index_dir)
                .map_err(|e| Error::Operation(format!("failed to open index: {}", e)))?
        } else {
            std::fs::create_dir_all(&self.index_dir)
                .map_err(|e| Error::Operation(format!("failed to create index dir: {}", e)))?;
            Index::create_in_dir(&self.index_dir, self.schema.clone())
                .map_err(|e| Error::Operation(format!("failed to create index: {}", e)))?
        };
        let _ = self.index.set(index);
        self.index
            .get()
            .ok_or_else(|| Error::Operation("index initialization raced".to_string()))
    }

    fn count_matching(&self, field: Field, value: &str) -> Result<usize> {
        let index = self.open_index()?;
        let reader = index
            .reader()
            .map_err(|e| Error::Operation(format!("failed to open reader: {}", e)))?;
        let searcher = reader.searcher();
        let query =
            TermQuery::new(Term::from_field_text(field, value), IndexRecordOption::Basic);
        searcher
            .search(&query, &Count)
            .map_err(|e| Error::Operation(format!("count query failed: {}", e)))
    }
}

#[async_trait]
impl IndexBackend for TantivyBackend {
    async fn ensure_index(&self) -> Result<()> {
        if self.index_dir.join("meta.json").exists() {
            info!(dir = %self.index_dir.display(), "index already exists");
        } else {
            info!(dir = %self.index_dir.display(), "creating index");
        }
        self.open_index().map(|_| ())
    }

    async fn upsert_batch(&self, docs: Vec<IndexDocument>) -> Result<FlushReport> {
        let attempted = docs.len();
        if attempted == 0 {
            return Ok(FlushReport::default());
        }
        let index = self.open_index()?;
        let mut writer: tantivy::IndexWriter = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| Error::Operation(format!("failed to open writer: {}", e)))?;
        let f = self.fields;
        let mut succeeded = 0usize;
        for d in docs {
            writer.delete_term(Term::from_field_text(f.id, &d.id));
            let embedding_json = match serde_json::to_string(&d.embedding) {
                Ok(json) => json,
                Err(e) => {
                    warn!(id = %d.id, error = %e, "failed to serialize embedding");
                    continue;
                }
            };
            let added = writer.add_document(doc!(
                f.id => d.id.clone(),
                f.content => d.content,
                f.category => d.category.unwrap_or_default(),
                f.sourcepage => d.sourcepage,
                f.sourcefile => d.sourcefile,
                f.embedding => embedding_json,
            ));
            match added {
                Ok(_) => succeeded += 1,
                Err(e) => warn!(id = %d.id, error = %e, "failed to queue document"),
            }
        }
        match writer.commit() {
            Ok(_) => Ok(FlushReport { attempted, succeeded }),
            Err(e) => {
                warn!(error = %e, "commit failed, batch not persisted");
                Ok(FlushReport { attempted, succeeded: 0 })
            }
        }
    }

    async fn remove_file(&self, source_file: &str) -> Result<usize> {
        let count = self.count_matching(self.fields.sourcefile, source_file)?;
        if count == 0 {
            return Ok(0);
        }
        let index = self.open_index()?;
        let mut writer: tantivy::IndexWriter = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| Error::Operation(format!("failed to open writer: {}", e)))?;
        writer.delete_term(Term::from_field_text(self.fields.sourcefile, source_file));
        writer
            .commit()
            .map_err(|e| Error::Operation(format!("delete commit failed: {}", e)))?;
        Ok(count)
    }
}

fn build_schema() -> Result<(Schema, Fields)> {
    let mut builder = Schema::builder();
    let id = builder.add_text_field("id", STRING | STORED);
    let content = builder.add_text_field("content", TEXT | STORED);
    let category = builder.add_text_field("category", STRING | STORED);
    let sourcepage = builder.add_text_field("sourcepage", STRING | STORED);
    let sourcefile = builder.add_text_field("sourcefile", STRING | STORED);
    let embedding = builder.add_text_field("embedding", STORED);
    let schema = builder.build();
    Ok((schema, Fields { id, content, category, sourcepage, sourcefile, embedding }))
}
