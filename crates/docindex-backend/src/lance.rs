//! LanceDB index backend.
//!
//! Documents are upserted with a merge-insert keyed on `id`, so re-delivery
//! of the same section is last-write-wins. All store operations run through
//! the shared [`ResilientConnection`].

use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use lancedb::{connect, Connection};
use std::sync::Arc;
use tracing::{info, warn};

use docindex_core::error::{Error, Result};
use docindex_core::traits::IndexBackend;
use docindex_core::types::{FlushReport, IndexDocument};

use crate::resilient::{ReconnectPolicy, ResilientConnection};

pub struct LanceBackend {
    conn: ResilientConnection<Connection>,
    table_name: String,
    dim: usize,
}

impl LanceBackend {
    pub async fn new(uri: &str, table_name: &str, dim: usize, policy: ReconnectPolicy) -> Result<Self> {
        let uri = uri.to_string();
        let conn = ResilientConnection::connect(
            Box::new(move || {
                let uri = uri.clone();
                Box::pin(async move { connect(&uri).execute().await.map_err(classify_lance) })
            }),
            policy,
        )
        .await?;
        Ok(Self { conn, table_name: table_name.to_string(), dim })
    }

    fn schema(&self) -> Arc<Schema> {
        build_index_schema(self.dim)
    }

    fn docs_to_record_batch(&self, docs: &[IndexDocument]) -> Result<RecordBatch> {
        let mut ids = Vec::new();
        let mut contents = Vec::new();
        let mut categories: Vec<Option<String>> = Vec::new();
        let mut sourcepages = Vec::new();
        let mut sourcefiles = Vec::new();
        let mut embeddings: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        let mut image_embeddings: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for doc in docs {
            ids.push(doc.id.clone());
            contents.push(doc.content.clone());
            categories.push(doc.category.clone());
            sourcepages.push(doc.sourcepage.clone());
            sourcefiles.push(doc.sourcefile.clone());
            embeddings.push(Some(doc.embedding.iter().map(|&x| Some(x)).collect()));
            image_embeddings
                .push(doc.image_embedding.as_ref().map(|v| v.iter().map(|&x| Some(x)).collect()));
        }
        RecordBatch::try_new(
            self.schema(),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(contents)),
                Arc::new(StringArray::from(categories)),
                Arc::new(StringArray::from(sourcepages)),
                Arc::new(StringArray::from(sourcefiles)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                    embeddings.into_iter(),
                    self.dim as i32,
                )),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                    image_embeddings.into_iter(),
                    self.dim as i32,
                )),
            ],
        )
        .map_err(|e| Error::Operation(format!("failed to build record batch: {}", e)))
    }
}

#[async_trait]
impl IndexBackend for LanceBackend {
    async fn ensure_index(&self) -> Result<()> {
        let table_name = self.table_name.clone();
        let schema = self.schema();
        self.conn
            .execute(move |conn| {
                let table_name = table_name.clone();
                let schema = schema.clone();
                async move {
                    let names =
                        conn.table_names().execute().await.map_err(classify_lance)?;
                    if names.contains(&table_name) {
                        info!(table = %table_name, "index table already exists");
                        return Ok(());
                    }
                    // create empty table with 0 rows
                    let iter = RecordBatchIterator::new(vec![].into_iter(), schema);
                    conn.create_table(&table_name, Box::new(iter))
                        .execute()
                        .await
                        .map_err(classify_lance)?;
                    info!(table = %table_name, "created index table");
                    Ok(())
                }
            })
            .await
    }

    async fn upsert_batch(&self, docs: Vec<IndexDocument>) -> Result<FlushReport> {
        let attempted = docs.len();
        if attempted == 0 {
            return Ok(FlushReport::default());
        }
        // Documents with a wrong-dimension vector can never be stored; they
        // count as attempted-but-failed rather than poisoning the batch.
        let (valid, rejected): (Vec<_>, Vec<_>) = docs
            .into_iter()
            .partition(|d| d.embedding.len() == self.dim
                && d.image_embedding.as_ref().map_or(true, |v| v.len() == self.dim));
        for doc in &rejected {
            warn!(id = %doc.id, "rejected document with mismatched embedding dimension");
        }
        if valid.is_empty() {
            return Ok(FlushReport { attempted, succeeded: 0 });
        }

        let batch = self.docs_to_record_batch(&valid)?;
        let schema = self.schema();
        let table_name = self.table_name.clone();
        let committed = self
            .conn
            .execute(move |conn| {
                let batch = batch.clone();
                let schema = schema.clone();
                let table_name = table_name.clone();
                async move {
                    let table = conn
                        .open_table(&table_name)
                        .execute()
                        .await
                        .map_err(classify_lance)?;
                    let mut mi = table.merge_insert(&["id"]);
                    mi.when_matched_update_all(None).when_not_matched_insert_all();
                    let reader =
                        Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
                    mi.execute(reader).await.map_err(classify_lance)?;
                    Ok(())
                }
            })
            .await;

        match committed {
            Ok(()) => Ok(FlushReport { attempted, succeeded: valid.len() }),
            Err(err) if err.is_transient() => Err(err),
            Err(err) => {
                warn!(error = %err, "merge insert failed, batch not committed");
                Ok(FlushReport { attempted, succeeded: 0 })
            }
        }
    }

    async fn remove_file(&self, source_file: &str) -> Result<usize> {
        let table_name = self.table_name.clone();
        let filter = format!("sourcefile = '{}'", source_file.replace('\'', "''"));
        self.conn
            .execute(move |conn| {
                let table_name = table_name.clone();
                let filter = filter.clone();
                async move {
                    let table = conn
                        .open_table(&table_name)
                        .execute()
                        .await
                        .map_err(classify_lance)?;
                    let count = table
                        .count_rows(Some(filter.clone()))
                        .await
                        .map_err(classify_lance)?;
                    table.delete(&filter).await.map_err(classify_lance)?;
                    Ok(count)
                }
            })
            .await
    }
}

pub fn build_index_schema(dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, true),
        Field::new("sourcepage", DataType::Utf8, false),
        Field::new("sourcefile", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32),
            true,
        ),
        Field::new(
            "image_embedding",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32),
            true,
        ),
    ]))
}

fn classify_lance(err: lancedb::Error) -> Error {
    let msg = err.to_string();
    let lowered = msg.to_lowercase();
    if lowered.contains("connection")
        || lowered.contains("socket")
        || lowered.contains("disposed")
        || lowered.contains("io error")
    {
        Error::Connection(msg)
    } else {
        Error::Operation(msg)
    }
}
