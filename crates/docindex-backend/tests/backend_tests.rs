use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docindex_backend::{
    BackendKind, BackendRegistry, BatchingWriter, IngestTarget, ReconnectPolicy,
    ResilientConnection,
};
use docindex_core::error::{Error, Result};
use docindex_core::traits::{Embedder, IndexBackend};
use docindex_core::types::{FlushReport, IndexDocument};
use docindex_embed::HashedEmbedder;

struct MockBackend {
    batch_sizes: Mutex<Vec<usize>>,
    fail_per_batch: usize,
}

impl MockBackend {
    fn new(fail_per_batch: usize) -> Self {
        Self { batch_sizes: Mutex::new(Vec::new()), fail_per_batch }
    }
}

#[async_trait]
impl IndexBackend for MockBackend {
    async fn ensure_index(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_batch(&self, docs: Vec<IndexDocument>) -> Result<FlushReport> {
        let attempted = docs.len();
        self.batch_sizes.lock().expect("lock").push(attempted);
        Ok(FlushReport { attempted, succeeded: attempted.saturating_sub(self.fail_per_batch) })
    }

    async fn remove_file(&self, _source_file: &str) -> Result<usize> {
        Ok(0)
    }
}

fn doc(i: usize) -> IndexDocument {
    IndexDocument {
        id: format!("file_pdf-{}", i),
        content: format!("section {}", i),
        category: None,
        sourcepage: "file-0.txt".to_string(),
        sourcefile: "file.pdf".to_string(),
        embedding: vec![0.1, 0.2],
        image_embedding: None,
    }
}

#[tokio::test]
async fn twenty_five_hundred_upserts_flush_in_three_batches() {
    let backend = Arc::new(MockBackend::new(0));
    let mut writer = BatchingWriter::new(backend.clone(), 1000);
    for i in 0..2500 {
        writer.upsert(doc(i)).await.expect("upsert");
    }
    let total = writer.finish().await.expect("finish");
    assert_eq!(*backend.batch_sizes.lock().expect("lock"), vec![1000, 1000, 500]);
    assert_eq!(total, FlushReport { attempted: 2500, succeeded: 2500 });
}

#[tokio::test]
async fn partial_failures_are_reported_not_thrown() {
    let backend = Arc::new(MockBackend::new(2));
    let mut writer = BatchingWriter::new(backend, 10);
    let mut mid_report = None;
    for i in 0..10 {
        if let Some(report) = writer.upsert(doc(i)).await.expect("upsert") {
            mid_report = Some(report);
        }
    }
    assert_eq!(mid_report, Some(FlushReport { attempted: 10, succeeded: 8 }));
    let total = writer.finish().await.expect("finish");
    assert_eq!(total, FlushReport { attempted: 10, succeeded: 8 });
}

#[tokio::test]
async fn empty_finish_flushes_nothing() {
    let backend = Arc::new(MockBackend::new(0));
    let writer = BatchingWriter::new(backend.clone(), 1000);
    let total = writer.finish().await.expect("finish");
    assert_eq!(total, FlushReport::default());
    assert!(backend.batch_sizes.lock().expect("lock").is_empty());
}

fn target_factory() -> docindex_backend::TargetFactory {
    Box::new(|| {
        Box::pin(async {
            Ok(IngestTarget {
                backend: Arc::new(MockBackend::new(0)) as Arc<dyn IndexBackend>,
                embedder: Arc::new(HashedEmbedder::new(8)) as Arc<dyn Embedder>,
            })
        })
    })
}

#[tokio::test]
async fn registry_selects_registered_backend() {
    let mut registry = BackendRegistry::new();
    registry.register(BackendKind::Lance, target_factory());
    let target = registry.select(BackendKind::Lance).await.expect("select");
    assert_eq!(target.embedder.dim(), 8);
}

#[tokio::test]
async fn registry_rejects_unknown_and_ambiguous_kinds() {
    let mut registry = BackendRegistry::new();
    registry.register(BackendKind::Lance, target_factory());
    assert!(registry.select(BackendKind::Tantivy).await.is_err());

    registry.register(BackendKind::Lance, target_factory());
    let err = registry.select(BackendKind::Lance).await.expect_err("ambiguous");
    assert!(err.to_string().contains("ambiguous"));
}

#[test]
fn backend_kind_parses_known_identifiers_only() {
    assert_eq!("lance".parse::<BackendKind>().expect("parse"), BackendKind::Lance);
    assert_eq!("tantivy".parse::<BackendKind>().expect("parse"), BackendKind::Tantivy);
    assert!("qdrant".parse::<BackendKind>().is_err());
}

fn counting_connector(counter: Arc<AtomicUsize>) -> docindex_backend::resilient::ConnectFn<usize> {
    Box::new(move || {
        let counter = counter.clone();
        Box::pin(async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) })
    })
}

#[tokio::test]
async fn retry_cap_bounds_attempts_without_reconnecting() {
    let connects = Arc::new(AtomicUsize::new(0));
    let policy = ReconnectPolicy {
        max_attempts: 5,
        min_reconnect_interval: Duration::from_secs(60),
        error_threshold: Duration::from_secs(30),
    };
    let conn = ResilientConnection::connect(counting_connector(connects.clone()), policy)
        .await
        .expect("connect");

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_in_op = attempts.clone();
    let result: Result<()> = conn
        .execute(move |_c| {
            let attempts = attempts_in_op.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::Connection("socket closed".to_string()))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    // errors persisted for far less than the threshold: same physical connection
    assert_eq!(connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_transient_errors_propagate_immediately() {
    let connects = Arc::new(AtomicUsize::new(0));
    let conn = ResilientConnection::connect(
        counting_connector(connects.clone()),
        ReconnectPolicy::default(),
    )
    .await
    .expect("connect");

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_in_op = attempts.clone();
    let result: Result<()> = conn
        .execute(move |_c| {
            let attempts = attempts_in_op.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::Operation("bad request".to_string()))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sustained_errors_past_threshold_trigger_exactly_one_reconnect() {
    let connects = Arc::new(AtomicUsize::new(0));
    let policy = ReconnectPolicy {
        max_attempts: 5,
        min_reconnect_interval: Duration::from_millis(1),
        error_threshold: Duration::from_millis(30),
    };
    let conn = ResilientConnection::connect(counting_connector(connects.clone()), policy)
        .await
        .expect("connect");

    // generation 1 keeps failing; the burst is shorter than the threshold,
    // so no reconnect happens yet
    let op = |c: Arc<usize>| async move {
        if *c == 1 {
            Err(Error::Connection("socket closed".to_string()))
        } else {
            Ok(*c)
        }
    };
    assert!(conn.execute(op).await.is_err());
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    // errors are still arriving once the threshold has elapsed: one
    // reconnect, and subsequent calls land on the new connection
    tokio::time::sleep(Duration::from_millis(40)).await;
    let generation = conn.execute(op).await.expect("recovers on fresh connection");
    assert_eq!(generation, 2);
    assert_eq!(connects.load(Ordering::SeqCst), 2);

    let again = conn.execute(op).await.expect("stays on new connection");
    assert_eq!(again, 2);
    assert_eq!(connects.load(Ordering::SeqCst), 2);
}
