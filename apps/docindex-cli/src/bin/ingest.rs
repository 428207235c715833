use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, process};

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use docindex_backend::{
    BackendKind, BackendRegistry, BatchingWriter, IngestTarget, LanceBackend, ReconnectPolicy,
    TantivyBackend, TargetFactory,
};
use docindex_core::config::{Config, IngestOptions};
use docindex_core::traits::{Embedder, IndexBackend, ObjectStore};
use docindex_core::types::{corpus_object_name, IndexDocument};
use docindex_corpus::{CorpusArchiver, FsObjectStore};
use docindex_embed::embedder_from_options;
use docindex_extract::{PageExtractor, PlainTextAnalyzer, SectionSplitter};

const EMBED_SUB_BATCH: usize = 16;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let opts = config.ingest_options()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_dir = None;
    let mut backend_arg = None;
    let mut remove = None;
    let mut category = None;
    let mut limit = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--backend" | "-b" => {
                backend_arg = take_value(&args, &mut i, "--backend");
            }
            "--remove" | "-r" => {
                remove = take_value(&args, &mut i, "--remove");
            }
            "--category" | "-c" => {
                category = take_value(&args, &mut i, "--category");
            }
            "--limit" => match take_value(&args, &mut i, "--limit").map(|v| v.parse::<usize>()) {
                Some(Ok(n)) => limit = Some(n),
                _ => {
                    eprintln!("Error: --limit requires a number");
                    process::exit(1);
                }
            },
            _ if !args[i].starts_with('-') => data_dir = Some(PathBuf::from(&args[i])),
            other => {
                eprintln!("Error: unknown flag '{}'", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let corpus_dir: String =
        config.get("data.corpus_dir").unwrap_or_else(|_| "./data/corpus".to_string());
    let kind: BackendKind = backend_arg.unwrap_or_else(|| opts.backend.clone()).parse()?;

    let mut registry = BackendRegistry::new();
    register_targets(&mut registry, &config, &opts)?;
    let target = registry.select(kind).await?;
    target.backend.ensure_index().await?;

    let store: Arc<dyn ObjectStore> =
        Arc::new(FsObjectStore::new(Path::new(&corpus_dir)).await?);

    if let Some(file) = remove {
        let removed = target.backend.remove_file(&file).await?;
        let stem = file_stem(Path::new(&file), &file);
        let pages = store.list(Some(&format!("{}-", stem))).await?;
        for name in &pages {
            store.delete(name).await?;
        }
        println!("Removed {} indexed sections and {} corpus pages for {}", removed, pages.len(), file);
        return Ok(());
    }

    let data_dir = data_dir.unwrap_or_else(|| {
        let dir: String = config.get("data.raw_txt_dir").unwrap_or_else(|_| "./data/txt".to_string());
        PathBuf::from(dir)
    });
    println!("Document Ingest ({} backend)\n============================", kind);
    println!("Data directory: {}", data_dir.display());

    let mut files: Vec<PathBuf> = WalkDir::new(&data_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    if let Some(limit) = limit {
        println!("🔢 Limiting ingestion to {} files", limit);
        files.truncate(limit);
    }

    let archiver = CorpusArchiver::new(store);
    let extractor = PageExtractor::new(PlainTextAnalyzer);
    let splitter = SectionSplitter::new(&opts);
    let mut writer = BatchingWriter::new(target.backend.clone(), opts.batch_size);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
    let mut section_count = 0usize;
    for path in &files {
        let source_file = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        pb.set_message(source_file.clone());

        let bytes = tokio::fs::read(path).await?;
        let pages = extractor.extract(&bytes).await?;

        let stem = file_stem(path, &source_file);
        for page in &pages {
            archiver.archive(&corpus_object_name(&stem, page.index), &page.text).await?;
        }

        let sections: Vec<_> = splitter.split(&pages, &source_file, category.as_deref()).collect();
        section_count += sections.len();
        for chunk in sections.chunks(EMBED_SUB_BATCH) {
            let texts: Vec<String> = chunk.iter().map(|s| s.content.clone()).collect();
            let vectors = target.embedder.embed_batch(&texts).await?;
            for (section, embedding) in chunk.iter().zip(vectors) {
                writer.upsert(IndexDocument::from_section(section, embedding)).await?;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let total = writer.finish().await?;
    println!("\n✅ Ingestion completed");
    println!("📊 {} files, {} sections", files.len(), section_count);
    println!("📊 {} documents committed ({} attempted)", total.succeeded, total.attempted);
    if total.succeeded < total.attempted {
        println!("⚠️  {} documents failed to commit, see logs", total.attempted - total.succeeded);
    }
    Ok(())
}

fn register_targets(
    registry: &mut BackendRegistry,
    config: &Config,
    opts: &IngestOptions,
) -> anyhow::Result<()> {
    let embedder: Arc<dyn Embedder> = Arc::from(embedder_from_options(opts)?);

    let lance_dir: String = config
        .get("data.lancedb_index_dir")
        .unwrap_or_else(|_| "./data/indexes/lancedb".to_string());
    registry.register(
        BackendKind::Lance,
        lance_factory(lance_dir, opts.embed_dim, embedder.clone()),
    );

    let tantivy_dir: String = config
        .get("data.tantivy_index_dir")
        .unwrap_or_else(|_| "./data/indexes/tantivy".to_string());
    registry.register(BackendKind::Tantivy, tantivy_factory(PathBuf::from(tantivy_dir), embedder));
    Ok(())
}

fn lance_factory(uri: String, dim: usize, embedder: Arc<dyn Embedder>) -> TargetFactory {
    Box::new(move || {
        let uri = uri.clone();
        let embedder = embedder.clone();
        Box::pin(async move {
            let backend = LanceBackend::new(&uri, "sections", dim, ReconnectPolicy::default()).await?;
            Ok(IngestTarget { backend: Arc::new(backend) as Arc<dyn IndexBackend>, embedder })
        })
    })
}

fn tantivy_factory(dir: PathBuf, embedder: Arc<dyn Embedder>) -> TargetFactory {
    Box::new(move || {
        let dir = dir.clone();
        let embedder = embedder.clone();
        Box::pin(async move {
            let backend = TantivyBackend::new(dir)?;
            Ok(IngestTarget { backend: Arc::new(backend) as Arc<dyn IndexBackend>, embedder })
        })
    })
}

fn file_stem(path: &Path, fallback: &str) -> String {
    path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| fallback.to_string())
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Option<String> {
    if *i + 1 < args.len() {
        *i += 1;
        Some(args[*i].clone())
    } else {
        eprintln!("Error: {} requires a value", flag);
        process::exit(1);
    }
}
