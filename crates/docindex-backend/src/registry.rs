use futures::future::BoxFuture;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use docindex_core::error::{Error, Result};
use docindex_core::traits::{Embedder, IndexBackend};

/// The closed set of interchangeable index targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Lance,
    Tantivy,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lance" => Ok(BackendKind::Lance),
            "tantivy" => Ok(BackendKind::Tantivy),
            other => Err(Error::InvalidConfig(format!("unknown backend '{}'", other))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Lance => write!(f, "lance"),
            BackendKind::Tantivy => write!(f, "tantivy"),
        }
    }
}

/// Everything one ingestion run needs from its chosen backend.
pub struct IngestTarget {
    pub backend: Arc<dyn IndexBackend>,
    pub embedder: Arc<dyn Embedder>,
}

impl fmt::Debug for IngestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestTarget").finish_non_exhaustive()
    }
}

pub type TargetFactory = Box<dyn Fn() -> BoxFuture<'static, Result<IngestTarget>> + Send + Sync>;

/// Maps backend identifiers to their single registered factory.
///
/// Selection fails fast on an unknown identifier and on ambiguous
/// configuration (two factories registered for the same kind).
#[derive(Default)]
pub struct BackendRegistry {
    entries: Vec<(BackendKind, TargetFactory)>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: BackendKind, factory: TargetFactory) -> &mut Self {
        self.entries.push((kind, factory));
        self
    }

    pub async fn select(&self, kind: BackendKind) -> Result<IngestTarget> {
        let mut matches = self.entries.iter().filter(|(k, _)| *k == kind);
        let Some((_, factory)) = matches.next() else {
            return Err(Error::InvalidConfig(format!("no backend registered for '{}'", kind)));
        };
        if matches.next().is_some() {
            return Err(Error::InvalidConfig(format!(
                "ambiguous configuration: multiple backends registered for '{}'",
                kind
            )));
        }
        factory().await
    }
}
