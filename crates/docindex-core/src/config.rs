//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! and exposes the typed ingest options with fail-fast validation.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract the typed ingest options (under the `ingest` key), falling
    /// back to defaults when the key is absent, then validate them.
    pub fn ingest_options(&self) -> anyhow::Result<IngestOptions> {
        let opts: IngestOptions = self.figment.extract_inner("ingest").unwrap_or_default();
        opts.validate()?;
        Ok(opts)
    }
}

/// Tunables for the splitting and indexing pipeline.
///
/// Defaults match the production constants; all of them are overridable via
/// `config.toml` / `APP_INGEST_*`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    pub max_section_length: usize,
    pub sentence_search_limit: usize,
    pub section_overlap: usize,
    pub batch_size: usize,
    pub backend: String,
    pub embed_provider: String,
    pub embed_model: String,
    pub embed_dim: usize,
    /// Requires an image-capable provider; checked at startup. The text
    /// ingest path never requests image vectors itself, so this gates
    /// provider selection for pipelines that attach them downstream.
    pub image_embeddings: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_section_length: 1000,
            sentence_search_limit: 100,
            section_overlap: 100,
            batch_size: 1000,
            backend: "lance".to_string(),
            embed_provider: "hashed".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            embed_dim: 1536,
            image_embeddings: false,
        }
    }
}

impl IngestOptions {
    /// Fails fast before any I/O when the options cannot produce a working
    /// pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.max_section_length == 0 {
            return Err(Error::InvalidConfig("max_section_length must be > 0".into()));
        }
        if self.section_overlap >= self.max_section_length {
            return Err(Error::InvalidConfig(format!(
                "section_overlap {} must be smaller than max_section_length {}",
                self.section_overlap, self.max_section_length
            )));
        }
        if self.sentence_search_limit == 0 {
            return Err(Error::InvalidConfig("sentence_search_limit must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".into()));
        }
        if self.embed_dim == 0 {
            return Err(Error::InvalidConfig("embed_dim must be > 0".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
