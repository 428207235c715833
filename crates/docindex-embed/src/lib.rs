//! docindex-embed
//!
//! Embedder implementations behind the `docindex_core::traits::Embedder`
//! capability: an OpenAI-compatible remote provider and a deterministic
//! hashed embedder for offline runs.

pub mod hashed;
pub mod remote;

pub use hashed::HashedEmbedder;
pub use remote::RemoteEmbedder;

use docindex_core::config::IngestOptions;
use docindex_core::error::{Error, Result};
use docindex_core::traits::Embedder;

/// Build the configured embedder, failing fast on capability mismatches
/// before any I/O happens. The image flag only gates provider selection
/// here; callers decide when to request image vectors.
pub fn embedder_from_options(opts: &IngestOptions) -> Result<Box<dyn Embedder>> {
    let embedder: Box<dyn Embedder> = match opts.embed_provider.as_str() {
        "hashed" => Box::new(HashedEmbedder::new(opts.embed_dim)),
        "remote" => {
            let api_key = std::env::var("APP_EMBED_API_KEY").unwrap_or_default();
            let base_url = std::env::var("APP_EMBED_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
            Box::new(RemoteEmbedder::new(&api_key, &base_url, &opts.embed_model, opts.embed_dim)?)
        }
        other => {
            return Err(Error::InvalidConfig(format!("unknown embed provider '{}'", other)));
        }
    };
    if opts.image_embeddings && !embedder.supports_images() {
        return Err(Error::InvalidConfig(format!(
            "image embeddings enabled but provider '{}' cannot embed images",
            opts.embed_provider
        )));
    }
    Ok(embedder)
}
