use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Connection-class failures are the only ones the resilient wrapper
    /// retries; everything else propagates immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
