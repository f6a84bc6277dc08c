use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Transient IO error: {0}")]
    TransientIo(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IngestError {
    /// Whether a bounded-backoff retry is worth attempting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::TransientIo(_))
    }
}
