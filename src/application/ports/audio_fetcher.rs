use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FetchedAudio {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Downloads source audio (and chunk audio) with a bounded timeout.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedAudio, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("download timed out after {0}s")]
    Timeout(u64),
    #[error("download failed with HTTP status {0}")]
    Status(u16),
    #[error("download failed: {0}")]
    Network(String),
}
