use async_trait::async_trait;

use crate::domain::{ErrorCode, Segment};

/// Transcript of one audio unit as returned by the speech engine.
#[derive(Debug, Clone)]
pub struct EngineTranscription {
    pub text: String,
    pub language: Option<String>,
    pub duration_seconds: f64,
    pub segments: Vec<Segment>,
}

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Transcribe raw audio bytes, requesting segment-level detail.
    /// `prompt` biases recognition toward domain vocabulary.
    async fn transcribe(
        &self,
        audio: &[u8],
        file_name: &str,
        language: &str,
        prompt: Option<&str>,
    ) -> Result<EngineTranscription, SpeechEngineError>;
}

/// Structured failure kinds. Adapters classify from HTTP status and typed
/// error bodies first; free-text matching is a last resort inside them.
#[derive(Debug, thiserror::Error)]
pub enum SpeechEngineError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("audio could not be decoded: {0}")]
    DecodeFailed(String),
    #[error("api request failed: {0}")]
    Api(String),
}

impl SpeechEngineError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            SpeechEngineError::RateLimited(_) => ErrorCode::RateLimit,
            SpeechEngineError::UnsupportedFormat(_) => ErrorCode::InvalidFormat,
            SpeechEngineError::DecodeFailed(_) => ErrorCode::DecodeError,
            SpeechEngineError::Api(_) => ErrorCode::OpenaiError,
        }
    }
}
