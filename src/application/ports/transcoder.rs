use async_trait::async_trait;

use crate::domain::{AudioChunk, JobId};

/// Request to the external transcode-and-split collaborator.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    pub source_url: String,
    pub job_id: JobId,
    pub chunk_duration_sec: u32,
    pub overlap_sec: u32,
    pub output_format: String,
    pub target_bitrate: String,
}

/// The collaborator either normalizes the whole file into one transcribable
/// unit or splits it into ordered chunks.
#[derive(Debug, Clone)]
pub enum TranscodeOutcome {
    Normalized {
        url: String,
        duration_sec: Option<f64>,
    },
    Chunks(Vec<AudioChunk>),
}

#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode_and_split(
        &self,
        request: &TranscodeRequest,
    ) -> Result<TranscodeOutcome, TranscoderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscoderError {
    #[error("transcoding service unreachable: {0}")]
    Unavailable(String),
    #[error("transcoding failed: {0}")]
    Failed(String),
}
