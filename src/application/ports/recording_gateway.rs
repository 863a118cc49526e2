use async_trait::async_trait;

use crate::domain::ErrorCode;

/// Best-effort push of the final outcome back to the owning recording
/// record. Failures here are logged by callers and never fail the job.
#[async_trait]
pub trait RecordingGateway: Send + Sync {
    async fn push_transcript(
        &self,
        recording_id: &str,
        transcript: &str,
        duration_seconds: f64,
    ) -> Result<(), GatewayError>;

    async fn push_failure(
        &self,
        recording_id: &str,
        code: ErrorCode,
        message: &str,
    ) -> Result<(), GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("callback failed: {0}")]
    Delivery(String),
}
