use async_trait::async_trait;

use crate::domain::{
    ErrorCode, FlaggedSegment, Job, JobId, JobStatus, JobStep, TranscriptionResult,
};

/// Single source of truth for job state. The polling API reads through it;
/// each job's background task is its only writer.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), JobStoreError>;

    async fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError>;

    /// Status transition plus its audit-log entry, in one write.
    async fn transition(
        &self,
        id: JobId,
        status: JobStatus,
        progress: u8,
        message: &str,
    ) -> Result<(), JobStoreError>;

    /// Intra-stage audit entry (per-chunk milestones, chunk failures).
    async fn append_step(&self, id: JobId, step: JobStep) -> Result<(), JobStoreError>;

    async fn add_flagged_segments(
        &self,
        id: JobId,
        segments: Vec<FlaggedSegment>,
    ) -> Result<(), JobStoreError>;

    async fn complete(
        &self,
        id: JobId,
        result: TranscriptionResult,
        quality_score: u8,
    ) -> Result<(), JobStoreError>;

    async fn fail(&self, id: JobId, code: ErrorCode, message: &str) -> Result<(), JobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("invalid job mutation: {0}")]
    InvalidMutation(#[from] crate::domain::JobError),
    #[error("store backend: {0}")]
    Backend(String),
}
