use chrono::{DateTime, Utc};

use super::{ErrorCode, FlaggedSegment, JobId, JobStatus, JobStep, TranscriptionResult};

/// The aggregate root for one transcription request. Mutated only through
/// the methods below, which enforce the lifecycle invariants: forward-only
/// status transitions, monotonically non-decreasing progress, append-only
/// step log, and a single terminal write.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub steps: Vec<JobStep>,
    pub audio_url: String,
    pub language: String,
    pub recording_id: Option<String>,
    pub optimize_for: Option<String>,
    pub result: Option<TranscriptionResult>,
    pub error: Option<String>,
    pub error_code: Option<ErrorCode>,
    pub flagged_segments: Vec<FlaggedSegment>,
    pub quality_score: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    #[error("job is already terminal ({0})")]
    AlreadyTerminal(JobStatus),
}

impl Job {
    pub fn new(
        audio_url: String,
        language: String,
        recording_id: Option<String>,
        optimize_for: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            progress: 0,
            steps: vec![JobStep::new("created", "Job created", 0)],
            audio_url,
            language,
            recording_id,
            optimize_for,
            result: None,
            error: None,
            error_code: None,
            flagged_segments: Vec::new(),
            quality_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `status`, appending a step entry. Progress never decreases.
    pub fn transition(
        &mut self,
        status: JobStatus,
        progress: u8,
        message: &str,
    ) -> Result<(), JobError> {
        if !self.status.can_transition_to(status) {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.progress = self.progress.max(progress);
        self.steps
            .push(JobStep::new(status.as_str(), message, self.progress));
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Append an intra-stage step (per-chunk milestones and the like).
    pub fn record_step(&mut self, step: JobStep) -> Result<(), JobError> {
        if self.is_terminal() {
            return Err(JobError::AlreadyTerminal(self.status));
        }
        self.progress = self.progress.max(step.progress);
        let mut step = step;
        step.progress = self.progress;
        self.steps.push(step);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn add_flagged_segments(
        &mut self,
        mut segments: Vec<FlaggedSegment>,
    ) -> Result<(), JobError> {
        if self.is_terminal() {
            return Err(JobError::AlreadyTerminal(self.status));
        }
        self.flagged_segments.append(&mut segments);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Terminal success write. Rejected if the job already finished.
    pub fn complete(
        &mut self,
        result: TranscriptionResult,
        quality_score: u8,
    ) -> Result<(), JobError> {
        self.transition(JobStatus::Completed, 100, "Transcription completed")?;
        self.result = Some(result);
        self.quality_score = Some(quality_score);
        Ok(())
    }

    /// Terminal failure write. Rejected if the job already finished, so a
    /// second failure path can never clobber the first terminal state.
    pub fn fail(&mut self, code: ErrorCode, message: &str) -> Result<(), JobError> {
        if self.is_terminal() {
            return Err(JobError::AlreadyTerminal(self.status));
        }
        self.status = JobStatus::Failed;
        self.error = Some(message.to_string());
        self.error_code = Some(code);
        self.steps
            .push(JobStep::new("failed", message, self.progress));
        self.updated_at = Utc::now();
        Ok(())
    }
}
