use std::fmt;
use std::str::FromStr;

/// Lifecycle of a transcription job. Transitions only move forward, except
/// for the universal escape to `Failed` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Downloading,
    Transcoding,
    Transcribing,
    Merging,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Transcoding => "transcoding",
            JobStatus::Transcribing => "transcribing",
            JobStatus::Merging => "merging",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Valid forward edges of the state machine.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStatus::Failed {
            return true;
        }
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Downloading)
                | (JobStatus::Downloading, JobStatus::Transcribing)
                | (JobStatus::Downloading, JobStatus::Transcoding)
                | (JobStatus::Transcoding, JobStatus::Transcribing)
                | (JobStatus::Transcribing, JobStatus::Merging)
                | (JobStatus::Transcribing, JobStatus::Completed)
                | (JobStatus::Merging, JobStatus::Completed)
        )
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "downloading" => Ok(JobStatus::Downloading),
            "transcoding" => Ok(JobStatus::Transcoding),
            "transcribing" => Ok(JobStatus::Transcribing),
            "merging" => Ok(JobStatus::Merging),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
