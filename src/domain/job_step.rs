use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry in a job's append-only audit log. Written on every status
/// transition and on notable intra-stage events (per-chunk milestones,
/// chunk failures).
#[derive(Debug, Clone, Serialize)]
pub struct JobStep {
    pub step: String,
    pub message: String,
    pub progress: u8,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl JobStep {
    pub fn new(step: impl Into<String>, message: impl Into<String>, progress: u8) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
            progress,
            timestamp: Utc::now(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }
}
