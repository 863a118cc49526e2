use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{JobStore, JobStoreError};
use crate::domain::{
    ErrorCode, FlaggedSegment, Job, JobId, JobStatus, JobStep, TranscriptionResult,
};

/// Keyed in-memory job store. Per-job writes go through the domain methods,
/// so the lifecycle invariants hold regardless of caller. Finished jobs are
/// evicted after a TTL by `run_eviction`.
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    async fn mutate<F>(&self, id: JobId, f: F) -> Result<(), JobStoreError>
    where
        F: FnOnce(&mut Job) -> Result<(), crate::domain::JobError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        f(job).map_err(JobStoreError::from)
    }

    /// Periodic sweep dropping terminal jobs older than `ttl`.
    pub async fn run_eviction(self: Arc<Self>, ttl: Duration, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let cutoff = Utc::now() - chrono::Duration::from_std(ttl).unwrap_or_default();
            let mut jobs = self.jobs.write().await;
            let before = jobs.len();
            jobs.retain(|_, job| !(job.is_terminal() && job.updated_at < cutoff));
            let evicted = before - jobs.len();
            if evicted > 0 {
                tracing::info!(evicted, remaining = jobs.len(), "Evicted expired jobs");
            }
        }
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &Job) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(&id).cloned())
    }

    async fn transition(
        &self,
        id: JobId,
        status: JobStatus,
        progress: u8,
        message: &str,
    ) -> Result<(), JobStoreError> {
        self.mutate(id, |job| job.transition(status, progress, message))
            .await
    }

    async fn append_step(&self, id: JobId, step: JobStep) -> Result<(), JobStoreError> {
        self.mutate(id, |job| job.record_step(step)).await
    }

    async fn add_flagged_segments(
        &self,
        id: JobId,
        segments: Vec<FlaggedSegment>,
    ) -> Result<(), JobStoreError> {
        self.mutate(id, |job| job.add_flagged_segments(segments))
            .await
    }

    async fn complete(
        &self,
        id: JobId,
        result: TranscriptionResult,
        quality_score: u8,
    ) -> Result<(), JobStoreError> {
        self.mutate(id, |job| job.complete(result, quality_score))
            .await
    }

    async fn fail(&self, id: JobId, code: ErrorCode, message: &str) -> Result<(), JobStoreError> {
        self.mutate(id, |job| job.fail(code, message)).await
    }
}
