use std::sync::Arc;

use crate::application::ports::{JobStore, JobStoreError};
use crate::application::services::PipelineWorker;
use crate::domain::Job;

pub const DEFAULT_LANGUAGE: &str = "he";

#[derive(Debug, Clone)]
pub struct StartJobRequest {
    pub audio_url: String,
    pub language: Option<String>,
    pub recording_id: Option<String>,
    pub optimize_for: Option<String>,
}

/// Creates jobs and launches one background pipeline task per job. The
/// caller gets the job id back immediately; everything else is observable
/// only through the job store.
pub struct TranscriptionService {
    store: Arc<dyn JobStore>,
    worker: Arc<PipelineWorker>,
}

impl TranscriptionService {
    pub fn new(store: Arc<dyn JobStore>, worker: Arc<PipelineWorker>) -> Self {
        Self { store, worker }
    }

    #[tracing::instrument(skip(self, request), fields(audio_url = %request.audio_url))]
    pub async fn start(&self, request: StartJobRequest) -> Result<Job, JobStoreError> {
        let job = Job::new(
            request.audio_url,
            request
                .language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            request.recording_id,
            request.optimize_for,
        );
        self.store.create(&job).await?;

        tracing::info!(job_id = %job.id, "Transcription job created");

        let worker = Arc::clone(&self.worker);
        let background_job = job.clone();
        tokio::spawn(async move {
            worker.run(background_job).await;
        });

        Ok(job)
    }
}
