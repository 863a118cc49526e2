use std::sync::Arc;

use crate::application::ports::JobStore;
use crate::application::services::TranscriptionService;

#[derive(Clone)]
pub struct AppState {
    pub transcription_service: Arc<TranscriptionService>,
    pub job_store: Arc<dyn JobStore>,
}
