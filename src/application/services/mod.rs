mod pipeline_worker;
mod transcription_service;

pub use pipeline_worker::{PipelineConfig, PipelineError, PipelineWorker};
pub use transcription_service::{DEFAULT_LANGUAGE, StartJobRequest, TranscriptionService};
