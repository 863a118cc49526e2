mod audio_fetcher;
mod job_store;
mod recording_gateway;
mod speech_engine;
mod transcoder;

pub use audio_fetcher::{AudioFetcher, FetchError, FetchedAudio};
pub use job_store::{JobStore, JobStoreError};
pub use recording_gateway::{GatewayError, RecordingGateway};
pub use speech_engine::{EngineTranscription, SpeechEngine, SpeechEngineError};
pub use transcoder::{TranscodeOutcome, TranscodeRequest, Transcoder, TranscoderError};
