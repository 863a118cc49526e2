mod health;
mod transcription;

pub use health::health_handler;
pub use transcription::{TranscriptionActionRequest, transcription_handler};
