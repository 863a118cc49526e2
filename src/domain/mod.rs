mod audio_format;
mod chunk;
mod error_code;
mod job;
mod job_id;
mod job_status;
mod job_step;
pub mod quality;
mod segment;
mod transcript;

pub use audio_format::AudioFormat;
pub use chunk::AudioChunk;
pub use error_code::ErrorCode;
pub use job::{Job, JobError};
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use job_step::JobStep;
pub use segment::{FlagType, FlaggedSegment, Segment};
pub use transcript::{ChunkTranscript, ResultMetadata, TranscriptionResult, merge_transcripts};
