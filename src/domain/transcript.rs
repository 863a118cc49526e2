use serde::Serialize;

use super::AudioFormat;

/// Final payload of a completed job.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionResult {
    pub transcription: String,
    pub chunks_count: usize,
    pub successful_chunks: usize,
    pub failed_chunks: usize,
    pub duration_seconds: f64,
    pub audio_duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_detected: Option<String>,
    pub was_transcoded: bool,
    pub metadata: ResultMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultMetadata {
    pub detected_format: String,
    pub source_size_bytes: u64,
}

impl ResultMetadata {
    pub fn new(format: AudioFormat, source_size_bytes: u64) -> Self {
        Self {
            detected_format: format.as_str().to_string(),
            source_size_bytes,
        }
    }
}

/// Per-chunk transcription outcome. `text` is `None` when the chunk's
/// download or transcription failed and was replaced with a placeholder.
#[derive(Debug, Clone)]
pub struct ChunkTranscript {
    pub index: usize,
    pub text: Option<String>,
}

impl ChunkTranscript {
    pub fn succeeded(index: usize, text: String) -> Self {
        Self {
            index,
            text: Some(text),
        }
    }

    pub fn failed(index: usize) -> Self {
        Self { index, text: None }
    }

    pub fn is_failed(&self) -> bool {
        self.text.is_none()
    }
}

/// Concatenate chunk transcripts in index order, dropping errored chunks.
/// Deliberately naive: boundary overlap is not deduplicated.
pub fn merge_transcripts(transcripts: &[ChunkTranscript]) -> String {
    let mut ordered: Vec<&ChunkTranscript> = transcripts.iter().collect();
    ordered.sort_by_key(|t| t.index);
    ordered
        .into_iter()
        .filter_map(|t| t.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
