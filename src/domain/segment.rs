use serde::{Deserialize, Serialize};

/// One recognized span as returned by the speech engine. Offsets are
/// relative to whichever audio unit was transcribed (the chunk, if chunked).
#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub avg_logprob: f64,
    #[serde(default)]
    pub no_speech_prob: f64,
}

impl Segment {
    /// Recognition confidence derived from the average token log-probability.
    pub fn confidence(&self) -> f64 {
        self.avg_logprob.exp()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    LowConfidence,
    UnclearAudio,
}

/// A suspect span, stored in the source's absolute timeline.
#[derive(Debug, Clone, Serialize)]
pub struct FlaggedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: f64,
    pub flag: FlagType,
}
