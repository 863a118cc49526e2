use super::{FlagType, FlaggedSegment, Segment};

pub const CONFIDENCE_THRESHOLD: f64 = 0.5;
pub const NO_SPEECH_THRESHOLD: f64 = 0.5;

/// Which aggregate scoring formula applies. The two paths inherited
/// different formulas; they are kept separate on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFormula {
    /// Whole-file transcription: penalty proportional to the flagged ratio.
    SingleFile,
    /// Chunked transcription: flat 5-point penalty per flagged segment.
    Chunked,
}

/// Flag suspect segments, shifting their offsets by `offset_sec` into the
/// source's absolute timeline.
pub fn flag_segments(segments: &[Segment], offset_sec: f64) -> Vec<FlaggedSegment> {
    segments
        .iter()
        .filter_map(|segment| {
            let unclear = segment.no_speech_prob > NO_SPEECH_THRESHOLD;
            let low_confidence = segment.confidence() < CONFIDENCE_THRESHOLD;
            if !unclear && !low_confidence {
                return None;
            }
            Some(FlaggedSegment {
                start: segment.start + offset_sec,
                end: segment.end + offset_sec,
                text: segment.text.clone(),
                confidence: segment.confidence(),
                flag: if unclear {
                    FlagType::UnclearAudio
                } else {
                    FlagType::LowConfidence
                },
            })
        })
        .collect()
}

/// Aggregate 0-100 trustworthiness score. 100 iff nothing was flagged.
pub fn quality_score(flagged_count: usize, total_segments: usize, formula: ScoreFormula) -> u8 {
    if flagged_count == 0 {
        return 100;
    }
    let score = match formula {
        ScoreFormula::SingleFile => {
            if total_segments == 0 {
                return 100;
            }
            100.0 - (flagged_count as f64 / total_segments as f64) * 100.0
        }
        ScoreFormula::Chunked => 100.0 - flagged_count as f64 * 5.0,
    };
    // Floor keeps the score strictly below 100 whenever anything was flagged.
    score.clamp(0.0, 100.0).floor() as u8
}
