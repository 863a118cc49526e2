use std::fmt;

use serde::Serialize;

/// Wire-level error taxonomy. Polling clients branch on these strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingUrl,
    MissingJobId,
    JobNotFound,
    DownloadFailed,
    DownloadTimeout,
    EmptyFile,
    InvalidFormat,
    NeedsConversion,
    FileTooLarge,
    TranscodingUnavailable,
    TranscodingFailed,
    OpenaiError,
    RateLimit,
    DecodeError,
    ProcessingError,
    JobInProgress,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingUrl => "MISSING_URL",
            ErrorCode::MissingJobId => "MISSING_JOB_ID",
            ErrorCode::JobNotFound => "JOB_NOT_FOUND",
            ErrorCode::DownloadFailed => "DOWNLOAD_FAILED",
            ErrorCode::DownloadTimeout => "DOWNLOAD_TIMEOUT",
            ErrorCode::EmptyFile => "EMPTY_FILE",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::NeedsConversion => "NEEDS_CONVERSION",
            ErrorCode::FileTooLarge => "FILE_TOO_LARGE",
            ErrorCode::TranscodingUnavailable => "TRANSCODING_UNAVAILABLE",
            ErrorCode::TranscodingFailed => "TRANSCODING_FAILED",
            ErrorCode::OpenaiError => "OPENAI_ERROR",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::DecodeError => "DECODE_ERROR",
            ErrorCode::ProcessingError => "PROCESSING_ERROR",
            ErrorCode::JobInProgress => "JOB_IN_PROGRESS",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
