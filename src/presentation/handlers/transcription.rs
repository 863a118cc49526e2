use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::StartJobRequest;
use crate::domain::{
    ErrorCode, FlaggedSegment, Job, JobId, JobStatus, JobStep, TranscriptionResult,
};
use crate::presentation::state::AppState;

/// Three logical operations multiplexed over one endpoint via `action`.
#[derive(Debug, Deserialize)]
pub struct TranscriptionActionRequest {
    pub action: String,
    pub audio_url: Option<String>,
    pub recording_id: Option<String>,
    pub language: Option<String>,
    pub optimize_for: Option<String>,
    pub job_id: Option<String>,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub success: bool,
    pub job_id: String,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: String,
    pub progress: u8,
    pub steps: Vec<JobStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    pub flagged_count: usize,
}

#[derive(Serialize)]
pub struct CompletedResultResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: TranscriptionResult,
    pub quality_score: u8,
    pub flagged_segments: Vec<FlaggedSegment>,
}

#[derive(Serialize)]
pub struct FailedResultResponse {
    pub success: bool,
    pub error: String,
    pub error_code: Option<ErrorCode>,
    pub steps: Vec<JobStep>,
}

#[derive(Serialize)]
pub struct InProgressResponse {
    pub success: bool,
    pub error_code: ErrorCode,
    pub status: String,
    pub progress: u8,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: ErrorCode,
}

fn error_response(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.into(),
            error_code: code,
        }),
    )
        .into_response()
}

#[tracing::instrument(skip(state, request), fields(action = %request.action))]
pub async fn transcription_handler(
    State(state): State<AppState>,
    Json(request): Json<TranscriptionActionRequest>,
) -> Response {
    match request.action.as_str() {
        "start" => start(state, request).await,
        "status" => status(state, request.job_id).await,
        "result" => result(state, request.job_id).await,
        other => error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::ProcessingError,
            format!("Unknown action: {}", other),
        ),
    }
}

async fn start(state: AppState, request: TranscriptionActionRequest) -> Response {
    let audio_url = match request.audio_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!("Start request without audio_url");
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::MissingUrl,
                "audio_url is required",
            );
        }
    };

    let started = state
        .transcription_service
        .start(StartJobRequest {
            audio_url,
            language: request.language,
            recording_id: request.recording_id,
            optimize_for: request.optimize_for,
        })
        .await;

    match started {
        Ok(job) => (
            StatusCode::OK,
            Json(StartResponse {
                success: true,
                job_id: job.id.to_string(),
                status: JobStatus::Pending.as_str(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create transcription job");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::ProcessingError,
                format!("Failed to create job: {}", e),
            )
        }
    }
}

async fn status(state: AppState, job_id: Option<String>) -> Response {
    let job = match lookup(&state, job_id).await {
        Ok(job) => job,
        Err(response) => return response,
    };

    (
        StatusCode::OK,
        Json(StatusResponse {
            success: true,
            status: job.status.to_string(),
            progress: job.progress,
            steps: job.steps,
            error: job.error,
            error_code: job.error_code,
            quality_score: job.quality_score,
            flagged_count: job.flagged_segments.len(),
        }),
    )
        .into_response()
}

async fn result(state: AppState, job_id: Option<String>) -> Response {
    let job = match lookup(&state, job_id).await {
        Ok(job) => job,
        Err(response) => return response,
    };

    match job.status {
        JobStatus::Completed => {
            // A completed job always carries a result and a quality score.
            let Some(result) = job.result else {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::ProcessingError,
                    "Completed job is missing its result",
                );
            };
            (
                StatusCode::OK,
                Json(CompletedResultResponse {
                    success: true,
                    result,
                    quality_score: job.quality_score.unwrap_or(100),
                    flagged_segments: job.flagged_segments,
                }),
            )
                .into_response()
        }
        JobStatus::Failed => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(FailedResultResponse {
                success: false,
                error: job
                    .error
                    .unwrap_or_else(|| "Transcription failed".to_string()),
                error_code: job.error_code,
                steps: job.steps,
            }),
        )
            .into_response(),
        _ => (
            StatusCode::ACCEPTED,
            Json(InProgressResponse {
                success: false,
                error_code: ErrorCode::JobInProgress,
                status: job.status.to_string(),
                progress: job.progress,
            }),
        )
            .into_response(),
    }
}

async fn lookup(state: &AppState, job_id: Option<String>) -> Result<Job, Response> {
    let raw = match job_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::MissingJobId,
                "job_id is required",
            ));
        }
    };

    let Ok(uuid) = Uuid::parse_str(&raw) else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::JobNotFound,
            format!("Job not found: {}", raw),
        ));
    };

    match state.job_store.get(JobId::from_uuid(uuid)).await {
        Ok(Some(job)) => Ok(job),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::JobNotFound,
            format!("Job not found: {}", raw),
        )),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch job");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::ProcessingError,
                format!("Failed to fetch job: {}", e),
            ))
        }
    }
}
