use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{TranscodeOutcome, TranscodeRequest, Transcoder, TranscoderError};
use crate::domain::AudioChunk;

/// Client for the external transcode-and-split microservice. Speaks the
/// service's camelCase JSON contract and authenticates with a bearer token.
pub struct HttpTranscoder {
    client: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl HttpTranscoder {
    pub fn new(base_url: String, auth_token: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscodeRequestBody<'a> {
    source_url: &'a str,
    job_id: String,
    chunk_duration_sec: u32,
    overlap_sec: u32,
    output_format: &'a str,
    target_bitrate: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscodeResponseBody {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    normalized_url: Option<String>,
    #[serde(default)]
    chunks: Vec<ChunkBody>,
    #[serde(default)]
    source_info: Option<SourceInfoBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkBody {
    index: usize,
    start_sec: f64,
    end_sec: f64,
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceInfoBody {
    #[serde(default)]
    duration_sec: Option<f64>,
}

#[async_trait]
impl Transcoder for HttpTranscoder {
    async fn transcode_and_split(
        &self,
        request: &TranscodeRequest,
    ) -> Result<TranscodeOutcome, TranscoderError> {
        let url = format!("{}/transcode-and-split", self.base_url);
        let body = TranscodeRequestBody {
            source_url: &request.source_url,
            job_id: request.job_id.to_string(),
            chunk_duration_sec: request.chunk_duration_sec,
            overlap_sec: request.overlap_sec,
            output_format: &request.output_format,
            target_bitrate: &request.target_bitrate,
        };

        tracing::debug!(job_id = %request.job_id, url = %url, "Requesting transcode-and-split");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscoderError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscoderError::Failed(format!(
                "status {}: {}",
                status, text
            )));
        }

        let parsed: TranscodeResponseBody = response
            .json()
            .await
            .map_err(|e| TranscoderError::Failed(format!("parse response: {}", e)))?;

        if !parsed.success {
            return Err(TranscoderError::Failed(
                parsed
                    .error
                    .unwrap_or_else(|| "service reported failure".to_string()),
            ));
        }

        let source_duration = parsed.source_info.and_then(|i| i.duration_sec);

        if !parsed.chunks.is_empty() {
            let chunks = parsed
                .chunks
                .into_iter()
                .map(|c| AudioChunk {
                    index: c.index,
                    start_sec: c.start_sec,
                    end_sec: c.end_sec,
                    url: c.url,
                })
                .collect();
            return Ok(TranscodeOutcome::Chunks(chunks));
        }

        match parsed.normalized_url {
            Some(url) => Ok(TranscodeOutcome::Normalized {
                url,
                duration_sec: source_duration,
            }),
            None => Err(TranscoderError::Failed(
                "response carried neither chunks nor a normalized url".to_string(),
            )),
        }
    }
}
