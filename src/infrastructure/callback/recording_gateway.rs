use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::application::ports::{GatewayError, RecordingGateway};
use crate::domain::ErrorCode;

/// Pushes the final outcome to the owning recording record over HTTP.
/// Callers treat every error here as log-and-continue.
pub struct HttpRecordingGateway {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpRecordingGateway {
    pub fn new(base_url: String, auth_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    async fn post(&self, recording_id: &str, body: serde_json::Value) -> Result<(), GatewayError> {
        let url = format!("{}/recordings/{}/transcription", self.base_url, recording_id);
        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Delivery(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordingGateway for HttpRecordingGateway {
    async fn push_transcript(
        &self,
        recording_id: &str,
        transcript: &str,
        duration_seconds: f64,
    ) -> Result<(), GatewayError> {
        self.post(
            recording_id,
            json!({
                "status": "completed",
                "transcription": transcript,
                "duration_seconds": duration_seconds,
            }),
        )
        .await
    }

    async fn push_failure(
        &self,
        recording_id: &str,
        code: ErrorCode,
        message: &str,
    ) -> Result<(), GatewayError> {
        self.post(
            recording_id,
            json!({
                "status": "failed",
                "error_code": code.as_str(),
                "error": message,
            }),
        )
        .await
    }
}

/// Gateway used when no callback target is configured.
pub struct NoopRecordingGateway;

#[async_trait]
impl RecordingGateway for NoopRecordingGateway {
    async fn push_transcript(
        &self,
        recording_id: &str,
        _transcript: &str,
        _duration_seconds: f64,
    ) -> Result<(), GatewayError> {
        tracing::debug!(recording_id = %recording_id, "No recording callback configured, skipping");
        Ok(())
    }

    async fn push_failure(
        &self,
        recording_id: &str,
        _code: ErrorCode,
        _message: &str,
    ) -> Result<(), GatewayError> {
        tracing::debug!(recording_id = %recording_id, "No recording callback configured, skipping");
        Ok(())
    }
}
