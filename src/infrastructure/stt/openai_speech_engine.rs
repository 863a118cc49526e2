use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{EngineTranscription, SpeechEngine, SpeechEngineError};
use crate::domain::Segment;

/// OpenAI-compatible Whisper client requesting `verbose_json` so segment
/// probabilities come back alongside the text.
pub struct OpenAiSpeechEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiSpeechEngine {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .unwrap_or_default(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "whisper-1".to_string()),
        }
    }
}

#[derive(Deserialize)]
struct VerboseTranscriptionResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[async_trait]
impl SpeechEngine for OpenAiSpeechEngine {
    async fn transcribe(
        &self,
        audio: &[u8],
        file_name: &str,
        language: &str,
        prompt: Option<&str>,
    ) -> Result<EngineTranscription, SpeechEngineError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| SpeechEngineError::Api(format!("mime: {}", e)))?;

        let mut form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .text("language", language.to_string())
            .part("file", file_part);
        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt.to_string());
        }

        tracing::debug!(model = %self.model, language = %language, bytes = audio.len(), "Sending audio to speech engine");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechEngineError::Api(format!("request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_failure(status.as_u16(), &body));
        }

        let result: VerboseTranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SpeechEngineError::Api(format!("parse response: {}", e)))?;

        tracing::info!(
            chars = result.text.len(),
            segments = result.segments.len(),
            duration = result.duration,
            "Speech engine transcription completed"
        );

        Ok(EngineTranscription {
            text: result.text.trim().to_string(),
            language: result.language,
            duration_seconds: result.duration,
            segments: result.segments,
        })
    }
}

/// Map an engine failure onto a structured kind. HTTP status and the typed
/// error body are authoritative; free-text matching is the last resort.
fn classify_failure(status: u16, body: &str) -> SpeechEngineError {
    if status == 429 {
        return SpeechEngineError::RateLimited(body.to_string());
    }

    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(detail) = parsed.error {
            if let Some(code) = detail.code.as_deref() {
                match code {
                    "invalid_file_format" | "unsupported_file" => {
                        return SpeechEngineError::UnsupportedFormat(detail.message);
                    }
                    "audio_decode_error" => {
                        return SpeechEngineError::DecodeFailed(detail.message);
                    }
                    "rate_limit_exceeded" => {
                        return SpeechEngineError::RateLimited(detail.message);
                    }
                    _ => {}
                }
            }
            return classify_message(status, &detail.message);
        }
    }

    classify_message(status, body)
}

fn classify_message(status: u16, message: &str) -> SpeechEngineError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("rate limit") {
        SpeechEngineError::RateLimited(message.to_string())
    } else if lower.contains("invalid file format") || lower.contains("unsupported") {
        SpeechEngineError::UnsupportedFormat(message.to_string())
    } else if lower.contains("decod") {
        SpeechEngineError::DecodeFailed(message.to_string())
    } else {
        SpeechEngineError::Api(format!("status {}: {}", status, message))
    }
}
