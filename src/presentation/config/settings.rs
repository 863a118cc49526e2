use std::time::Duration;

use serde::Deserialize;

use crate::application::services::PipelineConfig;
use crate::presentation::config::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub speech: SpeechSettings,
    pub transcoding: Option<TranscodingSettings>,
    pub callback: Option<CallbackSettings>,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// The chunked path is disabled entirely when this section is absent:
/// large or convertible files then fail fast instead of hanging.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscodingSettings {
    pub base_url: String,
    pub auth_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackSettings {
    pub base_url: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    pub direct_size_limit_mb: u64,
    pub chunk_duration_sec: u32,
    pub overlap_sec: u32,
    pub chunk_parallelism: usize,
    pub source_timeout_secs: u64,
    pub chunk_timeout_secs: u64,
    pub job_ttl_secs: u64,
}

impl Settings {
    /// Build settings from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let transcoding = match (
            std::env::var("TRANSCODER_BASE_URL").ok(),
            std::env::var("TRANSCODER_AUTH_TOKEN").ok(),
        ) {
            (Some(base_url), Some(auth_token)) => Some(TranscodingSettings {
                base_url,
                auth_token,
            }),
            _ => None,
        };

        let callback = std::env::var("RECORDING_CALLBACK_URL")
            .ok()
            .map(|base_url| CallbackSettings {
                base_url,
                auth_token: std::env::var("RECORDING_CALLBACK_TOKEN").ok(),
            });

        Self {
            environment: std::env::var("APP_ENVIRONMENT")
                .unwrap_or_else(|_| "local".to_string())
                .try_into()
                .unwrap_or(Environment::Local),
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_parsed("SERVER_PORT", 3000),
            },
            speech: SpeechSettings {
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                base_url: std::env::var("OPENAI_BASE_URL").ok(),
                model: std::env::var("WHISPER_MODEL").ok(),
            },
            transcoding,
            callback,
            pipeline: PipelineSettings {
                direct_size_limit_mb: env_parsed("DIRECT_SIZE_LIMIT_MB", 24),
                chunk_duration_sec: env_parsed("CHUNK_DURATION_SEC", 600),
                overlap_sec: env_parsed("CHUNK_OVERLAP_SEC", 3),
                chunk_parallelism: env_parsed("CHUNK_PARALLELISM", 2),
                source_timeout_secs: env_parsed("SOURCE_TIMEOUT_SECS", 120),
                chunk_timeout_secs: env_parsed("CHUNK_TIMEOUT_SECS", 60),
                job_ttl_secs: env_parsed("JOB_TTL_SECS", 21600),
            },
        }
    }
}

impl PipelineSettings {
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            direct_size_limit_bytes: self.direct_size_limit_mb * 1024 * 1024,
            chunk_duration_sec: self.chunk_duration_sec,
            overlap_sec: self.overlap_sec,
            chunk_parallelism: self.chunk_parallelism,
            source_timeout: Duration::from_secs(self.source_timeout_secs),
            chunk_timeout: Duration::from_secs(self.chunk_timeout_secs),
            ..PipelineConfig::default()
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
