use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{AudioFetcher, FetchError, FetchedAudio};

/// reqwest-backed fetcher. The timeout is a hard ceiling on the whole
/// download, not just connection establishment.
pub struct HttpAudioFetcher {
    client: reqwest::Client,
}

impl HttpAudioFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpAudioFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedAudio, FetchError> {
        let download = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            if !response.status().is_success() {
                return Err(FetchError::Status(response.status().as_u16()));
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(String::from);

            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            Ok(FetchedAudio {
                bytes: bytes.to_vec(),
                content_type,
            })
        };

        match tokio::time::timeout(timeout, download).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout.as_secs())),
        }
    }
}
