use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use dikta::application::ports::{RecordingGateway, Transcoder};
use dikta::application::services::{PipelineWorker, TranscriptionService};
use dikta::infrastructure::callback::{HttpRecordingGateway, NoopRecordingGateway};
use dikta::infrastructure::fetch::HttpAudioFetcher;
use dikta::infrastructure::observability::{TracingConfig, init_tracing};
use dikta::infrastructure::persistence::InMemoryJobStore;
use dikta::infrastructure::stt::OpenAiSpeechEngine;
use dikta::infrastructure::transcode::HttpTranscoder;
use dikta::presentation::config::Environment;
use dikta::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    init_tracing(
        TracingConfig {
            environment: settings.environment.to_string(),
            json_format: settings.environment == Environment::Prod,
        },
        settings.server.port,
    );

    let job_store = Arc::new(InMemoryJobStore::new());
    let fetcher = Arc::new(HttpAudioFetcher::new());
    let engine = Arc::new(OpenAiSpeechEngine::new(
        settings.speech.api_key.clone(),
        settings.speech.base_url.clone(),
        settings.speech.model.clone(),
    ));

    let transcoder: Option<Arc<dyn Transcoder>> = settings.transcoding.as_ref().map(|t| {
        Arc::new(HttpTranscoder::new(
            t.base_url.clone(),
            t.auth_token.clone(),
        )) as Arc<dyn Transcoder>
    });
    if transcoder.is_none() {
        tracing::warn!("No transcoding service configured: chunked path disabled");
    }

    let gateway: Arc<dyn RecordingGateway> = match &settings.callback {
        Some(cb) => Arc::new(HttpRecordingGateway::new(
            cb.base_url.clone(),
            cb.auth_token.clone(),
        )),
        None => Arc::new(NoopRecordingGateway),
    };

    let worker = Arc::new(PipelineWorker::new(
        job_store.clone(),
        fetcher,
        engine,
        transcoder,
        gateway,
        settings.pipeline.to_pipeline_config(),
    ));

    let transcription_service = Arc::new(TranscriptionService::new(job_store.clone(), worker));

    tokio::spawn(Arc::clone(&job_store).run_eviction(
        Duration::from_secs(settings.pipeline.job_ttl_secs),
        Duration::from_secs(300),
    ));

    let state = AppState {
        transcription_service,
        job_store,
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
