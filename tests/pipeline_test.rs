use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use dikta::application::ports::{
    AudioFetcher, EngineTranscription, FetchError, FetchedAudio, GatewayError, JobStore,
    RecordingGateway, SpeechEngine, SpeechEngineError, TranscodeOutcome, TranscodeRequest,
    Transcoder, TranscoderError,
};
use dikta::application::services::{PipelineConfig, PipelineWorker};
use dikta::domain::{AudioChunk, ErrorCode, FlagType, Job, JobStatus, Segment};
use dikta::infrastructure::persistence::InMemoryJobStore;

struct MockFetcher {
    default_size: usize,
    fail_urls: Vec<String>,
    timeout_urls: Vec<String>,
    sizes: HashMap<String, usize>,
}

impl MockFetcher {
    fn returning(default_size: usize) -> Self {
        Self {
            default_size,
            fail_urls: Vec::new(),
            timeout_urls: Vec::new(),
            sizes: HashMap::new(),
        }
    }

    fn failing_for(mut self, url: &str) -> Self {
        self.fail_urls.push(url.to_string());
        self
    }

    fn timing_out_for(mut self, url: &str) -> Self {
        self.timeout_urls.push(url.to_string());
        self
    }
}

#[async_trait::async_trait]
impl AudioFetcher for MockFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedAudio, FetchError> {
        if self.timeout_urls.iter().any(|f| url.contains(f.as_str())) {
            return Err(FetchError::Timeout(timeout.as_secs()));
        }
        if self.fail_urls.iter().any(|f| url.contains(f.as_str())) {
            return Err(FetchError::Status(502));
        }
        let size = self.sizes.get(url).copied().unwrap_or(self.default_size);
        Ok(FetchedAudio {
            bytes: vec![0u8; size],
            content_type: None,
        })
    }
}

#[derive(Default)]
struct MockEngine {
    /// Text keyed by the file name the worker passes in; falls back to a
    /// fixed phrase.
    texts: HashMap<String, String>,
    fail_files: Vec<String>,
    rate_limited: bool,
    segments: Vec<Segment>,
}

impl MockEngine {
    fn with_text(mut self, file_name: &str, text: &str) -> Self {
        self.texts.insert(file_name.to_string(), text.to_string());
        self
    }

    fn failing_for(mut self, file_name: &str) -> Self {
        self.fail_files.push(file_name.to_string());
        self
    }

    fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }
}

#[async_trait::async_trait]
impl SpeechEngine for MockEngine {
    async fn transcribe(
        &self,
        _audio: &[u8],
        file_name: &str,
        _language: &str,
        _prompt: Option<&str>,
    ) -> Result<EngineTranscription, SpeechEngineError> {
        if self.rate_limited {
            return Err(SpeechEngineError::RateLimited("try later".to_string()));
        }
        if self.fail_files.iter().any(|f| file_name == f) {
            return Err(SpeechEngineError::Api("engine exploded".to_string()));
        }
        let text = self
            .texts
            .get(file_name)
            .cloned()
            .unwrap_or_else(|| "שלום עולם".to_string());
        Ok(EngineTranscription {
            text,
            language: Some("he".to_string()),
            duration_seconds: 10.0,
            segments: self.segments.clone(),
        })
    }
}

struct MockTranscoder {
    outcome: TranscodeOutcome,
}

#[async_trait::async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode_and_split(
        &self,
        _request: &TranscodeRequest,
    ) -> Result<TranscodeOutcome, TranscoderError> {
        Ok(self.outcome.clone())
    }
}

struct UnreachableTranscoder;

#[async_trait::async_trait]
impl Transcoder for UnreachableTranscoder {
    async fn transcode_and_split(
        &self,
        _request: &TranscodeRequest,
    ) -> Result<TranscodeOutcome, TranscoderError> {
        Err(TranscoderError::Unavailable("connection refused".to_string()))
    }
}

#[derive(Default)]
struct RecordingSpy {
    transcripts: Mutex<Vec<(String, String)>>,
    failures: Mutex<Vec<(String, ErrorCode)>>,
    fail_delivery: bool,
}

#[async_trait::async_trait]
impl RecordingGateway for RecordingSpy {
    async fn push_transcript(
        &self,
        recording_id: &str,
        transcript: &str,
        _duration_seconds: f64,
    ) -> Result<(), GatewayError> {
        if self.fail_delivery {
            return Err(GatewayError::Delivery("callback target down".to_string()));
        }
        self.transcripts
            .lock()
            .await
            .push((recording_id.to_string(), transcript.to_string()));
        Ok(())
    }

    async fn push_failure(
        &self,
        recording_id: &str,
        code: ErrorCode,
        _message: &str,
    ) -> Result<(), GatewayError> {
        if self.fail_delivery {
            return Err(GatewayError::Delivery("callback target down".to_string()));
        }
        self.failures
            .lock()
            .await
            .push((recording_id.to_string(), code));
        Ok(())
    }
}

fn chunk(index: usize, start_sec: f64, url: &str) -> AudioChunk {
    AudioChunk {
        index,
        start_sec,
        end_sec: start_sec + 600.0,
        url: url.to_string(),
    }
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        direct_size_limit_bytes: 10_000,
        ..PipelineConfig::default()
    }
}

struct Harness {
    store: Arc<InMemoryJobStore>,
    worker: PipelineWorker,
    gateway: Arc<RecordingSpy>,
}

fn harness(
    fetcher: MockFetcher,
    engine: MockEngine,
    transcoder: Option<Arc<dyn Transcoder>>,
) -> Harness {
    harness_with_gateway(fetcher, engine, transcoder, RecordingSpy::default())
}

fn harness_with_gateway(
    fetcher: MockFetcher,
    engine: MockEngine,
    transcoder: Option<Arc<dyn Transcoder>>,
    gateway: RecordingSpy,
) -> Harness {
    let store = Arc::new(InMemoryJobStore::new());
    let gateway = Arc::new(gateway);
    let worker = PipelineWorker::new(
        store.clone(),
        Arc::new(fetcher),
        Arc::new(engine),
        transcoder,
        gateway.clone(),
        test_config(),
    );
    Harness {
        store,
        worker,
        gateway,
    }
}

async fn run_job(h: &Harness, url: &str, recording_id: Option<&str>) -> Job {
    let job = Job::new(
        url.to_string(),
        "he".to_string(),
        recording_id.map(String::from),
        None,
    );
    h.store.create(&job).await.unwrap();
    let id = job.id;
    h.worker.run(job).await;
    h.store.get(id).await.unwrap().expect("job vanished")
}

fn step_names(job: &Job) -> Vec<&str> {
    job.steps.iter().map(|s| s.step.as_str()).collect()
}

#[tokio::test]
async fn given_small_native_file_when_processing_then_direct_path_completes() {
    let h = harness(MockFetcher::returning(5_000), MockEngine::default(), None);
    let job = run_job(&h, "https://cdn.example.com/call.mp3", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    let result = job.result.as_ref().unwrap();
    assert_eq!(result.chunks_count, 1);
    assert!(!result.was_transcoded);
    assert_eq!(job.quality_score, Some(100));
    assert!(step_names(&job).contains(&"downloading"));
    assert!(step_names(&job).contains(&"transcribing"));
    assert!(!step_names(&job).contains(&"transcoding"));
}

#[tokio::test]
async fn given_any_job_when_processing_then_progress_is_monotone_across_steps() {
    let outcome = TranscodeOutcome::Chunks(vec![
        chunk(0, 0.0, "https://t/chunk-0"),
        chunk(1, 600.0, "https://t/chunk-1"),
    ]);
    let h = harness(
        MockFetcher::returning(50_000),
        MockEngine::default(),
        Some(Arc::new(MockTranscoder { outcome })),
    );
    let job = run_job(&h, "https://cdn.example.com/long.wav", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    let progresses: Vec<u8> = job.steps.iter().map(|s| s.progress).collect();
    let mut sorted = progresses.clone();
    sorted.sort_unstable();
    assert_eq!(progresses, sorted);
}

#[tokio::test]
async fn given_large_file_when_transcoder_returns_chunks_then_chunked_path_merges_in_index_order() {
    // Chunks handed over out of index order; the merge must still be stable.
    let outcome = TranscodeOutcome::Chunks(vec![
        chunk(2, 1200.0, "https://t/c2"),
        chunk(0, 0.0, "https://t/c0"),
        chunk(1, 600.0, "https://t/c1"),
    ]);
    let engine = MockEngine::default()
        .with_text("chunk-2.mp3", "third")
        .with_text("chunk-0.mp3", "first")
        .with_text("chunk-1.mp3", "second");
    let h = harness(
        MockFetcher::returning(50_000),
        engine,
        Some(Arc::new(MockTranscoder { outcome })),
    );
    let job = run_job(&h, "https://cdn.example.com/long.wav", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    let result = job.result.as_ref().unwrap();
    assert_eq!(result.transcription, "first second third");
    assert_eq!(result.chunks_count, 3);
    assert!(result.was_transcoded);
    assert!(step_names(&job).contains(&"transcoding"));
    assert!(step_names(&job).contains(&"merging"));
}

#[tokio::test]
async fn given_two_chunks_when_transcoding_then_job_walks_the_chunked_state_sequence() {
    let outcome = TranscodeOutcome::Chunks(vec![
        chunk(0, 0.0, "https://t/c0"),
        chunk(1, 600.0, "https://t/c1"),
    ]);
    let h = harness(
        MockFetcher::returning(50_000),
        MockEngine::default(),
        Some(Arc::new(MockTranscoder { outcome })),
    );
    let job = run_job(&h, "https://cdn.example.com/long.wav", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.as_ref().unwrap().chunks_count, 2);
    let names = step_names(&job);
    let downloading = names.iter().position(|s| *s == "downloading").unwrap();
    let transcoding = names.iter().position(|s| *s == "transcoding").unwrap();
    let transcribing = names.iter().position(|s| *s == "transcribing").unwrap();
    let merging = names.iter().position(|s| *s == "merging").unwrap();
    assert!(downloading < transcoding);
    assert!(transcoding < transcribing);
    assert!(transcribing < merging);
}

#[tokio::test]
async fn given_one_bad_chunk_when_processing_then_siblings_survive() {
    let outcome = TranscodeOutcome::Chunks(vec![
        chunk(0, 0.0, "https://t/c0"),
        chunk(1, 600.0, "https://t/bad"),
        chunk(2, 1200.0, "https://t/c2"),
    ]);
    let engine = MockEngine::default()
        .with_text("chunk-0.mp3", "first")
        .with_text("chunk-2.mp3", "third");
    let h = harness(
        MockFetcher::returning(50_000).failing_for("https://t/bad"),
        engine,
        Some(Arc::new(MockTranscoder { outcome })),
    );
    let job = run_job(&h, "https://cdn.example.com/long.wav", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    let result = job.result.as_ref().unwrap();
    assert_eq!(result.chunks_count, 3);
    assert_eq!(result.failed_chunks, 1);
    assert_eq!(result.successful_chunks, 2);
    assert_eq!(result.successful_chunks + result.failed_chunks, 3);
    assert_eq!(result.transcription, "first third");
}

#[tokio::test]
async fn given_failing_chunk_transcription_when_processing_then_job_still_completes() {
    let outcome = TranscodeOutcome::Chunks(vec![
        chunk(0, 0.0, "https://t/c0"),
        chunk(1, 600.0, "https://t/c1"),
    ]);
    let engine = MockEngine::default()
        .with_text("chunk-0.mp3", "only survivor")
        .failing_for("chunk-1.mp3");
    let h = harness(
        MockFetcher::returning(50_000),
        engine,
        Some(Arc::new(MockTranscoder { outcome })),
    );
    let job = run_job(&h, "https://cdn.example.com/long.wav", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    let result = job.result.as_ref().unwrap();
    assert_eq!(result.failed_chunks, 1);
    assert_eq!(result.transcription, "only survivor");
}

#[tokio::test]
async fn given_normalized_outcome_when_processing_then_single_effective_chunk() {
    let outcome = TranscodeOutcome::Normalized {
        url: "https://t/normalized".to_string(),
        duration_sec: Some(903.5),
    };
    let h = harness(
        MockFetcher::returning(50_000),
        MockEngine::default().with_text("normalized.mp3", "whole thing"),
        Some(Arc::new(MockTranscoder { outcome })),
    );
    let job = run_job(&h, "https://cdn.example.com/long.wav", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    let result = job.result.as_ref().unwrap();
    assert_eq!(result.chunks_count, 1);
    assert!(result.was_transcoded);
    assert_eq!(result.transcription, "whole thing");
    assert_eq!(result.audio_duration_seconds, 903.5);
    assert!(!step_names(&job).contains(&"merging"));
}

#[tokio::test]
async fn given_convertible_format_without_transcoder_then_fails_fast_with_needs_conversion() {
    let h = harness(MockFetcher::returning(5_000), MockEngine::default(), None);
    let job = run_job(&h, "https://cdn.example.com/memo.aac", None).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_code, Some(ErrorCode::NeedsConversion));
    assert!(!step_names(&job).contains(&"transcribing"));
    assert!(job.result.is_none());
}

#[tokio::test]
async fn given_oversized_file_without_transcoder_then_fails_with_file_too_large() {
    let h = harness(MockFetcher::returning(50_000), MockEngine::default(), None);
    let job = run_job(&h, "https://cdn.example.com/long.mp3", None).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_code, Some(ErrorCode::FileTooLarge));
}

#[tokio::test]
async fn given_empty_payload_when_downloading_then_fails_with_empty_file() {
    let h = harness(MockFetcher::returning(0), MockEngine::default(), None);
    let job = run_job(&h, "https://cdn.example.com/empty.mp3", None).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_code, Some(ErrorCode::EmptyFile));
}

#[tokio::test]
async fn given_unreachable_source_when_downloading_then_fails_with_download_failed() {
    let h = harness(
        MockFetcher::returning(5_000).failing_for("cdn.example.com"),
        MockEngine::default(),
        None,
    );
    let job = run_job(&h, "https://cdn.example.com/gone.mp3", None).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_code, Some(ErrorCode::DownloadFailed));
}

#[tokio::test]
async fn given_stalled_source_when_downloading_then_fails_with_download_timeout() {
    let h = harness(
        MockFetcher::returning(5_000).timing_out_for("stalled.mp3"),
        MockEngine::default(),
        None,
    );
    let job = run_job(&h, "https://cdn.example.com/stalled.mp3", None).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_code, Some(ErrorCode::DownloadTimeout));
    // The default source ceiling is 120s and the message names it.
    assert!(job.error.unwrap().contains("120"));
}

#[tokio::test]
async fn given_rate_limited_engine_when_transcribing_then_error_code_is_rate_limit() {
    let engine = MockEngine {
        rate_limited: true,
        ..MockEngine::default()
    };
    let h = harness(MockFetcher::returning(5_000), engine, None);
    let job = run_job(&h, "https://cdn.example.com/call.mp3", None).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_code, Some(ErrorCode::RateLimit));
}

#[tokio::test]
async fn given_unreachable_transcoder_when_splitting_then_fails_with_transcoding_unavailable() {
    let h = harness(
        MockFetcher::returning(50_000),
        MockEngine::default(),
        Some(Arc::new(UnreachableTranscoder)),
    );
    let job = run_job(&h, "https://cdn.example.com/long.wav", None).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_code, Some(ErrorCode::TranscodingUnavailable));
}

#[tokio::test]
async fn given_suspect_segments_in_a_chunk_then_flags_are_absolute_and_score_drops() {
    let suspect = Segment {
        start: 1.0,
        end: 3.0,
        text: "לא ברור".to_string(),
        avg_logprob: -3.0,
        no_speech_prob: 0.9,
    };
    let outcome = TranscodeOutcome::Chunks(vec![
        chunk(0, 0.0, "https://t/c0"),
        chunk(1, 600.0, "https://t/c1"),
    ]);
    let h = harness(
        MockFetcher::returning(50_000),
        MockEngine::default().with_segments(vec![suspect]),
        Some(Arc::new(MockTranscoder { outcome })),
    );
    let job = run_job(&h, "https://cdn.example.com/long.wav", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.flagged_segments.len(), 2);
    assert!(job.flagged_segments.iter().all(|f| f.flag == FlagType::UnclearAudio));
    // Second chunk's segment must be shifted into the source timeline.
    assert!(job.flagged_segments.iter().any(|f| f.start == 601.0));
    // Chunked formula: 100 - 2 * 5.
    assert_eq!(job.quality_score, Some(90));
}

#[tokio::test]
async fn given_recording_id_when_job_completes_then_transcript_is_pushed() {
    let h = harness_with_gateway(
        MockFetcher::returning(5_000),
        MockEngine::default().with_text("audio.mp3", "נמכר הנכס"),
        None,
        RecordingSpy::default(),
    );
    let job = run_job(&h, "https://cdn.example.com/call.mp3", Some("rec-42")).await;

    assert_eq!(job.status, JobStatus::Completed);
    let pushed = h.gateway.transcripts.lock().await;
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].0, "rec-42");
    assert_eq!(pushed[0].1, "נמכר הנכס");
}

#[tokio::test]
async fn given_recording_id_when_job_fails_then_failure_is_pushed() {
    let h = harness_with_gateway(
        MockFetcher::returning(0),
        MockEngine::default(),
        None,
        RecordingSpy::default(),
    );
    let job = run_job(&h, "https://cdn.example.com/empty.mp3", Some("rec-7")).await;

    assert_eq!(job.status, JobStatus::Failed);
    let failures = h.gateway.failures.lock().await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0], ("rec-7".to_string(), ErrorCode::EmptyFile));
}

#[tokio::test]
async fn given_broken_callback_when_job_completes_then_job_state_is_unaffected() {
    let gateway = RecordingSpy {
        fail_delivery: true,
        ..RecordingSpy::default()
    };
    let h = harness_with_gateway(
        MockFetcher::returning(5_000),
        MockEngine::default(),
        None,
        gateway,
    );
    let job = run_job(&h, "https://cdn.example.com/call.mp3", Some("rec-9")).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.result.is_some());
}
