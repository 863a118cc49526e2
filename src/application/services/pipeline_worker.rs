use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use futures::stream;

use crate::application::ports::{
    AudioFetcher, EngineTranscription, FetchError, JobStore, JobStoreError, RecordingGateway,
    SpeechEngine, SpeechEngineError, TranscodeOutcome, TranscodeRequest, Transcoder,
    TranscoderError,
};
use crate::domain::quality::{ScoreFormula, flag_segments, quality_score};
use crate::domain::{
    AudioChunk, AudioFormat, ChunkTranscript, ErrorCode, FlaggedSegment, Job, JobStatus, JobStep,
    ResultMetadata, TranscriptionResult, merge_transcripts,
};

/// Fixed vocabulary hint sent with Hebrew jobs to bias recognition toward
/// real-estate conversation terms.
const HEBREW_DOMAIN_PROMPT: &str =
    "שיחה בנושא נדל\"ן: נכס, דירה, חוזה מכר, משכנתא, שכירות, קבלן, טאבו, עמלת תיווך";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Files at or below this size on a native format skip transcoding.
    pub direct_size_limit_bytes: u64,
    pub chunk_duration_sec: u32,
    pub overlap_sec: u32,
    pub output_format: String,
    pub target_bitrate: String,
    /// Bounded fan-out for per-chunk download + transcription.
    pub chunk_parallelism: usize,
    pub source_timeout: Duration,
    pub chunk_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            direct_size_limit_bytes: 24 * 1024 * 1024,
            chunk_duration_sec: 600,
            overlap_sec: 3,
            output_format: "mp3".to_string(),
            target_bitrate: "64k".to_string(),
            chunk_parallelism: 2,
            source_timeout: Duration::from_secs(120),
            chunk_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("source download timed out after {0}s")]
    DownloadTimeout(u64),
    #[error("source download failed: {0}")]
    Download(String),
    #[error("downloaded file is empty")]
    EmptyFile,
    #[error("format {0} requires conversion but no transcoding service is configured")]
    NeedsConversion(AudioFormat),
    #[error("file of {0} bytes exceeds the direct-transcription limit and no transcoding service is configured")]
    FileTooLarge(u64),
    #[error("transcoding service unreachable: {0}")]
    TranscodingUnavailable(String),
    #[error("transcoding failed: {0}")]
    TranscodingFailed(String),
    #[error(transparent)]
    Engine(#[from] SpeechEngineError),
    #[error("job store: {0}")]
    Store(#[from] JobStoreError),
}

impl PipelineError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PipelineError::DownloadTimeout(_) => ErrorCode::DownloadTimeout,
            PipelineError::Download(_) => ErrorCode::DownloadFailed,
            PipelineError::EmptyFile => ErrorCode::EmptyFile,
            PipelineError::NeedsConversion(_) => ErrorCode::NeedsConversion,
            PipelineError::FileTooLarge(_) => ErrorCode::FileTooLarge,
            PipelineError::TranscodingUnavailable(_) => ErrorCode::TranscodingUnavailable,
            PipelineError::TranscodingFailed(_) => ErrorCode::TranscodingFailed,
            PipelineError::Engine(e) => e.error_code(),
            PipelineError::Store(_) => ErrorCode::ProcessingError,
        }
    }
}

struct PipelineOutcome {
    result: TranscriptionResult,
    quality_score: u8,
}

/// Per-chunk outcome; never an error, so one bad chunk cannot abort its
/// siblings.
struct ChunkOutcome {
    transcript: ChunkTranscript,
    flagged: Vec<FlaggedSegment>,
    segment_count: usize,
    duration_seconds: f64,
    language: Option<String>,
}

/// Drives one job through the state machine: download, format detection,
/// direct or chunked transcription, quality scoring, merge, terminal write,
/// best-effort recording callback.
pub struct PipelineWorker {
    store: Arc<dyn JobStore>,
    fetcher: Arc<dyn AudioFetcher>,
    engine: Arc<dyn SpeechEngine>,
    transcoder: Option<Arc<dyn Transcoder>>,
    gateway: Arc<dyn RecordingGateway>,
    config: PipelineConfig,
}

impl PipelineWorker {
    pub fn new(
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn AudioFetcher>,
        engine: Arc<dyn SpeechEngine>,
        transcoder: Option<Arc<dyn Transcoder>>,
        gateway: Arc<dyn RecordingGateway>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            engine,
            transcoder,
            gateway,
            config,
        }
    }

    /// Entry point of the background task. Owns the single terminal write:
    /// every exit path ends in exactly one `complete` or `fail`.
    pub async fn run(&self, job: Job) {
        let job_id = job.id;
        let recording_id = job.recording_id.clone();

        match self.process(&job).await {
            Ok(outcome) => {
                let transcript = outcome.result.transcription.clone();
                let duration = outcome.result.duration_seconds;
                if let Err(e) = self
                    .store
                    .complete(job_id, outcome.result, outcome.quality_score)
                    .await
                {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to write completed state");
                    return;
                }
                tracing::info!(job_id = %job_id, quality = outcome.quality_score, "Transcription job completed");

                if let Some(rec_id) = recording_id {
                    if let Err(e) = self
                        .gateway
                        .push_transcript(&rec_id, &transcript, duration)
                        .await
                    {
                        tracing::warn!(job_id = %job_id, recording_id = %rec_id, error = %e, "Recording callback failed");
                    }
                }
            }
            Err(e) => {
                let code = e.error_code();
                let message = e.to_string();
                if let Err(store_err) = self.store.fail(job_id, code, &message).await {
                    tracing::warn!(job_id = %job_id, error = %store_err, "Failed to write failed state");
                }
                tracing::error!(job_id = %job_id, error_code = %code, error = %message, "Transcription job failed");

                if let Some(rec_id) = recording_id {
                    if let Err(cb_err) = self.gateway.push_failure(&rec_id, code, &message).await {
                        tracing::warn!(job_id = %job_id, recording_id = %rec_id, error = %cb_err, "Recording failure callback failed");
                    }
                }
            }
        }
    }

    async fn process(&self, job: &Job) -> Result<PipelineOutcome, PipelineError> {
        self.store
            .transition(
                job.id,
                JobStatus::Downloading,
                10,
                "Downloading source audio",
            )
            .await?;

        let audio = self
            .fetcher
            .fetch(&job.audio_url, self.config.source_timeout)
            .await
            .map_err(source_fetch_error)?;

        if audio.bytes.is_empty() {
            return Err(PipelineError::EmptyFile);
        }

        let size = audio.bytes.len() as u64;
        let format = AudioFormat::detect(&job.audio_url, audio.content_type.as_deref());
        tracing::debug!(job_id = %job.id, format = %format, bytes = size, "Source audio downloaded");

        let needs_conversion = format.needs_conversion();
        let too_large = size > self.config.direct_size_limit_bytes;

        if !needs_conversion && !too_large {
            return self.direct_path(job, &audio.bytes, format, size).await;
        }

        let transcoder = self.transcoder.clone().ok_or(if needs_conversion {
            PipelineError::NeedsConversion(format)
        } else {
            PipelineError::FileTooLarge(size)
        })?;

        self.chunked_path(job, transcoder.as_ref(), format, size)
            .await
    }

    /// Small native-format file: one engine call over the whole payload.
    async fn direct_path(
        &self,
        job: &Job,
        audio: &[u8],
        format: AudioFormat,
        size: u64,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.store
            .transition(job.id, JobStatus::Transcribing, 30, "Transcribing audio")
            .await?;

        let transcription = self
            .engine
            .transcribe(
                audio,
                &format!("audio.{}", format.as_str()),
                &job.language,
                domain_prompt(&job.language),
            )
            .await?;

        let flagged = flag_segments(&transcription.segments, 0.0);
        let score = quality_score(
            flagged.len(),
            transcription.segments.len(),
            ScoreFormula::SingleFile,
        );
        if !flagged.is_empty() {
            self.store.add_flagged_segments(job.id, flagged).await?;
        }

        Ok(PipelineOutcome {
            result: TranscriptionResult {
                transcription: transcription.text,
                chunks_count: 1,
                successful_chunks: 1,
                failed_chunks: 0,
                duration_seconds: transcription.duration_seconds,
                audio_duration_seconds: transcription.duration_seconds,
                language_detected: transcription.language,
                was_transcoded: false,
                metadata: ResultMetadata::new(format, size),
            },
            quality_score: score,
        })
    }

    /// Large or non-native file: delegate splitting to the transcoding
    /// service, transcribe each returned unit, merge.
    async fn chunked_path(
        &self,
        job: &Job,
        transcoder: &dyn Transcoder,
        format: AudioFormat,
        size: u64,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.store
            .transition(
                job.id,
                JobStatus::Transcoding,
                20,
                "Transcoding and splitting source audio",
            )
            .await?;

        let request = TranscodeRequest {
            source_url: job.audio_url.clone(),
            job_id: job.id,
            chunk_duration_sec: self.config.chunk_duration_sec,
            overlap_sec: self.config.overlap_sec,
            output_format: self.config.output_format.clone(),
            target_bitrate: self.config.target_bitrate.clone(),
        };

        let outcome = transcoder
            .transcode_and_split(&request)
            .await
            .map_err(|e| match e {
                TranscoderError::Unavailable(msg) => PipelineError::TranscodingUnavailable(msg),
                TranscoderError::Failed(msg) => PipelineError::TranscodingFailed(msg),
            })?;

        match outcome {
            TranscodeOutcome::Normalized { url, duration_sec } => {
                self.normalized_path(job, &url, duration_sec, format, size)
                    .await
            }
            TranscodeOutcome::Chunks(chunks) => self.chunks_path(job, chunks, format, size).await,
        }
    }

    /// The transcoder returned one normalized file: a single effective
    /// chunk, transcribed like the direct path.
    async fn normalized_path(
        &self,
        job: &Job,
        url: &str,
        source_duration_sec: Option<f64>,
        format: AudioFormat,
        size: u64,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.store
            .transition(
                job.id,
                JobStatus::Transcribing,
                40,
                "Transcribing normalized audio",
            )
            .await?;

        let audio = self
            .fetcher
            .fetch(url, self.config.chunk_timeout)
            .await
            .map_err(source_fetch_error)?;

        let transcription = self
            .engine
            .transcribe(
                &audio.bytes,
                &format!("normalized.{}", self.config.output_format),
                &job.language,
                domain_prompt(&job.language),
            )
            .await?;

        let flagged = flag_segments(&transcription.segments, 0.0);
        let score = quality_score(
            flagged.len(),
            transcription.segments.len(),
            ScoreFormula::Chunked,
        );
        if !flagged.is_empty() {
            self.store.add_flagged_segments(job.id, flagged).await?;
        }

        Ok(PipelineOutcome {
            result: TranscriptionResult {
                transcription: transcription.text,
                chunks_count: 1,
                successful_chunks: 1,
                failed_chunks: 0,
                duration_seconds: transcription.duration_seconds,
                audio_duration_seconds: source_duration_sec
                    .unwrap_or(transcription.duration_seconds),
                language_detected: transcription.language,
                was_transcoded: true,
                metadata: ResultMetadata::new(format, size),
            },
            quality_score: score,
        })
    }

    async fn chunks_path(
        &self,
        job: &Job,
        chunks: Vec<AudioChunk>,
        format: AudioFormat,
        size: u64,
    ) -> Result<PipelineOutcome, PipelineError> {
        let total = chunks.len();
        self.store
            .transition(
                job.id,
                JobStatus::Transcribing,
                40,
                &format!("Transcribing {} chunks", total),
            )
            .await?;

        let completed = AtomicUsize::new(0);
        // `buffered` yields outcomes in input (index) order regardless of
        // completion order, so the merge below stays order-stable.
        let outcomes: Vec<ChunkOutcome> = stream::iter(chunks)
            .map(|chunk| self.process_chunk(job, chunk, total, &completed))
            .buffered(self.config.chunk_parallelism.max(1))
            .collect()
            .await;

        let failed_chunks = outcomes
            .iter()
            .filter(|o| o.transcript.is_failed())
            .count();
        let successful_chunks = total - failed_chunks;
        let total_segments: usize = outcomes.iter().map(|o| o.segment_count).sum();
        let duration_seconds: f64 = outcomes.iter().map(|o| o.duration_seconds).sum();
        let language_detected = outcomes.iter().find_map(|o| o.language.clone());

        let flagged: Vec<FlaggedSegment> =
            outcomes.iter().flat_map(|o| o.flagged.clone()).collect();
        let score = quality_score(flagged.len(), total_segments, ScoreFormula::Chunked);
        if !flagged.is_empty() {
            self.store.add_flagged_segments(job.id, flagged).await?;
        }

        let transcripts: Vec<ChunkTranscript> =
            outcomes.into_iter().map(|o| o.transcript).collect();

        if total > 1 {
            self.store
                .transition(job.id, JobStatus::Merging, 95, "Merging chunk transcripts")
                .await?;
        }
        let transcription = merge_transcripts(&transcripts);

        Ok(PipelineOutcome {
            result: TranscriptionResult {
                transcription,
                chunks_count: total,
                successful_chunks,
                failed_chunks,
                duration_seconds,
                audio_duration_seconds: duration_seconds,
                language_detected,
                was_transcoded: true,
                metadata: ResultMetadata::new(format, size),
            },
            quality_score: score,
        })
    }

    /// Download and transcribe one chunk. Failures are absorbed: the chunk
    /// becomes an error-marked transcript and the pipeline moves on.
    async fn process_chunk(
        &self,
        job: &Job,
        chunk: AudioChunk,
        total: usize,
        completed: &AtomicUsize,
    ) -> ChunkOutcome {
        let index = chunk.index;
        let outcome = match self.transcribe_chunk(job, &chunk).await {
            Ok(transcription) => {
                let flagged = flag_segments(&transcription.segments, chunk.start_sec);
                ChunkOutcome {
                    transcript: ChunkTranscript::succeeded(index, transcription.text),
                    flagged,
                    segment_count: transcription.segments.len(),
                    duration_seconds: transcription.duration_seconds,
                    language: transcription.language,
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, chunk = index, error = %e, "Chunk failed, continuing with siblings");
                let step = JobStep::new(
                    "transcribing",
                    format!("Chunk {} failed: {}", index, e),
                    0,
                )
                .with_extra(serde_json::json!({ "chunk": index, "failed": true }));
                if let Err(store_err) = self.store.append_step(job.id, step).await {
                    tracing::warn!(job_id = %job.id, error = %store_err, "Failed to record chunk failure step");
                }
                ChunkOutcome {
                    transcript: ChunkTranscript::failed(index),
                    flagged: Vec::new(),
                    segment_count: 0,
                    duration_seconds: 0.0,
                    language: None,
                }
            }
        };

        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        let progress = 40 + ((done as f64 / total as f64) * 50.0) as u8;
        let step = JobStep::new(
            "transcribing",
            format!("Transcribed chunk {}/{}", done, total),
            progress,
        );
        if let Err(e) = self.store.append_step(job.id, step).await {
            tracing::warn!(job_id = %job.id, error = %e, "Failed to record chunk progress step");
        }

        outcome
    }

    async fn transcribe_chunk(
        &self,
        job: &Job,
        chunk: &AudioChunk,
    ) -> Result<EngineTranscription, PipelineError> {
        let audio = self
            .fetcher
            .fetch(&chunk.url, self.config.chunk_timeout)
            .await
            .map_err(source_fetch_error)?;

        let transcription = self
            .engine
            .transcribe(
                &audio.bytes,
                &format!("chunk-{}.{}", chunk.index, self.config.output_format),
                &job.language,
                domain_prompt(&job.language),
            )
            .await?;

        Ok(transcription)
    }
}

fn domain_prompt(language: &str) -> Option<&'static str> {
    if language == "he" {
        Some(HEBREW_DOMAIN_PROMPT)
    } else {
        None
    }
}

fn source_fetch_error(e: FetchError) -> PipelineError {
    match e {
        FetchError::Timeout(secs) => PipelineError::DownloadTimeout(secs),
        FetchError::Status(status) => {
            PipelineError::Download(format!("HTTP status {}", status))
        }
        FetchError::Network(msg) => PipelineError::Download(msg),
    }
}
