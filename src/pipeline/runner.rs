//! Transcription pipeline — payload → ingest → Whisper → shaping.
//!
//! [`TranscriptionPipeline`] owns the shared [`SttEngine`] and an admission
//! semaphore.  Both entry points (HTTP handler and CLI) call
//! [`run`](TranscriptionPipeline::run).
//!
//! # Pipeline flow
//!
//! ```text
//! run(payload)
//!   ├─ try_acquire permit              ── none free → Busy
//!   ├─ spawn_blocking(ingest)          ── Workspace dropped here
//!   ├─ timeout(spawn_blocking(stt))    ── expired   → Timeout
//!   └─ shape(text)                     → PipelineOutput
//! ```
//!
//! All blocking work (file I/O, resampling, Whisper inference) is pushed
//! onto `tokio::task::spawn_blocking` so the async runtime never stalls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::audio::{ingest, AudioOrigin, AudioPayload, IngestError, Workspace};
use crate::config::{AppConfig, AudioConfig, ShapingConfig};
use crate::shaping::shape;
use crate::stt::{Segment, SttEngine, SttError};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can surface inside the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request carried no audio at all.
    #[error("no audio data provided")]
    MissingInput,

    /// The audio was rejected before reaching the model.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Whisper failed.
    #[error("transcription failed: {0}")]
    Stt(#[from] SttError),

    /// Every admission slot is taken.
    #[error("server busy: {0} requests already in flight")]
    Busy(usize),

    /// Inference did not finish within the configured limit.
    #[error("transcription timed out after {0:?}")]
    Timeout(Duration),

    /// Unexpected failure such as a panicked worker task.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// `true` for errors caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput
                | Self::Ingest(
                    IngestError::EmptyInput
                        | IngestError::DecodeFailure(_)
                        | IngestError::SilentInput { .. }
                        | IngestError::TooLong { .. }
                )
        )
    }
}

// ---------------------------------------------------------------------------
// PipelineOutput
// ---------------------------------------------------------------------------

/// Shaped transcript plus timing.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub transcript: String,
    pub language: String,
    pub segments: Vec<Segment>,
    /// Length of the validated audio in seconds.
    pub audio_secs: f32,
    /// Wall-clock time spent in Whisper.
    pub inference_ms: u128,
    /// Wall-clock time for the whole run, in seconds.
    pub duration: f64,
    pub origin: AudioOrigin,
}

// ---------------------------------------------------------------------------
// TranscriptionPipeline
// ---------------------------------------------------------------------------

/// Drives one payload through ingestion, transcription and shaping.
///
/// Cheap to clone; clones share the engine and the admission semaphore.
#[derive(Clone)]
pub struct TranscriptionPipeline {
    stt: Arc<dyn SttEngine>,
    audio: AudioConfig,
    shaping: ShapingConfig,
    timeout: Option<Duration>,
    max_pending: usize,
    permits: Arc<Semaphore>,
}

impl TranscriptionPipeline {
    /// Build a pipeline around `stt` using the `audio`, `shaping`,
    /// `stt.timeout_secs` and `server.max_pending` settings of `config`.
    ///
    /// `timeout_secs = 0` disables the timeout; `max_pending` is at least 1.
    pub fn new(stt: Arc<dyn SttEngine>, config: &AppConfig) -> Self {
        let max_pending = config.server.max_pending.max(1);
        let timeout = match config.stt.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            stt,
            audio: config.audio.clone(),
            shaping: config.shaping.clone(),
            timeout,
            max_pending,
            permits: Arc::new(Semaphore::new(max_pending)),
        }
    }

    /// Override the per-call inference timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Admission slots currently free.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Transcribe `payload`.
    pub async fn run(&self, payload: AudioPayload) -> Result<PipelineOutput, PipelineError> {
        let started = Instant::now();

        let permit = Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|_| PipelineError::Busy(self.max_pending))?;

        // ── 1. Ingest (blocking → thread pool) ───────────────────────────
        let settings = self.audio.clone();
        let audio = tokio::task::spawn_blocking(move || {
            let workspace = Workspace::create(settings.scratch_dir.as_deref())?;
            ingest(&payload, &workspace, &settings)
        })
        .await
        .map_err(|e| PipelineError::Internal(format!("ingest task: {e}")))??;

        let audio_secs = audio.duration_secs();
        let origin = audio.origin();

        // ── 2. Transcribe (blocking → thread pool) ───────────────────────
        // The permit travels with the inference task so a timed-out call
        // keeps its slot until Whisper actually returns.
        let stt = Arc::clone(&self.stt);
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            stt.transcribe(audio.samples())
        });

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                log::warn!("pipeline: inference exceeded {limit:?}, abandoning result");
                PipelineError::Timeout(limit)
            })?,
            None => task.await,
        };
        let result = joined.map_err(|e| PipelineError::Internal(format!("stt task: {e}")))??;

        log::debug!("pipeline: raw transcript = {:?}", result.text);

        // ── 3. Shape ─────────────────────────────────────────────────────
        let transcript = shape(&result.text, &self.shaping);
        let duration = started.elapsed().as_secs_f64();

        log::info!(
            "pipeline: {:.2}s audio → {} chars in {:.2}s (inference {} ms)",
            audio_secs,
            transcript.chars().count(),
            duration,
            result.duration_ms
        );

        Ok(PipelineOutput {
            transcript,
            language: result.language,
            segments: result.segments,
            audio_secs,
            inference_ms: result.duration_ms,
            duration,
            origin,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
