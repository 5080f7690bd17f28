//! Core STT engine trait and implementations.
//!
//! # Overview
//!
//! [`SttEngine`] is the public interface used by the pipeline.  It is
//! object-safe and `Send + Sync` so it can be held behind an `Arc<dyn SttEngine>`.
//!
//! [`WhisperEngine`] is the production implementation that wraps a
//! `whisper_rs::WhisperContext`.  Construct it with [`WhisperEngine::load`].
//! The model is loaded once; inference calls are serialised by a lock the
//! engine owns, so concurrent requests queue for the model instead of
//! racing on it.
//!
//! [`MockSttEngine`] (available under `#[cfg(test)]`) returns a
//! pre-configured response without a model file.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use thiserror::Error;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters, WhisperState};

use crate::config::SttConfig;
use crate::stt::model::{resolve_model_path, ModelPaths};
use crate::stt::transcribe::{
    SamplingStrategy, Segment, TranscribeParams, TranscriptionResult, LANGUAGE,
};

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors that can arise from the STT subsystem.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// The GGML model file was not found (or the id is not registered).
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// `whisper_rs` failed to initialise a `WhisperContext` or `WhisperState`.
    #[error("Whisper context initialisation failed: {0}")]
    ContextInit(String),

    /// An error occurred during the inference pass.
    #[error("Transcription error: {0}")]
    Transcription(String),
}

// ---------------------------------------------------------------------------
// SttEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// `audio` must be **16 kHz, mono, f32** PCM samples.  The returned text is
/// raw model output; shaping happens in the caller.
pub trait SttEngine: Send + Sync {
    fn transcribe(&self, audio: &[f32]) -> Result<TranscriptionResult, SttError>;
}

// Compile-time assertion: Box<dyn SttEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SttEngine>) {}
};

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

/// Production STT engine that wraps a `whisper_rs::WhisperContext`.
pub struct WhisperEngine {
    ctx: WhisperContext,
    params: TranscribeParams,
    inference: Mutex<()>,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; the model
// weights are read-only after loading and each call gets its own state.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model from `model_path` and prepare it for inference.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`] — `model_path` does not exist.
    /// - [`SttError::ContextInit`]  — whisper-rs failed to load the file.
    pub fn load(model_path: impl AsRef<Path>, params: TranscribeParams) -> Result<Self, SttError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu = params.use_gpu;

        let start = Instant::now();
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| SttError::ContextInit(e.to_string()))?;
        log::info!(
            "stt: loaded {} in {} ms (gpu: {}, threads: {})",
            path.display(),
            start.elapsed().as_millis(),
            params.use_gpu,
            params.n_threads
        );

        Ok(Self {
            ctx,
            params,
            inference: Mutex::new(()),
        })
    }

    /// Resolve the model named by `config` under `paths` and load it.
    pub fn from_config(config: &SttConfig, paths: &ModelPaths) -> Result<Self, SttError> {
        let model_path = resolve_model_path(config, paths)?;
        Self::load(model_path, TranscribeParams::from_config(config))
    }

    pub fn params(&self) -> &TranscribeParams {
        &self.params
    }

    fn full_params(&self) -> FullParams<'_, '_> {
        use whisper_rs::SamplingStrategy as WS;
        let ws = match self.params.strategy {
            SamplingStrategy::Greedy { best_of } => WS::Greedy { best_of },
            SamplingStrategy::BeamSearch { beam_size, patience } => {
                WS::BeamSearch { beam_size, patience }
            }
        };

        let mut fp = FullParams::new(ws);
        fp.set_language(Some(LANGUAGE));
        fp.set_translate(false);
        fp.set_n_threads(self.params.n_threads);

        if self.params.suppress_progress {
            fp.set_print_progress(false);
            fp.set_print_realtime(false);
            fp.set_print_special(false);
            fp.set_print_timestamps(false);
        }
        fp
    }

    /// Run one Whisper pass over `audio` and append its segments, shifted
    /// by `offset_ms`, to `segments`.
    fn run_pass(
        &self,
        state: &mut WhisperState,
        audio: &[f32],
        offset_ms: u64,
        segments: &mut Vec<Segment>,
    ) -> Result<(), SttError> {
        state
            .full(self.full_params(), audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;

            // Timestamps are in centiseconds → multiply by 10 for ms.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as u64 * 10;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as u64 * 10;

            segments.push(Segment {
                text,
                start_ms: offset_ms + t0,
                end_ms: offset_ms + t1,
            });
        }
        Ok(())
    }
}

impl SttEngine for WhisperEngine {
    fn transcribe(&self, audio: &[f32]) -> Result<TranscriptionResult, SttError> {
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self
            .inference
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        let wall_start = Instant::now();
        let chunk_len = self.params.chunk_samples().unwrap_or(audio.len().max(1));
        let mut segments = Vec::new();

        for (index, chunk) in audio.chunks(chunk_len).enumerate() {
            let offset_ms = (index * chunk_len) as u64 * 1_000 / 16_000;
            log::debug!(
                "stt: pass {} ({} samples at +{} ms)",
                index + 1,
                chunk.len(),
                offset_ms
            );
            self.run_pass(&mut state, chunk, offset_ms, &mut segments)?;
        }

        let text: String = segments.iter().map(|s| s.text.as_str()).collect();

        Ok(TranscriptionResult {
            text: text.trim().to_string(),
            language: LANGUAGE.to_string(),
            segments,
            duration_ms: wall_start.elapsed().as_millis(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockSttEngine  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without loading any
/// model file.  An optional delay simulates slow inference.
#[cfg(test)]
pub struct MockSttEngine {
    response: Result<String, SttError>,
    delay: std::time::Duration,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockSttEngine {
    /// Create a mock that always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            delay: std::time::Duration::ZERO,
            calls: Default::default(),
        }
    }

    /// Create a mock that always returns `Err(error)`.
    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
            delay: std::time::Duration::ZERO,
            calls: Default::default(),
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl SttEngine for MockSttEngine {
    fn transcribe(&self, audio: &[f32]) -> Result<TranscriptionResult, SttError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let text = self.response.clone()?;
        let end_ms = audio.len() as u64 * 1_000 / 16_000;
        Ok(TranscriptionResult {
            segments: vec![Segment {
                text: text.clone(),
                start_ms: 0,
                end_ms,
            }],
            text,
            language: LANGUAGE.to_string(),
            duration_ms: self.delay.as_millis(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ok_returns_configured_text() {
        let engine = MockSttEngine::ok("สวัสดีครับ");
        let result = engine.transcribe(&vec![0.0f32; 32_000]).unwrap();
        assert_eq!(result.text, "สวัสดีครับ");
        assert_eq!(result.language, "th");
        assert_eq!(result.segments[0].end_ms, 2_000);
        assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn mock_err_returns_configured_error() {
        let engine = MockSttEngine::err(SttError::Transcription("boom".into()));
        let err = engine.transcribe(&[0.0f32; 160]).unwrap_err();
        assert!(matches!(err, SttError::Transcription(_)));
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let params = TranscribeParams::default();
        let result = WhisperEngine::load("/nonexistent/model.bin", params);
        assert!(
            matches!(result, Err(SttError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    #[test]
    fn from_config_reports_missing_registry_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = WhisperEngine::from_config(&SttConfig::default(), &ModelPaths::new(dir.path()))
            .unwrap_err();
        assert!(
            matches!(&err, SttError::ModelNotFound(p) if p.ends_with("ggml-thonburian-medium.bin")),
            "{err}"
        );
    }

    #[test]
    fn load_garbage_file_is_context_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ggml-broken.bin");
        std::fs::write(&path, b"definitely not a ggml model").unwrap();
        let result = WhisperEngine::load(&path, TranscribeParams::default());
        assert!(
            matches!(result, Err(SttError::ContextInit(_))),
            "expected ContextInit, got: {result:?}"
        );
    }

    #[test]
    fn box_dyn_stt_engine_compiles() {
        let engine: Box<dyn SttEngine> = Box::new(MockSttEngine::ok("ok"));
        assert!(engine.transcribe(&[0.1; 16]).is_ok());
    }

    #[test]
    fn stt_error_display_model_not_found() {
        let e = SttError::ModelNotFound("/some/path.bin".into());
        assert!(e.to_string().contains("/some/path.bin"));
    }
}
