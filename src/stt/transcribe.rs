//! Transcription parameter types and result types.
//!
//! [`TranscribeParams`] carries all settings that control Whisper inference
//! for one loaded engine.  [`TranscriptionResult`] is returned by
//! [`SttEngine::transcribe`](super::SttEngine::transcribe).

use serde::Serialize;

use crate::config::SttConfig;

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Mirrors `whisper_rs::SamplingStrategy` but is owned and `Clone`.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    /// Greedy (single-pass) decoding.
    Greedy {
        /// Number of candidate tokens evaluated per step.  1 is fastest.
        best_of: i32,
    },
    /// Beam-search decoding.
    BeamSearch { beam_size: i32, patience: f32 },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// Language every engine decodes in (ISO-639-1).  Not configurable.
pub const LANGUAGE: &str = "th";

/// Parameters for every Whisper run of one engine.
///
/// Translation is never enabled and the language is always [`LANGUAGE`].
///
/// ```
/// use thai_transcribe::stt::TranscribeParams;
///
/// let params = TranscribeParams::default();
/// assert_eq!(params.chunk_secs, 30);
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// Decoding strategy.
    pub strategy: SamplingStrategy,

    /// Number of CPU threads handed to Whisper.  Defaults to
    /// [`optimal_threads()`], capped at 8.
    pub n_threads: i32,

    /// Ask whisper.cpp for GPU inference.
    pub use_gpu: bool,

    /// Audio longer than this is fed to Whisper in consecutive slices.
    pub chunk_secs: u32,

    /// Suppress Whisper's progress output to stderr.
    pub suppress_progress: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            use_gpu: false,
            chunk_secs: 30,
            suppress_progress: true,
        }
    }
}

impl TranscribeParams {
    pub fn from_config(config: &SttConfig) -> Self {
        Self {
            n_threads: config.n_threads.unwrap_or_else(optimal_threads),
            use_gpu: config.use_gpu,
            chunk_secs: config.chunk_secs,
            ..Self::default()
        }
    }

    /// Samples per Whisper pass at 16 kHz; `None` when chunking is off.
    pub fn chunk_samples(&self) -> Option<usize> {
        match self.chunk_secs {
            0 => None,
            secs => Some(secs as usize * 16_000),
        }
    }
}

/// Returns the number of physical CPU threads to use for inference,
/// capped at 8 to avoid diminishing returns on Whisper.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// The output of a successful transcription.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionResult {
    /// Full transcript text (trimmed).
    pub text: String,

    /// Language the model was told to transcribe.
    pub language: String,

    /// Time-aligned segments in audio order.
    pub segments: Vec<Segment>,

    /// Wall-clock time the inference took, in milliseconds.
    pub duration_ms: u128,
}

/// A single time-aligned text chunk produced by Whisper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub text: String,
    /// Start time in milliseconds from the start of the audio.
    pub start_ms: u64,
    /// End time in milliseconds from the start of the audio.
    pub end_ms: u64,
}
