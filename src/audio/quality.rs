//! Pre-transcription energy check.
//!
//! [`AudioQuality`] rejects 16 kHz mono clips that are empty or whose peak
//! absolute amplitude stays below a configurable silence threshold.  Both
//! the HTTP service and the CLI use the same threshold from
//! [`crate::config::AudioConfig::silence_threshold`].
//!
//! ```rust
//! use thai_transcribe::audio::{AudioQuality, IngestError};
//!
//! let validator = AudioQuality::new(0.01);
//! assert!(validator.validate(&vec![0.1_f32; 16_000]).is_ok());
//! assert!(matches!(
//!     validator.validate(&vec![0.001_f32; 16_000]),
//!     Err(IngestError::SilentInput { .. })
//! ));
//! ```

use super::ingest::IngestError;

/// Largest absolute sample value, or `0.0` for an empty slice.
pub fn peak_amplitude(audio: &[f32]) -> f32 {
    audio.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

/// Validates an audio clip before STT transcription.
#[derive(Debug, Clone, Copy)]
pub struct AudioQuality {
    /// Minimum peak amplitude for the clip to be considered non-silent.
    pub silence_threshold: f32,
}

impl Default for AudioQuality {
    fn default() -> Self {
        Self {
            silence_threshold: 0.01,
        }
    }
}

impl AudioQuality {
    pub fn new(silence_threshold: f32) -> Self {
        Self { silence_threshold }
    }

    /// Validate `audio` (16 kHz mono `f32`) and return its peak amplitude.
    ///
    /// An empty clip reports a peak of `0.0` and is rejected the same way as
    /// a silent one.
    pub fn validate(&self, audio: &[f32]) -> Result<f32, IngestError> {
        let peak = peak_amplitude(audio);

        if audio.is_empty() || peak < self.silence_threshold {
            return Err(IngestError::SilentInput {
                peak,
                threshold: self.silence_threshold,
                samples: audio.len(),
            });
        }

        Ok(peak)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
