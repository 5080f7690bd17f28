//! Payload → validated 16 kHz mono samples.
//!
//! [`ingest`] is the only constructor of [`ValidatedAudio`]; holding one
//! means the audio decoded cleanly, is non-empty, and is loud enough to be
//! worth sending to Whisper.

use std::time::Instant;

use thiserror::Error;

use super::decode::decode_wav_file;
use super::payload::{AudioOrigin, AudioPayload};
use super::quality::AudioQuality;
use super::resample::{resample_to_16k, stereo_to_mono, TARGET_SAMPLE_RATE};
use super::workspace::Workspace;
use crate::config::AudioConfig;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("audio payload is empty")]
    EmptyInput,

    #[error("could not decode audio: {0}")]
    DecodeFailure(String),

    #[error("audio is silent (peak {peak:.4} < threshold {threshold:.4}, {samples} samples)")]
    SilentInput {
        peak: f32,
        threshold: f32,
        samples: usize,
    },

    #[error("audio is too long ({secs:.1}s, limit {max_secs}s)")]
    TooLong { secs: f64, max_secs: u32 },

    #[error("scratch file error: {0}")]
    Io(String),
}

/// Mono `f32` samples at 16 kHz that passed the energy check.
#[derive(Debug, Clone)]
pub struct ValidatedAudio {
    samples: Vec<f32>,
    peak: f32,
    origin: AudioOrigin,
}

impl ValidatedAudio {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        TARGET_SAMPLE_RATE
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn origin(&self) -> AudioOrigin {
        self.origin
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / TARGET_SAMPLE_RATE as f32
    }
}

/// Decode, normalise and validate `payload`.
///
/// Scratch files go into `workspace`; the caller owns it and its drop
/// removes them regardless of the outcome here.
pub fn ingest(
    payload: &AudioPayload,
    workspace: &Workspace,
    settings: &AudioConfig,
) -> Result<ValidatedAudio, IngestError> {
    if payload.is_empty() {
        return Err(IngestError::EmptyInput);
    }

    let start = Instant::now();
    let origin = payload.origin();
    log::debug!("ingest: {} bytes, origin {:?}", payload.len(), origin);

    let wav_path = workspace.payload_path();
    payload.write_wav(&wav_path, settings.raw_pcm)?;

    let decoded = decode_wav_file(&wav_path, settings.max_duration_secs)?;
    log::debug!(
        "ingest: decoded {} frame(s) @ {} Hz, {} ch",
        decoded.frames(),
        decoded.sample_rate,
        decoded.channels
    );

    let mono = stereo_to_mono(&decoded.samples, decoded.channels);
    let samples = resample_to_16k(&mono, decoded.sample_rate)?;

    let peak = AudioQuality::new(settings.silence_threshold).validate(&samples)?;

    let audio = ValidatedAudio {
        samples,
        peak,
        origin,
    };

    if settings.write_normalized_copy {
        let path = workspace.write_normalized(&audio)?;
        log::debug!("ingest: normalized copy at {}", path.display());
    }

    log::info!(
        "ingest: {:.2}s of audio (peak {:.3}) ready in {} ms",
        audio.duration_secs(),
        audio.peak,
        start.elapsed().as_millis()
    );

    Ok(audio)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
