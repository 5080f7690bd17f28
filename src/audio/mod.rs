//! Audio ingestion — payload sniffing → WAV decode → mono → 16 kHz → energy check.
//!
//! # Pipeline
//!
//! ```text
//! AudioPayload ─┬─ "RIFF…" ──────────────┐
//!               └─ raw PCM → wrap_raw_pcm ┴→ workspace/payload.wav
//!          → decode_wav_file → stereo_to_mono → resample_to_16k
//!          → AudioQuality::validate → ValidatedAudio
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use thai_transcribe::audio::{ingest, AudioPayload, Workspace};
//! use thai_transcribe::config::AudioConfig;
//!
//! let bytes = std::fs::read("clip.wav").unwrap();
//! let workspace = Workspace::create(None).unwrap();
//! let audio = ingest(&AudioPayload::new(bytes), &workspace, &AudioConfig::default()).unwrap();
//! println!("{:.2}s @ {} Hz", audio.duration_secs(), audio.sample_rate());
//! // dropping `workspace` removes payload.wav
//! ```

pub mod decode;
pub mod ingest;
pub mod payload;
pub mod quality;
pub mod resample;
pub mod workspace;

pub use decode::{decode_wav_bytes, decode_wav_file, DecodedAudio};
pub use ingest::{ingest, IngestError, ValidatedAudio};
pub use payload::{detect_origin, wrap_raw_pcm, AudioOrigin, AudioPayload, PcmFormat};
pub use quality::{peak_amplitude, AudioQuality};
pub use resample::{
    check_source_rate, resample_to_16k, stereo_to_mono, MAX_SOURCE_RATE, MIN_SOURCE_RATE,
    TARGET_SAMPLE_RATE,
};
pub use workspace::Workspace;
