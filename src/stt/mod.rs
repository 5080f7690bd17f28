//! STT (Speech-to-Text) engine module.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  SttEngine (trait)                   │
//! │                                                      │
//! │   ┌──────────────┐    ┌──────────────┐               │
//! │   │  ModelPaths  │    │ WhisperEngine│               │
//! │   │ - resolve    │───▶│ - ctx        │               │
//! │   │ - registry   │    │ - lock       │               │
//! │   └──────────────┘    └──────┬───────┘               │
//! │                              │                       │
//! │                              ▼                       │
//! │                    ┌──────────────────┐              │
//! │                    │  transcribe()    │              │
//! │                    │ 30 s passes → th │              │
//! │                    └──────────────────┘              │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use thai_transcribe::stt::{SttEngine, TranscribeParams, WhisperEngine};
//!
//! let engine = WhisperEngine::load("models/ggml-thonburian-medium.bin", TranscribeParams::default())
//!     .expect("model not found");
//!
//! // audio: 16 kHz, mono, f32 PCM from the audio module
//! let audio: Vec<f32> = vec![0.0; 16_000];
//! let result = engine.transcribe(&audio).unwrap();
//! println!("{}", result.text);
//! ```

pub mod engine;
pub mod model;
pub mod transcribe;

pub use engine::{SttEngine, SttError, WhisperEngine};
pub use model::{
    find_model_by_id, resolve_model_path, ModelInfo, ModelPaths, ModelSize, THAI_MODELS,
    WHISPER_MODELS,
};
pub use transcribe::{
    SamplingStrategy, Segment, TranscribeParams, TranscriptionResult, LANGUAGE,
};

#[cfg(test)]
pub use engine::MockSttEngine;
