//! Pipeline orchestrator — one payload in, one shaped transcript out.
//!
//! # Architecture
//!
//! ```text
//! HTTP handler / CLI
//!        │ AudioPayload
//!        ▼
//! TranscriptionPipeline::run()       ← async, many callers at once
//!        │
//!        ├─ Semaphore (server.max_pending)        → Busy
//!        ├─ spawn_blocking(audio::ingest)         → IngestError
//!        ├─ timeout(spawn_blocking(SttEngine))    → Timeout / SttError
//!        └─ shaping::shape                        → PipelineOutput
//! ```
//!
//! The engine is shared as `Arc<dyn SttEngine>`; `WhisperEngine` serialises
//! its own inference calls, so the semaphore only bounds how many requests
//! may wait for it.

pub mod runner;

pub use runner::{PipelineError, PipelineOutput, TranscriptionPipeline};
