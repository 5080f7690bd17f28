//! Thai speech-to-text over HTTP and the command line.
//!
//! A Thonburian Whisper GGML model is loaded once and shared by:
//!
//! * `thai-transcribe-server` — `POST /transcribe`, `GET /health` ([`server`])
//! * `thai-transcribe` — transcribe one file and print JSON
//!
//! Both go through [`pipeline::TranscriptionPipeline`]:
//! [`audio`] ingestion → [`stt`] inference → [`shaping`].

pub mod audio;
pub mod client;
pub mod config;
pub mod pipeline;
pub mod server;
pub mod shaping;
pub mod stt;
