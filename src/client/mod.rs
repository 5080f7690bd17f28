//! Client side of the transcription service.
//!
//! # Usage
//!
//! ```rust,no_run
//! use thai_transcribe::client::{RemoteClient, Transcriber};
//! use thai_transcribe::config::RemoteConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = RemoteClient::from_config(&RemoteConfig::default());
//!     if client.health().await {
//!         let wav = std::fs::read("clip.wav").unwrap();
//!         let result = client.transcribe(&wav, "user-1").await;
//!         println!("{result:?}");
//!     }
//! }
//! ```
//!
//! Wrap a [`RemoteClient`] and a [`LocalTranscriber`] in a
//! [`FallbackTranscriber`] to keep working when the service is down.

pub mod fallback;
pub mod remote;

pub use fallback::{FallbackTranscriber, LocalTranscriber};
pub use remote::{
    backoff_delay, timeout_for_size, ClientError, RemoteClient, Transcriber, Transcript,
    TranscriptSource,
};
