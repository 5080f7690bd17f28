//! Local pipeline as a [`Transcriber`], and a remote-first fallback wrapper.
//!
//! When the remote service is unreachable, busy past all retries, or
//! rejects the request, [`FallbackTranscriber`] hands the same bytes to the
//! secondary transcriber (normally [`LocalTranscriber`]) instead of failing.

use async_trait::async_trait;

use crate::audio::AudioPayload;
use crate::client::remote::{ClientError, Transcriber, Transcript, TranscriptSource};
use crate::pipeline::TranscriptionPipeline;

// ---------------------------------------------------------------------------
// LocalTranscriber
// ---------------------------------------------------------------------------

/// Runs the in-process [`TranscriptionPipeline`].
pub struct LocalTranscriber {
    pipeline: TranscriptionPipeline,
}

impl LocalTranscriber {
    pub fn new(pipeline: TranscriptionPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Transcriber for LocalTranscriber {
    async fn transcribe(&self, audio: &[u8], _user_id: &str) -> Result<Transcript, ClientError> {
        let output = self.pipeline.run(AudioPayload::new(audio.to_vec())).await?;
        Ok(Transcript {
            transcript: output.transcript,
            language: output.language,
            segments: output.segments,
            source: TranscriptSource::Local,
        })
    }
}

// ---------------------------------------------------------------------------
// FallbackTranscriber
// ---------------------------------------------------------------------------

/// Tries `primary`, then `secondary` on any error.
///
/// Only the secondary's error is returned when both fail.
pub struct FallbackTranscriber<P: Transcriber, S: Transcriber> {
    primary: P,
    secondary: S,
}

impl<P: Transcriber, S: Transcriber> FallbackTranscriber<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }
}

#[async_trait]
impl<P: Transcriber, S: Transcriber> Transcriber for FallbackTranscriber<P, S> {
    async fn transcribe(&self, audio: &[u8], user_id: &str) -> Result<Transcript, ClientError> {
        match self.primary.transcribe(audio, user_id).await {
            Ok(transcript) => Ok(transcript),
            Err(err) => {
                log::warn!("client: remote transcription failed ({err}), falling back to local");
                self.secondary.transcribe(audio, user_id).await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::config::AppConfig;
    use crate::stt::MockSttEngine;

    struct Fixed(&'static str, TranscriptSource);

    #[async_trait]
    impl Transcriber for Fixed {
        async fn transcribe(&self, _a: &[u8], _u: &str) -> Result<Transcript, ClientError> {
            Ok(Transcript {
                transcript: self.0.into(),
                language: "th".into(),
                segments: Vec::new(),
                source: self.1,
            })
        }
    }

    #[derive(Default)]
    struct Failing(AtomicUsize);

    #[async_trait]
    impl Transcriber for Failing {
        async fn transcribe(&self, _a: &[u8], _u: &str) -> Result<Transcript, ClientError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Timeout)
        }
    }

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let t = FallbackTranscriber::new(
            Fixed("remote", TranscriptSource::Remote),
            Failing::default(),
        );
        let out = t.transcribe(b"audio", "u").await.unwrap();
        assert_eq!(out.transcript, "remote");
        assert_eq!(out.source, TranscriptSource::Remote);
    }

    #[tokio::test]
    async fn primary_failure_uses_secondary() {
        let t = FallbackTranscriber::new(
            Failing::default(),
            Fixed("local", TranscriptSource::Local),
        );
        let out = t.transcribe(b"audio", "u").await.unwrap();
        assert_eq!(out.source, TranscriptSource::Local);
        assert_eq!(t.primary().0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_failing_returns_secondary_error() {
        let t = FallbackTranscriber::new(Failing::default(), Failing::default());
        assert!(matches!(
            t.transcribe(b"audio", "u").await.unwrap_err(),
            ClientError::Timeout
        ));
    }

    #[tokio::test]
    async fn local_transcriber_maps_pipeline_errors() {
        let scratch = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.audio.scratch_dir = Some(scratch.path().to_path_buf());
        let pipeline = TranscriptionPipeline::new(Arc::new(MockSttEngine::ok("x")), &config);

        let err = LocalTranscriber::new(pipeline)
            .transcribe(&[0u8; 4_096], "u")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Local(_)), "{err}");
    }
}
