//! `Transcriber` trait and the HTTP [`RemoteClient`].
//!
//! `RemoteClient` talks to a running `thai-transcribe-server` (or anything
//! that speaks the same `/transcribe` + `/health` JSON).  All connection
//! details come from [`RemoteConfig`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Serialize;
use thiserror::Error;

use crate::config::RemoteConfig;
use crate::pipeline::PipelineError;
use crate::server::{HealthResponse, TranscribeResponse};
use crate::stt::Segment;

const MIB: usize = 1024 * 1024;

/// Upper bound on one backoff sleep, as a multiple of the base delay.
const BACKOFF_CAP_FACTOR: u32 = 10;

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ClientError {
    /// Payload is too small to be worth sending.
    #[error("payload of {len} bytes is below the {min}-byte minimum")]
    PayloadTooSmall { len: usize, min: usize },

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Local transcription failed.
    #[error("local transcription failed: {0}")]
    Local(#[from] PipelineError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Request(e.to_string())
        }
    }
}

impl ClientError {
    /// Transport failures, timeouts and 5xx are worth another attempt;
    /// everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript / Transcriber
// ---------------------------------------------------------------------------

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    Remote,
    Local,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub transcript: String,
    pub language: String,
    /// Empty for remote results; the service does not return segments.
    pub segments: Vec<Segment>,
    #[serde(skip)]
    pub source: TranscriptSource,
}

/// Async interface shared by the remote client and the local pipeline.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], user_id: &str) -> Result<Transcript, ClientError>;
}

// ---------------------------------------------------------------------------
// RemoteClient
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    audio: String,
    user_id: &'a str,
}

/// Request timeout scaled to payload size: < 1 MiB → 30 s, < 10 MiB →
/// 120 s, otherwise 300 s.
pub fn timeout_for_size(len: usize) -> Duration {
    let secs = if len < MIB {
        30
    } else if len < 10 * MIB {
        120
    } else {
        300
    };
    Duration::from_secs(secs)
}

/// Delay before retry number `attempt + 1`: `base · 2^attempt`, capped at
/// ten times `base`.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt).min(BACKOFF_CAP_FACTOR);
    base.saturating_mul(factor)
}

/// HTTP client for a remote transcription service.
pub struct RemoteClient {
    client: reqwest::Client,
    config: RemoteConfig,
    backoff_base: Duration,
}

impl RemoteClient {
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
            backoff_base: Duration::from_millis(1_000),
        }
    }

    /// Override the base retry delay (1 s by default).
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// `true` when `GET /health` answers `{"status": "healthy"}` in time.
    pub async fn health(&self) -> bool {
        let response = self
            .client
            .get(self.url("/health"))
            .timeout(Duration::from_secs(self.config.health_timeout_secs))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<HealthResponse>().await {
                Ok(health) => health.status == "healthy",
                Err(e) => {
                    log::warn!("client: unreadable health response: {e}");
                    false
                }
            },
            Ok(resp) => {
                log::warn!("client: health check returned {}", resp.status());
                false
            }
            Err(e) => {
                log::warn!("client: health check failed: {e}");
                false
            }
        }
    }

    /// One `POST /transcribe` attempt.
    pub async fn transcribe_once(
        &self,
        audio: &[u8],
        user_id: &str,
    ) -> Result<Transcript, ClientError> {
        if audio.len() < self.config.min_payload_bytes.max(1) {
            return Err(ClientError::PayloadTooSmall {
                len: audio.len(),
                min: self.config.min_payload_bytes.max(1),
            });
        }

        let body = RequestBody {
            audio: base64::engine::general_purpose::STANDARD.encode(audio),
            user_id,
        };

        let response = self
            .client
            .post(self.url("/transcribe"))
            .timeout(timeout_for_size(audio.len()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or(text);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        Ok(Transcript {
            transcript: parsed.transcript,
            language: parsed.language,
            segments: Vec::new(),
            source: TranscriptSource::Remote,
        })
    }

    /// [`transcribe_once`](Self::transcribe_once) with up to
    /// `max_retries` attempts and exponential backoff between them.
    pub async fn transcribe_with_retry(
        &self,
        audio: &[u8],
        user_id: &str,
    ) -> Result<Transcript, ClientError> {
        let attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match self.transcribe_once(audio, user_id).await {
                Ok(transcript) => return Ok(transcript),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let delay = backoff_delay(attempt, self.backoff_base);
                    log::warn!(
                        "client: attempt {}/{} failed ({e}), retrying in {delay:?}",
                        attempt + 1,
                        attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Transcriber for RemoteClient {
    async fn transcribe(&self, audio: &[u8], user_id: &str) -> Result<Transcript, ClientError> {
        self.transcribe_with_retry(audio, user_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_scales_with_payload() {
        assert_eq!(timeout_for_size(0), Duration::from_secs(30));
        assert_eq!(timeout_for_size(MIB - 1), Duration::from_secs(30));
        assert_eq!(timeout_for_size(MIB), Duration::from_secs(120));
        assert_eq!(timeout_for_size(10 * MIB - 1), Duration::from_secs(120));
        assert_eq!(timeout_for_size(10 * MIB), Duration::from_secs(300));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let base = Duration::from_millis(1_000);
        let delays: Vec<u128> = (0..6).map(|i| backoff_delay(i, base).as_millis()).collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 10_000, 10_000]);
        assert_eq!(backoff_delay(40, base), Duration::from_secs(10));
    }

    #[test]
    fn retryable_classification() {
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::Request("refused".into()).is_retryable());
        assert!(ClientError::Status {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!ClientError::Status {
            status: 400,
            message: "silent".into()
        }
        .is_retryable());
        assert!(!ClientError::Parse("x".into()).is_retryable());
        assert!(!ClientError::PayloadTooSmall { len: 1, min: 2 }.is_retryable());
    }

    #[tokio::test]
    async fn small_payload_is_skipped_without_a_request() {
        // Port 9 (discard) is never contacted: the size check comes first.
        let config = RemoteConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..RemoteConfig::default()
        };
        let client = RemoteClient::from_config(&config);
        for len in [0, 1, 1_023] {
            let err = client.transcribe_once(&vec![1u8; len], "u").await.unwrap_err();
            assert!(matches!(err, ClientError::PayloadTooSmall { .. }), "{err}");
        }
    }

    #[test]
    fn url_joins_without_double_slash() {
        let config = RemoteConfig {
            base_url: "http://host:5000/".into(),
            ..RemoteConfig::default()
        };
        let client = RemoteClient::from_config(&config);
        assert_eq!(client.url("/health"), "http://host:5000/health");
    }
}
