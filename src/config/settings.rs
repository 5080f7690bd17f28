//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a settings file only needs the
//! keys it wants to change.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::audio::PcmFormat;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Settings for the HTTP transcription service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (`0.0.0.0` listens on every interface).
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Largest accepted request body in bytes.  Base64 inflates audio by
    /// roughly a third, so this bounds decoded payloads at ~48 MiB.
    pub max_body_bytes: usize,
    /// Requests admitted at once (waiting for the model or running).
    /// Further requests are answered with 503 instead of queueing forever.
    pub max_pending: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            max_body_bytes: 64 * 1024 * 1024,
            max_pending: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper STT engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Model id from the registry (e.g. `"thonburian-medium"`).
    pub model: String,
    /// Explicit GGML file; overrides the registry lookup when set.
    pub model_path: Option<PathBuf>,
    /// Attempt GPU-accelerated inference when whisper.cpp was built with it.
    pub use_gpu: bool,
    /// CPU threads handed to Whisper; `None` picks a sensible default.
    pub n_threads: Option<i32>,
    /// Longest slice of audio handed to a single Whisper pass, in seconds.
    pub chunk_secs: u32,
    /// Upper bound on one transcription call before the request gives up.
    pub timeout_secs: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "thonburian-medium".into(),
            model_path: None,
            use_gpu: false,
            n_threads: None,
            chunk_secs: 30,
            timeout_secs: 300,
        }
    }
}

impl SttConfig {
    /// Apply a `--model` style override: an existing file becomes
    /// `model_path`, anything else is taken as a registry id.
    pub fn set_model(&mut self, value: &str) {
        let path = std::path::Path::new(value);
        if path.is_file() {
            self.model_path = Some(path.to_path_buf());
        } else {
            self.model = value.to_string();
            self.model_path = None;
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for audio ingestion and validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Minimum peak amplitude (0.0 – 1.0) for a clip to count as audible.
    pub silence_threshold: f32,
    /// Parent directory for per-request scratch directories.  `None` uses
    /// the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    /// Also write a 16-bit 16 kHz mono copy of the decoded audio into the
    /// scratch directory.
    pub write_normalized_copy: bool,
    /// Format assumed for headerless payloads when the caller declares none.
    pub raw_pcm: PcmFormat,
    /// Longest accepted clip in seconds; 0 disables the check.
    pub max_duration_secs: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            silence_threshold: 0.01,
            scratch_dir: None,
            write_normalized_copy: false,
            raw_pcm: PcmFormat::default(),
            max_duration_secs: 1_800,
        }
    }
}

// ---------------------------------------------------------------------------
// ShapingConfig
// ---------------------------------------------------------------------------

/// Rules applied to raw model output before it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingConfig {
    /// Distinct-to-total character ratio below which text is degenerate.
    pub min_distinct_ratio: f32,
    /// Characters kept from degenerate text (an ellipsis is appended).
    pub truncate_chars: usize,
    /// Trimmed transcripts shorter than this are discarded.
    pub min_chars: usize,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            min_distinct_ratio: 0.3,
            truncate_chars: 50,
            min_chars: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteConfig
// ---------------------------------------------------------------------------

/// Settings for talking to a running transcription service over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the service, e.g. `http://gpu-box:5000`.
    pub base_url: String,
    /// Attempts made by `transcribe_with_retry` before giving up.
    pub max_retries: u32,
    /// Timeout for `GET /health`.
    pub health_timeout_secs: u64,
    /// Payloads smaller than this are not worth a round trip.
    pub min_payload_bytes: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            max_retries: 3,
            health_timeout_secs: 10,
            min_payload_bytes: 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use thai_transcribe::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// println!("listening on {}:{}", config.server.host, config.server.port);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP service settings.
    pub server: ServerConfig,
    /// STT engine settings.
    pub stt: SttConfig,
    /// Ingestion / validation settings.
    pub audio: AudioConfig,
    /// Transcript clean-up rules.
    pub shaping: ShapingConfig,
    /// Remote service client settings.
    pub remote: RemoteConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
