//! Model registry, metadata and path resolution.
//!
//! Two const arrays are provided:
//! - [`THAI_MODELS`]   — Thonburian Whisper (fine-tuned for Thai, ICNLSP 2024)
//! - [`WHISPER_MODELS`] — Standard multilingual Whisper models
//!
//! [`ModelPaths`] resolves the on-disk location of a model given an
//! [`crate::config::AppPaths`] instance; [`resolve_model_path`] applies the
//! `stt.model_path` override on top of that.

use std::path::PathBuf;

use crate::config::{AppPaths, SttConfig};
use crate::stt::SttError;

// ---------------------------------------------------------------------------
// ModelSize
// ---------------------------------------------------------------------------

/// Approximate capacity tier of a Whisper GGML model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSize {
    /// ~242 MB file — fastest, lowest accuracy.
    Small,
    /// ~769 MB file — balanced (recommended).
    Medium,
    /// ~1.5 GB file — highest accuracy, slowest.
    Large,
}

// ---------------------------------------------------------------------------
// ModelInfo
// ---------------------------------------------------------------------------

/// Static metadata for a single GGML model file.
#[derive(Debug)]
pub struct ModelInfo {
    /// Unique identifier used in `SttConfig::model` (e.g. `"thonburian-medium"`).
    pub id: &'static str,
    pub display_name: &'static str,
    pub size: ModelSize,
    /// File name under the models directory (e.g. `"ggml-thonburian-medium.bin"`).
    pub file_name: &'static str,
    pub file_size_mb: u64,
    /// Where the original checkpoint is published.
    pub source_url: &'static str,
    /// ISO-639-1 language code this model is optimised for, or
    /// `"multilingual"` for the standard Whisper models.
    pub language: &'static str,
    /// Published word error rate in percent, when one exists.
    pub wer_pct: Option<f32>,
}

// ---------------------------------------------------------------------------
// Thai-optimised models (Thonburian Whisper)
// ---------------------------------------------------------------------------

pub const THAI_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "thonburian-small",
        display_name: "Thonburian Whisper Small (Thai)",
        size: ModelSize::Small,
        file_name: "ggml-thonburian-small.bin",
        file_size_mb: 242,
        source_url: "https://huggingface.co/biodatlab/whisper-small-th-combined",
        language: "th",
        wer_pct: None,
    },
    ModelInfo {
        id: "thonburian-medium",
        display_name: "Thonburian Whisper Medium (Thai)",
        size: ModelSize::Medium,
        file_name: "ggml-thonburian-medium.bin",
        file_size_mb: 769,
        source_url: "https://huggingface.co/biodatlab/whisper-th-medium-combined",
        language: "th",
        wer_pct: Some(7.42),
    },
    ModelInfo {
        id: "thonburian-large",
        display_name: "Thonburian Whisper Large (Thai)",
        size: ModelSize::Large,
        file_name: "ggml-thonburian-large.bin",
        file_size_mb: 1_500,
        source_url: "https://huggingface.co/biodatlab/whisper-th-large-combined",
        language: "th",
        wer_pct: None,
    },
];

// ---------------------------------------------------------------------------
// Standard Whisper models (multilingual)
// ---------------------------------------------------------------------------

pub const WHISPER_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "whisper-small",
        display_name: "Whisper Small (Multilingual)",
        size: ModelSize::Small,
        file_name: "ggml-small.bin",
        file_size_mb: 244,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
        language: "multilingual",
        wer_pct: None,
    },
    ModelInfo {
        id: "whisper-medium",
        display_name: "Whisper Medium (Multilingual)",
        size: ModelSize::Medium,
        file_name: "ggml-medium.bin",
        file_size_mb: 769,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
        language: "multilingual",
        wer_pct: None,
    },
    ModelInfo {
        id: "whisper-large-v3",
        display_name: "Whisper Large-v3 (Multilingual)",
        size: ModelSize::Large,
        file_name: "ggml-large-v3.bin",
        file_size_mb: 1_550,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
        language: "multilingual",
        wer_pct: None,
    },
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Find a [`ModelInfo`] by its `id` string, searching both registries.
pub fn find_model_by_id(id: &str) -> Option<&'static ModelInfo> {
    THAI_MODELS
        .iter()
        .chain(WHISPER_MODELS.iter())
        .find(|m| m.id == id)
}

/// Where the model for `config` lives on disk.
///
/// `stt.model_path` wins when set; otherwise `stt.model` must name a
/// registered model, which is looked up under `paths.models_dir`.
pub fn resolve_model_path(config: &SttConfig, paths: &ModelPaths) -> Result<PathBuf, SttError> {
    if let Some(explicit) = &config.model_path {
        return Ok(explicit.clone());
    }
    find_model_by_id(&config.model)
        .map(|m| paths.model_path(m))
        .ok_or_else(|| SttError::ModelNotFound(format!("unknown model id '{}'", config.model)))
}

// ---------------------------------------------------------------------------
// ModelPaths
// ---------------------------------------------------------------------------

/// Resolves the on-disk location of model files from [`AppPaths`].
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Directory that contains (or will contain) GGML `.bin` files.
    pub models_dir: PathBuf,
}

impl ModelPaths {
    pub fn from_app_paths(app_paths: &AppPaths) -> Self {
        Self {
            models_dir: app_paths.models_dir.clone(),
        }
    }

    /// Construct directly from a models directory path (useful in tests).
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// Full path to the GGML file for the given model.
    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.models_dir.join(model.file_name)
    }

    pub fn is_available(&self, model: &ModelInfo) -> bool {
        self.model_path(model).exists()
    }

    /// Returns all models (from both registries) that are present on disk.
    pub fn list_local_models(&self) -> Vec<&'static ModelInfo> {
        THAI_MODELS
            .iter()
            .chain(WHISPER_MODELS.iter())
            .filter(|m| self.is_available(m))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thai_models_have_correct_language() {
        for m in THAI_MODELS {
            assert_eq!(m.language, "th", "model {} should be 'th'", m.id);
        }
    }

    #[test]
    fn default_model_is_registered_with_wer() {
        let m = find_model_by_id(&SttConfig::default().model).unwrap();
        assert_eq!(m.size, ModelSize::Medium);
        assert_eq!(m.wer_pct, Some(7.42));
    }

    #[test]
    fn find_model_by_id_unknown() {
        assert!(find_model_by_id("does-not-exist").is_none());
    }

    #[test]
    fn resolve_uses_registry_file_name() {
        let mp = ModelPaths::new("/models");
        let p = resolve_model_path(&SttConfig::default(), &mp).unwrap();
        assert_eq!(p, PathBuf::from("/models/ggml-thonburian-medium.bin"));
    }

    #[test]
    fn resolve_prefers_explicit_path() {
        let config = SttConfig {
            model: "does-not-exist".into(),
            model_path: Some("/opt/custom.bin".into()),
            ..SttConfig::default()
        };
        let p = resolve_model_path(&config, &ModelPaths::new("/models")).unwrap();
        assert_eq!(p, PathBuf::from("/opt/custom.bin"));
    }

    #[test]
    fn resolve_unknown_id_is_model_not_found() {
        let config = SttConfig {
            model: "does-not-exist".into(),
            ..SttConfig::default()
        };
        let err = resolve_model_path(&config, &ModelPaths::new("/models")).unwrap_err();
        assert!(matches!(err, SttError::ModelNotFound(m) if m.contains("does-not-exist")));
    }

    #[test]
    fn local_models_lists_only_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ggml-thonburian-small.bin"), b"x").unwrap();
        let mp = ModelPaths::new(dir.path());
        let ids: Vec<_> = mp.list_local_models().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["thonburian-small"]);
    }
}
