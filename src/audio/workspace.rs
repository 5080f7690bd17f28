//! Per-request scratch directory with guaranteed cleanup.
//!
//! Every file ingestion writes (`payload.wav`, optionally `normalized.wav`)
//! lives inside one [`Workspace`].  Dropping the workspace removes the whole
//! directory, so cleanup runs on success, on every `?` early return and
//! during panic unwinding.  A failed removal is logged and otherwise
//! ignored: it leaks disk space but cannot corrupt a result.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::ingest::{IngestError, ValidatedAudio};

const PAYLOAD_FILE: &str = "payload.wav";
const NORMALIZED_FILE: &str = "normalized.wav";

pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh scratch directory under `parent` (the system temp dir
    /// when `None`).  `parent` is created if missing.
    pub fn create(parent: Option<&Path>) -> Result<Self, IngestError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("thai-transcribe-");

        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| {
                    IngestError::Io(format!("creating {}: {e}", parent.display()))
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| IngestError::Io(format!("creating scratch directory: {e}")))?;

        let path = dir.path().to_path_buf();
        log::debug!("workspace: created {}", path.display());

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the received payload is stored as WAV.
    pub fn payload_path(&self) -> PathBuf {
        self.path.join(PAYLOAD_FILE)
    }

    /// Where the normalised copy goes.
    pub fn normalized_path(&self) -> PathBuf {
        self.path.join(NORMALIZED_FILE)
    }

    /// Write `audio` as 16-bit, 16 kHz mono WAV and return its path.
    pub fn write_normalized(&self, audio: &ValidatedAudio) -> Result<PathBuf, IngestError> {
        let path = self.normalized_path();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: audio.sample_rate(),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let wav_err = |e: hound::Error| IngestError::Io(format!("writing normalized copy: {e}"));

        let mut writer = hound::WavWriter::create(&path, spec).map_err(wav_err)?;
        for &s in audio.samples() {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(v).map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;

        Ok(path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => log::debug!("workspace: removed {}", self.path.display()),
                Err(e) => log::debug!(
                    "workspace: could not remove {} ({e}); ignoring",
                    self.path.display()
                ),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn directory_is_removed_on_drop() {
        let root = tempdir().unwrap();
        let ws = Workspace::create(Some(root.path())).unwrap();
        std::fs::write(ws.payload_path(), b"data").unwrap();
        assert!(ws.path().exists());
        assert_eq!(entries(root.path()), 1);

        drop(ws);
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn directory_is_removed_on_early_return() {
        fn failing_step(root: &Path) -> Result<(), IngestError> {
            let ws = Workspace::create(Some(root))?;
            std::fs::write(ws.payload_path(), b"data").unwrap();
            Err(IngestError::EmptyInput)
        }

        let root = tempdir().unwrap();
        assert!(failing_step(root.path()).is_err());
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn missing_parent_is_created() {
        let root = tempdir().unwrap();
        let nested = root.path().join("a/b");
        let ws = Workspace::create(Some(&nested)).unwrap();
        assert!(ws.path().starts_with(&nested));
    }

    #[test]
    fn already_removed_directory_does_not_panic() {
        let root = tempdir().unwrap();
        let ws = Workspace::create(Some(root.path())).unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();
        drop(ws);
    }

    #[test]
    fn file_names_are_fixed() {
        let root = tempdir().unwrap();
        let ws = Workspace::create(Some(root.path())).unwrap();
        assert!(ws.payload_path().ends_with("payload.wav"));
        assert!(ws.normalized_path().ends_with("normalized.wav"));
    }
}
