//! Incoming audio bytes and the container-vs-raw-PCM decision.
//!
//! Callers hand us either a complete WAV file or headerless PCM.  The only
//! thing we look at is the 4-byte `RIFF` signature; everything else is
//! treated as raw PCM in the declared format (or [`PcmFormat::default`]).
//! Raw PCM is wrapped in a minimal WAV header so one decoder handles both.

use std::io::{Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ingest::IngestError;
use super::resample::check_source_rate;

/// Leading bytes of every RIFF/WAVE file.
pub const RIFF_SIGNATURE: &[u8; 4] = b"RIFF";

// ---------------------------------------------------------------------------
// PcmFormat
// ---------------------------------------------------------------------------

/// Layout of headerless PCM samples.
///
/// 8-bit samples are unsigned (WAV convention); 16/24/32-bit samples are
/// signed little-endian integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmFormat {
    /// 48 kHz, stereo, 16-bit: what voice-chat bots usually receive.
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            bits_per_sample: 16,
        }
    }
}

impl PcmFormat {
    /// Bytes occupied by one interleaved frame (one sample per channel).
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    fn check(&self) -> Result<(), IngestError> {
        let supported_bits = matches!(self.bits_per_sample, 8 | 16 | 24 | 32);
        if self.channels == 0 || !supported_bits {
            return Err(IngestError::DecodeFailure(format!(
                "unsupported raw PCM format: {} Hz, {} ch, {}-bit",
                self.sample_rate, self.channels, self.bits_per_sample
            )));
        }
        check_source_rate(self.sample_rate)
    }
}

// ---------------------------------------------------------------------------
// AudioOrigin
// ---------------------------------------------------------------------------

/// How the payload bytes were interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioOrigin {
    /// The bytes already carry a RIFF/WAVE header.
    Container,
    /// Headerless samples; a header was synthesised from a [`PcmFormat`].
    RawPcm,
}

/// Classify `bytes` by their leading signature.
///
/// Payloads shorter than the signature are raw PCM.
pub fn detect_origin(bytes: &[u8]) -> AudioOrigin {
    if bytes.starts_with(RIFF_SIGNATURE) {
        AudioOrigin::Container
    } else {
        AudioOrigin::RawPcm
    }
}

// ---------------------------------------------------------------------------
// AudioPayload
// ---------------------------------------------------------------------------

/// Raw audio as received from an HTTP body or a file on disk.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    bytes: Vec<u8>,
    origin: AudioOrigin,
    declared: Option<PcmFormat>,
}

impl AudioPayload {
    /// Wrap `bytes`, sniffing the origin from the leading signature.
    pub fn new(bytes: Vec<u8>) -> Self {
        let origin = detect_origin(&bytes);
        Self {
            bytes,
            origin,
            declared: None,
        }
    }

    /// Attach a caller-declared raw PCM format.  Ignored for containers.
    pub fn with_declared_format(mut self, format: Option<PcmFormat>) -> Self {
        self.declared = format;
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn origin(&self) -> AudioOrigin {
        self.origin
    }

    pub fn declared_format(&self) -> Option<PcmFormat> {
        self.declared
    }

    /// Write the payload to `path` as a WAV file.
    ///
    /// Containers are copied verbatim.  Raw PCM is wrapped using the
    /// declared format, falling back to `default_format`.
    pub fn write_wav(&self, path: &Path, default_format: PcmFormat) -> Result<(), IngestError> {
        match self.origin {
            AudioOrigin::Container => std::fs::write(path, &self.bytes)
                .map_err(|e| IngestError::Io(format!("writing {}: {e}", path.display()))),
            AudioOrigin::RawPcm => {
                let format = self.declared.unwrap_or(default_format);
                let file = std::fs::File::create(path)
                    .map_err(|e| IngestError::Io(format!("creating {}: {e}", path.display())))?;
                wrap_raw_pcm(&self.bytes, format, std::io::BufWriter::new(file))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// wrap_raw_pcm
// ---------------------------------------------------------------------------

/// Write headerless PCM `bytes` to `writer` as a WAV file in `format`.
///
/// Trailing bytes that do not make up a whole frame are dropped.  Returns
/// an error only for an unsupported `format` or a failing writer.
pub fn wrap_raw_pcm<W: Write + Seek>(
    bytes: &[u8],
    format: PcmFormat,
    writer: W,
) -> Result<(), IngestError> {
    format.check()?;

    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };

    let frame = format.bytes_per_frame();
    let usable = bytes.len() - bytes.len() % frame;
    if usable < bytes.len() {
        log::debug!(
            "raw PCM: dropping {} trailing byte(s) that do not form a whole frame",
            bytes.len() - usable
        );
    }

    let wav_err = |e: hound::Error| IngestError::Io(format!("wrapping raw PCM: {e}"));
    let mut wav = hound::WavWriter::new(writer, spec).map_err(wav_err)?;

    let width = format.bits_per_sample as usize / 8;
    for raw in bytes[..usable].chunks_exact(width) {
        let sample: i32 = match raw {
            [b] => i32::from(*b) - 128,
            [lo, hi] => i32::from(i16::from_le_bytes([*lo, *hi])),
            // Sign-extend by placing the three bytes in the top of an i32.
            [a, b, c] => i32::from_le_bytes([0, *a, *b, *c]) >> 8,
            [a, b, c, d] => i32::from_le_bytes([*a, *b, *c, *d]),
            _ => unreachable!("chunk width is 1..=4 bytes"),
        };
        wav.write_sample(sample).map_err(wav_err)?;
    }

    wav.finalize().map_err(wav_err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
