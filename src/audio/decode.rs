//! WAV decoding to normalised `f32` samples.
//!
//! Integer WAV (8/16/24/32-bit) is scaled into `[-1.0, 1.0)`; 32-bit float
//! WAV is passed through.  Samples stay interleaved; channel mixing and
//! resampling happen in [`super::resample`].
//!
//! The header is checked before any sample is read: the rate must pass
//! [`check_source_rate`] and the declared length must fit `max_secs`
//! (0 disables the length check).

use std::io::Read;
use std::path::Path;

use super::ingest::IngestError;
use super::resample::check_source_rate;

/// Interleaved samples as stored in the file.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Decode the WAV file at `path`.
pub fn decode_wav_file(path: &Path, max_secs: u32) -> Result<DecodedAudio, IngestError> {
    let reader = hound::WavReader::open(path).map_err(decode_err)?;
    decode_reader(reader, max_secs)
}

/// Decode a WAV file already held in memory.
pub fn decode_wav_bytes(bytes: &[u8], max_secs: u32) -> Result<DecodedAudio, IngestError> {
    let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).map_err(decode_err)?;
    decode_reader(reader, max_secs)
}

fn decode_reader<R: Read>(
    mut reader: hound::WavReader<R>,
    max_secs: u32,
) -> Result<DecodedAudio, IngestError> {
    let spec = reader.spec();
    check_source_rate(spec.sample_rate)?;

    let secs = f64::from(reader.duration()) / f64::from(spec.sample_rate);
    if max_secs > 0 && secs > f64::from(max_secs) {
        return Err(IngestError::TooLong { secs, max_secs });
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(decode_err)?
        }
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn decode_err(e: hound::Error) -> IngestError {
    IngestError::DecodeFailure(e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn wav_i16(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn int16_is_scaled_to_unit_range() {
        let wav = wav_i16(16_000, 1, &[0, 16_384, -32_768]);
        let decoded = decode_wav_bytes(&wav, 0).unwrap();
        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.channels, 1);
        assert!((decoded.samples[0]).abs() < 1e-6);
        assert!((decoded.samples[1] - 0.5).abs() < 1e-6);
        assert!((decoded.samples[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn float_samples_pass_through() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in [0.25f32, -0.25, 0.75, -0.75] {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();

        let decoded = decode_wav_bytes(&cursor.into_inner(), 0).unwrap();
        assert_eq!(decoded.samples, vec![0.25, -0.25, 0.75, -0.75]);
        assert_eq!(decoded.frames(), 2);
    }

    #[test]
    fn garbage_after_riff_is_a_decode_failure() {
        let err = decode_wav_bytes(b"RIFF\x10\x00\x00\x00not a wave file", 0).unwrap_err();
        assert!(matches!(err, IngestError::DecodeFailure(_)), "{err}");
    }

    #[test]
    fn truncated_header_is_a_decode_failure() {
        let wav = wav_i16(16_000, 1, &[1, 2, 3, 4]);
        let err = decode_wav_bytes(&wav[..20], 0).unwrap_err();
        assert!(matches!(err, IngestError::DecodeFailure(_)), "{err}");
    }

    #[test]
    fn one_hertz_header_is_rejected_before_decoding() {
        let wav = wav_i16(1, 1, &[16_000; 2_000]);
        let err = decode_wav_bytes(&wav, 0).unwrap_err();
        assert!(matches!(err, IngestError::DecodeFailure(_)), "{err}");
    }

    #[test]
    fn header_longer_than_limit_is_too_long() {
        // 3 s at 4 kHz against a 2 s limit.
        let wav = wav_i16(4_000, 1, &vec![100; 12_000]);
        let err = decode_wav_bytes(&wav, 2).unwrap_err();
        assert!(
            matches!(err, IngestError::TooLong { max_secs: 2, .. }),
            "{err}"
        );
        assert!(decode_wav_bytes(&wav, 3).is_ok());
        assert!(decode_wav_bytes(&wav, 0).is_ok());
    }

    #[test]
    fn missing_file_is_a_decode_failure() {
        let err = decode_wav_file(Path::new("/nonexistent/payload.wav"), 0).unwrap_err();
        assert!(matches!(err, IngestError::DecodeFailure(_)));
    }
}
