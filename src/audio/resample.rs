//! Audio resampling and channel mixing utilities.
//!
//! The Whisper STT engine requires **16 kHz mono `f32`** audio.  This module
//! provides the two conversion steps:
//!
//! 1. [`stereo_to_mono`] — downmix any number of interleaved channels to mono.
//! 2. [`resample_to_16k`] — resample from any source rate to 16 000 Hz with
//!    a windowed-sinc resampler (`rubato::SincFixedIn`, Blackman-Harris).

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::ingest::IngestError;

/// Sample rate expected by Whisper.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Lowest source rate accepted from a header or a declared format.
pub const MIN_SOURCE_RATE: u32 = 4_000;

/// Highest source rate accepted from a header or a declared format.
pub const MAX_SOURCE_RATE: u32 = 384_000;

/// Input frames handed to rubato per `process` call.
const CHUNK_SIZE: usize = 1024;

/// Reject sample rates outside `MIN_SOURCE_RATE..=MAX_SOURCE_RATE`.
///
/// Output length scales with `16_000 / rate`, so a header claiming a few Hz
/// would turn a small payload into gigabytes of samples.
pub fn check_source_rate(rate: u32) -> Result<(), IngestError> {
    if (MIN_SOURCE_RATE..=MAX_SOURCE_RATE).contains(&rate) {
        Ok(())
    } else {
        Err(IngestError::DecodeFailure(format!(
            "unsupported sample rate {rate} Hz (expected {MIN_SOURCE_RATE}..={MAX_SOURCE_RATE})"
        )))
    }
}

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec`.
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use thai_transcribe::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_to_16k
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to 16 000 Hz.
///
/// * `source_rate == 16_000` returns the input unchanged.
/// * Empty input returns an empty vector.
/// * Rates rejected by [`check_source_rate`] are a `DecodeFailure`.
///
/// The resampler's output delay is skipped, so output sample `i` lines up
/// with input time `i / 16_000` s.  The output is cut to
/// `ceil(samples.len() * 16_000 / source_rate)`.
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Result<Vec<f32>, IngestError> {
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    check_source_rate(source_rate)?;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(TARGET_SAMPLE_RATE) / f64::from(source_rate);

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1)
        .map_err(|e| IngestError::DecodeFailure(format!("resampler init: {e}")))?;

    let expected_len = (samples.len() as f64 * ratio).ceil() as usize;
    let delay = resampler.output_delay();
    let wanted = expected_len + delay;
    let mut output = Vec::with_capacity(wanted + CHUNK_SIZE);

    let mut process = |block: Vec<f32>, output: &mut Vec<f32>| -> Result<(), IngestError> {
        let input = vec![block];
        let resampled = resampler
            .process(&input, None)
            .map_err(|e| IngestError::DecodeFailure(format!("resample: {e}")))?;
        match resampled.first() {
            Some(channel) if !channel.is_empty() => {
                output.extend_from_slice(channel);
                Ok(())
            }
            _ => Err(IngestError::DecodeFailure("resampler produced no output".into())),
        }
    };

    for chunk in samples.chunks(CHUNK_SIZE) {
        let mut block = chunk.to_vec();
        // Last chunk: pad with silence up to the fixed input size.
        block.resize(CHUNK_SIZE, 0.0);
        process(block, &mut output)?;
    }
    // Flush the filter so the tail survives skipping the delay.
    while output.len() < wanted {
        process(vec![0.0; CHUNK_SIZE], &mut output)?;
    }

    output.drain(..delay);
    output.truncate(expected_len);
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- stereo_to_mono ----------------------------------------------------

    #[test]
    fn stereo_to_mono_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        let out = stereo_to_mono(&input, 1);
        assert_eq!(out, input);
    }

    #[test]
    fn stereo_to_mono_two_channel() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = stereo_to_mono(&input, 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6); // (1.0 + -1.0) / 2
        assert!((out[1] - 0.5).abs() < 1e-6); // (0.5 + 0.5) / 2
    }

    #[test]
    fn stereo_to_mono_drops_incomplete_frame() {
        let out = stereo_to_mono(&[0.2_f32, 0.4, 0.9], 2);
        assert_eq!(out.len(), 1);
        assert!((out[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn stereo_to_mono_zero_channels() {
        let out = stereo_to_mono(&[1.0_f32, 2.0], 0);
        assert!(out.is_empty());
    }

    // ---- resample_to_16k ---------------------------------------------------

    #[test]
    fn resample_already_16k_is_noop() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        let out = resample_to_16k(&input, 16_000).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn resample_empty_input() {
        let out = resample_to_16k(&[], 48_000).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn resample_zero_rate_is_an_error() {
        assert!(resample_to_16k(&[0.1, 0.2], 0).is_err());
    }

    #[test]
    fn implausible_rates_are_rejected() {
        for rate in [1, 100, MIN_SOURCE_RATE - 1, MAX_SOURCE_RATE + 1] {
            let err = resample_to_16k(&[0.5; 2_000], rate).unwrap_err();
            assert!(matches!(err, IngestError::DecodeFailure(_)), "{rate} Hz: {err}");
        }
        assert!(check_source_rate(MIN_SOURCE_RATE).is_ok());
        assert!(check_source_rate(MAX_SOURCE_RATE).is_ok());
    }

    #[test]
    fn impulse_position_survives_resampling() {
        // Impulse at 0.1 s; after resampling it must still sit at 0.1 s.
        let mut input = vec![0.0_f32; 48_000];
        input[4_800] = 1.0;
        let out = resample_to_16k(&input, 48_000).unwrap();
        assert_eq!(out.len(), 16_000);
        let peak_at = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak_at.abs_diff(1_600) <= 2, "impulse landed at {peak_at}");
    }

    #[test]
    fn resample_48k_to_16k_output_length() {
        // 1 s @ 48 kHz → 1 s @ 16 kHz
        let input: Vec<f32> = (0..48_000).map(|i| (i as f32 / 48.0).sin() * 0.5).collect();
        let out = resample_to_16k(&input, 48_000).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn resample_short_input_is_not_padded_out() {
        // 10 ms @ 48 kHz is far less than one rubato chunk.
        let input = vec![0.5_f32; 480];
        let out = resample_to_16k(&input, 48_000).unwrap();
        assert_eq!(out.len(), 160);
    }

    #[test]
    fn resample_44100_to_16k_output_length() {
        let input = vec![0.0_f32; 44_100];
        let out = resample_to_16k(&input, 44_100).unwrap();
        assert!(
            out.len().abs_diff(16_000) <= 1,
            "expected ~16000, got {}",
            out.len()
        );
    }

    #[test]
    fn resample_upsample_from_8k_to_16k() {
        let input: Vec<f32> = (0..8_000).map(|i| (i as f32 / 20.0).sin()).collect();
        let out = resample_to_16k(&input, 8_000).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn resample_keeps_tone_energy() {
        // 440 Hz at half scale survives downsampling with a similar peak.
        let input: Vec<f32> = (0..48_000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48_000.0).sin() * 0.5)
            .collect();
        let out = resample_to_16k(&input, 48_000).unwrap();
        let peak = out.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!((0.4..0.6).contains(&peak), "peak {peak}");
    }
}
