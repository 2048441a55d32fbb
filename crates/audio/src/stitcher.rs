//! Equal-power crossfade concatenation of chunked synthesis output.
//!
//! Per-backend chunking means a multi-chunk request produces one
//! [`AudioBuffer`] per chunk, synthesized independently and therefore
//! liable to small loudness and phase discontinuities at the seams. This
//! module joins them with an equal-power (cos/sin) crossfade so the seam
//! is inaudible, then peak-normalizes the result.

use tts_gateway_core::audio::AudioBuffer;
use tts_gateway_core::error::GatewayError;

use crate::resample::resample_buffer;

/// Target peak after normalization: -1 dBFS, leaving headroom for
/// downstream lossy encoding without clipping.
const TARGET_PEAK: f32 = 0.891_251; // 10^(-1/20)

/// Join `buffers` end to end with an equal-power crossfade of
/// `crossfade_ms` at each seam. A single buffer is returned normalized and
/// otherwise untouched — there's no seam to hide.
///
/// Every buffer is resampled to the first buffer's rate before stitching,
/// per the documented behavior when backends return audio at different
/// native rates (there is no single "project rate" to prefer instead).
pub fn stitch(buffers: Vec<AudioBuffer>, crossfade_ms: u32) -> Result<AudioBuffer, GatewayError> {
    let mut iter = buffers.into_iter();
    let first = iter.next().ok_or_else(|| {
        GatewayError::StitchFailure("cannot stitch zero audio buffers".to_string())
    })?;

    let target_rate = first.sample_rate;
    let channels = first.channels;

    let mut output = first.samples;
    for next in iter {
        let next = resample_buffer(next, target_rate)?;
        if next.channels != channels {
            return Err(GatewayError::StitchFailure(format!(
                "channel count mismatch mid-stitch: {channels} vs {}",
                next.channels
            )));
        }

        let crossfade_frames = ((crossfade_ms as f64 / 1000.0) * target_rate as f64) as usize;
        let crossfade_samples = (crossfade_frames * channels.max(1) as usize)
            .min(output.len() / 4)
            .min(next.samples.len() / 4);

        if crossfade_samples == 0 {
            output.extend_from_slice(&next.samples);
            continue;
        }

        let tail_start = output.len() - crossfade_samples;
        let tail = output.split_off(tail_start);
        let head = &next.samples[..crossfade_samples];
        output.extend(equal_power_blend(&tail, head));
        output.extend_from_slice(&next.samples[crossfade_samples..]);
    }

    Ok(peak_normalize(AudioBuffer::new(output, target_rate, channels)))
}

fn equal_power_blend(fading_out: &[f32], fading_in: &[f32]) -> Vec<f32> {
    let n = fading_out.len();
    if n <= 1 {
        return fading_out
            .iter()
            .zip(fading_in)
            .map(|(a, b)| 0.5 * a + 0.5 * b)
            .collect();
    }
    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            let fade_out_gain = (t * std::f64::consts::FRAC_PI_2).cos() as f32;
            let fade_in_gain = (t * std::f64::consts::FRAC_PI_2).sin() as f32;
            fading_out[i] * fade_out_gain + fading_in[i] * fade_in_gain
        })
        .collect()
}

fn peak_normalize(buf: AudioBuffer) -> AudioBuffer {
    let peak = buf.peak();
    if peak < 1e-6 {
        return buf;
    }
    let gain = TARGET_PEAK / peak;
    AudioBuffer::new(
        buf.samples.into_iter().map(|s| s * gain).collect(),
        buf.sample_rate,
        buf.channels,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_buffer_is_normalized_but_otherwise_unchanged() {
        let buf = AudioBuffer::new(vec![0.2, -0.4, 0.1], 24_000, 1);
        let out = stitch(vec![buf], 30).unwrap();
        assert!((out.peak() - TARGET_PEAK).abs() < 1e-3);
        assert_eq!(out.samples.len(), 3);
    }

    #[test]
    fn stitching_preserves_total_duration_minus_overlap() {
        let a = AudioBuffer::new(vec![0.5; 2400], 24_000, 1); // 100ms
        let b = AudioBuffer::new(vec![0.5; 2400], 24_000, 1);
        let crossfade_ms = 30;
        let out = stitch(vec![a, b], crossfade_ms).unwrap();
        // 30ms would overlap 720 samples, but the crossfade width is
        // clamped to a quarter of each buffer (600 samples here) so a
        // short chunk never loses most of itself to the fade.
        let overlap_samples = 2400 / 4;
        assert_eq!(out.samples.len(), 4800 - overlap_samples);
    }

    #[test]
    fn crossfade_width_is_clamped_to_a_quarter_of_the_shorter_buffer() {
        let a = AudioBuffer::new(vec![0.5; 4000], 24_000, 1);
        let b = AudioBuffer::new(vec![0.5; 40], 24_000, 1); // tiny second chunk
        // 30ms at 24kHz is 720 samples, far more than b's own length, so the
        // clamp must fall back to b.len() / 4 rather than consuming all of it.
        let out = stitch(vec![a, b], 30).unwrap();
        let overlap_samples = 40 / 4;
        assert_eq!(out.samples.len(), 4000 + 40 - overlap_samples);
    }

    #[test]
    fn zero_buffers_is_a_stitch_failure() {
        let err = stitch(vec![], 30).unwrap_err();
        assert_eq!(err.kind(), "stitch_failure");
    }

    #[test]
    fn mismatched_channel_counts_fail_fast() {
        let a = AudioBuffer::new(vec![0.1; 100], 24_000, 1);
        let b = AudioBuffer::new(vec![0.1; 200], 24_000, 2);
        let err = stitch(vec![a, b], 20).unwrap_err();
        assert_eq!(err.kind(), "stitch_failure");
    }

    #[test]
    fn crossfade_blend_preserves_equal_power_at_midpoint() {
        let out = equal_power_blend(&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]);
        // at the midpoint both gains are close to 1/sqrt(2); combined power
        // should stay near 1.0 rather than dipping like a linear crossfade.
        let mid = out[1];
        assert!((mid - std::f32::consts::FRAC_1_SQRT_2 * 2.0).abs() < 0.05);
    }
}
