//! Sample-rate conversion via `rubato`'s fixed-ratio FFT resampler.
//!
//! Processing proceeds in fixed-size chunks with a zero-padded final chunk,
//! the same shape as other windowed resampling code in the pack: ask the
//! resampler how many input frames it wants next, feed it exactly that
//! many, and scale the tail chunk's output proportionally since the padded
//! silence produces extra trailing samples we don't want to keep.

use rubato::{FftFixedInOut, Resampler};
use tts_gateway_core::audio::AudioBuffer;
use tts_gateway_core::error::GatewayError;

const CHUNK_SIZE: usize = 1024;

fn resample_channels(
    channel_data: &[Vec<f32>],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<Vec<f32>>, GatewayError> {
    let channels = channel_data.len();
    let total_frames = channel_data[0].len();

    let mut resampler = FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, channels)
        .map_err(|e| GatewayError::StitchFailure(format!("resampler init failed: {e}")))?;

    let mut outputs: Vec<Vec<f32>> = vec![Vec::new(); channels];
    let input_frames_per_chunk = resampler.input_frames_next();
    let mut pos = 0;

    while pos + input_frames_per_chunk <= total_frames {
        let chunk: Vec<&[f32]> = channel_data
            .iter()
            .map(|c| &c[pos..pos + input_frames_per_chunk])
            .collect();
        let result = resampler
            .process(&chunk, None)
            .map_err(|e| GatewayError::StitchFailure(format!("resample chunk failed: {e}")))?;
        for (out, produced) in outputs.iter_mut().zip(result) {
            out.extend_from_slice(&produced);
        }
        pos += input_frames_per_chunk;
    }

    let remaining = total_frames - pos;
    if remaining > 0 {
        let padded: Vec<Vec<f32>> = channel_data
            .iter()
            .map(|c| {
                let mut buf = vec![0.0f32; input_frames_per_chunk];
                buf[..remaining].copy_from_slice(&c[pos..]);
                buf
            })
            .collect();
        let refs: Vec<&[f32]> = padded.iter().map(Vec::as_slice).collect();
        let result = resampler
            .process(&refs, None)
            .map_err(|e| GatewayError::StitchFailure(format!("resample tail failed: {e}")))?;

        let keep = (remaining as f64 * to_rate as f64 / from_rate as f64).round() as usize;
        for (out, produced) in outputs.iter_mut().zip(result) {
            let keep = keep.min(produced.len());
            out.extend_from_slice(&produced[..keep]);
        }
    }

    Ok(outputs)
}

/// Resample `buf` to `target_rate`, preserving channel count and layout.
/// A no-op when the buffer is already at the target rate.
pub fn resample_buffer(buf: AudioBuffer, target_rate: u32) -> Result<AudioBuffer, GatewayError> {
    if buf.sample_rate == target_rate || buf.samples.is_empty() {
        return Ok(AudioBuffer::new(buf.samples, target_rate, buf.channels));
    }

    let channels = buf.channels.max(1) as usize;
    let mut deinterleaved = vec![Vec::with_capacity(buf.frames()); channels];
    for (i, &sample) in buf.samples.iter().enumerate() {
        deinterleaved[i % channels].push(sample);
    }

    let resampled = resample_channels(&deinterleaved, buf.sample_rate, target_rate)?;
    let out_frames = resampled.iter().map(Vec::len).min().unwrap_or(0);

    let mut interleaved = Vec::with_capacity(out_frames * channels);
    for frame in 0..out_frames {
        for channel in &resampled {
            interleaved.push(channel[frame]);
        }
    }

    Ok(AudioBuffer::new(interleaved, target_rate, buf.channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_a_no_op() {
        let buf = AudioBuffer::new(vec![0.1, 0.2, 0.3], 24_000, 1);
        let out = resample_buffer(buf.clone(), 24_000).unwrap();
        assert_eq!(out.samples, buf.samples);
    }

    #[test]
    fn resampling_changes_sample_rate_and_roughly_preserves_duration() {
        let samples: Vec<f32> = (0..4096)
            .map(|i| (i as f32 * 0.05).sin())
            .collect();
        let buf = AudioBuffer::new(samples, 24_000, 1);
        let original_duration = buf.duration_secs();
        let out = resample_buffer(buf, 16_000).unwrap();
        assert_eq!(out.sample_rate, 16_000);
        assert!((out.duration_secs() - original_duration).abs() < 0.1);
    }
}
