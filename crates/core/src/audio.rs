//! In-memory PCM audio buffers.

/// Decoded PCM audio, owned by the request that produced it.
///
/// Lifetime is bounded by one synthesis request: buffers are dropped once
/// the HTTP response body has been fully written.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Interleaved samples, one `f32` per sample per channel, in [-1.0, 1.0].
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn silence(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .fold(0.0_f32, |max, &s| max.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_matches_sample_count() {
        let buf = AudioBuffer::new(vec![0.0; 48_000], 24_000, 1);
        assert!((buf.duration_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn peak_finds_largest_magnitude() {
        let buf = AudioBuffer::new(vec![0.1, -0.9, 0.4], 24_000, 1);
        assert!((buf.peak() - 0.9).abs() < 1e-6);
    }
}
