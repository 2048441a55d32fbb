//! Minimal WAV decode for interpreting raw bytes an upstream backend
//! returned. Encoding back to WAV/mp3/flac/opus is the transcoder's job,
//! not the adapter layer's — this only has to read what we were handed.

use tts_gateway_core::audio::AudioBuffer;
use tts_gateway_core::error::GatewayError;

pub fn decode_wav_bytes(bytes: &[u8]) -> Result<AudioBuffer, GatewayError> {
    let mut reader = hound::WavReader::new(std::io::Cursor::new(bytes))
        .map_err(|e| GatewayError::BackendDefinitive {
            backend: "wav-decode".to_string(),
            message: format!("malformed wav response: {e}"),
        })?;
    let spec = reader.spec();

    let samples: Result<Vec<f32>, _> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect()
        }
    };
    let samples = samples.map_err(|e| GatewayError::BackendDefinitive {
        backend: "wav-decode".to_string(),
        message: format!("corrupt wav samples: {e}"),
    })?;

    Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_pcm16_mono_wav() {
        let bytes = write_test_wav(&[0, 16384, -16384], 22050);
        let audio = decode_wav_bytes(&bytes).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.samples.len(), 3);
    }

    #[test]
    fn rejects_non_wav_bytes() {
        let err = decode_wav_bytes(b"not a wav file at all").unwrap_err();
        assert_eq!(err.kind(), "backend_definitive");
    }
}
