//! Encodes stitched PCM into the container the caller asked for.
//!
//! WAV encoding happens in-process via `hound`. Lossy formats shell out to
//! `ffmpeg` over stdio, the same external-process pattern the pack's
//! OpenAI-compatible TTS server uses for its own encoding step — this
//! gateway has no interest in reimplementing an mp3/opus encoder.
//!
//! Callers that already have bytes in the requested container (a
//! single-chunk request whose adapter's native output matches) should
//! skip this module entirely and serve those bytes directly; re-encoding
//! here would be lossy for no reason.

use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use tts_gateway_core::adapter::FormatHint;
use tts_gateway_core::audio::AudioBuffer;
use tts_gateway_core::error::GatewayError;

pub async fn encode(audio: &AudioBuffer, format: FormatHint) -> Result<Vec<u8>, GatewayError> {
    let wav_bytes = encode_wav(audio)?;
    match format {
        FormatHint::Wav => Ok(wav_bytes),
        FormatHint::Mp3 | FormatHint::Flac | FormatHint::Opus => {
            encode_with_ffmpeg(wav_bytes, format).await
        }
    }
}

fn encode_wav(audio: &AudioBuffer) -> Result<Vec<u8>, GatewayError> {
    let spec = hound::WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| GatewayError::EncodeFailure(format!("wav writer init: {e}")))?;
        for &sample in &audio.samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * i16::MAX as f32) as i16)
                .map_err(|e| GatewayError::EncodeFailure(format!("wav sample write: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| GatewayError::EncodeFailure(format!("wav finalize: {e}")))?;
    }
    Ok(cursor.into_inner())
}

/// Default constant bitrate for lossy formats, per spec.md §4.7. Lossless
/// containers (flac, wav) pass no bitrate flag at all.
fn default_bitrate(format: FormatHint) -> Option<&'static str> {
    match format {
        FormatHint::Mp3 => Some("192k"),
        FormatHint::Opus => Some("96k"),
        FormatHint::Flac | FormatHint::Wav => None,
    }
}

fn ffmpeg_args(format: FormatHint) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-i", "pipe:0"]
        .into_iter()
        .map(String::from)
        .collect();
    if let Some(bitrate) = default_bitrate(format) {
        args.push("-b:a".to_string());
        args.push(bitrate.to_string());
    }
    args.push("-f".to_string());
    args.push(format.as_str().to_string());
    args.push("pipe:1".to_string());
    args
}

async fn encode_with_ffmpeg(wav_bytes: Vec<u8>, format: FormatHint) -> Result<Vec<u8>, GatewayError> {
    let mut child = Command::new("ffmpeg")
        .args(ffmpeg_args(format))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| GatewayError::EncodeFailure(format!("failed to spawn ffmpeg: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .expect("stdin was requested as piped");
    let feed = tokio::spawn(async move {
        let _ = stdin.write_all(&wav_bytes).await;
    });

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| GatewayError::EncodeFailure(format!("ffmpeg process failed: {e}")))?;
    let _ = feed.await;

    if !output.status.success() {
        return Err(GatewayError::EncodeFailure(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_output_starts_with_riff_header() {
        let buf = AudioBuffer::new(vec![0.0, 0.5, -0.5], 22_050, 1);
        let bytes = encode_wav(&buf).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[tokio::test]
    async fn wav_format_hint_skips_ffmpeg() {
        let buf = AudioBuffer::new(vec![0.1; 10], 24_000, 1);
        let bytes = encode(&buf, FormatHint::Wav).await.unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[test]
    fn lossy_formats_get_their_documented_default_bitrate() {
        let mp3_args = ffmpeg_args(FormatHint::Mp3);
        let bitrate_idx = mp3_args.iter().position(|a| a == "-b:a").unwrap();
        assert_eq!(mp3_args[bitrate_idx + 1], "192k");

        let opus_args = ffmpeg_args(FormatHint::Opus);
        let bitrate_idx = opus_args.iter().position(|a| a == "-b:a").unwrap();
        assert_eq!(opus_args[bitrate_idx + 1], "96k");
    }

    #[test]
    fn lossless_formats_get_no_bitrate_flag() {
        assert!(!ffmpeg_args(FormatHint::Flac).iter().any(|a| a == "-b:a"));
        assert!(!ffmpeg_args(FormatHint::Wav).iter().any(|a| a == "-b:a"));
    }
}
