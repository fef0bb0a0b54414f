use std::fs::File;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::resample::linear_resample;
use super::TARGET_SAMPLE_RATE;
use crate::error::DecodeError;
use crate::types::PcmBuffer;

/// Decode an audio file into mono PCM at [`TARGET_SAMPLE_RATE`].
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<PcmBuffer, DecodeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }
    decode_source(Box::new(file), hint)
}

/// Decode an in-memory container (WAV, MP3, OGG, FLAC, ...) into mono PCM at
/// [`TARGET_SAMPLE_RATE`].
pub fn decode_bytes(bytes: Vec<u8>) -> Result<PcmBuffer, DecodeError> {
    decode_source(Box::new(Cursor::new(bytes)), Hint::new())
}

fn decode_source(source: Box<dyn MediaSource>, hint: Hint) -> Result<PcmBuffer, DecodeError> {
    let mss = MediaSourceStream::new(source, Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| DecodeError::Unsupported(err.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let source_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::MissingSampleRate)?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| DecodeError::Codec(err.to_string()))?;

    let mut mono = Vec::new();
    let mut interleaved: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(DecodeError::Codec(err.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!(reason, "skipping corrupt audio packet");
                skipped_packets += 1;
                continue;
            }
            Err(err) => return Err(DecodeError::Codec(err.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let buffer = interleaved
            .get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
        buffer.copy_interleaved_ref(decoded);
        mix_to_mono(buffer.samples(), channels, &mut mono);
    }

    if mono.is_empty() {
        return Err(DecodeError::Empty);
    }

    debug!(
        source_rate,
        source_samples = mono.len(),
        skipped_packets,
        "decoded audio stream"
    );
    let samples = linear_resample(&mono, source_rate, TARGET_SAMPLE_RATE);
    Ok(PcmBuffer::new(samples, TARGET_SAMPLE_RATE))
}

/// Average interleaved frames down to a single channel.
fn mix_to_mono(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn wav_bytes(sample_rate: u32, channels: u16, frames: &[Vec<i16>]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for frame in frames {
                for &sample in frame {
                    writer.write_sample(sample).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn stereo_input_is_mixed_and_resampled() {
        let frames: Vec<Vec<i16>> = (0..22_050).map(|_| vec![16_384, -16_384]).collect();
        let pcm = decode_bytes(wav_bytes(22_050, 2, &frames)).unwrap();

        assert_eq!(pcm.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(pcm.len(), 44_100);
        assert!(pcm.samples.iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn mono_input_at_target_rate_is_preserved() {
        let frames: Vec<Vec<i16>> = (0..4_410).map(|_| vec![8_192]).collect();
        let pcm = decode_bytes(wav_bytes(44_100, 1, &frames)).unwrap();
        assert_eq!(pcm.len(), 4_410);
        assert!(pcm.samples.iter().all(|s| (s - 0.25).abs() < 1e-3));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_bytes(b"definitely not an audio container".to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }

    #[test]
    fn empty_stream_is_rejected() {
        assert!(decode_bytes(wav_bytes(44_100, 1, &[])).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = decode_file("/nonexistent/clip.wav").unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }
}
