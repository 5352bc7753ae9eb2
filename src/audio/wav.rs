//! WAV decoding and encoding.

use crate::error::{Result, VoxError};
use std::io::Cursor;

/// Mono PCM decoded from a WAV payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Mean absolute amplitude normalized to 0.0..=1.0.
    pub fn mean_level(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|&s| (s as f64).abs()).sum();
        (sum / self.samples.len() as f64 / i16::MAX as f64) as f32
    }
}

/// Decode a WAV payload, downmixing to mono.
///
/// Integer PCM of any width and 32-bit float PCM are accepted.
pub fn decode(bytes: &[u8]) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
        VoxError::UnsupportedFormat {
            mime: format!("audio/wav ({})", e),
        }
    })?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let raw_samples: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<std::result::Result<Vec<_>, _>>(),
        hound::SampleFormat::Int if spec.bits_per_sample <= 16 => {
            reader.samples::<i16>().collect::<std::result::Result<Vec<_>, _>>()
        }
        hound::SampleFormat::Int => {
            let shift = spec.bits_per_sample.saturating_sub(16);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
    }
    .map_err(|e| VoxError::UnsupportedFormat {
        mime: format!("audio/wav ({})", e),
    })?;

    // Convert to mono by averaging each frame
    let samples = if channels > 1 {
        raw_samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Read only the header and return the duration in seconds.
pub fn probe_duration(bytes: &[u8]) -> Option<f64> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return None;
    }
    Some(reader.duration() as f64 / rate as f64)
}

/// Encode mono 16-bit PCM as a WAV file.
pub fn encode(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|e| {
            VoxError::Synthesis {
                message: format!("Failed to start WAV writer: {}", e),
            }
        })?;
        for &s in samples {
            writer.write_sample(s).map_err(|e| VoxError::Synthesis {
                message: format!("Failed to write WAV sample: {}", e),
            })?;
        }
        writer.finalize().map_err(|e| VoxError::Synthesis {
            message: format!("Failed to finalize WAV: {}", e),
        })?;
    }
    Ok(cursor.into_inner())
}
