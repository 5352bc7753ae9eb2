//! Placeholder transcription engine.
//!
//! Stands in for a speech-to-text model: it always transcribes to the
//! configured script, but the segment timings follow the real length of the
//! audio when it can be decoded.

use crate::audio::format::resolve_format;
use crate::audio::{AudioFormat, wav};
use crate::config::TranscriptionConfig;
use crate::error::{Result, VoxError};
use crate::storage::StoredAudio;
use crate::stt::transcriber::{Segment, Transcriber, Transcript};

/// Transcriber that returns a fixed script split into timed segments.
#[derive(Debug, Clone)]
pub struct ScriptedTranscriber {
    config: TranscriptionConfig,
}

impl ScriptedTranscriber {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }

    fn total_secs(&self, format: AudioFormat, bytes: &[u8]) -> f64 {
        let decoded = match format {
            AudioFormat::Wav => wav::probe_duration(bytes),
            _ => None,
        };
        match decoded {
            Some(secs) if secs > 0.0 => secs,
            _ => self.config.fallback_segment_secs * self.config.segment_count as f64,
        }
    }
}

impl Transcriber for ScriptedTranscriber {
    fn transcribe(&self, audio: &StoredAudio) -> Result<Transcript> {
        let format = resolve_format(Some(&audio.asset.mime_type), &audio.bytes)?;
        let total = self.total_secs(format, &audio.bytes);
        let segments = split_script(&self.config.script, self.config.segment_count, total)?;
        Ok(Transcript::from_segments(
            &audio.asset.id,
            &self.config.language,
            segments,
        ))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn is_ready(&self) -> bool {
        !self.config.script.trim().is_empty()
    }
}

/// Split `script` into at most `count` word-balanced segments covering
/// `total_secs` evenly.
///
/// Every segment after the first keeps its leading space, so concatenating
/// the segment texts reproduces the normalized script.
pub fn split_script(script: &str, count: usize, total_secs: f64) -> Result<Vec<Segment>> {
    let words: Vec<&str> = script.split_whitespace().collect();
    if words.is_empty() || count == 0 {
        return Err(VoxError::Transcription {
            message: "transcription script is empty".to_string(),
        });
    }

    let n = count.min(words.len());
    let span = total_secs / n as f64;

    Ok((0..n)
        .map(|i| {
            let lo = i * words.len() / n;
            let hi = (i + 1) * words.len() / n;
            let joined = words[lo..hi].join(" ");
            let text = if i == 0 { joined } else { format!(" {}", joined) };
            Segment {
                id: i,
                start: round_ms(span * i as f64),
                end: round_ms(span * (i + 1) as f64),
                text,
            }
        })
        .collect())
}

fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}
