use crate::error::{Result, VoxError};
use crate::storage::StoredAudio;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A timestamped span of transcribed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: usize,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    pub text: String,
}

/// Transcription of one audio asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub audio_id: String,
    pub language: String,
    /// Always the in-order concatenation of the segment texts.
    pub text: String,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Build a transcript whose text is derived from its segments.
    pub fn from_segments(audio_id: &str, language: &str, segments: Vec<Segment>) -> Self {
        let text = segments.iter().map(|s| s.text.as_str()).collect();
        Self {
            audio_id: audio_id.to_string(),
            language: language.to_string(),
            text,
            segments,
        }
    }
}

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (real model vs placeholder vs mock).
/// Calls are blocking; the orchestrator runs them on the blocking pool.
pub trait Transcriber: Send + Sync {
    /// Transcribe a stored audio payload.
    fn transcribe(&self, audio: &StoredAudio) -> Result<Transcript>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across tasks.
impl<T: Transcriber> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &StoredAudio) -> Result<Transcript> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    model_name: String,
    response: String,
    should_fail: bool,
    delay: Option<Duration>,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            should_fail: false,
            delay: None,
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Block for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, audio: &StoredAudio) -> Result<Transcript> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            return Err(VoxError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }
        let segment = Segment {
            id: 0,
            start: 0.0,
            end: 1.0,
            text: self.response.clone(),
        };
        Ok(Transcript::from_segments(&audio.asset.id, "en", vec![segment]))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
