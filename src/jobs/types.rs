use crate::tts::VoiceReference;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a synthesis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    /// Complete and failed jobs never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// pending -> running -> complete | failed
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Complete)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One text-to-speech request and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisJob {
    pub id: String,
    pub input_text: String,
    pub voice_reference: VoiceReference,
    pub status: JobStatus,
    pub output_audio_id: Option<String>,
    pub error: Option<String>,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
    pub updated_at: u64,
}

impl SynthesisJob {
    pub(crate) fn new(input_text: String, voice_reference: VoiceReference, now: u64) -> Self {
        Self {
            id: format!("job-{}", uuid::Uuid::new_v4().simple()),
            input_text,
            voice_reference,
            status: JobStatus::Pending,
            output_audio_id: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
