use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The voice a synthesis request should speak with.
///
/// Exactly one source: a catalog voice or an uploaded audio sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoiceReference {
    Preset { voice_preset_id: String },
    Audio { reference_audio_id: String },
}

impl VoiceReference {
    /// Build a reference from the two optional request fields.
    ///
    /// Blank strings count as absent. Both or neither set is a validation
    /// error.
    pub fn from_fields(
        reference_audio_id: Option<&str>,
        voice_preset_id: Option<&str>,
    ) -> Result<Self> {
        let audio = reference_audio_id.map(str::trim).filter(|s| !s.is_empty());
        let preset = voice_preset_id.map(str::trim).filter(|s| !s.is_empty());
        match (audio, preset) {
            (Some(audio), None) => Ok(Self::Audio {
                reference_audio_id: audio.to_string(),
            }),
            (None, Some(preset)) => Ok(Self::Preset {
                voice_preset_id: preset.to_string(),
            }),
            (None, None) => Err(VoxError::validation(
                "No reference audio or voice preset provided",
            )),
            (Some(_), Some(_)) => Err(VoxError::validation(
                "Provide either reference_audio_id or voice_preset_id, not both",
            )),
        }
    }

    pub fn preset(id: impl Into<String>) -> Self {
        Self::Preset {
            voice_preset_id: id.into(),
        }
    }

    pub fn audio(id: impl Into<String>) -> Self {
        Self::Audio {
            reference_audio_id: id.into(),
        }
    }

    /// The referenced id, whichever kind it is.
    pub fn id(&self) -> &str {
        match self {
            Self::Preset { voice_preset_id } => voice_preset_id,
            Self::Audio { reference_audio_id } => reference_audio_id,
        }
    }
}

impl fmt::Display for VoiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preset { voice_preset_id } => write!(f, "preset:{}", voice_preset_id),
            Self::Audio { reference_audio_id } => write!(f, "audio:{}", reference_audio_id),
        }
    }
}
