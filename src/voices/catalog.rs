//! Voice preset catalog.
//!
//! Holds the built-in celebrity/character presets plus custom voices
//! registered from uploaded samples. Order is insertion order: built-ins
//! first in the order listed in [`PRESETS`], then custom voices by
//! registration time.

use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

/// Grouping shown in the voice picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceCategory {
    Celebrity,
    Character,
    Custom,
}

impl VoiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceCategory::Celebrity => "celebrity",
            VoiceCategory::Character => "character",
            VoiceCategory::Custom => "custom",
        }
    }
}

/// A reusable reference voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePreset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: VoiceCategory,
    pub preview_text: String,
    pub preview_audio_id: Option<String>,
    /// Uploaded sample backing a custom voice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_audio_id: Option<String>,
    /// File name the sample was uploaded under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// What the sample says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
}

/// An uploaded sample registered as a custom voice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceSample {
    pub audio_id: String,
    pub file_name: Option<String>,
    pub duration_secs: Option<f64>,
    pub transcription: Option<String>,
}

impl VoicePreset {
    /// Whether this is one of the static presets.
    pub fn is_builtin(&self) -> bool {
        self.category != VoiceCategory::Custom
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.as_str().contains(needle)
    }
}

/// Static description of a built-in preset.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: VoiceCategory,
    pub preview_text: &'static str,
}

impl PresetInfo {
    fn to_preset(&self) -> VoicePreset {
        VoicePreset {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            category: self.category,
            preview_text: self.preview_text.to_string(),
            preview_audio_id: None,
            sample_audio_id: None,
            file_name: None,
            duration_secs: None,
            transcription: None,
        }
    }
}

/// Built-in presets, in catalog order.
pub const PRESETS: &[PresetInfo] = &[
    PresetInfo {
        id: "rdj-1",
        name: "Robert Downey Jr.",
        description: "Tony Stark / Iron Man voice",
        category: VoiceCategory::Celebrity,
        preview_text: "Sometimes you gotta run before you can walk.",
    },
    PresetInfo {
        id: "morgan-freeman-1",
        name: "Morgan Freeman",
        description: "Deep, authoritative narrator voice",
        category: VoiceCategory::Celebrity,
        preview_text: "I've always believed that you should never give up and you should always keep fighting.",
    },
    PresetInfo {
        id: "wizard-1",
        name: "Wise Wizard",
        description: "Elderly, mystical wizard voice",
        category: VoiceCategory::Character,
        preview_text: "Magic is not just about power, but about wisdom and responsibility.",
    },
    PresetInfo {
        id: "anime-girl-1",
        name: "Anime Girl",
        description: "High-pitched, energetic anime character",
        category: VoiceCategory::Character,
        preview_text: "I'll do my best! Let's go on an adventure together!",
    },
];

/// Registry of presets and custom voices.
#[derive(Debug, Default)]
pub struct VoiceCatalog {
    entries: RwLock<Vec<VoicePreset>>,
}

impl VoiceCatalog {
    /// Catalog seeded with the built-in presets.
    pub fn with_builtins() -> Self {
        Self {
            entries: RwLock::new(PRESETS.iter().map(PresetInfo::to_preset).collect()),
        }
    }

    /// All voices in catalog order.
    pub fn list(&self) -> Vec<VoicePreset> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `limit` voices after the first `skip`, in catalog order.
    pub fn page(&self, skip: usize, limit: usize) -> Vec<VoicePreset> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of voices.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive substring search over name, description and category.
    pub fn search(&self, query: &str) -> Result<Vec<VoicePreset>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(VoxError::validation("No search query provided"));
        }
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|v| v.matches(&needle))
            .cloned()
            .collect())
    }

    /// Look up a voice by id.
    pub fn get(&self, id: &str) -> Result<VoicePreset> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| VoxError::not_found("Voice", id))
    }

    /// Register a custom voice backed by an uploaded sample.
    ///
    /// Unnamed voices take the sample's file stem, then a generic name.
    pub fn register_custom(&self, name: Option<&str>, sample: VoiceSample) -> VoicePreset {
        let stem = sample
            .file_name
            .as_deref()
            .and_then(|f| Path::new(f).file_stem())
            .and_then(|s| s.to_str());
        let name = name
            .into_iter()
            .chain(stem)
            .map(str::trim)
            .find(|n| !n.is_empty())
            .unwrap_or("Custom Voice")
            .to_string();
        let preset = VoicePreset {
            id: format!("custom-{}", uuid::Uuid::new_v4().simple()),
            name,
            description: "User-uploaded voice sample".to_string(),
            category: VoiceCategory::Custom,
            preview_text: String::new(),
            preview_audio_id: None,
            sample_audio_id: Some(sample.audio_id),
            file_name: sample.file_name,
            duration_secs: sample.duration_secs,
            transcription: sample.transcription,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(preset.clone());
        preset
    }

    /// Remove a custom voice; built-in presets are read-only.
    pub fn remove_custom(&self, id: &str) -> Result<VoicePreset> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let index = entries
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| VoxError::not_found("Voice", id))?;
        if entries[index].is_builtin() {
            return Err(VoxError::validation("Built-in voice presets are read-only"));
        }
        Ok(entries.remove(index))
    }

    /// Attach rendered preview audio to a voice.
    pub fn set_preview_audio(&self, id: &str, audio_id: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let voice = entries
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| VoxError::not_found("Voice", id))?;
        voice.preview_audio_id = Some(audio_id.to_string());
        Ok(())
    }
}
