//! Audio container detection and mime normalization.

use crate::defaults::GENERIC_MIME;
use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};

/// Audio containers the blob store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
    Webm,
    Mp4,
}

impl AudioFormat {
    /// Detect the container from its magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            return Some(Self::Wav);
        }
        if bytes.starts_with(b"ID3") {
            return Some(Self::Mp3);
        }
        if bytes.len() >= 2 && bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0 {
            return Some(Self::Mp3);
        }
        if bytes.starts_with(b"OggS") {
            return Some(Self::Ogg);
        }
        if bytes.starts_with(b"fLaC") {
            return Some(Self::Flac);
        }
        if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(Self::Webm);
        }
        if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
            return Some(Self::Mp4);
        }
        None
    }

    /// Map a declared mime type (parameters allowed) to a format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some(Self::Wav),
            "audio/mpeg" | "audio/mp3" | "audio/mpeg3" => Some(Self::Mp3),
            "audio/ogg" | "audio/opus" => Some(Self::Ogg),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            "audio/webm" | "video/webm" => Some(Self::Webm),
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => Some(Self::Mp4),
            _ => None,
        }
    }

    /// Canonical mime type.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::Webm => "audio/webm",
            Self::Mp4 => "audio/mp4",
        }
    }

    /// File extension used for downloads.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::Webm => "webm",
            Self::Mp4 => "m4a",
        }
    }
}

/// Resolve the format of an upload.
///
/// The bytes win over the declared type; the declared type is only used
/// when the bytes carry no recognizable signature.
pub fn resolve_format(declared: Option<&str>, bytes: &[u8]) -> Result<AudioFormat> {
    if let Some(format) = AudioFormat::sniff(bytes) {
        return Ok(format);
    }
    declared
        .and_then(AudioFormat::from_mime)
        .ok_or_else(|| VoxError::UnsupportedFormat {
            mime: declared
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(GENERIC_MIME)
                .to_string(),
        })
}

/// File extension for an arbitrary stored mime type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    AudioFormat::from_mime(mime)
        .map(|f| f.extension())
        .unwrap_or("bin")
}
