//! Blob store for uploaded and generated audio.
//!
//! Assets are append-only: every `put` gets a fresh random id, even for
//! byte-identical payloads, and nothing is updated in place. The SHA-256
//! digest is recorded so identical uploads can still be recognized.

pub mod fs;
pub mod memory;

use crate::audio::format::resolve_format;
use crate::audio::{AudioFormat, wav};
use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// Where a payload came from.
///
/// Uploads are bounded by the store limit; synthesized output is bounded by
/// the synthesis text limit instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetOrigin {
    #[default]
    Upload,
    Synthesis,
}

/// Metadata of a stored audio payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub id: String,
    pub byte_length: usize,
    pub mime_type: String,
    pub storage_location: String,
    pub sha256: String,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
    #[serde(default)]
    pub origin: AssetOrigin,
    /// Known only for WAV payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl AudioAsset {
    /// Container format, if the stored mime type is recognized.
    pub fn format(&self) -> Option<AudioFormat> {
        AudioFormat::from_mime(&self.mime_type)
    }

    pub fn is_synthesized(&self) -> bool {
        self.origin == AssetOrigin::Synthesis
    }

    /// Suggested download file name.
    pub fn file_name(&self) -> String {
        format!(
            "{}.{}",
            self.id,
            crate::audio::format::extension_for_mime(&self.mime_type)
        )
    }
}

/// An asset together with its bytes.
#[derive(Debug, Clone)]
pub struct StoredAudio {
    pub asset: AudioAsset,
    pub bytes: Vec<u8>,
}

/// Storage backend for audio payloads.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist a payload and return its metadata.
    ///
    /// `mime` is the declared content type; the stored type is resolved
    /// from the bytes when possible.
    async fn put(
        &self,
        bytes: Vec<u8>,
        mime: Option<&str>,
        origin: AssetOrigin,
    ) -> Result<AudioAsset>;

    /// Fetch an asset and its bytes.
    async fn get(&self, id: &str) -> Result<StoredAudio>;

    /// Fetch only the metadata of an asset.
    async fn metadata(&self, id: &str) -> Result<AudioAsset>;

    /// Remove an asset.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Number of stored assets.
    async fn len(&self) -> Result<usize>;

    /// Largest payload `put` accepts.
    fn max_bytes(&self) -> usize;
}

/// A payload that passed validation and is ready to be written.
#[derive(Debug)]
pub(crate) struct PreparedBlob {
    pub id: String,
    pub format: AudioFormat,
    pub origin: AssetOrigin,
    pub sha256: String,
    pub duration_secs: Option<f64>,
    pub bytes: Vec<u8>,
}

impl PreparedBlob {
    pub(crate) fn into_asset(self, storage_location: String) -> (AudioAsset, Vec<u8>) {
        let asset = AudioAsset {
            id: self.id,
            byte_length: self.bytes.len(),
            mime_type: self.format.mime().to_string(),
            storage_location,
            sha256: self.sha256,
            created_at: unix_now(),
            origin: self.origin,
            duration_secs: self.duration_secs,
        };
        (asset, self.bytes)
    }
}

/// Validate a payload and compute everything the stores record.
pub(crate) fn prepare(
    bytes: Vec<u8>,
    mime: Option<&str>,
    origin: AssetOrigin,
    max_bytes: usize,
) -> Result<PreparedBlob> {
    if bytes.is_empty() {
        return Err(VoxError::validation("Audio payload is empty"));
    }
    if origin == AssetOrigin::Upload && bytes.len() > max_bytes {
        return Err(VoxError::PayloadTooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    let format = resolve_format(mime, &bytes)?;
    let duration_secs = match format {
        AudioFormat::Wav => wav::probe_duration(&bytes),
        _ => None,
    };
    let sha256 = format!("{:x}", Sha256::digest(&bytes));

    Ok(PreparedBlob {
        id: new_audio_id(),
        format,
        origin,
        sha256,
        duration_secs,
        bytes,
    })
}

/// Generate a fresh asset id.
pub fn new_audio_id() -> String {
    format!("audio-{}", uuid::Uuid::new_v4().simple())
}

/// Ids double as file names, so only a conservative alphabet is allowed.
pub(crate) fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
