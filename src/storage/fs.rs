//! Filesystem blob store.
//!
//! Layout: `<root>/<id>.<ext>` holds the payload and `<root>/<id>.json` its
//! metadata. The payload is written to a temporary file, synced and renamed
//! before the metadata appears, so a metadata file always points at a
//! complete payload.

use crate::error::{Result, VoxError};
use crate::storage::{AssetOrigin, AudioAsset, BlobStore, StoredAudio, is_valid_id, prepare};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    max_bytes: usize,
}

impl FsBlobStore {
    /// Open (and create if needed) a store at `root`.
    pub async fn open(root: impl Into<PathBuf>, max_bytes: usize) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| VoxError::Storage {
                message: format!("Failed to create {}: {}", root.display(), e),
            })?;
        Ok(Self { root, max_bytes })
    }

    /// Directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn metadata_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    async fn read_metadata(&self, id: &str) -> Result<AudioAsset> {
        if !is_valid_id(id) {
            return Err(VoxError::not_found("Audio", id));
        }
        let raw = match tokio::fs::read(self.metadata_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VoxError::not_found("Audio", id));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait::async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        bytes: Vec<u8>,
        mime: Option<&str>,
        origin: AssetOrigin,
    ) -> Result<AudioAsset> {
        let prepared = prepare(bytes, mime, origin, self.max_bytes)?;
        let payload_path = self
            .root
            .join(format!("{}.{}", prepared.id, prepared.format.extension()));
        let location = payload_path.to_string_lossy().to_string();
        let (asset, bytes) = prepared.into_asset(location);

        write_synced(&payload_path, &bytes)
            .await
            .map_err(|e| VoxError::Storage {
                message: format!("Failed to write {}: {}", payload_path.display(), e),
            })?;
        let metadata = serde_json::to_vec_pretty(&asset)?;
        write_synced(&self.metadata_path(&asset.id), &metadata)
            .await
            .map_err(|e| VoxError::Storage {
                message: format!("Failed to write metadata for {}: {}", asset.id, e),
            })?;

        tracing::debug!(id = %asset.id, path = %payload_path.display(), "stored blob");
        Ok(asset)
    }

    async fn get(&self, id: &str) -> Result<StoredAudio> {
        let asset = self.read_metadata(id).await?;
        let bytes = tokio::fs::read(&asset.storage_location)
            .await
            .map_err(|e| VoxError::Storage {
                message: format!("Payload for {} unreadable: {}", id, e),
            })?;
        Ok(StoredAudio { asset, bytes })
    }

    async fn metadata(&self, id: &str) -> Result<AudioAsset> {
        self.read_metadata(id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let asset = self.read_metadata(id).await?;
        tokio::fs::remove_file(self.metadata_path(id)).await?;
        if let Err(e) = tokio::fs::remove_file(&asset.storage_location).await {
            tracing::warn!(id, error = %e, "metadata removed but payload removal failed");
        }
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::wav_bytes;
    use tempfile::TempDir;

    #[tokio::test]
    async fn put_writes_payload_and_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(temp_dir.path(), 1 << 20).await.unwrap();

        let asset = store.put(wav_bytes(160), None, AssetOrigin::Upload).await.unwrap();

        assert!(temp_dir.path().join(format!("{}.wav", asset.id)).exists());
        assert!(temp_dir.path().join(format!("{}.json", asset.id)).exists());
        assert_eq!(asset.mime_type, "audio/wav");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let bytes = wav_bytes(400);
        let id = {
            let store = FsBlobStore::open(temp_dir.path(), 1 << 20).await.unwrap();
            store
                .put(bytes.clone(), Some("audio/wav"), AssetOrigin::Synthesis)
                .await
                .unwrap()
                .id
        };

        let reopened = FsBlobStore::open(temp_dir.path(), 1 << 20).await.unwrap();
        let stored = reopened.get(&id).await.unwrap();
        assert_eq!(stored.bytes, bytes);
        assert_eq!(stored.asset.duration_secs, Some(0.025));
        assert!(stored.asset.is_synthesized());
    }

    #[tokio::test]
    async fn traversal_ids_are_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(temp_dir.path(), 1 << 20).await.unwrap();

        assert!(matches!(
            store.get("../../etc/passwd").await,
            Err(VoxError::NotFound { .. })
        ));
        assert!(matches!(
            store.get("audio-nothing-here").await,
            Err(VoxError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_removes_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(temp_dir.path(), 1 << 20).await.unwrap();
        let asset = store.put(wav_bytes(10), None, AssetOrigin::Upload).await.unwrap();

        store.delete(&asset.id).await.unwrap();

        assert!(!Path::new(&asset.storage_location).exists());
        assert_eq!(store.len().await.unwrap(), 0);
        assert!(matches!(
            store.delete(&asset.id).await,
            Err(VoxError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn open_creates_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = FsBlobStore::open(&nested, 10).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.root(), nested.as_path());
        assert_eq!(store.max_bytes(), 10);
    }
}
