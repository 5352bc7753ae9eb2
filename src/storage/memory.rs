//! In-memory blob store for tests and ephemeral runs.

use crate::error::{Result, VoxError};
use crate::storage::{AssetOrigin, AudioAsset, BlobStore, StoredAudio, prepare};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Blob store backed by a hash map; contents are lost on drop.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    entries: Arc<RwLock<HashMap<String, (AudioAsset, Arc<Vec<u8>>)>>>,
    max_bytes: usize,
}

impl MemoryBlobStore {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_bytes,
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bytes: Vec<u8>,
        mime: Option<&str>,
        origin: AssetOrigin,
    ) -> Result<AudioAsset> {
        let prepared = prepare(bytes, mime, origin, self.max_bytes)?;
        let location = format!("memory://{}", prepared.id);
        let (asset, bytes) = prepared.into_asset(location);

        self.entries
            .write()
            .await
            .insert(asset.id.clone(), (asset.clone(), Arc::new(bytes)));
        tracing::debug!(id = %asset.id, bytes = asset.byte_length, "stored blob in memory");
        Ok(asset)
    }

    async fn get(&self, id: &str) -> Result<StoredAudio> {
        let entries = self.entries.read().await;
        let (asset, bytes) = entries
            .get(id)
            .ok_or_else(|| VoxError::not_found("Audio", id))?;
        Ok(StoredAudio {
            asset: asset.clone(),
            bytes: bytes.as_ref().clone(),
        })
    }

    async fn metadata(&self, id: &str) -> Result<AudioAsset> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|(asset, _)| asset.clone())
            .ok_or_else(|| VoxError::not_found("Audio", id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| VoxError::not_found("Audio", id))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::wav_bytes;

    #[tokio::test]
    async fn put_then_get_returns_same_bytes() {
        let store = MemoryBlobStore::new(1 << 20);
        let bytes = wav_bytes(320);
        let asset = store
            .put(bytes.clone(), Some("audio/wav"), AssetOrigin::Upload)
            .await
            .unwrap();

        let stored = store.get(&asset.id).await.unwrap();
        assert_eq!(stored.bytes, bytes);
        assert_eq!(stored.asset, asset);
        assert_eq!(asset.byte_length, bytes.len());
        assert!(asset.storage_location.starts_with("memory://"));
    }

    #[tokio::test]
    async fn same_bytes_twice_yield_two_assets() {
        let store = MemoryBlobStore::new(1 << 20);
        let a = store.put(wav_bytes(10), None, AssetOrigin::Upload).await.unwrap();
        let b = store.put(wav_bytes(10), None, AssetOrigin::Upload).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryBlobStore::new(1 << 20);
        assert!(matches!(
            store.get("audio-missing").await,
            Err(VoxError::NotFound { .. })
        ));
        assert!(matches!(
            store.metadata("audio-missing").await,
            Err(VoxError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_removes_asset() {
        let store = MemoryBlobStore::new(1 << 20);
        let asset = store.put(wav_bytes(10), None, AssetOrigin::Upload).await.unwrap();

        store.delete(&asset.id).await.unwrap();
        assert!(store.get(&asset.id).await.is_err());
        assert!(store.delete(&asset.id).await.is_err());
    }

    #[tokio::test]
    async fn oversized_put_is_rejected() {
        let store = MemoryBlobStore::new(16);
        let result = store.put(wav_bytes(100), None, AssetOrigin::Upload).await;
        assert!(matches!(result, Err(VoxError::PayloadTooLarge { .. })));
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn synthesized_output_is_not_bound_by_upload_limit() {
        let store = MemoryBlobStore::new(16);
        let asset = store
            .put(wav_bytes(100), None, AssetOrigin::Synthesis)
            .await
            .unwrap();
        assert!(asset.is_synthesized());
        assert_eq!(store.len().await.unwrap(), 1);
    }
}
