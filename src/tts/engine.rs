//! Synthesis engine: request validation, voice resolution and rendering.

use crate::error::{Result, VoxError};
use crate::storage::{AssetOrigin, AudioAsset, BlobStore};
use crate::tts::reference::VoiceReference;
use crate::tts::synthesizer::{Synthesizer, VoiceSource};
use crate::voices::VoiceCatalog;
use std::sync::Arc;

pub struct SynthesisEngine {
    synthesizer: Arc<dyn Synthesizer>,
    catalog: Arc<VoiceCatalog>,
    store: Arc<dyn BlobStore>,
    max_text_chars: usize,
}

impl SynthesisEngine {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        catalog: Arc<VoiceCatalog>,
        store: Arc<dyn BlobStore>,
        max_text_chars: usize,
    ) -> Self {
        Self {
            synthesizer,
            catalog,
            store,
            max_text_chars,
        }
    }

    pub fn model_name(&self) -> &str {
        self.synthesizer.model_name()
    }

    pub fn is_ready(&self) -> bool {
        self.synthesizer.is_ready()
    }

    /// Reject empty text and text over the character limit.
    pub fn validate_text(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(VoxError::validation("No text provided"));
        }
        let length = text.chars().count();
        if length > self.max_text_chars {
            return Err(VoxError::TextTooLong {
                length,
                limit: self.max_text_chars,
            });
        }
        Ok(())
    }

    /// Turn a reference into something the synthesizer can speak with.
    ///
    /// Custom catalog voices resolve to their uploaded sample.
    pub async fn resolve(&self, reference: &VoiceReference) -> Result<VoiceSource> {
        match reference {
            VoiceReference::Preset { voice_preset_id } => {
                let preset = self.catalog.get(voice_preset_id).map_err(|_| {
                    VoxError::InvalidVoiceReference {
                        message: format!("voice preset '{}' does not exist", voice_preset_id),
                    }
                })?;
                match preset.sample_audio_id.as_deref() {
                    Some(sample_id) => self.load_sample(sample_id).await,
                    None => Ok(VoiceSource::Preset(preset)),
                }
            }
            VoiceReference::Audio { reference_audio_id } => {
                self.load_sample(reference_audio_id).await
            }
        }
    }

    async fn load_sample(&self, audio_id: &str) -> Result<VoiceSource> {
        match self.store.get(audio_id).await {
            Ok(audio) => Ok(VoiceSource::Sample(audio)),
            Err(VoxError::NotFound { .. }) => Err(VoxError::InvalidVoiceReference {
                message: format!("reference audio '{}' does not exist", audio_id),
            }),
            Err(e) => Err(e),
        }
    }

    /// Validate, resolve and render. Returns WAV bytes.
    pub async fn synthesize(&self, text: &str, reference: &VoiceReference) -> Result<Vec<u8>> {
        self.validate_text(text)?;
        let voice = self.resolve(reference).await?;
        self.render(text.to_string(), voice).await
    }

    /// Render an already-validated request on the blocking pool.
    pub async fn render(&self, text: String, voice: VoiceSource) -> Result<Vec<u8>> {
        let synthesizer = self.synthesizer.clone();
        tokio::task::spawn_blocking(move || {
            tracing::debug!(voice = voice.label(), chars = text.chars().count(), "Rendering speech");
            synthesizer.synthesize(&text, &voice)
        })
        .await
        .map_err(|e| VoxError::Synthesis {
            message: format!("synthesis task failed: {}", e),
        })?
    }

    /// Render a request and store the result as synthesized output.
    ///
    /// Output size is bounded by the text limit, not the upload limit.
    pub async fn synthesize_to_store(
        &self,
        text: &str,
        reference: &VoiceReference,
    ) -> Result<AudioAsset> {
        let wav = self.synthesize(text, reference).await?;
        self.store
            .put(wav, Some("audio/wav"), AssetOrigin::Synthesis)
            .await
    }

    /// Render and store every built-in preset's preview text.
    ///
    /// Returns how many previews were stored. A preset whose preview fails
    /// is logged and left without preview audio.
    pub async fn render_previews(&self) -> Result<usize> {
        let mut rendered = 0;
        for preset in self.catalog.list().into_iter().filter(|p| p.is_builtin()) {
            if preset.preview_audio_id.is_some() {
                continue;
            }
            let text = preset.preview_text.clone();
            let id = preset.id.clone();
            let wav = match self.render(text, VoiceSource::Preset(preset)).await {
                Ok(wav) => wav,
                Err(e) => {
                    tracing::warn!(voice = %id, error = %e, "Preview rendering failed");
                    continue;
                }
            };
            let asset = self
                .store
                .put(wav, Some("audio/wav"), AssetOrigin::Synthesis)
                .await?;
            self.catalog.set_preview_audio(&id, &asset.id)?;
            tracing::debug!(voice = %id, audio_id = %asset.id, "Stored preview");
            rendered += 1;
        }
        Ok(rendered)
    }
}
