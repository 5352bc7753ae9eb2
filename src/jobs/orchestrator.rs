//! Job orchestrator.
//!
//! Sequences upload, transcription and synthesis. Every engine call runs on
//! the blocking pool under the configured request timeout. Synthesis jobs
//! follow pending -> running -> complete | failed, and only the task that
//! dispatched a job writes its status.

use crate::error::{Result, VoxError};
use crate::jobs::types::{JobStatus, SynthesisJob};
use crate::storage::{AssetOrigin, AudioAsset, BlobStore, unix_now};
use crate::stt::{Transcriber, Transcript};
use crate::tts::{SynthesisEngine, VoiceReference};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct JobTable {
    order: Vec<String>,
    by_id: HashMap<String, SynthesisJob>,
}

/// Shared entry point for all pipeline work.
#[derive(Clone)]
pub struct JobOrchestrator {
    store: Arc<dyn BlobStore>,
    transcriber: Arc<dyn Transcriber>,
    engine: Arc<SynthesisEngine>,
    timeout: Duration,
    jobs: Arc<RwLock<JobTable>>,
    transcripts: Arc<RwLock<HashMap<String, Transcript>>>,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<dyn BlobStore>,
        transcriber: Arc<dyn Transcriber>,
        engine: Arc<SynthesisEngine>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            transcriber,
            engine,
            timeout,
            jobs: Arc::new(RwLock::new(JobTable::default())),
            transcripts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<SynthesisEngine> {
        &self.engine
    }

    async fn with_timeout<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(VoxError::Timeout {
                secs: self.timeout.as_secs_f64(),
            }),
        }
    }

    pub fn transcriber(&self) -> &Arc<dyn Transcriber> {
        &self.transcriber
    }

    /// Store an upload.
    pub async fn upload(&self, bytes: Vec<u8>, mime: Option<&str>) -> Result<AudioAsset> {
        let asset = self.store.put(bytes, mime, AssetOrigin::Upload).await?;
        tracing::info!(audio_id = %asset.id, mime = %asset.mime_type, bytes = asset.byte_length, "Stored upload");
        Ok(asset)
    }

    /// Transcribe a stored asset, reusing a cached transcript when present.
    pub async fn transcribe(&self, audio_id: &str) -> Result<Transcript> {
        self.store.metadata(audio_id).await?;
        if let Some(cached) = self.transcripts.read().await.get(audio_id) {
            tracing::debug!(audio_id, "Transcript cache hit");
            return Ok(cached.clone());
        }

        let audio = self.store.get(audio_id).await?;
        let transcriber = self.transcriber.clone();
        let transcript = self
            .with_timeout(async move {
                tokio::task::spawn_blocking(move || transcriber.transcribe(&audio))
                    .await
                    .map_err(|e| VoxError::Transcription {
                        message: format!("transcription task failed: {}", e),
                    })?
            })
            .await?;

        tracing::info!(
            audio_id,
            segments = transcript.segments.len(),
            "Transcribed audio"
        );
        self.transcripts
            .write()
            .await
            .insert(audio_id.to_string(), transcript.clone());
        Ok(transcript)
    }

    /// Store an upload, then transcribe it.
    pub async fn transcribe_upload(&self, bytes: Vec<u8>, mime: Option<&str>) -> Result<Transcript> {
        let asset = self.upload(bytes, mime).await?;
        self.transcribe(&asset.id).await
    }

    /// Validate a request and record it as a pending job.
    ///
    /// Rejected requests leave no job behind.
    pub async fn submit(&self, text: &str, voice: VoiceReference) -> Result<SynthesisJob> {
        self.engine.validate_text(text)?;
        self.engine.resolve(&voice).await?;

        let job = SynthesisJob::new(text.to_string(), voice, unix_now());
        let mut table = self.jobs.write().await;
        table.order.push(job.id.clone());
        table.by_id.insert(job.id.clone(), job.clone());
        tracing::debug!(job_id = %job.id, voice = %job.voice_reference, "Job submitted");
        Ok(job)
    }

    fn transition(
        table: &mut JobTable,
        job_id: &str,
        to: JobStatus,
        apply: impl FnOnce(&mut SynthesisJob),
    ) -> Result<SynthesisJob> {
        let job = table
            .by_id
            .get_mut(job_id)
            .ok_or_else(|| VoxError::not_found("Job", job_id))?;
        if !job.status.can_transition_to(to) {
            return Err(VoxError::InvalidTransition {
                job_id: job_id.to_string(),
                from: job.status.to_string(),
                to: to.to_string(),
            });
        }
        job.status = to;
        job.updated_at = unix_now();
        apply(job);
        tracing::info!(job_id, status = %to, "Job transition");
        Ok(job.clone())
    }

    /// Dispatch a pending job and wait for it to finish.
    ///
    /// Engine failures are recorded on the job and also returned.
    pub async fn run(&self, job_id: &str) -> Result<SynthesisJob> {
        let job = {
            let mut table = self.jobs.write().await;
            Self::transition(&mut table, job_id, JobStatus::Running, |_| {})?
        };

        let outcome = self
            .with_timeout(
                self.engine
                    .synthesize_to_store(&job.input_text, &job.voice_reference),
            )
            .await;

        let mut table = self.jobs.write().await;
        match outcome {
            Ok(asset) => Self::transition(&mut table, job_id, JobStatus::Complete, |job| {
                job.output_audio_id = Some(asset.id.clone());
            }),
            Err(e) => {
                tracing::warn!(job_id, error = %e, "Synthesis failed");
                let message = e.to_string();
                Self::transition(&mut table, job_id, JobStatus::Failed, |job| {
                    job.error = Some(message);
                })?;
                Err(e)
            }
        }
    }

    /// Run a job on its own task so it finishes even if the caller is dropped.
    fn dispatch(&self, job_id: String) -> JoinHandle<Result<SynthesisJob>> {
        let this = self.clone();
        tokio::spawn(async move { this.run(&job_id).await })
    }

    /// Submit and run a job, waiting for the result.
    pub async fn synthesize(&self, text: &str, voice: VoiceReference) -> Result<SynthesisJob> {
        let job = self.submit(text, voice).await?;
        self.dispatch(job.id.clone())
            .await
            .map_err(|e| VoxError::Synthesis {
                message: format!("job {} task failed: {}", job.id, e),
            })?
    }

    /// Submit a job and run it in the background.
    ///
    /// Returns the pending job immediately.
    pub async fn spawn(&self, text: &str, voice: VoiceReference) -> Result<SynthesisJob> {
        let job = self.submit(text, voice).await?;
        // detached: failures are recorded on the job
        drop(self.dispatch(job.id.clone()));
        Ok(job)
    }

    /// Snapshot of one job.
    pub async fn job(&self, job_id: &str) -> Result<SynthesisJob> {
        self.jobs
            .read()
            .await
            .by_id
            .get(job_id)
            .cloned()
            .ok_or_else(|| VoxError::not_found("Job", job_id))
    }

    /// Snapshot of all jobs in submission order.
    pub async fn jobs(&self) -> Vec<SynthesisJob> {
        let table = self.jobs.read().await;
        table
            .order
            .iter()
            .filter_map(|id| table.by_id.get(id).cloned())
            .collect()
    }
}
