//! Route handlers.
//!
//! Every handler returns `Result<_, VoxError>`; errors render as
//! `{"error": "..."}` with a status derived from [`VoxError::kind`].

use crate::defaults::{AUDIO_FIELD, VOICE_PAGE_LIMIT};
use crate::error::{ErrorKind, Result, VoxError};
use crate::server::AppState;
use crate::server::protocol::{
    DeleteResponse, EngineStatus, ErrorResponse, GenerateSpeechRequest, GenerateSpeechResponse,
    HealthResponse, JobRequest, JobResponse, JobsResponse, ListVoicesQuery, SearchQuery,
    SearchResponse, SynthesizeResponse, TranscribeRequest, TranscribeResponse, UploadResponse,
    UploadVoiceResponse, VoiceResponse, VoicesResponse,
};
use crate::stt::{Transcriber, Transcript};
use crate::tts::VoiceReference;
use crate::voices::VoiceSample;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

impl IntoResponse for VoxError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Model | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// An uploaded file part.
#[derive(Debug)]
pub(crate) struct Upload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Fields of a form body, whichever encoding it arrived in.
#[derive(Debug, Default)]
pub(crate) struct FormFields {
    values: HashMap<String, String>,
    audio: Option<Upload>,
}

impl FormFields {
    /// A non-blank text field.
    fn value(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn require_audio(&mut self) -> Result<Upload> {
        self.audio
            .take()
            .ok_or_else(|| VoxError::validation("No audio file provided"))
    }
}

/// Body-limit rejections are 413; any other extractor rejection is a bad request.
fn rejection_error(status: StatusCode, message: String) -> VoxError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        VoxError::BodyTooLarge { message }
    } else {
        VoxError::validation(message)
    }
}

fn multipart_error(err: MultipartError) -> VoxError {
    rejection_error(err.status(), err.body_text())
}

fn content_type(req: &Request) -> String {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Read a multipart, urlencoded or JSON body into flat fields.
///
/// The multipart part named `audio` is kept as the upload; every other
/// part is read as text.
async fn read_fields(req: Request, state: &AppState) -> Result<FormFields> {
    let kind = content_type(&req);
    let mut fields = FormFields::default();

    if kind.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|r| rejection_error(r.status(), r.body_text()))?;
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == AUDIO_FIELD {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                fields.audio = Some(Upload {
                    bytes: bytes.to_vec(),
                    content_type,
                    file_name,
                });
            } else {
                let text = field.text().await.map_err(multipart_error)?;
                fields.values.insert(name, text);
            }
        }
    } else if kind.starts_with("application/x-www-form-urlencoded") {
        let axum::Form(values) = axum::Form::<HashMap<String, String>>::from_request(req, state)
            .await
            .map_err(|r| rejection_error(r.status(), r.body_text()))?;
        fields.values = values;
    } else if kind.starts_with("application/json") {
        let values: HashMap<String, serde_json::Value> = read_json(req, state).await?;
        fields.values = values
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect();
    } else {
        return Err(VoxError::validation(format!(
            "Unsupported content type: '{}'",
            kind
        )));
    }
    Ok(fields)
}

async fn read_json<T: DeserializeOwned>(req: Request, state: &AppState) -> Result<T> {
    let Json(value) = Json::<T>::from_request(req, state)
        .await
        .map_err(|r| rejection_error(r.status(), r.body_text()))?;
    Ok(value)
}

fn transcribe_response(transcript: Transcript) -> TranscribeResponse {
    TranscribeResponse {
        success: true,
        text: transcript.text,
        language: transcript.language,
        segments: transcript.segments,
        audio_id: transcript.audio_id,
    }
}

pub async fn upload_audio(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<UploadResponse>> {
    let upload = read_fields(req, &state).await?.require_audio()?;
    let asset = state
        .orchestrator
        .upload(upload.bytes, upload.content_type.as_deref())
        .await?;
    Ok(Json(UploadResponse {
        success: true,
        audio_id: asset.id,
        message: "Audio uploaded successfully".to_string(),
    }))
}

/// Multipart upload, multipart `audio_id`, or JSON `{audio_id}`.
pub async fn transcribe(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<TranscribeResponse>> {
    let transcript = if content_type(&req).starts_with("application/json") {
        let request: TranscribeRequest = read_json(req, &state).await?;
        state.orchestrator.transcribe(&request.audio_id).await?
    } else {
        let mut fields = read_fields(req, &state).await?;
        match (fields.audio.take(), fields.value("audio_id")) {
            (Some(upload), _) => {
                state
                    .orchestrator
                    .transcribe_upload(upload.bytes, upload.content_type.as_deref())
                    .await?
            }
            (None, Some(audio_id)) => state.orchestrator.transcribe(audio_id).await?,
            (None, None) => return Err(VoxError::validation("No audio provided")),
        }
    };
    Ok(Json(transcribe_response(transcript)))
}

pub async fn search_voices(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let results = state.catalog.search(query.q.as_deref().unwrap_or_default())?;
    Ok(Json(SearchResponse {
        success: true,
        results,
    }))
}

pub async fn get_voice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VoiceResponse>> {
    let voice = state.catalog.get(&id)?;
    Ok(Json(VoiceResponse {
        success: true,
        voice,
    }))
}

/// `?skip=&limit=` paging over catalog order.
pub async fn list_voices(
    State(state): State<AppState>,
    Query(query): Query<ListVoicesQuery>,
) -> Json<VoicesResponse> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(VOICE_PAGE_LIMIT);
    Json(VoicesResponse {
        success: true,
        voices: state.catalog.page(skip, limit),
    })
}

/// Form fields: `text` plus exactly one of `reference_audio_id` / `voice_preset_id`.
pub async fn synthesize(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<SynthesizeResponse>> {
    let fields = read_fields(req, &state).await?;
    let text = fields
        .value("text")
        .ok_or_else(|| VoxError::validation("No text provided"))?;
    let voice = VoiceReference::from_fields(
        fields.value("reference_audio_id"),
        fields.value("voice_preset_id"),
    )?;

    let job = state.orchestrator.synthesize(text, voice).await?;
    let audio_id = job
        .output_audio_id
        .ok_or_else(|| VoxError::Other(format!("job {} completed without output", job.id)))?;
    Ok(Json(SynthesizeResponse {
        success: true,
        audio_id,
        job_id: job.id,
        message: "Speech generated successfully".to_string(),
    }))
}

pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    // only synthesized output (speech and previews) is downloadable
    let store = state.orchestrator.store();
    if !store.metadata(&id).await?.is_synthesized() {
        return Err(VoxError::not_found("Audio", &id));
    }
    let audio = store.get(&id).await?;
    let disposition = format!("attachment; filename=\"{}\"", audio.asset.file_name());
    let headers = [
        (header::CONTENT_TYPE, audio.asset.mime_type.clone()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, audio.bytes).into_response())
}

/// Register a custom voice from an uploaded sample.
pub async fn upload_voice(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<UploadVoiceResponse>> {
    let mut fields = read_fields(req, &state).await?;
    let upload = fields.require_audio()?;
    let asset = state
        .orchestrator
        .upload(upload.bytes, upload.content_type.as_deref())
        .await?;
    let transcript = state.orchestrator.transcribe(&asset.id).await?;
    let sample = VoiceSample {
        audio_id: asset.id.clone(),
        file_name: upload.file_name,
        duration_secs: asset.duration_secs,
        transcription: Some(transcript.text),
    };
    let voice = state.catalog.register_custom(fields.value("name"), sample);
    tracing::info!(voice_id = %voice.id, audio_id = %asset.id, "Registered custom voice");
    Ok(Json(UploadVoiceResponse {
        success: true,
        voice_id: voice.id,
        audio_id: asset.id,
        message: "Voice uploaded and processed successfully".to_string(),
    }))
}

/// Remove a custom voice and its stored sample.
pub async fn delete_voice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let voice = state.catalog.remove_custom(&id)?;
    if let Some(sample) = voice.sample_audio_id.as_deref()
        && let Err(e) = state.orchestrator.store().delete(sample).await
    {
        tracing::warn!(voice_id = %id, audio_id = sample, error = %e, "Failed to delete voice sample");
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Voice {} deleted", voice.id),
    }))
}

/// JSON `{text, voiceId}`; `voiceId` names a preset or custom voice.
pub async fn generate_speech(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<GenerateSpeechResponse>> {
    let request: GenerateSpeechRequest = read_json(req, &state).await?;
    let (Some(text), Some(voice_id)) = (
        request.text.filter(|t| !t.trim().is_empty()),
        request.voice_id.filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(VoxError::validation("Missing required fields"));
    };

    let job = state
        .orchestrator
        .synthesize(&text, VoiceReference::preset(voice_id))
        .await?;
    let audio_id = job
        .output_audio_id
        .ok_or_else(|| VoxError::Other(format!("job {} completed without output", job.id)))?;
    Ok(Json(GenerateSpeechResponse {
        success: true,
        audio_url: format!("/download/{}", audio_id),
        audio_id,
        message: "Speech generated successfully".to_string(),
    }))
}

/// Queue a background synthesis job.
pub async fn create_job(
    State(state): State<AppState>,
    req: Request,
) -> Result<(StatusCode, Json<JobResponse>)> {
    let request: JobRequest = read_json(req, &state).await?;
    let voice = VoiceReference::from_fields(
        request.reference_audio_id.as_deref(),
        request.voice_preset_id.as_deref(),
    )?;
    let job = state.orchestrator.spawn(&request.text, voice).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobResponse { success: true, job }),
    ))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>> {
    let job = state.orchestrator.job(&id).await?;
    Ok(Json(JobResponse { success: true, job }))
}

pub async fn list_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    Json(JobsResponse {
        success: true,
        jobs: state.orchestrator.jobs().await,
    })
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let assets = state.orchestrator.store().len().await?;
    let transcriber = state.orchestrator.transcriber();
    let engine = state.orchestrator.engine();
    let transcriber = EngineStatus {
        model: transcriber.model_name().to_string(),
        ready: transcriber.is_ready(),
    };
    let synthesizer = EngineStatus {
        model: engine.model_name().to_string(),
        ready: engine.is_ready(),
    };
    let status = if transcriber.ready && synthesizer.ready {
        "ok"
    } else {
        "degraded"
    };
    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: crate::version_string(),
        voices: state.catalog.len(),
        assets,
        transcriber,
        synthesizer,
    }))
}

pub async fn not_found(uri: Uri) -> VoxError {
    VoxError::not_found("Route", uri.path())
}
