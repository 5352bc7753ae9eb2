//! HTTP client for a running voxshift server.

use crate::defaults::AUDIO_FIELD;
use crate::error::{Result, VoxError};
use crate::server::protocol::{
    DeleteResponse, ErrorResponse, GenerateSpeechRequest, GenerateSpeechResponse, HealthResponse,
    JobRequest, JobResponse, JobsResponse, SearchResponse, SynthesizeResponse, TranscribeRequest,
    TranscribeResponse, UploadResponse, UploadVoiceResponse, VoiceResponse, VoicesResponse,
};
use crate::tts::VoiceReference;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A file to send as the `audio` part of a multipart request.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: Option<String>,
}

impl AudioFile {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    fn into_part(self) -> Result<Part> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.mime {
            Some(mime) => part.mime_str(&mime).map_err(|e| {
                VoxError::validation(format!("Invalid mime type '{}': {}", mime, e))
            }),
            None => Ok(part),
        }
    }
}

/// Downloaded audio and the file name the server suggested.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Typed wrapper around the HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, None)
    }

    /// Client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::build(base_url, Some(timeout))
    }

    fn build(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| VoxError::Connection {
            message: format!("Failed to build HTTP client: {e}"),
        })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| VoxError::Connection {
            message: e.to_string(),
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        Err(VoxError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let text = response.text().await.map_err(|e| VoxError::Connection {
            message: format!("Failed to read response: {e}"),
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.json(self.http.get(self.url("/health"))).await
    }

    pub async fn upload_audio(&self, file: AudioFile) -> Result<UploadResponse> {
        let form = Form::new().part(AUDIO_FIELD, file.into_part()?);
        self.json(self.http.post(self.url("/upload_audio")).multipart(form))
            .await
    }

    /// Upload and transcribe in one request.
    pub async fn transcribe_file(&self, file: AudioFile) -> Result<TranscribeResponse> {
        let form = Form::new().part(AUDIO_FIELD, file.into_part()?);
        self.json(self.http.post(self.url("/transcribe")).multipart(form))
            .await
    }

    /// Transcribe previously uploaded audio.
    pub async fn transcribe_id(&self, audio_id: &str) -> Result<TranscribeResponse> {
        let body = TranscribeRequest {
            audio_id: audio_id.to_string(),
        };
        self.json(self.http.post(self.url("/transcribe")).json(&body))
            .await
    }

    pub async fn search_voices(&self, query: &str) -> Result<SearchResponse> {
        self.json(
            self.http
                .get(self.url("/search_voices"))
                .query(&[("q", query)]),
        )
        .await
    }

    pub async fn get_voice(&self, id: &str) -> Result<VoiceResponse> {
        self.json(self.http.get(self.url(&format!("/get_voice/{id}"))))
            .await
    }

    pub async fn list_voices(&self) -> Result<VoicesResponse> {
        self.json(self.http.get(self.url("/voices"))).await
    }

    pub async fn upload_voice(&self, file: AudioFile, name: Option<&str>) -> Result<UploadVoiceResponse> {
        let mut form = Form::new().part(AUDIO_FIELD, file.into_part()?);
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }
        self.json(self.http.post(self.url("/upload_voice")).multipart(form))
            .await
    }

    pub async fn delete_voice(&self, id: &str) -> Result<DeleteResponse> {
        self.json(self.http.delete(self.url(&format!("/voices/{id}"))))
            .await
    }

    /// Synthesize and wait for the result.
    pub async fn synthesize(&self, text: &str, voice: &VoiceReference) -> Result<SynthesizeResponse> {
        let field = match voice {
            VoiceReference::Preset { .. } => "voice_preset_id",
            VoiceReference::Audio { .. } => "reference_audio_id",
        };
        let form = [("text", text), (field, voice.id())];
        self.json(self.http.post(self.url("/synthesize")).form(&form))
            .await
    }

    pub async fn generate_speech(&self, text: &str, voice_id: &str) -> Result<GenerateSpeechResponse> {
        let body = GenerateSpeechRequest {
            text: Some(text.to_string()),
            voice_id: Some(voice_id.to_string()),
        };
        self.json(self.http.post(self.url("/generate_speech")).json(&body))
            .await
    }

    /// Queue a background job.
    pub async fn create_job(&self, text: &str, voice: &VoiceReference) -> Result<JobResponse> {
        let mut body = JobRequest {
            text: text.to_string(),
            ..Default::default()
        };
        match voice {
            VoiceReference::Preset { voice_preset_id } => {
                body.voice_preset_id = Some(voice_preset_id.clone())
            }
            VoiceReference::Audio { reference_audio_id } => {
                body.reference_audio_id = Some(reference_audio_id.clone())
            }
        }
        self.json(self.http.post(self.url("/jobs")).json(&body)).await
    }

    pub async fn job(&self, id: &str) -> Result<JobResponse> {
        self.json(self.http.get(self.url(&format!("/jobs/{id}"))))
            .await
    }

    pub async fn jobs(&self) -> Result<JobsResponse> {
        self.json(self.http.get(self.url("/jobs"))).await
    }

    pub async fn download(&self, id: &str) -> Result<Download> {
        let response = self
            .send(self.http.get(self.url(&format!("/download/{id}"))))
            .await?;
        let headers = response.headers();
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let file_name = headers
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name);
        let bytes = response.bytes().await.map_err(|e| VoxError::Connection {
            message: format!("Failed to read download: {e}"),
        })?;
        Ok(Download {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        })
    }
}

/// Extract `filename` from a `Content-Disposition` value, keeping only the
/// final path component so a server cannot steer where the file is written.
fn attachment_file_name(disposition: &str) -> Option<String> {
    let name = disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');
    std::path::Path::new(name)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://127.0.0.1:8000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(client.url("/health"), "http://127.0.0.1:8000/health");
    }

    #[test]
    fn test_attachment_file_name() {
        assert_eq!(
            attachment_file_name("attachment; filename=\"audio-1.wav\"").as_deref(),
            Some("audio-1.wav")
        );
        assert_eq!(
            attachment_file_name("attachment;filename=x.mp3").as_deref(),
            Some("x.mp3")
        );
        assert_eq!(attachment_file_name("attachment"), None);
        assert_eq!(attachment_file_name("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_attachment_file_name_drops_directories() {
        assert_eq!(
            attachment_file_name("attachment; filename=\"../../etc/passwd\"").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            attachment_file_name("attachment; filename=/tmp/out.wav").as_deref(),
            Some("out.wav")
        );
        assert_eq!(attachment_file_name("attachment; filename=\"..\""), None);
        assert_eq!(attachment_file_name("attachment; filename=\"a/..\""), None);
    }

    #[test]
    fn test_invalid_mime_is_rejected() {
        let file = AudioFile::new(vec![1, 2, 3], "x.wav").with_mime("not a mime");
        assert!(matches!(file.into_part(), Err(VoxError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        // port 9 (discard) is closed on test machines
        let client = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            client.health().await,
            Err(VoxError::Connection { .. })
        ));
    }
}
