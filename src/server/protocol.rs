//! JSON bodies exchanged over the HTTP API.
//!
//! Shared by the server handlers and [`crate::client::ApiClient`].

use crate::jobs::SynthesisJob;
use crate::stt::Segment;
use crate::voices::VoicePreset;
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub audio_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribeRequest {
    pub audio_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub text: String,
    pub language: String,
    pub segments: Vec<Segment>,
    pub audio_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<VoicePreset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub success: bool,
    pub voice: VoicePreset,
}

/// Paging for `/voices`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListVoicesQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub success: bool,
    pub voices: Vec<VoicePreset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizeResponse {
    pub success: bool,
    pub audio_id: String,
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadVoiceResponse {
    pub success: bool,
    pub voice_id: String,
    pub audio_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateSpeechRequest {
    pub text: Option<String>,
    #[serde(rename = "voiceId")]
    pub voice_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateSpeechResponse {
    pub success: bool,
    pub audio_id: String,
    pub audio_url: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_preset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_audio_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: SynthesisJob,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsResponse {
    pub success: bool,
    pub jobs: Vec<SynthesisJob>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model: String,
    pub ready: bool,
}

/// `status` is "ok" when both engines are ready, "degraded" otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub voices: usize,
    pub assets: usize,
    pub transcriber: EngineStatus,
    pub synthesizer: EngineStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_speech_uses_camel_case_voice_id() {
        let request: GenerateSpeechRequest =
            serde_json::from_str(r#"{"text":"hi","voiceId":"rdj-1"}"#).unwrap();
        assert_eq!(request.voice_id.as_deref(), Some("rdj-1"));

        let missing: GenerateSpeechRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert!(missing.voice_id.is_none());
    }

    #[test]
    fn test_job_request_omits_absent_voice_fields() {
        let request = JobRequest {
            text: "hi".to_string(),
            voice_preset_id: Some("wizard-1".to_string()),
            reference_audio_id: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"text":"hi","voice_preset_id":"wizard-1"}"#);

        let empty: JobRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, JobRequest::default());
    }

    #[test]
    fn test_list_voices_query_is_optional() {
        let query: ListVoicesQuery = serde_json::from_str(r#"{"limit":2}"#).unwrap();
        assert_eq!(query.skip, None);
        assert_eq!(query.limit, Some(2));
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_string(&ErrorResponse {
            error: "No text provided".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"error":"No text provided"}"#);
    }
}
