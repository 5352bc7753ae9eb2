//! `ApiClient` against a live server, including a filesystem-backed store
//! that outlives the server process state.

#![cfg(feature = "client")]

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use voxshift::client::{ApiClient, AudioFile};
use voxshift::config::Config;
use voxshift::server::{build_state, serve};
use voxshift::{JobStatus, VoiceReference, VoxError};

async fn spawn(config: Config) -> ApiClient {
    let state = build_state(&config).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state, std::future::pending()));
    ApiClient::with_timeout(&format!("http://{addr}/"), Duration::from_secs(10)).unwrap()
}

fn memory_config() -> Config {
    let mut config = Config::default();
    config.storage.in_memory = true;
    config
}

fn disk_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.in_memory = false;
    config.storage.dir = Some(dir.to_path_buf());
    config
}

fn clip(secs: f64) -> AudioFile {
    let mut cursor = Cursor::new(Vec::new());
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    let samples = (secs * 16000.0) as usize;
    for i in 0..samples {
        let t = i as f32 / 16000.0;
        let value = (t * 220.0 * std::f32::consts::TAU).sin() * 8000.0;
        writer.write_sample(value as i16).unwrap();
    }
    writer.finalize().unwrap();
    AudioFile::new(cursor.into_inner(), "clip.wav")
}

fn server_status(err: VoxError) -> u16 {
    match err {
        VoxError::Server { status, .. } => status,
        other => panic!("expected a server error, got {other:?}"),
    }
}

#[tokio::test]
async fn base_url_trailing_slash_is_trimmed() {
    let client = spawn(memory_config()).await;
    assert!(!client.base_url().ends_with('/'));
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn upload_then_transcribe_by_id() {
    let client = spawn(memory_config()).await;
    let upload = client.upload_audio(clip(2.0)).await.unwrap();
    assert!(upload.success);

    let transcript = client.transcribe_id(&upload.audio_id).await.unwrap();
    assert_eq!(transcript.audio_id, upload.audio_id);
    let joined: String = transcript.segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(joined, transcript.text);
    assert_eq!(transcript.segments.last().unwrap().end, 2.0);

    // transcribing the same asset again gives the same answer
    let again = client.transcribe_id(&upload.audio_id).await.unwrap();
    assert_eq!(again.text, transcript.text);
}

#[tokio::test]
async fn transcribe_file_uploads_first() {
    let client = spawn(memory_config()).await;
    let transcript = client
        .transcribe_file(clip(1.0).with_mime("audio/wav"))
        .await
        .unwrap();
    assert!(transcript.audio_id.starts_with("audio-"));
    let again = client.transcribe_id(&transcript.audio_id).await.unwrap();
    assert_eq!(again.text, transcript.text);

    // uploads are inputs, not downloadable output
    let err = client.download(&transcript.audio_id).await.unwrap_err();
    assert_eq!(server_status(err), 404);
}

#[tokio::test]
async fn synthesize_and_download_with_suggested_name() {
    let client = spawn(memory_config()).await;
    let response = client
        .synthesize("Hello from the wizard", &VoiceReference::preset("wizard-1"))
        .await
        .unwrap();
    assert_eq!(response.message, "Speech generated successfully");

    let download = client.download(&response.audio_id).await.unwrap();
    assert_eq!(
        download.file_name.as_deref(),
        Some(format!("{}.wav", response.audio_id).as_str())
    );
    let reader = hound::WavReader::new(Cursor::new(download.bytes)).unwrap();
    assert!(reader.duration() > 0);

    let job = client.job(&response.job_id).await.unwrap().job;
    assert_eq!(job.status, JobStatus::Complete);
    assert_eq!(job.output_audio_id.as_deref(), Some(response.audio_id.as_str()));
}

#[tokio::test]
async fn different_voices_produce_different_audio() {
    let client = spawn(memory_config()).await;
    let text = "Same words, different voice";
    let deep = client
        .synthesize(text, &VoiceReference::preset("morgan-freeman-1"))
        .await
        .unwrap();
    let high = client
        .synthesize(text, &VoiceReference::preset("anime-girl-1"))
        .await
        .unwrap();
    let deep = client.download(&deep.audio_id).await.unwrap();
    let high = client.download(&high.audio_id).await.unwrap();
    assert_ne!(deep.bytes, high.bytes);
}

#[tokio::test]
async fn synthesize_with_reference_audio() {
    let client = spawn(memory_config()).await;
    let reference = client.upload_audio(clip(0.5)).await.unwrap();
    let response = client
        .synthesize("Mimic me", &VoiceReference::audio(reference.audio_id.clone()))
        .await
        .unwrap();
    assert_ne!(response.audio_id, reference.audio_id);

    let err = client
        .synthesize("Mimic me", &VoiceReference::audio("audio-missing"))
        .await
        .unwrap_err();
    assert_eq!(server_status(err), 404);
}

#[tokio::test]
async fn errors_carry_status_and_message() {
    let client = spawn(memory_config()).await;

    match client.get_voice("ghost-1").await.unwrap_err() {
        VoxError::Server { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Voice not found: ghost-1");
        }
        other => panic!("expected a server error, got {other:?}"),
    }

    let err = client.search_voices("   ").await.unwrap_err();
    assert_eq!(server_status(err), 400);

    let err = client.download("audio-nothing").await.unwrap_err();
    assert_eq!(server_status(err), 404);
}

#[tokio::test]
async fn voice_catalog_over_http() {
    let client = spawn(memory_config()).await;
    let voices = client.list_voices().await.unwrap().voices;
    assert_eq!(voices.len(), 4);
    assert!(voices.iter().all(|v| v.preview_audio_id.is_some()));

    let results = client.search_voices("CELEBRITY").await.unwrap().results;
    let ids: Vec<_> = results.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, ["rdj-1", "morgan-freeman-1"]);

    let voice = client.get_voice("anime-girl-1").await.unwrap().voice;
    assert_eq!(voice.name, "Anime Girl");
}

#[tokio::test]
async fn custom_voice_round_trip() {
    let client = spawn(memory_config()).await;
    let uploaded = client
        .upload_voice(clip(1.0), Some("Studio Voice"))
        .await
        .unwrap();

    let voice = client.get_voice(&uploaded.voice_id).await.unwrap().voice;
    assert_eq!(voice.name, "Studio Voice");
    assert_eq!(voice.sample_audio_id.as_deref(), Some(uploaded.audio_id.as_str()));
    assert_eq!(voice.file_name.as_deref(), Some("clip.wav"));
    assert!(voice.transcription.is_some());

    let speech = client
        .generate_speech("Custom speech", &uploaded.voice_id)
        .await
        .unwrap();
    assert!(client.download(&speech.audio_id).await.is_ok());

    client.delete_voice(&uploaded.voice_id).await.unwrap();
    let err = client.delete_voice(&uploaded.voice_id).await.unwrap_err();
    assert_eq!(server_status(err), 404);
}

#[tokio::test]
async fn queued_jobs_complete_in_order() {
    let client = spawn(memory_config()).await;
    let first = client
        .create_job("First", &VoiceReference::preset("rdj-1"))
        .await
        .unwrap()
        .job;
    let second = client
        .create_job("Second", &VoiceReference::preset("rdj-1"))
        .await
        .unwrap()
        .job;

    for id in [&first.id, &second.id] {
        let mut status = JobStatus::Pending;
        for _ in 0..100 {
            status = client.job(id).await.unwrap().job.status;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(status, JobStatus::Complete);
    }

    let jobs = client.jobs().await.unwrap().jobs;
    let ids: Vec<_> = jobs.iter().map(|j| j.id.clone()).collect();
    assert_eq!(ids, [first.id, second.id]);
}

#[tokio::test]
async fn stored_audio_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (upload_id, output_id) = {
        let client = spawn(disk_config(dir.path())).await;
        let upload = client.upload_audio(clip(0.25)).await.unwrap().audio_id;
        let output = client
            .synthesize("Still here", &VoiceReference::preset("rdj-1"))
            .await
            .unwrap()
            .audio_id;
        (upload, output)
    };

    let client = spawn(disk_config(dir.path())).await;
    let download = client.download(&output_id).await.unwrap();
    assert_eq!(download.content_type.as_deref(), Some("audio/wav"));
    assert!(client.transcribe_id(&upload_id).await.is_ok());
    let err = client.download(&upload_id).await.unwrap_err();
    assert_eq!(server_status(err), 404);
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let client = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    match client.health().await {
        Err(VoxError::Connection { .. }) => {}
        other => panic!("expected a connection error, got {other:?}"),
    }
}
