//! Plain-text rendering of API results for the CLI.
//!
//! Returns strings so the CLI decides where they go and how they are colored.

use crate::server::protocol::{EngineStatus, HealthResponse, TranscribeResponse};
use crate::voices::VoicePreset;

/// Format seconds as `m:ss.mmm`.
pub fn format_timestamp(secs: f64) -> String {
    let millis = (secs.max(0.0) * 1000.0).round() as u64;
    format!("{}:{:02}.{:03}", millis / 60_000, (millis / 1000) % 60, millis % 1000)
}

/// One line per segment, followed by the full text.
pub fn format_transcript(transcript: &TranscribeResponse) -> String {
    let mut out = String::new();
    for segment in &transcript.segments {
        out.push_str(&format!(
            "[{} -> {}] {}\n",
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            segment.text.trim()
        ));
    }
    out.push_str(&transcript.text);
    out
}

/// `id  name  (category)` per voice, ids padded to line up.
pub fn format_voice_list(voices: &[VoicePreset]) -> String {
    let width = voices.iter().map(|v| v.id.len()).max().unwrap_or(0);
    voices
        .iter()
        .map(|v| format!("{:width$}  {}  ({})", v.id, v.name, v.category.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_voice(voice: &VoicePreset) -> String {
    let mut lines = vec![
        format!("id:          {}", voice.id),
        format!("name:        {}", voice.name),
        format!("category:    {}", voice.category.as_str()),
        format!("description: {}", voice.description),
    ];
    if !voice.preview_text.is_empty() {
        lines.push(format!("preview:     \"{}\"", voice.preview_text));
    }
    if let Some(audio) = &voice.preview_audio_id {
        lines.push(format!("audio:       {}", audio));
    }
    if let Some(file_name) = &voice.file_name {
        lines.push(format!("sample:      {}", file_name));
    }
    if let Some(secs) = voice.duration_secs {
        lines.push(format!("duration:    {}", format_timestamp(secs)));
    }
    if let Some(text) = &voice.transcription {
        lines.push(format!("transcript:  \"{}\"", text));
    }
    lines.join("\n")
}

pub fn format_health(health: &HealthResponse) -> String {
    let engine = |e: &EngineStatus| {
        format!("{} ({})", e.model, if e.ready { "ready" } else { "not ready" })
    };
    format!(
        "status:      {}\nversion:     {}\nvoices:      {}\nassets:      {}\ntranscriber: {}\nsynthesizer: {}",
        health.status,
        health.version,
        health.voices,
        health.assets,
        engine(&health.transcriber),
        engine(&health.synthesizer)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::Segment;
    use crate::voices::{VoiceCatalog, VoiceSample};

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00.000");
        assert_eq!(format_timestamp(2.5), "0:02.500");
        assert_eq!(format_timestamp(75.25), "1:15.250");
        assert_eq!(format_timestamp(-1.0), "0:00.000");
    }

    #[test]
    fn test_format_transcript() {
        let transcript = TranscribeResponse {
            success: true,
            text: "Hello world".to_string(),
            language: "en".to_string(),
            segments: vec![
                Segment {
                    id: 0,
                    start: 0.0,
                    end: 1.0,
                    text: "Hello".to_string(),
                },
                Segment {
                    id: 1,
                    start: 1.0,
                    end: 2.0,
                    text: " world".to_string(),
                },
            ],
            audio_id: "audio-1".to_string(),
        };
        assert_eq!(
            format_transcript(&transcript),
            "[0:00.000 -> 0:01.000] Hello\n[0:01.000 -> 0:02.000] world\nHello world"
        );
    }

    #[test]
    fn test_format_voice_list_aligns_ids() {
        let voices = VoiceCatalog::with_builtins().list();
        let text = format_voice_list(&voices);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "rdj-1             Robert Downey Jr.  (celebrity)");
        assert!(lines[2].starts_with("wizard-1          Wise Wizard"));
        assert_eq!(format_voice_list(&[]), "");
    }

    #[test]
    fn test_format_voice() {
        let voice = VoiceCatalog::with_builtins().get("wizard-1").unwrap();
        let text = format_voice(&voice);
        assert!(text.contains("name:        Wise Wizard"));
        assert!(text.contains("preview:     \"Magic is not just"));
        assert!(!text.contains("audio:"));
        assert!(!text.contains("sample:"));
    }

    #[test]
    fn test_format_custom_voice_shows_sample() {
        let catalog = VoiceCatalog::with_builtins();
        let voice = catalog.register_custom(
            Some("Me"),
            VoiceSample {
                audio_id: "audio-1".to_string(),
                file_name: Some("me.wav".to_string()),
                duration_secs: Some(1.5),
                transcription: Some("hello there".to_string()),
            },
        );
        let text = format_voice(&voice);
        assert!(text.contains("sample:      me.wav"));
        assert!(text.contains("duration:    0:01.500"));
        assert!(text.contains("transcript:  \"hello there\""));
    }

    #[test]
    fn test_format_health_lists_engines() {
        let health = HealthResponse {
            status: "degraded".to_string(),
            version: "0.1.0".to_string(),
            voices: 4,
            assets: 7,
            transcriber: EngineStatus {
                model: "scripted".to_string(),
                ready: true,
            },
            synthesizer: EngineStatus {
                model: "tone".to_string(),
                ready: false,
            },
        };
        let text = format_health(&health);
        assert!(text.starts_with("status:      degraded"));
        assert!(text.contains("transcriber: scripted (ready)"));
        assert!(text.contains("synthesizer: tone (not ready)"));
    }
}
