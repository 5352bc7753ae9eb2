//! Default configuration constants for voxshift.
//!
//! Shared between the config types, the engines and the CLI so the values
//! only live in one place.

/// Default address the HTTP server binds to.
pub const BIND_ADDR: &str = "127.0.0.1:8000";

/// Default URL the CLI client talks to.
pub const SERVER_URL: &str = "http://127.0.0.1:8000";

/// Largest accepted audio upload, in bytes (25 MiB).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Extra room granted to the HTTP body limit for multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Language reported for transcripts unless configured otherwise.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Script returned by the placeholder transcription engine.
pub const TRANSCRIPT_SCRIPT: &str =
    "This is a sample transcription that would normally come from Whisper API.";

/// Number of segments the script is split into.
pub const SEGMENT_COUNT: usize = 3;

/// Segment length used when the audio duration cannot be decoded.
pub const FALLBACK_SEGMENT_SECS: f64 = 2.5;

/// Character budget for a single synthesis request.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Sample rate of synthesized audio in Hz.
pub const SYNTHESIS_SAMPLE_RATE: u32 = 16000;

/// Engine call timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Mime type used when nothing better is known.
pub const GENERIC_MIME: &str = "application/octet-stream";

/// Name of the multipart field carrying audio bytes.
pub const AUDIO_FIELD: &str = "audio";

/// Page size for `/voices` when no `limit` is given.
pub const VOICE_PAGE_LIMIT: usize = 100;
