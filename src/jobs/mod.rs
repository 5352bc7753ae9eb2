//! Job orchestration: transcription requests and synthesis jobs.

pub mod orchestrator;
pub mod types;

pub use orchestrator::JobOrchestrator;
pub use types::{JobStatus, SynthesisJob};
