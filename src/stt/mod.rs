//! Speech-to-text engines.

pub mod scripted;
pub mod transcriber;

pub use scripted::ScriptedTranscriber;
pub use transcriber::{MockTranscriber, Segment, Transcriber, Transcript};
