//! Audio container detection and WAV handling.

pub mod format;
pub mod wav;

pub use format::AudioFormat;
