//! Voice catalog: built-in presets and uploaded custom voices.

pub mod catalog;

pub use catalog::{PRESETS, VoiceCatalog, VoiceCategory, VoicePreset, VoiceSample};
