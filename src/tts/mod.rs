//! Text-to-speech: voice references, synthesizers and the synthesis engine.

pub mod engine;
pub mod reference;
pub mod synthesizer;

pub use engine::SynthesisEngine;
pub use reference::VoiceReference;
pub use synthesizer::{MockSynthesizer, Synthesizer, ToneSynthesizer, VoiceProfile, VoiceSource};
