use crate::audio::{AudioFormat, wav};
use crate::error::{Result, VoxError};
use crate::storage::StoredAudio;
use crate::voices::VoicePreset;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// A resolved voice, ready to hand to a synthesizer.
#[derive(Debug, Clone)]
pub enum VoiceSource {
    /// A built-in catalog voice.
    Preset(VoicePreset),
    /// An uploaded reference recording.
    Sample(StoredAudio),
}

impl VoiceSource {
    /// Stable label for logs.
    pub fn label(&self) -> &str {
        match self {
            VoiceSource::Preset(preset) => &preset.id,
            VoiceSource::Sample(audio) => &audio.asset.id,
        }
    }
}

/// Trait for text-to-speech synthesis.
///
/// This trait allows swapping implementations (real model vs placeholder vs mock).
/// Calls are blocking; the engine runs them on the blocking pool.
pub trait Synthesizer: Send + Sync {
    /// Render `text` in the given voice, returning a WAV payload.
    fn synthesize(&self, text: &str, voice: &VoiceSource) -> Result<Vec<u8>>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the synthesizer is ready
    fn is_ready(&self) -> bool;
}

impl<T: Synthesizer> Synthesizer for Arc<T> {
    fn synthesize(&self, text: &str, voice: &VoiceSource) -> Result<Vec<u8>> {
        (**self).synthesize(text, voice)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Pitch and loudness derived from a voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceProfile {
    pub base_hz: f32,
    pub amplitude: f32,
}

impl VoiceProfile {
    const LOW_HZ: f32 = 90.0;
    const SPAN_HZ: f32 = 240.0;

    /// Profile for a voice source.
    pub fn for_source(voice: &VoiceSource) -> Self {
        match voice {
            VoiceSource::Preset(preset) => {
                let description = preset.description.to_lowercase();
                let register = if description.contains("high-pitched") {
                    1.6
                } else if description.contains("deep") {
                    0.6
                } else {
                    1.0
                };
                Self {
                    base_hz: digest_pitch(preset.id.as_bytes()) * register,
                    amplitude: 0.3,
                }
            }
            VoiceSource::Sample(audio) => {
                let level = match AudioFormat::sniff(&audio.bytes) {
                    Some(AudioFormat::Wav) => wav::decode(&audio.bytes)
                        .map(|d| d.mean_level())
                        .unwrap_or(0.3),
                    _ => 0.3,
                };
                Self {
                    base_hz: digest_pitch(&audio.bytes),
                    amplitude: level.clamp(0.1, 0.6),
                }
            }
        }
    }
}

fn digest_pitch(seed: &[u8]) -> f32 {
    let digest = Sha256::digest(seed);
    let n = u16::from_be_bytes([digest[0], digest[1]]) as f32 / u16::MAX as f32;
    VoiceProfile::LOW_HZ + n * VoiceProfile::SPAN_HZ
}

/// Placeholder synthesizer: one enveloped tone per word.
///
/// Output is deterministic for a given text and voice.
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    sample_rate: u32,
}

impl ToneSynthesizer {
    const GAP_MS: u32 = 40;
    const PAUSE_MS: u32 = 150;
    const RAMP_MS: u32 = 5;

    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    fn samples_for_ms(&self, ms: u32) -> usize {
        (self.sample_rate as u64 * ms as u64 / 1000) as usize
    }

    fn render_word(&self, word: &str, profile: VoiceProfile, out: &mut Vec<i16>) {
        let chars = word.chars().count() as u32;
        let len = self.samples_for_ms((60 + 25 * chars).min(400));
        let step = word.bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32)) % 5;
        let freq = profile.base_hz * (1.0 + step as f32 * 0.06);
        let ramp = self.samples_for_ms(Self::RAMP_MS).max(1);
        let peak = profile.amplitude * i16::MAX as f32;

        for i in 0..len {
            let t = i as f32 / self.sample_rate as f32;
            let envelope = (i.min(len - 1 - i).min(ramp) as f32) / ramp as f32;
            let value = (2.0 * std::f32::consts::PI * freq * t).sin() * peak * envelope;
            out.push(value as i16);
        }

        let mut silence = self.samples_for_ms(Self::GAP_MS);
        if word.ends_with(['.', '!', '?', ',', ';', ':']) {
            silence += self.samples_for_ms(Self::PAUSE_MS);
        }
        out.extend(std::iter::repeat_n(0i16, silence));
    }
}

impl Synthesizer for ToneSynthesizer {
    fn synthesize(&self, text: &str, voice: &VoiceSource) -> Result<Vec<u8>> {
        if self.sample_rate == 0 {
            return Err(VoxError::Synthesis {
                message: "sample rate must be non-zero".to_string(),
            });
        }
        let profile = VoiceProfile::for_source(voice);
        let mut samples = Vec::new();
        for word in text.split_whitespace() {
            self.render_word(word, profile, &mut samples);
        }
        wav::encode(&samples, self.sample_rate)
    }

    fn model_name(&self) -> &str {
        "tone"
    }

    fn is_ready(&self) -> bool {
        self.sample_rate > 0
    }
}

/// Mock synthesizer for testing
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    should_fail: bool,
    delay: Option<Duration>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            should_fail: false,
            delay: None,
        }
    }

    /// Configure the mock to fail on synthesize
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Block for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer for MockSynthesizer {
    fn synthesize(&self, text: &str, _voice: &VoiceSource) -> Result<Vec<u8>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            return Err(VoxError::Synthesis {
                message: "mock synthesis failure".to_string(),
            });
        }
        wav::encode(&vec![0i16; text.chars().count()], 16000)
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
