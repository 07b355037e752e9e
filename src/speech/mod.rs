//! Speech engine interfaces
//!
//! This module provides:
//! - Speech-to-text (STT) interface, with a Whisper engine behind the `whisper` feature
//! - Text-to-speech (TTS) interface, with an espeak engine

#[cfg(feature = "whisper")]
pub mod stt;
pub mod tts;

#[cfg(feature = "whisper")]
pub use stt::WhisperStt;
pub use tts::EspeakTts;

use crate::Result;
use std::fmt;

/// Which recognition path an STT instance serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttRole {
    /// Command recognition after the wake word
    Active,
    /// Wake-word spotting
    Passive,
}

impl SttRole {
    /// Tag handed to STT plugins at construction
    pub fn tag(&self) -> &'static str {
        match self {
            SttRole::Active => "default",
            SttRole::Passive => "keyword",
        }
    }

    /// Profile section holding this role's settings
    pub fn profile_section(&self) -> &'static str {
        match self {
            SttRole::Active => "active_stt",
            SttRole::Passive => "passive_stt",
        }
    }
}

impl fmt::Display for SttRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Speech recognizer for one role and phrase set
pub trait SpeechToText {
    /// Transcribe mono samples recorded at [`SpeechToText::sample_rate`]
    fn transcribe(&mut self, samples: &[f32]) -> Result<Vec<String>>;

    /// Rate the engine expects its input at
    fn sample_rate(&self) -> u32;

    fn set_sample_rate(&mut self, sample_rate: u32);

    /// Target peak level applied before recognition
    fn set_volume_normalization(&mut self, level: f32);
}

/// Audio produced by a TTS engine
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Speech synthesizer
pub trait TextToSpeech {
    fn synthesize(&mut self, text: &str) -> Result<SynthesizedAudio>;
}

/// Scale samples so the loudest one reaches `level`
pub fn normalize_volume(samples: &mut [f32], level: f32) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak <= f32::EPSILON {
        return;
    }
    let gain = level.clamp(0.0, 1.0) / peak;
    for s in samples.iter_mut() {
        *s *= gain;
    }
}
