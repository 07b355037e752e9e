//! Plugins compiled into the binary

use super::{PluginFactory, PluginInfo, PluginRegistry};
use crate::audio::{SnrVad, StaticAudioEngine};
use crate::brain::handlers::{ClockHandler, ShutdownHandler};
use crate::speech::tts::{EspeakConfig, EspeakTts};
use crate::speech::SpeechToText;
use crate::Result;

/// Audio engine written into freshly generated profiles
#[cfg(feature = "audio-io")]
pub const DEFAULT_AUDIO_ENGINE: &str = "cpal";
#[cfg(not(feature = "audio-io"))]
pub const DEFAULT_AUDIO_ENGINE: &str = NULL_AUDIO_SLUG;

/// Audio engine with one silent device
pub const NULL_AUDIO_SLUG: &str = "null";

/// STT engine written into freshly generated profiles
#[cfg(feature = "whisper")]
pub const DEFAULT_STT_ENGINE: &str = "whisper";
#[cfg(not(feature = "whisper"))]
pub const DEFAULT_STT_ENGINE: &str = "null-stt";

pub const ESPEAK_TTS_SLUG: &str = "espeak-tts";
pub const SNR_VAD_SLUG: &str = "snr_vad";

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Recognizer that never hears anything, for text and batch sessions
struct NullStt {
    sample_rate: u32,
}

impl SpeechToText for NullStt {
    fn transcribe(&mut self, _samples: &[f32]) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    fn set_volume_normalization(&mut self, _level: f32) {}
}

impl PluginRegistry {
    /// A registry holding every built-in plugin
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }
}

pub fn register_builtins(registry: &mut PluginRegistry) {
    #[cfg(feature = "audio-io")]
    registry.register(
        PluginInfo::new("cpal", "CPAL", VERSION, "System audio through cpal"),
        PluginFactory::audio_engine(|_, _| Ok(Box::new(crate::audio::CpalEngine::new()))),
    );
    registry.register(
        PluginInfo::new(NULL_AUDIO_SLUG, "Null audio", VERSION, "Silent full-duplex device"),
        PluginFactory::audio_engine(|_, _| Ok(Box::new(StaticAudioEngine::null()))),
    );

    #[cfg(feature = "whisper")]
    registry.register(
        PluginInfo::new("whisper", "Whisper", VERSION, "Offline speech recognition with whisper.cpp"),
        PluginFactory::stt(|role, phrases, _, profile| {
            let config = crate::speech::stt::WhisperConfig::from_profile(profile);
            Ok(Box::new(crate::speech::WhisperStt::new(role, phrases, config)?))
        }),
    );
    registry.register(
        PluginInfo::new("null-stt", "Null STT", VERSION, "Recognizer that returns no text"),
        PluginFactory::stt(|_, _, _, _| Ok(Box::new(NullStt { sample_rate: 16000 }))),
    );

    registry.register(
        PluginInfo::new(ESPEAK_TTS_SLUG, "eSpeak", VERSION, "Speech synthesis with espeak"),
        PluginFactory::tts(|_, profile| {
            Ok(Box::new(EspeakTts::new(EspeakConfig::from_profile(profile))?))
        }),
    );

    registry.register(
        PluginInfo::new(SNR_VAD_SLUG, "SNR VAD", VERSION, "Signal-to-noise voice detection"),
        PluginFactory::vad(|_, input, profile| Ok(Box::new(SnrVad::from_profile(input, profile)))),
    );
    #[cfg(feature = "silero")]
    registry.register(
        PluginInfo::new("silero_vad", "Silero VAD", VERSION, "Neural voice detection"),
        PluginFactory::vad(|_, input, profile| {
            let threshold = profile.get_or(&["silero_vad", "threshold"], 0.5f32);
            Ok(Box::new(crate::audio::vad::SileroVad::new(
                input.params.sample_rate,
                threshold,
            )?))
        }),
    );

    registry.register(
        PluginInfo::new("clock", "Clock", VERSION, "Tells the current time"),
        PluginFactory::speech_handler(|_, _| Ok(Box::new(ClockHandler::new()))),
    );
    registry.register(
        PluginInfo::new("shutdown", "Shutdown", VERSION, "Ends the conversation"),
        PluginFactory::speech_handler(|_, profile| {
            Ok(Box::new(ShutdownHandler::from_profile(profile)))
        }),
    );
}
