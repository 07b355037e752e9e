//! Text-to-speech through the `espeak` command line synthesizer

use super::{SynthesizedAudio, TextToSpeech};
use crate::audio::wav::read_wav_mono;
use crate::profile::Profile;
use crate::{ParleyError, Result};
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

static UTTERANCE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Configuration for the espeak engine
#[derive(Clone, Debug, PartialEq)]
pub struct EspeakConfig {
    /// Path or name of the espeak binary
    pub binary: String,

    /// Voice name, e.g. `en-us`
    pub voice: String,

    /// Speaking rate in words per minute
    pub words_per_minute: u32,

    /// Pitch adjustment, 0-99
    pub pitch_adjustment: u32,
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            binary: "espeak".to_string(),
            voice: "default".to_string(),
            words_per_minute: 160,
            pitch_adjustment: 40,
        }
    }
}

impl EspeakConfig {
    /// Read the `[espeak-tts]` section, defaulting the voice from the language
    pub fn from_profile(profile: &Profile) -> Self {
        let defaults = Self::default();
        let language_voice = profile
            .get_str(&["language"])
            .map(|l| l.to_ascii_lowercase())
            .unwrap_or(defaults.voice);
        Self {
            binary: profile.get_or(&["espeak-tts", "binary"], defaults.binary),
            voice: profile.get_or(&["espeak-tts", "voice"], language_voice),
            words_per_minute: profile
                .get_or(&["espeak-tts", "words_per_minute"], defaults.words_per_minute),
            pitch_adjustment: profile
                .get_or(&["espeak-tts", "pitch_adjustment"], defaults.pitch_adjustment),
        }
    }
}

pub struct EspeakTts {
    config: EspeakConfig,
}

impl EspeakTts {
    /// Create the engine, checking the binary can be run
    pub fn new(config: EspeakConfig) -> Result<Self> {
        let status = Command::new(&config.binary)
            .arg("--version")
            .output()
            .map_err(|e| ParleyError::Tts(format!("Cannot run '{}': {}", config.binary, e)))?;
        debug!(
            "Found espeak: {}",
            String::from_utf8_lossy(&status.stdout).trim()
        );
        Ok(Self { config })
    }

    fn scratch_path() -> PathBuf {
        let n = UTTERANCE_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("parley-espeak-{}-{}.wav", std::process::id(), n))
    }
}

impl TextToSpeech for EspeakTts {
    fn synthesize(&mut self, text: &str) -> Result<SynthesizedAudio> {
        let path = Self::scratch_path();
        let output = Command::new(&self.config.binary)
            .arg("-v")
            .arg(&self.config.voice)
            .arg("-p")
            .arg(self.config.pitch_adjustment.to_string())
            .arg("-s")
            .arg(self.config.words_per_minute.to_string())
            .arg("-w")
            .arg(&path)
            .arg(text)
            .output()
            .map_err(|e| ParleyError::Tts(format!("Failed to run espeak: {}", e)))?;

        if !output.status.success() {
            let _ = std::fs::remove_file(&path);
            return Err(ParleyError::Tts(format!(
                "espeak exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let decoded = read_wav_mono(&path);
        let _ = std::fs::remove_file(&path);
        let (samples, sample_rate) = decoded?;
        debug!("Synthesized {} samples at {} Hz", samples.len(), sample_rate);

        Ok(SynthesizedAudio {
            samples,
            sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_profile() {
        let profile = Profile::from_toml_str(
            "language = \"fr-FR\"\n[espeak-tts]\nwords_per_minute = 120\n",
        )
        .unwrap();
        let config = EspeakConfig::from_profile(&profile);
        assert_eq!(config.voice, "fr-fr");
        assert_eq!(config.words_per_minute, 120);
        assert_eq!(config.pitch_adjustment, 40);
        assert_eq!(config.binary, "espeak");
    }

    #[test]
    fn test_explicit_voice_wins() {
        let profile =
            Profile::from_toml_str("language = \"en-US\"\n[espeak-tts]\nvoice = \"mb-en1\"\n")
                .unwrap();
        assert_eq!(EspeakConfig::from_profile(&profile).voice, "mb-en1");
    }

    #[test]
    fn test_missing_binary_fails() {
        let config = EspeakConfig {
            binary: "/nonexistent/espeak".to_string(),
            ..EspeakConfig::default()
        };
        assert!(matches!(EspeakTts::new(config), Err(ParleyError::Tts(_))));
    }

    #[test]
    fn test_synthesize() {
        // Only runs where espeak is installed
        if let Ok(mut tts) = EspeakTts::new(EspeakConfig::default()) {
            if let Ok(audio) = tts.synthesize("hello") {
                assert!(audio.sample_rate > 0);
                assert!(!audio.samples.is_empty());
            }
        }
    }
}
