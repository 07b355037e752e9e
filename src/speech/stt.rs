use super::{normalize_volume, SpeechToText, SttRole};
use crate::audio::resample_audio;
use crate::profile::Profile;
use crate::{ParleyError, Result};
use std::path::PathBuf;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper models are trained on 16 kHz audio
const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Configuration for the Whisper speech-to-text engine
#[derive(Clone, Debug)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,

    /// Language to transcribe (None for auto-detection)
    pub language: Option<String>,

    /// Number of threads to use for transcription
    pub n_threads: i32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            language: Some("en".to_string()),
            n_threads: 4,
        }
    }
}

impl WhisperConfig {
    /// Read the `[whisper]` section; the language defaults to the profile's
    pub fn from_profile(profile: &Profile) -> Self {
        let defaults = Self::default();
        let language = profile
            .get_str(&["whisper", "language"])
            .or_else(|| {
                profile
                    .get_str(&["language"])
                    .and_then(|l| l.split('-').next().map(|s| s.to_ascii_lowercase()))
            })
            .or(defaults.language);
        Self {
            model_path: profile
                .get_str(&["whisper", "model_path"])
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            language,
            n_threads: profile.get_or(&["whisper", "threads"], defaults.n_threads as i64) as i32,
        }
    }
}

/// Whisper speech-to-text engine
pub struct WhisperStt {
    role: SttRole,
    config: WhisperConfig,
    context: WhisperContext,
    prompt: String,
    sample_rate: u32,
    volume_normalization: Option<f32>,
}

impl WhisperStt {
    /// Load a model for one role; the phrase set primes the decoder
    pub fn new(role: SttRole, phrases: &[String], config: WhisperConfig) -> Result<Self> {
        info!("Loading Whisper model for '{}' from: {:?}", role, config.model_path);

        if !config.model_path.exists() {
            return Err(ParleyError::Transcription(format!(
                "Model file not found: {:?}",
                config.model_path
            )));
        }

        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| ParleyError::Transcription("Invalid model path".to_string()))?;
        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| {
                ParleyError::Transcription(format!("Failed to load Whisper model: {:?}", e))
            })?;

        Ok(Self {
            role,
            config,
            context,
            prompt: phrases.join(", "),
            sample_rate: WHISPER_SAMPLE_RATE,
            volume_normalization: None,
        })
    }
}

impl SpeechToText for WhisperStt {
    fn transcribe(&mut self, samples: &[f32]) -> Result<Vec<String>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let mut audio = resample_audio(samples, self.sample_rate, WHISPER_SAMPLE_RATE)?;
        if let Some(level) = self.volume_normalization {
            normalize_volume(&mut audio, level);
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.config.n_threads);
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        if let Some(ref lang) = self.config.language {
            params.set_language(Some(lang.as_str()));
        }
        if !self.prompt.is_empty() {
            params.set_initial_prompt(&self.prompt);
        }

        let mut state = self.context.create_state().map_err(|e| {
            ParleyError::Transcription(format!("Failed to create state: {:?}", e))
        })?;
        state
            .full(params, &audio)
            .map_err(|e| ParleyError::Transcription(format!("Transcription failed: {:?}", e)))?;

        let segments = state.full_n_segments().map_err(|e| {
            ParleyError::Transcription(format!("Failed to get segments: {:?}", e))
        })?;
        let mut text = String::new();
        for i in 0..segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                ParleyError::Transcription(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment);
        }

        let text = text.trim().to_string();
        debug!("[{}] transcribed: {:?}", self.role, text);
        Ok(if text.is_empty() { Vec::new() } else { vec![text] })
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    fn set_volume_normalization(&mut self, level: f32) {
        self.volume_normalization = Some(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_profile() {
        let profile = Profile::from_toml_str(
            "language = \"de-DE\"\n[whisper]\nmodel_path = \"/models/small.bin\"\n",
        )
        .unwrap();
        let config = WhisperConfig::from_profile(&profile);
        assert_eq!(config.model_path, PathBuf::from("/models/small.bin"));
        assert_eq!(config.language.as_deref(), Some("de"));
        assert_eq!(config.n_threads, 4);
    }

    #[test]
    fn test_missing_model() {
        let config = WhisperConfig {
            model_path: PathBuf::from("/nonexistent/model.bin"),
            ..WhisperConfig::default()
        };
        assert!(WhisperStt::new(SttRole::Active, &[], config).is_err());
    }
}
