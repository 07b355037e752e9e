//! Binding plugins to runtime roles

use crate::audio::vad::VoiceActivityDetector;
use crate::audio::{AudioEngine, InputDevice};
use crate::plugins::{PluginCatalog, PluginCategory, PluginDescriptor};
use crate::profile::Profile;
use crate::speech::{SpeechToText, SttRole, TextToSpeech};
use crate::{ParleyError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// The singleton roles a runtime fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineRole {
    AudioEngine,
    Vad,
    ActiveStt,
    PassiveStt,
    Tts,
}

impl EngineRole {
    pub fn category(&self) -> PluginCategory {
        match self {
            EngineRole::AudioEngine => PluginCategory::AudioEngine,
            EngineRole::Vad => PluginCategory::Vad,
            EngineRole::ActiveStt | EngineRole::PassiveStt => PluginCategory::Stt,
            EngineRole::Tts => PluginCategory::Tts,
        }
    }
}

impl fmt::Display for EngineRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineRole::AudioEngine => "audio engine",
            EngineRole::Vad => "VAD",
            EngineRole::ActiveStt => "active STT",
            EngineRole::PassiveStt => "passive STT",
            EngineRole::Tts => "TTS",
        };
        f.write_str(name)
    }
}

/// Post-construction adjustments for a recognizer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SttOverrides {
    pub sample_rate: Option<u32>,
    pub volume_normalization: Option<f32>,
}

impl SttOverrides {
    /// Read `<role>.samplerate` and `<role>.volume_normalization`
    pub fn from_profile(profile: &Profile, role: SttRole) -> Result<Self> {
        let section = role.profile_section();
        Ok(Self {
            sample_rate: profile.get_opt(&[section, "samplerate"])?,
            volume_normalization: profile.get_opt(&[section, "volume_normalization"])?,
        })
    }

    pub fn apply(&self, stt: &mut dyn SpeechToText) {
        if let Some(rate) = self.sample_rate {
            debug!("Overriding STT sample rate: {} Hz", rate);
            stt.set_sample_rate(rate);
        }
        if let Some(level) = self.volume_normalization {
            debug!("Overriding STT volume normalization: {}", level);
            stt.set_volume_normalization(level);
        }
    }
}

/// A role filled by a plugin instance
pub struct EngineBinding<T: ?Sized> {
    pub role: EngineRole,
    pub descriptor: Arc<PluginDescriptor>,
    pub instance: Box<T>,
    pub overrides: SttOverrides,
}

impl<T: ?Sized> EngineBinding<T> {
    pub fn slug(&self) -> &str {
        self.descriptor.slug()
    }
}

impl<T: ?Sized> fmt::Debug for EngineBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBinding")
            .field("role", &self.role)
            .field("slug", &self.slug())
            .field("overrides", &self.overrides)
            .finish()
    }
}

fn instantiate<T: ?Sized>(
    role: EngineRole,
    descriptor: Arc<PluginDescriptor>,
    create: impl FnOnce(&PluginDescriptor) -> Result<Box<T>>,
) -> Result<EngineBinding<T>> {
    let instance = create(&descriptor).map_err(|e| {
        error!("Failed to initialize {} '{}': {}", role, descriptor.slug(), e);
        ParleyError::PluginInit {
            category: role.category(),
            slug: descriptor.slug().to_string(),
            source: Box::new(e),
        }
    })?;
    info!("Initialized {} '{}' ({})", role, descriptor.slug(), descriptor.name());
    Ok(EngineBinding {
        role,
        descriptor,
        instance,
        overrides: SttOverrides::default(),
    })
}

pub fn bind_audio_engine(
    catalog: &dyn PluginCatalog,
    slug: &str,
    profile: &Profile,
) -> Result<EngineBinding<dyn AudioEngine>> {
    let descriptor = catalog.lookup(slug, PluginCategory::AudioEngine)?;
    instantiate(EngineRole::AudioEngine, descriptor, |d| {
        d.create_audio_engine(profile)
    })
}

pub fn bind_vad(
    catalog: &dyn PluginCatalog,
    slug: &str,
    input: &InputDevice,
    profile: &Profile,
) -> Result<EngineBinding<dyn VoiceActivityDetector>> {
    let descriptor = catalog.lookup(slug, PluginCategory::Vad)?;
    instantiate(EngineRole::Vad, descriptor, |d| d.create_vad(input, profile))
}

fn bind_stt(
    role: EngineRole,
    stt_role: SttRole,
    descriptor: Arc<PluginDescriptor>,
    phrases: &[String],
    profile: &Profile,
) -> Result<EngineBinding<dyn SpeechToText>> {
    let overrides = SttOverrides::from_profile(profile, stt_role)?;
    let mut binding = instantiate(role, descriptor, |d| {
        d.create_stt(stt_role, phrases, profile)
    })?;
    overrides.apply(binding.instance.as_mut());
    binding.overrides = overrides;
    Ok(binding)
}

/// Active recognizer, primed with the handlers' phrases
pub fn bind_active_stt(
    catalog: &dyn PluginCatalog,
    slug: &str,
    phrases: &[String],
    profile: &Profile,
) -> Result<EngineBinding<dyn SpeechToText>> {
    let descriptor = catalog.lookup(slug, PluginCategory::Stt)?;
    bind_stt(EngineRole::ActiveStt, SttRole::Active, descriptor, phrases, profile)
}

/// Passive recognizer, primed with the standard phrases and the keyword
///
/// Reuses the active binding's descriptor when both roles name the same
/// plugin. The instance is always a fresh one.
pub fn bind_passive_stt(
    catalog: &dyn PluginCatalog,
    slug: &str,
    active: &EngineBinding<dyn SpeechToText>,
    phrases: &[String],
    profile: &Profile,
) -> Result<EngineBinding<dyn SpeechToText>> {
    let descriptor = if slug == active.slug() {
        debug!("Passive STT shares the '{}' plugin", slug);
        Arc::clone(&active.descriptor)
    } else {
        catalog.lookup(slug, PluginCategory::Stt)?
    };
    bind_stt(EngineRole::PassiveStt, SttRole::Passive, descriptor, phrases, profile)
}

pub fn bind_tts(
    catalog: &dyn PluginCatalog,
    slug: &str,
    profile: &Profile,
) -> Result<EngineBinding<dyn TextToSpeech>> {
    let descriptor = catalog.lookup(slug, PluginCategory::Tts)?;
    instantiate(EngineRole::Tts, descriptor, |d| d.create_tts(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{PluginFactory, PluginInfo, PluginRegistry};
    use parking_lot::Mutex;

    struct Probe {
        rate: u32,
        level: Option<f32>,
    }

    impl SpeechToText for Probe {
        fn transcribe(&mut self, _samples: &[f32]) -> Result<Vec<String>> {
            Ok(vec![format!("{}:{:?}", self.rate, self.level)])
        }

        fn sample_rate(&self) -> u32 {
            self.rate
        }

        fn set_sample_rate(&mut self, rate: u32) {
            self.rate = rate;
        }

        fn set_volume_normalization(&mut self, level: f32) {
            self.level = Some(level);
        }
    }

    fn registry(calls: Arc<Mutex<Vec<(SttRole, Vec<String>)>>>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register(
            PluginInfo::new("probe", "Probe", "1.0", ""),
            PluginFactory::stt(move |role, phrases, _, _| {
                calls.lock().push((role, phrases.to_vec()));
                Ok(Box::new(Probe { rate: 16000, level: None }))
            }),
        );
        registry.register(
            PluginInfo::new("broken", "Broken", "1.0", ""),
            PluginFactory::stt(|_, _, _, _| Err(ParleyError::Transcription("no model".into()))),
        );
        registry
    }

    #[test]
    fn test_overrides_applied() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(Arc::clone(&calls));
        let profile = Profile::from_toml_str(
            "[active_stt]\nsamplerate = 8000\nvolume_normalization = 0.5\n",
        )
        .unwrap();

        let mut active = bind_active_stt(&registry, "probe", &["TIME".into()], &profile).unwrap();
        assert_eq!(active.instance.sample_rate(), 8000);
        assert_eq!(active.instance.transcribe(&[]).unwrap(), vec!["8000:Some(0.5)".to_string()]);
        assert_eq!(calls.lock()[0], (SttRole::Active, vec!["TIME".to_string()]));
    }

    #[test]
    fn test_bad_override_is_invalid_value() {
        let registry = registry(Arc::new(Mutex::new(Vec::new())));
        let profile = Profile::from_toml_str("[passive_stt]\nsamplerate = \"fast\"\n").unwrap();
        let active = bind_active_stt(&registry, "probe", &[], &profile).unwrap();
        let err = bind_passive_stt(&registry, "probe", &active, &[], &profile).unwrap_err();
        assert!(matches!(err, ParleyError::InvalidValue { ref key, .. } if key == "passive_stt.samplerate"));
    }

    #[test]
    fn test_passive_shares_descriptor_not_instance() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(Arc::clone(&calls));
        let profile = Profile::default();

        let active = bind_active_stt(&registry, "probe", &["TIME".into()], &profile).unwrap();
        let passive =
            bind_passive_stt(&registry, "probe", &active, &["NAOMI".into()], &profile).unwrap();
        assert!(Arc::ptr_eq(&active.descriptor, &passive.descriptor));
        assert_eq!(calls.lock().len(), 2);
        assert_eq!(calls.lock()[1], (SttRole::Passive, vec!["NAOMI".to_string()]));
    }

    #[test]
    fn test_init_failure_is_wrapped() {
        let registry = registry(Arc::new(Mutex::new(Vec::new())));
        match bind_active_stt(&registry, "broken", &[], &Profile::default()) {
            Err(ParleyError::PluginInit { category, slug, source }) => {
                assert_eq!(category, PluginCategory::Stt);
                assert_eq!(slug, "broken");
                assert!(matches!(*source, ParleyError::Transcription(_)));
            }
            other => panic!("unexpected: {:?}", other.map(|b| b.slug().to_string())),
        }
    }

    #[test]
    fn test_unknown_slug_lists_alternatives() {
        let registry = registry(Arc::new(Mutex::new(Vec::new())));
        match bind_tts(&registry, "espeak-tts", &Profile::default()) {
            Err(ParleyError::PluginNotFound { category, available, .. }) => {
                assert_eq!(category, PluginCategory::Tts);
                assert!(available.is_empty());
            }
            other => panic!("unexpected: {:?}", other.map(|b| b.slug().to_string())),
        }
    }
}
