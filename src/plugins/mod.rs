//! Plugin descriptors and the catalog interface
//!
//! Every plugin belongs to one category and carries a typed factory for that
//! category's interface, so a descriptor can only ever produce the kind of
//! engine it was registered as.

pub mod builtin;
mod registry;

pub use registry::PluginRegistry;

use crate::audio::vad::VoiceActivityDetector;
use crate::audio::{AudioEngine, InputDevice};
use crate::brain::SpeechHandler;
use crate::profile::Profile;
use crate::speech::{SpeechToText, SttRole, TextToSpeech};
use crate::{ParleyError, Result};
use std::fmt;
use std::sync::Arc;

/// Plugin categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginCategory {
    AudioEngine,
    Stt,
    Tts,
    Vad,
    SpeechHandler,
}

impl PluginCategory {
    pub const ALL: [PluginCategory; 5] = [
        PluginCategory::AudioEngine,
        PluginCategory::Stt,
        PluginCategory::Tts,
        PluginCategory::Vad,
        PluginCategory::SpeechHandler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginCategory::AudioEngine => "audioengine",
            PluginCategory::Stt => "stt",
            PluginCategory::Tts => "tts",
            PluginCategory::Vad => "vad",
            PluginCategory::SpeechHandler => "speechhandler",
        }
    }
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and metadata of a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub slug: String,
    pub name: String,
    pub version: String,
    pub description: String,
}

impl PluginInfo {
    pub fn new(slug: &str, name: &str, version: &str, description: &str) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            description: description.to_string(),
        }
    }
}

pub type AudioEngineFactory =
    Arc<dyn Fn(&PluginInfo, &Profile) -> Result<Box<dyn AudioEngine>> + Send + Sync>;
pub type SttFactory = Arc<
    dyn Fn(SttRole, &[String], &PluginInfo, &Profile) -> Result<Box<dyn SpeechToText>>
        + Send
        + Sync,
>;
pub type TtsFactory =
    Arc<dyn Fn(&PluginInfo, &Profile) -> Result<Box<dyn TextToSpeech>> + Send + Sync>;
pub type VadFactory = Arc<
    dyn Fn(&PluginInfo, &InputDevice, &Profile) -> Result<Box<dyn VoiceActivityDetector>>
        + Send
        + Sync,
>;
pub type HandlerFactory =
    Arc<dyn Fn(&PluginInfo, &Profile) -> Result<Box<dyn SpeechHandler>> + Send + Sync>;

/// Category-typed instantiation factory
#[derive(Clone)]
pub enum PluginFactory {
    AudioEngine(AudioEngineFactory),
    Stt(SttFactory),
    Tts(TtsFactory),
    Vad(VadFactory),
    SpeechHandler(HandlerFactory),
}

impl PluginFactory {
    pub fn audio_engine<F>(f: F) -> Self
    where
        F: Fn(&PluginInfo, &Profile) -> Result<Box<dyn AudioEngine>> + Send + Sync + 'static,
    {
        PluginFactory::AudioEngine(Arc::new(f))
    }

    pub fn stt<F>(f: F) -> Self
    where
        F: Fn(SttRole, &[String], &PluginInfo, &Profile) -> Result<Box<dyn SpeechToText>>
            + Send
            + Sync
            + 'static,
    {
        PluginFactory::Stt(Arc::new(f))
    }

    pub fn tts<F>(f: F) -> Self
    where
        F: Fn(&PluginInfo, &Profile) -> Result<Box<dyn TextToSpeech>> + Send + Sync + 'static,
    {
        PluginFactory::Tts(Arc::new(f))
    }

    pub fn vad<F>(f: F) -> Self
    where
        F: Fn(&PluginInfo, &InputDevice, &Profile) -> Result<Box<dyn VoiceActivityDetector>>
            + Send
            + Sync
            + 'static,
    {
        PluginFactory::Vad(Arc::new(f))
    }

    pub fn speech_handler<F>(f: F) -> Self
    where
        F: Fn(&PluginInfo, &Profile) -> Result<Box<dyn SpeechHandler>> + Send + Sync + 'static,
    {
        PluginFactory::SpeechHandler(Arc::new(f))
    }

    pub fn category(&self) -> PluginCategory {
        match self {
            PluginFactory::AudioEngine(_) => PluginCategory::AudioEngine,
            PluginFactory::Stt(_) => PluginCategory::Stt,
            PluginFactory::Tts(_) => PluginCategory::Tts,
            PluginFactory::Vad(_) => PluginCategory::Vad,
            PluginFactory::SpeechHandler(_) => PluginCategory::SpeechHandler,
        }
    }
}

/// A registered plugin: metadata plus its factory
pub struct PluginDescriptor {
    pub info: PluginInfo,
    factory: PluginFactory,
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("category", &self.category())
            .field("info", &self.info)
            .finish()
    }
}

impl PluginDescriptor {
    pub fn new(info: PluginInfo, factory: PluginFactory) -> Self {
        Self { info, factory }
    }

    pub fn category(&self) -> PluginCategory {
        self.factory.category()
    }

    pub fn slug(&self) -> &str {
        &self.info.slug
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    fn mismatch(&self, wanted: PluginCategory) -> ParleyError {
        ParleyError::PluginNotFound {
            category: wanted,
            slug: self.info.slug.clone(),
            available: Vec::new(),
        }
    }

    pub fn create_audio_engine(&self, profile: &Profile) -> Result<Box<dyn AudioEngine>> {
        match &self.factory {
            PluginFactory::AudioEngine(f) => f(&self.info, profile),
            _ => Err(self.mismatch(PluginCategory::AudioEngine)),
        }
    }

    pub fn create_stt(
        &self,
        role: SttRole,
        phrases: &[String],
        profile: &Profile,
    ) -> Result<Box<dyn SpeechToText>> {
        match &self.factory {
            PluginFactory::Stt(f) => f(role, phrases, &self.info, profile),
            _ => Err(self.mismatch(PluginCategory::Stt)),
        }
    }

    pub fn create_tts(&self, profile: &Profile) -> Result<Box<dyn TextToSpeech>> {
        match &self.factory {
            PluginFactory::Tts(f) => f(&self.info, profile),
            _ => Err(self.mismatch(PluginCategory::Tts)),
        }
    }

    pub fn create_vad(
        &self,
        input: &InputDevice,
        profile: &Profile,
    ) -> Result<Box<dyn VoiceActivityDetector>> {
        match &self.factory {
            PluginFactory::Vad(f) => f(&self.info, input, profile),
            _ => Err(self.mismatch(PluginCategory::Vad)),
        }
    }

    pub fn create_handler(&self, profile: &Profile) -> Result<Box<dyn SpeechHandler>> {
        match &self.factory {
            PluginFactory::SpeechHandler(f) => f(&self.info, profile),
            _ => Err(self.mismatch(PluginCategory::SpeechHandler)),
        }
    }
}

/// Source of plugin descriptors
pub trait PluginCatalog {
    /// Find one plugin, failing with `PluginNotFound` listing the alternatives
    fn lookup(&self, slug: &str, category: PluginCategory) -> Result<Arc<PluginDescriptor>>;

    /// Every plugin of one category, in slug order
    fn list(&self, category: PluginCategory) -> Vec<Arc<PluginDescriptor>>;

    /// Every plugin of every category
    fn all(&self) -> Vec<Arc<PluginDescriptor>> {
        PluginCategory::ALL
            .iter()
            .flat_map(|c| self.list(*c))
            .collect()
    }
}
