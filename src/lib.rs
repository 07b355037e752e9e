pub mod audio;
pub mod brain;
pub mod conversation;
pub mod integration;
pub mod mic;
pub mod paths;
pub mod plugins;
pub mod profile;
pub mod speech;

use audio::DeviceCapability;
use plugins::PluginCategory;
use std::path::PathBuf;
use thiserror::Error;

pub use integration::{bootstrap, Assistant, BootstrapOptions, ResolvedRuntime, RuntimeComposer};
pub use profile::Profile;

#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    #[error("Cannot read profile '{}': {reason}", path.display())]
    ConfigUnreadable { path: PathBuf, reason: String },

    #[error("Cannot parse profile '{}' at line {line}, column {column}: {message}", path.display())]
    ConfigMalformed {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Missing profile key: {0}")]
    MissingKey(String),

    #[error("Invalid value for profile key '{key}': expected {expected}")]
    InvalidValue { key: String, expected: &'static str },

    #[error("No {category} plugin named '{slug}' (available: {})", available.join(", "))]
    PluginNotFound {
        category: PluginCategory,
        slug: String,
        available: Vec<String>,
    },

    #[error("Failed to initialize {category} plugin '{slug}': {source}")]
    PluginInit {
        category: PluginCategory,
        slug: String,
        #[source]
        source: Box<ParleyError>,
    },

    #[error("Speech handler '{name}' could not be loaded: {reason}")]
    HandlerInstantiation { name: String, reason: String },

    #[error("No plugins for handling speech found!")]
    NoHandlers,

    #[error("No command phrases found!")]
    NoPhrases,

    #[error("Audio engine reports no {0} devices")]
    NoDevices(DeviceCapability),

    #[error("Audio device with slug '{slug}' not found (valid devices: {})", available.join(", "))]
    DeviceNotFound { slug: String, available: Vec<String> },

    #[error("Audio device with slug '{slug}' is not an {capability} device (valid devices: {})", available.join(", "))]
    UnsupportedCapability {
        slug: String,
        capability: DeviceCapability,
        available: Vec<String>,
    },

    #[error("Cannot continue without a profile")]
    Aborted,

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::Io(e.to_string())
    }
}

impl ParleyError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A missing profile can be regenerated interactively
            ParleyError::ConfigUnreadable { .. } => true,
            // Only the offending handler is skipped
            ParleyError::HandlerInstantiation { .. } => true,
            // These are typically transient errors
            ParleyError::Transcription(_) => true,
            ParleyError::Tts(_) => true,
            ParleyError::AudioProcessing(_) => true,
            ParleyError::ConfigMalformed { .. }
            | ParleyError::MissingKey(_)
            | ParleyError::InvalidValue { .. }
            | ParleyError::PluginNotFound { .. }
            | ParleyError::PluginInit { .. }
            | ParleyError::NoHandlers
            | ParleyError::NoPhrases
            | ParleyError::NoDevices(_)
            | ParleyError::DeviceNotFound { .. }
            | ParleyError::UnsupportedCapability { .. }
            | ParleyError::Aborted
            | ParleyError::AudioDevice(_)
            | ParleyError::Io(_)
            | ParleyError::Channel(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::ConfigUnreadable { .. } => {
                "Your config file does not exist.".to_string()
            }
            ParleyError::ConfigMalformed { .. }
            | ParleyError::MissingKey(_)
            | ParleyError::InvalidValue { .. } => {
                "Configuration error. Please check your profile.".to_string()
            }
            ParleyError::PluginNotFound { .. } | ParleyError::PluginInit { .. } => {
                "A required plugin is unavailable. Please check your profile.".to_string()
            }
            ParleyError::HandlerInstantiation { .. } => {
                "A speech handler was skipped.".to_string()
            }
            ParleyError::NoHandlers | ParleyError::NoPhrases => {
                "Nothing to respond to. Please install speech handler plugins.".to_string()
            }
            ParleyError::NoDevices(_)
            | ParleyError::DeviceNotFound { .. }
            | ParleyError::UnsupportedCapability { .. }
            | ParleyError::AudioDevice(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            ParleyError::Aborted => "Cannot continue. Exiting.".to_string(),
            ParleyError::AudioProcessing(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            ParleyError::Transcription(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            ParleyError::Tts(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            ParleyError::Io(_) => "File system error occurred.".to_string(),
            ParleyError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found_lists_alternatives() {
        let err = ParleyError::DeviceNotFound {
            slug: "nonexistent".into(),
            available: vec!["mic0".into(), "mic1".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("nonexistent"));
        assert!(msg.contains("mic0, mic1"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_plugin_init_keeps_cause() {
        let err = ParleyError::PluginInit {
            category: PluginCategory::Tts,
            slug: "espeak-tts".into(),
            source: Box::new(ParleyError::Tts("espeak not installed".into())),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("TTS error: espeak not installed"));
    }

    #[test]
    fn test_missing_profile_is_recoverable() {
        let err = ParleyError::ConfigUnreadable {
            path: PathBuf::from("/tmp/profile.toml"),
            reason: "not found".into(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.user_message(), "Your config file does not exist.");
    }
}
