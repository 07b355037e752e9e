//! Command dispatch
//!
//! The dispatcher owns the loaded speech handlers and exposes the phrase sets
//! the recognizers are built from.

pub mod handlers;
mod loader;

pub use loader::{load_speech_handlers, validate_command_surface};

use crate::mic::InputChannel;
use crate::profile::Profile;
use crate::Result;
use tracing::warn;

/// What the conversation should do after a handler ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Continue,
    Stop,
}

/// A plugin that responds to spoken commands
pub trait SpeechHandler {
    /// Phrases this handler wants the active recognizer to know
    fn phrases(&self) -> Vec<String>;

    /// Whether this handler should answer `text`
    fn is_valid(&self, text: &str) -> bool {
        let text = text.to_uppercase();
        self.phrases()
            .iter()
            .any(|p| !p.is_empty() && text.contains(&p.to_uppercase()))
    }

    /// Higher priorities are asked first
    fn priority(&self) -> i32 {
        0
    }

    fn handle(&mut self, text: &str, mic: &mut dyn InputChannel) -> Result<HandlerOutcome>;
}

const STANDARD_PHRASES_EN: &[&str] = &[
    "YES", "NO", "CANCEL", "STOP", "REPEAT", "HELP", "THANK YOU", "PLEASE", "WHAT", "OKAY",
];
const STANDARD_PHRASES_DE: &[&str] = &[
    "JA", "NEIN", "ABBRECHEN", "STOPP", "WIEDERHOLEN", "HILFE", "DANKE", "BITTE", "WAS",
];
const STANDARD_PHRASES_FR: &[&str] = &[
    "OUI", "NON", "ANNULER", "ARRÊTE", "RÉPÈTE", "AIDE", "MERCI", "S'IL TE PLAÎT", "QUOI",
];

/// Always-listened-for phrases for a language
///
/// A `standard_phrases` list in the profile replaces the built-in set.
pub fn standard_phrases(profile: &Profile, language: &str) -> Vec<String> {
    match profile.get_opt::<Vec<String>>(&["standard_phrases"]) {
        Ok(Some(custom)) => return custom,
        Ok(None) => {}
        Err(e) => warn!("{}, using the built-in standard phrases", e),
    }
    let builtin = match language.split('-').next().unwrap_or_default() {
        "en" => STANDARD_PHRASES_EN,
        "de" => STANDARD_PHRASES_DE,
        "fr" => STANDARD_PHRASES_FR,
        _ => {
            warn!(
                "No standard phrases for language '{}', using en-US",
                language
            );
            STANDARD_PHRASES_EN
        }
    };
    builtin.iter().map(|p| p.to_string()).collect()
}

fn sorted_unique(mut phrases: Vec<String>) -> Vec<String> {
    phrases.retain(|p| !p.trim().is_empty());
    phrases.sort();
    phrases.dedup();
    phrases
}

/// Routes transcriptions to speech handlers
pub struct Dispatcher {
    handlers: Vec<Box<dyn SpeechHandler>>,
    standard_phrases: Vec<String>,
}

impl Dispatcher {
    pub fn new(standard_phrases: Vec<String>) -> Self {
        Self {
            handlers: Vec::new(),
            standard_phrases: sorted_unique(standard_phrases),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn SpeechHandler>) {
        self.handlers.push(handler);
        // Stable sort keeps load order among equal priorities
        self.handlers.sort_by_key(|h| std::cmp::Reverse(h.priority()));
    }

    pub fn handlers(&self) -> &[Box<dyn SpeechHandler>] {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Union of every loaded handler's phrases
    pub fn plugin_phrases(&self) -> Vec<String> {
        sorted_unique(self.handlers.iter().flat_map(|h| h.phrases()).collect())
    }

    pub fn standard_phrases(&self) -> &[String] {
        &self.standard_phrases
    }

    /// Standard and handler phrases together
    pub fn all_phrases(&self) -> Vec<String> {
        let mut phrases = self.standard_phrases.clone();
        phrases.extend(self.plugin_phrases());
        sorted_unique(phrases)
    }

    /// Find the first handler, by priority, that accepts one of the texts
    pub fn query(&self, texts: &[String]) -> Option<(usize, String)> {
        self.handlers.iter().enumerate().find_map(|(i, handler)| {
            texts
                .iter()
                .find(|t| handler.is_valid(t))
                .map(|t| (i, t.clone()))
        })
    }

    pub fn handler_mut(&mut self, index: usize) -> Option<&mut Box<dyn SpeechHandler>> {
        self.handlers.get_mut(index)
    }
}
