//! Engine selection
//!
//! Reads which plugin fills each role from the profile, falling back to
//! fixed defaults when the profile is silent.

use crate::profile::Profile;
use tracing::{info, warn};

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_AUDIO_ENGINE: &str = "pyaudio";
pub const DEFAULT_STT_ENGINE: &str = "sphinx";
pub const DEFAULT_TTS_ENGINE: &str = "espeak-tts";
pub const DEFAULT_VAD_ENGINE: &str = "snr_vad";
pub const DEFAULT_KEYWORD: &str = "NAOMI";

/// Which plugin fills each role, plus the conversation settings that go with them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSelection {
    pub language: String,
    pub audio_engine: String,
    pub active_stt: String,
    /// Same as `active_stt` unless configured
    pub passive_stt: String,
    pub tts: String,
    pub vad: String,
    pub keyword: String,

    /// Spoken after the wake word is heard
    pub reply: Option<String>,

    /// Spoken after a command is captured
    pub response: Option<String>,

    pub print_transcript: bool,
}

fn setting(profile: &Profile, path: &[&str], default: &str, what: &str) -> String {
    match profile.get_str(path) {
        Some(value) => value,
        None => {
            warn!(
                "{} not specified in profile, using default ({})",
                what, default
            );
            default.to_string()
        }
    }
}

impl EngineSelection {
    /// Resolve every role; `force_print_transcript` wins over the profile flag
    pub fn resolve(profile: &Profile, force_print_transcript: bool) -> Self {
        let language = setting(profile, &["language"], DEFAULT_LANGUAGE, "language");
        info!("Using language '{}'", language);

        let audio_engine = setting(profile, &["audio_engine"], DEFAULT_AUDIO_ENGINE, "audio_engine");
        info!("Using audio engine '{}'", audio_engine);

        let active_stt = setting(
            profile,
            &["active_stt", "engine"],
            DEFAULT_STT_ENGINE,
            "active_stt.engine",
        );
        info!("Using STT (speech to text) engine '{}'", active_stt);

        let reply = profile.get_str(&["active_stt", "reply"]);
        if let Some(reply) = &reply {
            info!("Using active STT voice reply '{}'", reply);
        }
        let response = profile.get_str(&["active_stt", "response"]);
        if let Some(response) = &response {
            info!("Using active STT voice response '{}'", response);
        }

        let passive_stt = profile
            .get_str(&["passive_stt", "engine"])
            .unwrap_or_else(|| active_stt.clone());
        info!("Using passive STT engine '{}'", passive_stt);

        let tts = setting(profile, &["tts_engine"], DEFAULT_TTS_ENGINE, "tts_engine");
        info!("Using TTS engine '{}'", tts);

        let vad = setting(profile, &["vad_engine"], DEFAULT_VAD_ENGINE, "vad_engine");
        info!("Using VAD engine '{}'", vad);

        let keyword = setting(profile, &["keyword"], DEFAULT_KEYWORD, "keyword");
        info!("Using keyword '{}'", keyword);

        let print_transcript =
            force_print_transcript || profile.get_flag(&["print_transcript"], false);

        Self {
            language,
            audio_engine,
            active_stt,
            passive_stt,
            tts,
            vad,
            keyword,
            reply,
            response,
            print_transcript,
        }
    }

    /// Whether both recognizers come from the same plugin
    pub fn shares_stt(&self) -> bool {
        self.active_stt == self.passive_stt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_uses_defaults() {
        let selection = EngineSelection::resolve(&Profile::default(), false);
        assert_eq!(selection.language, "en-US");
        assert_eq!(selection.audio_engine, "pyaudio");
        assert_eq!(selection.active_stt, "sphinx");
        assert_eq!(selection.passive_stt, "sphinx");
        assert_eq!(selection.tts, "espeak-tts");
        assert_eq!(selection.vad, "snr_vad");
        assert_eq!(selection.keyword, "NAOMI");
        assert_eq!(selection.reply, None);
        assert!(!selection.print_transcript);
        assert!(selection.shares_stt());
    }

    #[test]
    fn test_profile_values_win() {
        let profile = Profile::from_toml_str(
            r#"
language = "de-DE"
audio_engine = "cpal"
keyword = "JARVIS"
print_transcript = "yes"

[active_stt]
engine = "whisper"
reply = "Yes?"

[passive_stt]
engine = "pocketsphinx"
"#,
        )
        .unwrap();
        let selection = EngineSelection::resolve(&profile, false);
        assert_eq!(selection.language, "de-DE");
        assert_eq!(selection.audio_engine, "cpal");
        assert_eq!(selection.active_stt, "whisper");
        assert_eq!(selection.passive_stt, "pocketsphinx");
        assert_eq!(selection.keyword, "JARVIS");
        assert_eq!(selection.reply.as_deref(), Some("Yes?"));
        assert!(selection.print_transcript);
        assert!(!selection.shares_stt());
    }

    #[test]
    fn test_print_transcript_override() {
        let profile = Profile::from_toml_str("print_transcript = false\n").unwrap();
        assert!(EngineSelection::resolve(&profile, true).print_transcript);
    }
}
