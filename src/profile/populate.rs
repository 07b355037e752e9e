//! Fresh profile generation

use super::Profile;
use crate::plugins::builtin;
use crate::{ParleyError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use toml::{Table, Value};

/// Answers collected by the profile questionnaire
#[derive(Clone, Debug, Serialize)]
pub struct PopulateAnswers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    pub keyword: String,
    pub language: String,
    pub audio_engine: String,
    pub tts_engine: String,
    pub vad_engine: String,
    pub active_stt: EngineSection,
}

#[derive(Clone, Debug, Serialize)]
pub struct EngineSection {
    pub engine: String,
}

impl Default for PopulateAnswers {
    fn default() -> Self {
        Self {
            first_name: None,
            keyword: "NAOMI".to_string(),
            language: "en-US".to_string(),
            audio_engine: builtin::DEFAULT_AUDIO_ENGINE.to_string(),
            tts_engine: builtin::ESPEAK_TTS_SLUG.to_string(),
            vad_engine: builtin::SNR_VAD_SLUG.to_string(),
            active_stt: EngineSection {
                engine: builtin::DEFAULT_STT_ENGINE.to_string(),
            },
        }
    }
}

impl PopulateAnswers {
    /// Seed answers from an existing profile, keeping its values
    pub fn from_profile(profile: &Profile) -> Self {
        let defaults = Self::default();
        Self {
            first_name: profile.get_str(&["first_name"]),
            keyword: profile.get_str(&["keyword"]).unwrap_or(defaults.keyword),
            language: profile.get_str(&["language"]).unwrap_or(defaults.language),
            audio_engine: profile
                .get_str(&["audio_engine"])
                .unwrap_or(defaults.audio_engine),
            tts_engine: profile
                .get_str(&["tts_engine"])
                .unwrap_or(defaults.tts_engine),
            vad_engine: profile
                .get_str(&["vad_engine"])
                .unwrap_or(defaults.vad_engine),
            active_stt: EngineSection {
                engine: profile
                    .get_str(&["active_stt", "engine"])
                    .unwrap_or(defaults.active_stt.engine),
            },
        }
    }

    /// The answers as a profile tree
    pub fn to_table(&self) -> Result<Table> {
        match Value::try_from(self) {
            Ok(Value::Table(table)) => Ok(table),
            Ok(_) => Err(ParleyError::Io("Profile answers are not a table".to_string())),
            Err(e) => Err(ParleyError::Io(format!("Failed to serialize profile: {}", e))),
        }
    }

    /// Apply the questionnaire keys on top of an existing profile
    ///
    /// Only `first_name`, `keyword` and `language` are asked for, so every
    /// other key of `existing` is carried over untouched.
    pub fn apply_to(&self, existing: &Profile) -> Table {
        let mut table = existing.as_table().clone();
        match &self.first_name {
            Some(name) => {
                table.insert("first_name".to_string(), Value::String(name.clone()));
            }
            None => {
                table.remove("first_name");
            }
        }
        table.insert("keyword".to_string(), Value::String(self.keyword.clone()));
        table.insert("language".to_string(), Value::String(self.language.clone()));
        table
    }
}

/// Write the answers to `path`, merged into `existing` when repopulating
pub fn write_profile(
    path: &Path,
    answers: &PopulateAnswers,
    existing: Option<&Profile>,
) -> Result<()> {
    let table = match existing {
        Some(profile) => answers.apply_to(profile),
        None => answers.to_table()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(&table)
        .map_err(|e| ParleyError::Io(format!("Failed to serialize profile: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_values_survive_repopulate() {
        let existing = Profile::from_toml_str(
            "keyword = \"JARVIS\"\ntts_engine = \"custom\"\n[active_stt]\nengine = \"sphinx\"\n",
        )
        .unwrap();
        let answers = PopulateAnswers::from_profile(&existing);
        assert_eq!(answers.keyword, "JARVIS");
        assert_eq!(answers.tts_engine, "custom");
        assert_eq!(answers.active_stt.engine, "sphinx");
        assert_eq!(answers.language, "en-US");
    }

    #[test]
    fn test_written_profile_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        write_profile(&path, &PopulateAnswers::default(), None).unwrap();

        let profile = Profile::from_toml_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            profile.get_str(&["active_stt", "engine"]).as_deref(),
            Some(builtin::DEFAULT_STT_ENGINE)
        );
        assert!(!profile.exists(&["first_name"]));
    }

    #[test]
    fn test_unasked_keys_survive_merge() {
        let existing = Profile::from_toml_str(
            "first_name = \"Ada\"\nprint_transcript = true\n[audio]\ninput_device = \"mic1\"\n[snr_vad]\nthreshold = 12.0\n",
        )
        .unwrap();
        let mut answers = PopulateAnswers::from_profile(&existing);
        answers.first_name = None;
        answers.keyword = "COMPUTER".to_string();

        let merged = Profile::new(answers.apply_to(&existing));
        assert_eq!(merged.get_str(&["keyword"]).as_deref(), Some("COMPUTER"));
        assert_eq!(merged.get_str(&["audio", "input_device"]).as_deref(), Some("mic1"));
        assert_eq!(merged.get_or(&["snr_vad", "threshold"], 0.0), 12.0);
        assert!(merged.get_flag(&["print_transcript"], false));
        assert!(!merged.exists(&["first_name"]));
        // Engine slugs are not asked for, so none are added
        assert!(!merged.exists(&["audio_engine"]));
    }
}
