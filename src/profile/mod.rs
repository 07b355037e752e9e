//! User profile access
//!
//! The profile is a TOML tree loaded once per run. Every lookup walks a key
//! path and either yields a typed value or falls back to a caller default.

mod loader;
mod populate;
mod recovery;

pub use loader::{LoadState, ProfileLoader};
pub use populate::{write_profile, PopulateAnswers};
pub use recovery::{ConsolePrompt, RecoveryChoice, RecoveryPolicy};

use crate::{ParleyError, Result};
use toml::{Table, Value};
use tracing::warn;

/// Conversion from a raw profile value into a typed setting
pub trait FromProfileValue: Sized {
    /// Human readable name of the expected type, used in error messages
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromProfileValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl FromProfileValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            Value::String(s) => Some(matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "on" | "y" | "1"
            )),
            _ => None,
        }
    }
}

impl FromProfileValue for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromProfileValue for f32 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

macro_rules! integer_from_profile_value {
    ($($ty:ty),*) => {
        $(
            impl FromProfileValue for $ty {
                const EXPECTED: &'static str = "an integer";

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Integer(i) => <$ty>::try_from(*i).ok(),
                        Value::String(s) => s.trim().parse().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_from_profile_value!(i64, u32, u16, usize);

impl FromProfileValue for Vec<String> {
    const EXPECTED: &'static str = "a list of strings";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.iter().map(String::from_value).collect(),
            Value::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}

/// Read-only view over the loaded profile tree
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    root: Table,
}

impl Profile {
    pub fn new(root: Table) -> Self {
        Self { root }
    }

    /// Parse a profile from TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str::<Table>(content).map(Self::new)
    }

    /// Descend the tree one key at a time
    ///
    /// Returns `None` as soon as a key is missing or a non-table value is
    /// reached while keys remain.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(*first)?;
        for key in rest {
            current = current.as_table()?.get(*key)?;
        }
        Some(current)
    }

    /// Typed lookup with a default for absent or unusable values
    pub fn get_or<T: FromProfileValue>(&self, path: &[&str], default: T) -> T {
        match self.get(path) {
            None => default,
            Some(value) => T::from_value(value).unwrap_or_else(|| {
                warn!(
                    "Profile key '{}' is not {}, using default",
                    dotted(path),
                    T::EXPECTED
                );
                default
            }),
        }
    }

    /// Typed lookup that fails when the key is absent
    pub fn require<T: FromProfileValue>(&self, path: &[&str]) -> Result<T> {
        let value = self
            .get(path)
            .ok_or_else(|| ParleyError::MissingKey(dotted(path)))?;
        T::from_value(value).ok_or_else(|| ParleyError::InvalidValue {
            key: dotted(path),
            expected: T::EXPECTED,
        })
    }

    /// Typed lookup returning `None` when absent
    pub fn get_opt<T: FromProfileValue>(&self, path: &[&str]) -> Result<Option<T>> {
        if self.exists(path) {
            self.require(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// String lookup where an empty value counts as unset
    pub fn get_str(&self, path: &[&str]) -> Option<String> {
        self.get(path)
            .and_then(String::from_value)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Boolean lookup that never fails
    pub fn get_flag(&self, path: &[&str], default: bool) -> bool {
        self.get(path)
            .and_then(bool::from_value)
            .unwrap_or(default)
    }

    /// Pure existence probe, no defaulting
    pub fn exists(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    pub fn as_table(&self) -> &Table {
        &self.root
    }
}

pub(crate) fn dotted(path: &[&str]) -> String {
    path.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(content: &str) -> Profile {
        Profile::from_toml_str(content).unwrap()
    }

    #[test]
    fn test_nested_lookup() {
        let p = profile(
            r#"
            keyword = "COMPUTER"

            [audio]
            input_samplerate = 44100
            input_device = "mic1"
            "#,
        );
        assert_eq!(p.get_or(&["audio", "input_samplerate"], 16000u32), 44100);
        assert_eq!(p.get_str(&["audio", "input_device"]).as_deref(), Some("mic1"));
        assert_eq!(p.get_str(&["keyword"]).as_deref(), Some("COMPUTER"));
    }

    #[test]
    fn test_missing_and_scalar_intermediate() {
        let p = profile("keyword = \"NAOMI\"\n[audio]\ninput_channels = 2\n");
        assert!(p.get(&["language"]).is_none());
        // Descending through a scalar yields nothing
        assert!(p.get(&["keyword", "nested"]).is_none());
        assert!(p.get(&[]).is_none());
        assert_eq!(p.get_or(&["audio", "input_chunksize"], 1024usize), 1024);
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let p = profile("[audio]\ninput_samplerate = \"fast\"\n");
        assert_eq!(p.get_or(&["audio", "input_samplerate"], 16000u32), 16000);
        assert!(matches!(
            p.require::<u32>(&["audio", "input_samplerate"]),
            Err(ParleyError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_numeric_strings_convert() {
        let p = profile("[active_stt]\nsamplerate = \"8000\"\nvolume_normalization = 2\n");
        assert_eq!(p.require::<u32>(&["active_stt", "samplerate"]).unwrap(), 8000);
        assert_eq!(
            p.require::<f32>(&["active_stt", "volume_normalization"]).unwrap(),
            2.0
        );
    }

    #[test]
    fn test_require_missing_key() {
        let p = Profile::default();
        match p.require::<String>(&["tts_engine"]) {
            Err(ParleyError::MissingKey(key)) => assert_eq!(key, "tts_engine"),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(p.get_opt::<u32>(&["active_stt", "samplerate"]).unwrap(), None);
    }

    #[test]
    fn test_flag_coercion() {
        let p = profile(
            r#"
            a = true
            b = "yes"
            c = "off"
            d = 0
            e = "Y"
            "#,
        );
        assert!(p.get_flag(&["a"], false));
        assert!(p.get_flag(&["b"], false));
        assert!(!p.get_flag(&["c"], true));
        assert!(!p.get_flag(&["d"], true));
        assert!(p.get_flag(&["e"], false));
        assert!(p.get_flag(&["missing"], true));
        assert!(!p.get_flag(&["missing", "deeper"], false));
    }

    #[test]
    fn test_empty_string_counts_as_unset() {
        let p = profile("language = \"  \"\n");
        assert!(p.exists(&["language"]));
        assert_eq!(p.get_str(&["language"]), None);
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let p = profile("[passive_stt]\nengine = \"whisper\"\n");
        let first = p.get(&["passive_stt", "engine"]).cloned();
        let second = p.get(&["passive_stt", "engine"]).cloned();
        assert_eq!(first, second);
        assert_eq!(p, profile("[passive_stt]\nengine = \"whisper\"\n"));
    }

    #[test]
    fn test_string_list() {
        let p = profile("standard_phrases = [\"YES\", \"NO\"]\n");
        assert_eq!(
            p.get_or(&["standard_phrases"], Vec::<String>::new()),
            vec!["YES".to_string(), "NO".to_string()]
        );
    }
}
