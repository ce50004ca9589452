//! Phrase key lookup

use crate::{Result, StoryError};
use std::collections::HashMap;
use std::path::Path;

/// Maps phrase keys to text in one language
pub trait Dictionary {
    fn language(&self) -> &str;

    fn contains(&self, key: &str) -> bool;

    /// Text for `key`, or `StoryError::MissingPhrase`
    fn find(&self, key: &str) -> Result<String>;
}

/// In-memory phrase table, loadable from a flat JSON object
#[derive(Debug, Clone, Default)]
pub struct BasicDictionary {
    language: String,
    phrases: HashMap<String, String>,
}

impl BasicDictionary {
    #[must_use]
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            phrases: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: &str, text: &str) {
        self.phrases.insert(key.to_string(), text.to_string());
    }

    /// Parse `{"key": "text", ...}`
    pub fn from_json_str(language: &str, json: &str) -> Result<Self> {
        let phrases: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self {
            language: language.to_string(),
            phrases,
        })
    }

    pub fn load(language: &str, path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let dictionary = Self::from_json_str(language, &json)?;
        tracing::debug!(
            "Loaded {} phrases for language {} from {}",
            dictionary.phrases.len(),
            language,
            path.display()
        );
        Ok(dictionary)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Dictionary for BasicDictionary {
    fn language(&self) -> &str {
        &self.language
    }

    fn contains(&self, key: &str) -> bool {
        self.phrases.contains_key(key)
    }

    fn find(&self, key: &str) -> Result<String> {
        self.phrases
            .get(key)
            .cloned()
            .ok_or_else(|| StoryError::missing_phrase(key, self.language.as_str()))
    }
}

/// Dictionary that realizes every key as itself
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDictionary;

impl Dictionary for NullDictionary {
    fn language(&self) -> &str {
        "keys"
    }

    fn contains(&self, _key: &str) -> bool {
        true
    }

    fn find(&self, key: &str) -> Result<String> {
        Ok(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_dictionary_lookup() {
        let dictionary =
            BasicDictionary::from_json_str("en", r#"{"sadetta": "rain", "aamulla": "in the morning"}"#)
                .unwrap();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.find("sadetta").unwrap(), "rain");
        assert!(matches!(
            dictionary.find("sumua"),
            Err(StoryError::MissingPhrase { .. })
        ));
    }

    #[test]
    fn test_null_dictionary_echoes() {
        assert_eq!(NullDictionary.find("sumua").unwrap(), "sumua");
        assert!(NullDictionary.contains("anything"));
    }
}
