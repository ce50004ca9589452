//! Error types for the forecast story engine

use chrono::NaiveDateTime;
use thiserror::Error;

/// Main error type for the `weatherstory` crate
#[derive(Error, Debug)]
pub enum StoryError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A period whose start lies after its end
    #[error("Invalid period: start {start} is after end {end}")]
    InvalidPeriod {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Collaborator output that breaks the story item partition
    #[error("Story invariant violated: {message}")]
    Invariant { message: String },

    /// Phrase key not found in the dictionary during realization
    #[error("Phrase '{key}' missing from {language} dictionary")]
    MissingPhrase { key: String, language: String },

    /// Scenario file content errors
    #[error("Scenario error: {message}")]
    Scenario { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON decoding errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl StoryError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new invariant violation error
    pub fn invariant<S: Into<String>>(message: S) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Create a new scenario error
    pub fn scenario<S: Into<String>>(message: S) -> Self {
        Self::Scenario {
            message: message.into(),
        }
    }

    /// Create a new missing phrase error
    pub fn missing_phrase<K: Into<String>, L: Into<String>>(key: K, language: L) -> Self {
        Self::MissingPhrase {
            key: key.into(),
            language: language.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            StoryError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            StoryError::Validation { message } => format!("Invalid input: {message}"),
            StoryError::InvalidPeriod { start, end } => {
                format!("A period ends ({end}) before it starts ({start}).")
            }
            StoryError::Invariant { .. } => {
                "The forecast data could not be arranged into a consistent story.".to_string()
            }
            StoryError::MissingPhrase { key, .. } => {
                format!("No text available for phrase '{key}'. Please check the dictionary.")
            }
            StoryError::Scenario { message } => format!("Scenario file is invalid: {message}"),
            StoryError::Io { .. } => {
                "File operation failed. Please check file paths and permissions.".to_string()
            }
            StoryError::Json { .. } => "Input is not valid JSON.".to_string(),
        }
    }
}
