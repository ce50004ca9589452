//! Sentence containers and their realization to text
//!
//! The story engine only assembles phrase keys; a [`Dictionary`] and a
//! [`TextFormatter`] turn them into readable text.

pub mod dictionary;
pub mod formatter;
pub mod sentence;

pub use dictionary::{BasicDictionary, Dictionary, NullDictionary};
pub use formatter::{PlainTextFormatter, TextFormatter};
pub use sentence::{Document, Glyph, Paragraph, Sentence};
