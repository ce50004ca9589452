//! Realization of sentences into plain text

use crate::Result;
use crate::text::{Dictionary, Document, Glyph, Paragraph, Sentence};

/// Turns phrase containers into text with a dictionary
pub trait TextFormatter {
    fn format_sentence(&self, sentence: &Sentence, dictionary: &dyn Dictionary) -> Result<String>;

    fn format_paragraph(
        &self,
        paragraph: &Paragraph,
        dictionary: &dyn Dictionary,
    ) -> Result<String>;

    fn format_document(&self, document: &Document, dictionary: &dyn Dictionary) -> Result<String>;
}

/// Capitalized, period-terminated sentences separated by spaces
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormatter;

impl PlainTextFormatter {
    fn capitalize(text: &str) -> String {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl TextFormatter for PlainTextFormatter {
    fn format_sentence(&self, sentence: &Sentence, dictionary: &dyn Dictionary) -> Result<String> {
        let mut text = String::new();
        for glyph in sentence.glyphs() {
            let word = match glyph {
                Glyph::Phrase(key) => dictionary.find(key)?,
                Glyph::Integer(value) => value.to_string(),
                Glyph::Delimiter(delimiter) => {
                    if !text.is_empty() {
                        text.push_str(delimiter);
                    }
                    continue;
                }
            };
            if word.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&word);
        }

        let text = text.trim_end_matches(',').trim();
        if text.is_empty() {
            return Ok(String::new());
        }
        let mut text = Self::capitalize(text);
        if !text.ends_with(['.', '!', '?']) {
            text.push('.');
        }
        Ok(text)
    }

    fn format_paragraph(
        &self,
        paragraph: &Paragraph,
        dictionary: &dyn Dictionary,
    ) -> Result<String> {
        let mut sentences = Vec::with_capacity(paragraph.len());
        for sentence in paragraph.sentences() {
            let text = self.format_sentence(sentence, dictionary)?;
            if !text.is_empty() {
                sentences.push(text);
            }
        }
        Ok(sentences.join(" "))
    }

    fn format_document(&self, document: &Document, dictionary: &dyn Dictionary) -> Result<String> {
        let mut paragraphs = Vec::new();
        for paragraph in document.paragraphs() {
            let text = self.format_paragraph(paragraph, dictionary)?;
            if !text.is_empty() {
                paragraphs.push(text);
            }
        }
        Ok(paragraphs.join("\n\n"))
    }
}
