//! Phrase containers realized to text only by a dictionary and formatter

use std::fmt;

/// One token of a sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Glyph {
    /// Dictionary key
    Phrase(String),
    Integer(i64),
    /// Punctuation attached to the previous token
    Delimiter(String),
}

impl From<&str> for Glyph {
    fn from(key: &str) -> Self {
        Glyph::Phrase(key.to_string())
    }
}

impl From<String> for Glyph {
    fn from(key: String) -> Self {
        Glyph::Phrase(key)
    }
}

impl From<i64> for Glyph {
    fn from(value: i64) -> Self {
        Glyph::Integer(value)
    }
}

/// Ordered sequence of glyphs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    glyphs: Vec<Glyph>,
}

impl Sentence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sentence holding a single phrase key
    #[must_use]
    pub fn from_phrase(key: &str) -> Self {
        Self {
            glyphs: vec![Glyph::from(key)],
        }
    }

    pub fn push<G: Into<Glyph>>(&mut self, glyph: G) -> &mut Self {
        self.glyphs.push(glyph.into());
        self
    }

    /// Builder form of [`Sentence::push`]
    #[must_use]
    pub fn with<G: Into<Glyph>>(mut self, glyph: G) -> Self {
        self.glyphs.push(glyph.into());
        self
    }

    pub fn delimiter(&mut self, delimiter: &str) -> &mut Self {
        self.glyphs.push(Glyph::Delimiter(delimiter.to_string()));
        self
    }

    /// Append all glyphs of `other`
    pub fn append(&mut self, other: &Sentence) -> &mut Self {
        self.glyphs.extend(other.glyphs.iter().cloned());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Phrase keys in order, skipping numbers and delimiters
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.glyphs.iter().filter_map(|glyph| match glyph {
            Glyph::Phrase(key) => Some(key.as_str()),
            _ => None,
        })
    }

    #[must_use]
    pub fn contains_phrase(&self, key: &str) -> bool {
        self.phrases().any(|phrase| phrase == key)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for glyph in &self.glyphs {
            match glyph {
                Glyph::Delimiter(delimiter) => write!(f, "{delimiter}")?,
                Glyph::Phrase(key) => {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{key}")?;
                }
                Glyph::Integer(value) => {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{value}")?;
                }
            }
            first = false;
        }
        Ok(())
    }
}

/// Ordered list of sentences; empty sentences are not stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    sentences: Vec<Sentence>,
}

impl Paragraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sentence: Sentence) -> &mut Self {
        if !sentence.is_empty() {
            self.sentences.push(sentence);
        }
        self
    }

    pub fn append(&mut self, other: Paragraph) -> &mut Self {
        self.sentences.extend(other.sentences);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    #[must_use]
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn last_mut(&mut self) -> Option<&mut Sentence> {
        self.sentences.last_mut()
    }
}

/// Ordered list of paragraphs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, paragraph: Paragraph) -> &mut Self {
        if !paragraph.is_empty() {
            self.paragraphs.push(paragraph);
        }
        self
    }

    #[must_use]
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_building() {
        let mut sentence = Sentence::from_phrase("iltapäivällä");
        sentence.push("sadetta").delimiter(",").push("sää poutaantuu");
        assert_eq!(sentence.len(), 4);
        assert!(sentence.contains_phrase("sadetta"));
        assert_eq!(sentence.to_string(), "iltapäivällä sadetta, sää poutaantuu");
    }

    #[test]
    fn test_append_flattens() {
        let mut first = Sentence::new().with("aluksi");
        let second = Sentence::new().with("pilvistä").with(3_i64);
        first.append(&second);
        assert_eq!(first.phrases().collect::<Vec<_>>(), vec!["aluksi", "pilvistä"]);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_paragraph_skips_empty_sentences() {
        let mut paragraph = Paragraph::new();
        paragraph.push(Sentence::new()).push(Sentence::from_phrase("sumua"));
        assert_eq!(paragraph.len(), 1);
    }
}
