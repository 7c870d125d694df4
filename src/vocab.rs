//! Word vocabulary.
//!
//! Index layout:
//!
//! ```text
//! 0        <pad>   padding, never a real word
//! 1..=n    words   in order of first occurrence across the corpus
//! n + 1    <oov>   sentinel for words not seen while building
//! ```
//!
//! The same word splitting is used to build the vocabulary and to encode
//! seed text at generation time, so both sides agree on what a "word" is.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Token stored at index 0.
pub const PAD_TOKEN: &str = "<pad>";
/// Token stored at the last index.
pub const OOV_TOKEN: &str = "<oov>";
/// Index reserved for padding.
pub const PAD_INDEX: u32 = 0;

/// Characters replaced by a space before splitting.
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n\r";

/// Split text into lower-cased words, dropping filtered punctuation.
///
/// Apostrophes survive so contractions like `o'er` stay one word.
pub fn split_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if FILTERS.contains(c) { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Bidirectional word ↔ index mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VocabularyWords", into = "VocabularyWords")]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, u32>,
}

/// Serialized form: the ordered word list without sentinels.
#[derive(Serialize, Deserialize)]
struct VocabularyWords {
    words: Vec<String>,
}

impl TryFrom<VocabularyWords> for Vocabulary {
    type Error = Error;

    fn try_from(value: VocabularyWords) -> Result<Self> {
        Self::from_words(value.words)
    }
}

impl From<Vocabulary> for VocabularyWords {
    fn from(value: Vocabulary) -> Self {
        Self { words: value.words }
    }
}

impl Vocabulary {
    /// Build from texts, assigning indices by first occurrence.
    pub fn build<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut words = Vec::new();
        let mut index = HashMap::new();
        for text in texts {
            for word in split_words(text) {
                if !index.contains_key(&word) {
                    index.insert(word.clone(), words.len() as u32 + 1);
                    words.push(word);
                }
            }
        }
        Self { words, index }
    }

    /// Rebuild from an ordered word list. A repeated word would give two
    /// indices the same token, so it is rejected.
    pub fn from_words(words: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            if index.insert(word.clone(), i as u32 + 1).is_some() {
                return Err(Error::WeightLoad(format!(
                    "vocabulary lists {word:?} more than once"
                )));
            }
        }
        Ok(Self { words, index })
    }

    /// Total number of indices, including padding and OOV.
    pub fn size(&self) -> usize {
        self.words.len() + 2
    }

    /// Index of the out-of-vocabulary sentinel.
    pub fn oov_index(&self) -> u32 {
        self.words.len() as u32 + 1
    }

    /// Index of a word, or the OOV index when unseen.
    pub fn encode_word(&self, word: &str) -> u32 {
        self.index.get(word).copied().unwrap_or_else(|| self.oov_index())
    }

    /// Split and encode text.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        split_words(text)
            .iter()
            .map(|w| self.encode_word(w))
            .collect()
    }

    /// The real word at `index`; `None` for padding, OOV and out-of-range indices.
    pub fn word(&self, index: u32) -> Option<&str> {
        if index == PAD_INDEX {
            return None;
        }
        self.words.get(index as usize - 1).map(String::as_str)
    }

    /// The token at `index`, including the padding and OOV sentinels.
    pub fn token(&self, index: u32) -> Option<&str> {
        match index {
            PAD_INDEX => Some(PAD_TOKEN),
            i if i == self.oov_index() => Some(OOV_TOKEN),
            i => self.word(i),
        }
    }

    /// Real words in index order.
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_filters_punctuation() {
        assert_eq!(
            split_words("From fairest creatures, we desire increase!"),
            vec!["from", "fairest", "creatures", "we", "desire", "increase"]
        );
        assert_eq!(split_words("O'er the hill-side\n"), vec!["o'er", "the", "hill", "side"]);
        assert!(split_words("  ...  ").is_empty());
    }

    #[test]
    fn test_first_occurrence_order() {
        let vocab = Vocabulary::build(["hello world", "hello there world"]);
        assert_eq!(vocab.size(), 5);
        assert_eq!(vocab.token(0), Some(PAD_TOKEN));
        assert_eq!(vocab.token(1), Some("hello"));
        assert_eq!(vocab.token(2), Some("world"));
        assert_eq!(vocab.token(3), Some("there"));
        assert_eq!(vocab.token(4), Some(OOV_TOKEN));
        assert_eq!(vocab.token(5), None);
    }

    #[test]
    fn test_every_index_maps_to_one_token() {
        let vocab = Vocabulary::build(["the raven the door", "nevermore quoth the raven"]);
        let tokens: Vec<&str> = (0..vocab.size() as u32)
            .map(|i| vocab.token(i).unwrap())
            .collect();
        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), tokens.len());
        for word in vocab.words() {
            assert_eq!(vocab.token(vocab.encode_word(word)), Some(word.as_str()));
        }
    }

    #[test]
    fn test_unknown_words_encode_to_oov() {
        let vocab = Vocabulary::build(["green fields"]);
        assert_eq!(vocab.encode("Green meadows"), vec![1, vocab.oov_index()]);
    }

    #[test]
    fn test_sentinels_have_no_word() {
        let vocab = Vocabulary::build(["green fields"]);
        assert_eq!(vocab.word(PAD_INDEX), None);
        assert_eq!(vocab.word(vocab.oov_index()), None);
        assert_eq!(vocab.word(99), None);
        assert_eq!(vocab.word(2), Some("fields"));
    }

    #[test]
    fn test_serde_preserves_order() {
        let vocab = Vocabulary::build(["a dreary midnight", "midnight bird"]);
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"{"words":["a","dreary","midnight","bird"]}"#);
        let restored: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vocab);
    }

    #[test]
    fn test_from_words_rejects_duplicates() {
        let err = Vocabulary::from_words(vec!["raven".into(), "door".into(), "raven".into()])
            .unwrap_err();
        assert!(matches!(err, Error::WeightLoad(_)));
        assert!(err.to_string().contains("\"raven\""), "{err}");
    }

    #[test]
    fn test_deserialize_rejects_duplicate_words() {
        let json = r#"{"words":["a","dreary","a"]}"#;
        assert!(serde_json::from_str::<Vocabulary>(json).is_err());
    }
}
