//! Seeded lyric generation.
//!
//! Generation is greedy: the current text is encoded, fitted to the model's
//! input width, and the argmax of the predicted distribution is decoded and
//! appended. Repeat until the text holds the requested number of words.
//!
//! Structured requests come in two flavours:
//!
//! - **independent**: every section is generated from its own seed only
//! - **cumulative**: one running text carries through all sections; each
//!   section appends its seed, extends the running text to the cumulative
//!   word total, and keeps the last `word_count` words as its output

use crate::Result;
use crate::catalog::Padding;
use crate::formatter::format_lyrics;
use crate::model::{SequenceModel, argmax};
use crate::section::LyricsSection;
use crate::validation::{GenerationLimits, sanitize_seed};
use crate::vocab::Vocabulary;

/// Last `k` words of `text` (split on single spaces), rejoined with spaces.
///
/// Returns every word when `text` has fewer than `k`.
pub fn tail_words(text: &str, k: usize) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    words[words.len().saturating_sub(k)..].join(" ")
}

/// Greedy text generator over a trained model and its vocabulary.
pub struct TextGenerator<'a> {
    model: &'a dyn SequenceModel,
    vocabulary: &'a Vocabulary,
    padding: Padding,
    limits: GenerationLimits,
}

impl<'a> TextGenerator<'a> {
    pub fn new(
        model: &'a dyn SequenceModel,
        vocabulary: &'a Vocabulary,
        padding: Padding,
        limits: GenerationLimits,
    ) -> Self {
        Self {
            model,
            vocabulary,
            padding,
            limits,
        }
    }

    /// Sanitise and validate `seed_text`, then extend it to `word_count`
    /// words. The result is unformatted: seed plus generated words.
    pub fn generate(
        &self,
        seed_text: &str,
        word_group_count: usize,
        word_count: usize,
    ) -> Result<String> {
        let seed = sanitize_seed(seed_text);
        self.limits
            .check_request(&seed, word_group_count, word_count)?;
        self.extend(seed, word_count)
    }

    /// Generate every section from its own seed.
    ///
    /// Returns the concatenated `--LABEL--` headed, formatted sections; each
    /// section also receives its formatted text.
    pub fn generate_independent_sections(&self, sections: &mut [LyricsSection]) -> Result<String> {
        self.prepare_sections(sections)?;
        let mut lyrics = String::new();
        for section in sections.iter_mut() {
            let text = self.extend(section.seed_text.clone(), section.word_count)?;
            attach(section, &text, &mut lyrics);
        }
        Ok(lyrics)
    }

    /// Generate sections in order over one running text, so later sections
    /// see everything generated before them.
    pub fn generate_cumulative_sections(&self, sections: &mut [LyricsSection]) -> Result<String> {
        self.prepare_sections(sections)?;
        let mut lyrics = String::new();
        let mut running = String::new();
        let mut target = 0;
        for section in sections.iter_mut() {
            if !section.seed_text.is_empty() {
                if !running.is_empty() {
                    running.push(' ');
                }
                running.push_str(&section.seed_text);
            }
            target += section.word_count;
            running = self.extend(running, target)?;
            let tail = tail_words(&running, section.word_count);
            attach(section, &tail, &mut lyrics);
        }
        Ok(lyrics)
    }

    /// Sanitise every seed in place and validate the whole request before
    /// any generation starts.
    fn prepare_sections(&self, sections: &mut [LyricsSection]) -> Result<()> {
        self.limits.check_section_count(sections.len())?;
        for section in sections.iter_mut() {
            section.seed_text = sanitize_seed(&section.seed_text);
            self.limits.check_request(
                &section.seed_text,
                section.word_group_count,
                section.word_count,
            )?;
        }
        Ok(())
    }

    /// Append predicted words until `text` holds `word_count` words.
    ///
    /// A predicted index with no word (padding, OOV) adds nothing for that
    /// step, so the result may fall short of `word_count`.
    fn extend(&self, mut text: String, word_count: usize) -> Result<String> {
        let width = self.model.input_width();
        let steps = word_count.saturating_sub(text.split_whitespace().count());
        for step in 0..steps {
            let row = self.padding.apply(&self.vocabulary.encode(&text), width);
            let probs = self.model.predict(&[row])?;
            let predicted = probs.first().and_then(|p| argmax(p));
            match predicted.and_then(|i| self.vocabulary.word(i)) {
                Some(word) => {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(word);
                }
                None => {
                    tracing::debug!(step, index = ?predicted, "predicted index has no word, skipping");
                }
            }
        }
        Ok(text)
    }
}

fn attach(section: &mut LyricsSection, text: &str, lyrics: &mut String) {
    let formatted = format_lyrics(text, section.word_group_count);
    lyrics.push_str(&section.section_type.header());
    lyrics.push_str(&formatted);
    section.generated_text = Some(formatted);
}
