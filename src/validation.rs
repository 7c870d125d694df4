//! Request validation: seed sanitising and configurable generation bounds.
//!
//! Every generation entry point sanitises its seed text and checks it against
//! [`GenerationLimits`] before the model is touched. Failures are reported as
//! a typed [`ValidationError`] carrying a stable reason code, never a panic.

use serde::{Deserialize, Serialize};

/// Why a generation request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("seed text is {len} characters; the maximum is {max}")]
    SeedTooLong { len: usize, max: usize },

    #[error("word count {requested} exceeds the maximum of {max}")]
    WordCountTooLarge { requested: usize, max: usize },

    #[error("word group count {requested} exceeds the maximum of {max}")]
    WordGroupCountTooLarge { requested: usize, max: usize },

    #[error("word group count must be at least 1")]
    WordGroupCountZero,

    #[error("{count} lyrics sections requested; the maximum is {max}")]
    TooManySections { count: usize, max: usize },

    #[error("at least one lyrics section is required")]
    NoSections,

    #[error("unknown model id {0}")]
    UnknownModel(u32),

    #[error("unknown section type {0}")]
    UnknownSectionType(u32),
}

impl ValidationError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SeedTooLong { .. } => "seed_too_long",
            Self::WordCountTooLarge { .. } => "word_count_too_large",
            Self::WordGroupCountTooLarge { .. } => "word_group_count_too_large",
            Self::WordGroupCountZero => "word_group_count_zero",
            Self::TooManySections { .. } => "too_many_sections",
            Self::NoSections => "no_sections",
            Self::UnknownModel(_) => "unknown_model",
            Self::UnknownSectionType(_) => "unknown_section_type",
        }
    }
}

/// Caller-configurable generation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationLimits {
    /// Maximum length of the sanitised seed text, in characters.
    pub max_seed_chars: usize,
    /// Maximum total word count of one generation (also caps the group width).
    pub max_word_count: usize,
    /// Maximum number of sections in a structured request.
    pub max_sections: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_seed_chars: 100,
            max_word_count: 500,
            max_sections: 12,
        }
    }
}

impl GenerationLimits {
    /// Check an already-sanitised seed plus its word counts.
    pub fn check_request(
        &self,
        sanitized_seed: &str,
        word_group_count: usize,
        word_count: usize,
    ) -> Result<(), ValidationError> {
        let len = sanitized_seed.chars().count();
        if len > self.max_seed_chars {
            return Err(ValidationError::SeedTooLong {
                len,
                max: self.max_seed_chars,
            });
        }
        if word_count > self.max_word_count {
            return Err(ValidationError::WordCountTooLarge {
                requested: word_count,
                max: self.max_word_count,
            });
        }
        if word_group_count > self.max_word_count {
            return Err(ValidationError::WordGroupCountTooLarge {
                requested: word_group_count,
                max: self.max_word_count,
            });
        }
        if word_group_count == 0 {
            return Err(ValidationError::WordGroupCountZero);
        }
        Ok(())
    }

    /// Check the section count of a structured request.
    pub fn check_section_count(&self, count: usize) -> Result<(), ValidationError> {
        if count == 0 {
            return Err(ValidationError::NoSections);
        }
        if count > self.max_sections {
            return Err(ValidationError::TooManySections {
                count,
                max: self.max_sections,
            });
        }
        Ok(())
    }
}

/// Strip everything but letters, digits, spaces and apostrophes, collapse
/// runs of spaces and trim.
///
/// `"a dreary  midnight   bir!d"` → `"a dreary midnight bird"`.
pub fn sanitize_seed(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let keep = c.is_alphanumeric() || c == '\'' || c == ' ';
        if !keep || (c == ' ' && (out.is_empty() || out.ends_with(' '))) {
            continue;
        }
        out.push(c);
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_punctuation_and_collapses_spaces() {
        assert_eq!(
            sanitize_seed("a dreary  midnight   bir!d"),
            "a dreary midnight bird"
        );
        assert_eq!(
            sanitize_seed("a dreary  midnight   bir!d and here </> i heard"),
            "a dreary midnight bird and here i heard"
        );
    }

    #[test]
    fn test_sanitize_keeps_apostrophes_and_digits() {
        assert_eq!(sanitize_seed("  o'er the 2 hills  "), "o'er the 2 hills");
    }

    #[test]
    fn test_sanitize_drops_tabs_and_newlines() {
        assert_eq!(sanitize_seed("green\tfields\nonce more"), "greenfieldsonce more");
        assert_eq!(sanitize_seed("!!! ???"), "");
    }

    #[test]
    fn test_sanitized_output_alphabet() {
        let inputs = [
            "  hello,   world!! ",
            "--dash-- and   ~tilde~",
            "  ' quoted '  ",
            "émigré   naïve\u{00a0}text",
            "",
            "     ",
        ];
        for input in inputs {
            let out = sanitize_seed(input);
            assert!(
                out.chars()
                    .all(|c| c.is_alphanumeric() || c == ' ' || c == '\''),
                "{out:?}"
            );
            assert!(!out.contains("  "), "{out:?}");
            assert!(!out.starts_with(' ') && !out.ends_with(' '), "{out:?}");
        }
    }

    #[test]
    fn test_seed_too_long() {
        let limits = GenerationLimits {
            max_seed_chars: 5,
            ..Default::default()
        };
        assert!(limits.check_request("hello", 4, 10).is_ok());
        assert_eq!(
            limits.check_request("hello world", 4, 10),
            Err(ValidationError::SeedTooLong { len: 11, max: 5 })
        );
    }

    #[test]
    fn test_word_count_bounds() {
        let limits = GenerationLimits {
            max_word_count: 50,
            ..Default::default()
        };
        assert!(limits.check_request("seed", 4, 50).is_ok());
        assert_eq!(
            limits.check_request("seed", 4, 51).unwrap_err().code(),
            "word_count_too_large"
        );
        assert_eq!(
            limits.check_request("seed", 51, 10).unwrap_err().code(),
            "word_group_count_too_large"
        );
        assert_eq!(
            limits.check_request("seed", 0, 10),
            Err(ValidationError::WordGroupCountZero)
        );
    }

    #[test]
    fn test_section_count_bounds() {
        let limits = GenerationLimits {
            max_sections: 3,
            ..Default::default()
        };
        assert!(limits.check_section_count(3).is_ok());
        assert_eq!(
            limits.check_section_count(4),
            Err(ValidationError::TooManySections { count: 4, max: 3 })
        );
        assert_eq!(limits.check_section_count(0), Err(ValidationError::NoSections));
    }

    #[test]
    fn test_limits_deserialize_with_defaults() {
        let limits: GenerationLimits = serde_json::from_str(r#"{"max_sections": 7}"#).unwrap();
        assert_eq!(limits.max_sections, 7);
        assert_eq!(limits.max_word_count, 500);
        assert_eq!(limits.max_seed_chars, 100);
    }
}
