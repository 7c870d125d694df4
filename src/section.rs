//! Lyrics sections for structured generation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Category of a lyrics section. Wire values are 1-based integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SectionType {
    Verse = 1,
    Chorus = 2,
    Bridge = 3,
    Intro = 4,
    PreChorus = 5,
    Outro = 6,
}

impl SectionType {
    /// Upper-case label used in section headers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Verse => "VERSE",
            Self::Chorus => "CHORUS",
            Self::Bridge => "BRIDGE",
            Self::Intro => "INTRO",
            Self::PreChorus => "PRE_CHORUS",
            Self::Outro => "OUTRO",
        }
    }

    /// `--LABEL--\n\n` header preceding a section's formatted text.
    pub fn header(self) -> String {
        format!("--{}--\n\n", self.label())
    }
}

impl TryFrom<u32> for SectionType {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::Verse,
            2 => Self::Chorus,
            3 => Self::Bridge,
            4 => Self::Intro,
            5 => Self::PreChorus,
            6 => Self::Outro,
            other => return Err(ValidationError::UnknownSectionType(other)),
        })
    }
}

impl From<SectionType> for u32 {
    fn from(value: SectionType) -> Self {
        value as u32
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One section of a structured lyrics request.
///
/// The generator sanitises `seed_text` in place and fills `generated_text`
/// with the section's formatted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsSection {
    /// Position of the section within its request.
    pub section_id: usize,
    pub section_type: SectionType,
    /// Total words in the section, seed included.
    pub word_count: usize,
    /// Words per line; two lines make a stanza.
    pub word_group_count: usize,
    pub seed_text: String,
    pub generated_text: Option<String>,
}

impl LyricsSection {
    pub fn new(
        section_id: usize,
        section_type: SectionType,
        word_count: usize,
        word_group_count: usize,
        seed_text: impl Into<String>,
    ) -> Self {
        Self {
            section_id,
            section_type,
            word_count,
            word_group_count,
            seed_text: seed_text.into(),
            generated_text: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(SectionType::try_from(1), Ok(SectionType::Verse));
        assert_eq!(SectionType::try_from(5), Ok(SectionType::PreChorus));
        assert_eq!(u32::from(SectionType::Outro), 6);
        assert_eq!(
            SectionType::try_from(7),
            Err(ValidationError::UnknownSectionType(7))
        );
    }

    #[test]
    fn test_header() {
        assert_eq!(SectionType::Chorus.header(), "--CHORUS--\n\n");
        assert_eq!(SectionType::PreChorus.to_string(), "PRE_CHORUS");
    }

    #[test]
    fn test_serde_integer() {
        let t: SectionType = serde_json::from_str("3").unwrap();
        assert_eq!(t, SectionType::Bridge);
        assert_eq!(serde_json::to_string(&SectionType::Intro).unwrap(), "4");
        assert!(serde_json::from_str::<SectionType>("0").is_err());
    }
}
