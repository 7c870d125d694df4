//! JSON request handling for the lyrics service.
//!
//! [`LyricsService::handle`] maps a method, path and body to a [`Reply`]
//! without touching any socket; the `lyrics-server` binary only moves bytes
//! between `tiny_http` and this function.

use serde::{Deserialize, Serialize};

use crate::generator::TextGenerator;
use crate::registry::ModelRegistry;
use crate::section::{LyricsSection, SectionType};
use crate::validation::{GenerationLimits, ValidationError};
use crate::{Error, Result};

pub const LYRICS_PATH: &str = "/lyrics-api";
pub const STRUCTURED_LYRICS_PATH: &str = "/structured-lyrics-api";

// ── Wire types ──────────────────────────────────────────────────────────

/// Body of `POST /lyrics-api`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsRequest {
    pub model_id: u32,
    pub seed_text: String,
    pub word_count: usize,
    pub word_group_count: usize,
}

/// One entry of `lyrics_sections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRequest {
    pub section_type: u32,
    pub word_count: usize,
    pub word_group_count: usize,
    #[serde(default)]
    pub seed_text: String,
}

/// Body of `POST /structured-lyrics-api`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredLyricsRequest {
    pub model_id: u32,
    #[serde(default)]
    pub independent_sections: bool,
    pub lyrics_sections: Vec<SectionRequest>,
}

/// JSON body of every non-200 reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Transport-independent HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn text(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; charset=utf-8",
            body,
        }
    }

    /// JSON error reply with the given status.
    pub fn error(status: u16, message: impl Into<String>, code: Option<&str>) -> Self {
        let body = ErrorBody {
            status,
            message: message.into(),
            code: code.map(str::to_string),
        };
        Self {
            status,
            content_type: "application/json",
            // Serialising a struct of strings and integers cannot fail.
            body: serde_json::to_string(&body).unwrap_or_default(),
        }
    }

    fn from_error(err: &Error) -> Self {
        match err {
            Error::Validation(v) => Self::error(400, v.to_string(), Some(v.code())),
            Error::Json(e) => Self::error(400, format!("malformed request body: {e}"), None),
            other => Self::error(500, other.to_string(), None),
        }
    }
}

// ── Service ─────────────────────────────────────────────────────────────

/// Generates lyrics for requests against a fixed set of loaded models.
pub struct LyricsService {
    registry: ModelRegistry,
    limits: GenerationLimits,
}

impl LyricsService {
    pub fn new(registry: ModelRegistry, limits: GenerationLimits) -> Self {
        Self { registry, limits }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Formatted lyrics for a single-block request.
    pub fn generate(&self, request: &LyricsRequest) -> Result<String> {
        let loaded = self.registry.resolve(request.model_id)?;
        let generator = TextGenerator::new(
            loaded.model.as_ref(),
            &loaded.vocabulary,
            loaded.padding,
            self.limits,
        );
        let text = generator.generate(
            &request.seed_text,
            request.word_group_count,
            request.word_count,
        )?;
        Ok(crate::formatter::format_lyrics(
            &text,
            request.word_group_count,
        ))
    }

    /// Headed, formatted lyrics for a multi-section request.
    pub fn generate_structured(&self, request: &StructuredLyricsRequest) -> Result<String> {
        let loaded = self.registry.resolve(request.model_id)?;
        let mut sections = request
            .lyrics_sections
            .iter()
            .enumerate()
            .map(|(i, s)| {
                SectionType::try_from(s.section_type).map(|section_type| {
                    LyricsSection::new(
                        i,
                        section_type,
                        s.word_count,
                        s.word_group_count,
                        s.seed_text.as_str(),
                    )
                })
            })
            .collect::<std::result::Result<Vec<_>, ValidationError>>()?;

        let generator = TextGenerator::new(
            loaded.model.as_ref(),
            &loaded.vocabulary,
            loaded.padding,
            self.limits,
        );
        if request.independent_sections {
            generator.generate_independent_sections(&mut sections)
        } else {
            generator.generate_cumulative_sections(&mut sections)
        }
    }

    /// Route one HTTP request.
    pub fn handle(&self, method: &str, path: &str, body: &str) -> Reply {
        let path = path.split('?').next().unwrap_or(path);
        let result = match path {
            LYRICS_PATH | STRUCTURED_LYRICS_PATH if !method.eq_ignore_ascii_case("POST") => {
                return Reply::error(405, format!("{method} not allowed on {path}"), None);
            }
            LYRICS_PATH => serde_json::from_str::<LyricsRequest>(body)
                .map_err(Error::from)
                .and_then(|req| self.generate(&req)),
            STRUCTURED_LYRICS_PATH => serde_json::from_str::<StructuredLyricsRequest>(body)
                .map_err(Error::from)
                .and_then(|req| self.generate_structured(&req)),
            _ => return Reply::error(404, format!("no route for {path}"), None),
        };

        match result {
            Ok(lyrics) => {
                tracing::info!(path, chars = lyrics.len(), "request served");
                Reply::text(lyrics)
            }
            Err(e) => {
                let reply = Reply::from_error(&e);
                if reply.status == 500 {
                    tracing::error!(path, error = %e, "request failed");
                } else {
                    tracing::warn!(path, error = %e, "request rejected");
                }
                reply
            }
        }
    }
}
