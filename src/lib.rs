//! Word-level LSTM lyric generation in pure Rust.
//!
//! Trains one next-word model per literary style and extends seed text into
//! formatted lyrics, either as a single block or as a sequence of headed
//! sections (verse, chorus, ...).
//!
//! ## Architecture
//!
//! ```text
//! corpus files → Catalog → TrainingData (vocabulary + n-gram pairs)
//!                               ↓
//!                       LstmModel::train → safetensors + JSON metadata
//!                               ↓
//!                        ModelRegistry (one model per style)
//!                               ↓
//! seed text → TextGenerator (greedy argmax) → format_lyrics → caller
//! ```
//!
//! ## Modules
//!
//! - [`vocab`] — word ↔ index mapping with padding and OOV sentinels
//! - [`catalog`] — corpus lines, padding and training-pair construction
//! - [`model`] — `SequenceModel` trait, candle LSTM, early stopping
//! - [`generator`] — seeded generation, independent and cumulative sections
//! - [`formatter`] — stanza layout
//! - [`validation`] — seed sanitising and request limits
//! - [`section`] — section types and per-section state
//! - [`registry`] — loaded models keyed by style
//! - [`service`] — JSON request handling behind `lyrics-server`
//! - [`training`] — per-style training runs and corpus conversion
//! - [`config`] — JSON configuration files

pub mod catalog;
pub mod config;
pub mod formatter;
pub mod generator;
pub mod model;
pub mod registry;
pub mod section;
pub mod service;
pub mod training;
pub mod validation;
pub mod vocab;

mod error;

pub use error::{Error, Result};
