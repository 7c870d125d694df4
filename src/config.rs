//! Configuration for training styles and the lyrics service.
//!
//! One [`StyleConfig`] JSON file per literary style drives training; a
//! [`ServerConfig`] lists the trained artifacts the service loads at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Padding};
use crate::registry::ModelId;
use crate::validation::GenerationLimits;
use crate::{Error, Result};

/// Network shape: embedding → bidirectional LSTM stack → dense softmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Embedding output dimensions.
    pub embedding_dim: usize,
    /// Hidden units per LSTM direction.
    pub lstm_units: usize,
    /// Number of stacked bidirectional LSTM layers.
    pub lstm_layers: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 100,
            lstm_units: 150,
            lstm_layers: 1,
        }
    }
}

/// Optimisation hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of the pairs held out to monitor validation loss.
    pub validation_split: f64,
    /// Epochs without improvement before stopping.
    pub patience: usize,
    /// Minimum validation-loss decrease that counts as improvement.
    pub min_delta: f64,
    /// Seed for the hold-out split and batch shuffling.
    pub random_state: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 150,
            batch_size: 32,
            learning_rate: 1e-3,
            validation_split: 0.3,
            patience: 8,
            min_delta: 0.001,
            random_state: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(Error::Config(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        Ok(())
    }
}

/// Where a style's training lines come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum CorpusSource {
    /// One training line per physical line.
    Text { path: PathBuf },
    /// One field of each delimited row.
    Delimited {
        path: PathBuf,
        #[serde(default)]
        text_column: usize,
        #[serde(default = "default_delimiter")]
        delimiter: char,
        #[serde(default)]
        skip_header: bool,
    },
}

fn default_delimiter() -> char {
    '\t'
}

impl CorpusSource {
    /// Append this source's lines to `catalog`.
    pub fn load_into(&self, catalog: &mut Catalog) -> Result<()> {
        match self {
            CorpusSource::Text { path } => catalog.add_text_file(path),
            CorpusSource::Delimited {
                path,
                text_column,
                delimiter,
                skip_header,
            } => catalog.add_delimited_file(path, *text_column, *delimiter, *skip_header),
        }
    }
}

/// Everything needed to train one style and produce a sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    pub model_id: ModelId,
    pub corpus: Vec<CorpusSource>,
    #[serde(default)]
    pub padding: Padding,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    /// Weights are written here; metadata and history alongside.
    pub model_path: PathBuf,
    #[serde(default)]
    pub sample: Option<SampleConfig>,
}

/// Sample lyrics generated right after training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    pub seed_text: String,
    #[serde(default = "default_words_to_generate")]
    pub words_to_generate: usize,
    #[serde(default = "default_word_group_count")]
    pub word_group_count: usize,
    pub output_path: PathBuf,
}

fn default_words_to_generate() -> usize {
    100
}

fn default_word_group_count() -> usize {
    4
}

/// One trained artifact the service should load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub model_id: ModelId,
    pub model_path: PathBuf,
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub limits: GenerationLimits,
    pub models: Vec<ModelEntry>,
}

fn default_bind() -> String {
    "127.0.0.1:5000".into()
}

/// Read and parse a JSON config file.
pub fn load_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
}
