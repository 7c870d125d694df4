//! Trained models keyed by style.
//!
//! The registry is built once at startup and never mutated afterwards, so
//! request handling only needs shared references into it.

use std::collections::HashMap;

use candle_core::Device;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::catalog::Padding;
use crate::config::ModelEntry;
use crate::model::SequenceModel;
use crate::model::lstm::LstmModel;
use crate::validation::ValidationError;
use crate::vocab::Vocabulary;

/// Literary style a model was trained on. Wire values are 1-based integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ModelId {
    IrishLyrics = 1,
    PoePoem = 2,
    ShakespeareSonnets = 3,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [
        ModelId::IrishLyrics,
        ModelId::PoePoem,
        ModelId::ShakespeareSonnets,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::IrishLyrics => "irish_lyrics",
            Self::PoePoem => "poe_poem",
            Self::ShakespeareSonnets => "shakespeare_sonnets",
        }
    }
}

impl TryFrom<u32> for ModelId {
    type Error = ValidationError;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::IrishLyrics),
            2 => Ok(Self::PoePoem),
            3 => Ok(Self::ShakespeareSonnets),
            other => Err(ValidationError::UnknownModel(other)),
        }
    }
}

impl From<ModelId> for u32 {
    fn from(value: ModelId) -> Self {
        value as u32
    }
}

/// A model ready for generation, with the vocabulary and padding it was
/// trained with.
pub struct LoadedModel {
    pub model: Box<dyn SequenceModel + Send + Sync>,
    pub vocabulary: Vocabulary,
    pub padding: Padding,
}

impl LoadedModel {
    pub fn from_lstm(model: LstmModel) -> Self {
        let vocabulary = model.vocabulary().clone();
        let padding = model.meta().padding;
        Self {
            model: Box::new(model),
            vocabulary,
            padding,
        }
    }
}

/// Read-only map from [`ModelId`] to its loaded model.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<ModelId, LoadedModel>,
}

impl ModelRegistry {
    /// Load every configured artifact. Any failure aborts startup.
    pub fn load(entries: &[ModelEntry], device: &Device) -> Result<Self> {
        let mut registry = Self::default();
        for entry in entries {
            tracing::info!(model = entry.model_id.name(), path = ?entry.model_path, "loading model");
            let model = LstmModel::load(&entry.model_path, device)?;
            registry = registry.with_model(entry.model_id, LoadedModel::from_lstm(model));
        }
        tracing::info!(count = registry.len(), "model registry ready");
        Ok(registry)
    }

    /// Add (or replace) one model while the registry is being assembled.
    pub fn with_model(mut self, id: ModelId, model: LoadedModel) -> Self {
        if self.models.insert(id, model).is_some() {
            tracing::warn!(model = id.name(), "model registered twice; keeping the last");
        }
        self
    }

    pub fn get(&self, id: ModelId) -> Option<&LoadedModel> {
        self.models.get(&id)
    }

    /// Look up a raw wire id, failing with a validation error when the id is
    /// unknown or no model was loaded for it.
    pub fn resolve(&self, raw_id: u32) -> std::result::Result<&LoadedModel, ValidationError> {
        let id = ModelId::try_from(raw_id)?;
        self.get(id).ok_or(ValidationError::UnknownModel(raw_id))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// First CUDA device when available, otherwise the CPU.
pub fn preferred_device(cuda_ordinal: usize) -> Device {
    Device::cuda_if_available(cuda_ordinal).unwrap_or(Device::Cpu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::NetworkConfig;
    use crate::model::lstm::ModelMeta;
    use crate::model::testing::CycleModel;
    use crate::model::TrainableModel;

    fn cycle_entry() -> LoadedModel {
        LoadedModel {
            model: Box::new(CycleModel { words: 2, width: 3 }),
            vocabulary: Vocabulary::from_words(vec!["hello".into(), "world".into()]).unwrap(),
            padding: Padding::Pre,
        }
    }

    #[test]
    fn test_model_id_wire_values() {
        assert_eq!(ModelId::try_from(1), Ok(ModelId::IrishLyrics));
        assert_eq!(ModelId::try_from(3), Ok(ModelId::ShakespeareSonnets));
        assert_eq!(ModelId::try_from(0), Err(ValidationError::UnknownModel(0)));
        assert_eq!(u32::from(ModelId::PoePoem), 2);
        let ids: Vec<u32> = ModelId::ALL.iter().map(|&id| id.into()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_model_id_serde() {
        assert_eq!(serde_json::from_str::<ModelId>("2").unwrap(), ModelId::PoePoem);
        assert_eq!(serde_json::to_string(&ModelId::IrishLyrics).unwrap(), "1");
        assert!(serde_json::from_str::<ModelId>("4").is_err());
    }

    #[test]
    fn test_resolve() {
        let registry = ModelRegistry::default().with_model(ModelId::PoePoem, cycle_entry());
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(2).is_ok());
        // Known id without a loaded model.
        assert_eq!(
            registry.resolve(1).err(),
            Some(ValidationError::UnknownModel(1))
        );
        assert_eq!(
            registry.resolve(99).err(),
            Some(ValidationError::UnknownModel(99))
        );
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poe.safetensors");

        let mut catalog = Catalog::new();
        catalog.add_line("once upon a midnight dreary");
        let data = catalog.tokenize(Padding::Post).unwrap();
        let network = NetworkConfig {
            embedding_dim: 4,
            lstm_units: 3,
            lstm_layers: 1,
        };
        let model = LstmModel::new(ModelMeta::for_training_data(network, &data), &Device::Cpu)
            .unwrap();
        model.save(&path).unwrap();

        let entries = vec![ModelEntry {
            model_id: ModelId::PoePoem,
            model_path: path,
        }];
        let registry = ModelRegistry::load(&entries, &Device::Cpu).unwrap();
        let loaded = registry.get(ModelId::PoePoem).unwrap();
        assert_eq!(loaded.padding, Padding::Post);
        assert_eq!(loaded.vocabulary.encode("midnight"), vec![4]);
        assert_eq!(loaded.model.input_width(), data.input_width());
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        let entries = vec![ModelEntry {
            model_id: ModelId::IrishLyrics,
            model_path: "/nonexistent/irish.safetensors".into(),
        }];
        assert!(ModelRegistry::load(&entries, &Device::Cpu).is_err());
    }
}
