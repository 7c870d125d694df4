//! Next-word sequence models.
//!
//! The generator only needs [`SequenceModel::predict`]; training and
//! persistence live on [`TrainableModel`]. [`lstm::LstmModel`] is the
//! candle-backed implementation:
//!
//! ```text
//! word indices [B, W]
//!   → Embedding            [B, W, E]
//!   → BiLSTM × (layers-1)  [B, W, 2U]   (full sequences)
//!   → BiLSTM               [B, 2U]      (final states)
//!   → Linear + softmax     [B, V]
//! ```
//!
//! - [`lstm`] — network, training loop, safetensors persistence
//! - [`early_stopping`] — validation-loss patience tracker

pub mod early_stopping;
pub mod lstm;
#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::catalog::TrainingData;
use crate::config::TrainingConfig;

/// Inference contract: fixed-width index rows in, one distribution per row out.
pub trait SequenceModel {
    /// Width of the index rows the model was trained on.
    fn input_width(&self) -> usize;

    /// Probability distribution over the vocabulary for each row.
    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}

/// Training and persistence contract.
pub trait TrainableModel: SequenceModel {
    /// Fit parameters to `data`, returning per-epoch metrics.
    fn train(&mut self, data: &TrainingData, config: &TrainingConfig) -> Result<TrainingHistory>;

    /// Persist parameters (and whatever metadata reloading needs) to `path`.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Metrics for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

/// Per-epoch metrics of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    pub stopped_early: bool,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Index of the largest probability; ties go to the lowest index.
///
/// Returns `None` for an empty distribution.
pub fn argmax(probs: &[f32]) -> Option<u32> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in probs.iter().enumerate() {
        match best {
            Some((_, b)) if p <= b => {}
            _ if p.is_nan() => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
    }

    #[test]
    fn test_argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[0.25; 4]), Some(0));
    }

    #[test]
    fn test_argmax_empty_and_nan() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, 0.3, f32::NAN]), Some(1));
    }

    #[test]
    fn test_history_last() {
        let mut history = TrainingHistory::default();
        assert!(history.last().is_none());
        history.epochs.push(EpochMetrics {
            epoch: 1,
            loss: 2.5,
            accuracy: 0.1,
            val_loss: Some(2.7),
            val_accuracy: Some(0.05),
        });
        assert_eq!(history.last().map(|m| m.epoch), Some(1));
    }

    #[test]
    fn test_history_json_round_trip_is_exact() {
        let history = TrainingHistory {
            epochs: vec![EpochMetrics {
                epoch: 1,
                loss: 2.9174811289860654,
                accuracy: 0.1111111111111111,
                val_loss: Some(3.0445224377234230),
                val_accuracy: Some(0.0),
            }],
            stopped_early: false,
        };
        let json = serde_json::to_string(&history).unwrap();
        let parsed: TrainingHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }
}
