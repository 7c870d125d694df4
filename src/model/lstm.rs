//! Embedding + bidirectional LSTM + dense softmax next-word model.
//!
//! Weights live in a [`VarMap`] and are persisted as safetensors. A JSON
//! [`ModelMeta`] sidecar (same stem, `.json` extension) records the network
//! shape, vocabulary and padding so an artifact is self-describing.

use std::path::{Path, PathBuf};

use candle_core::{D, DType, Device, Module, Tensor};
use candle_nn::{
    AdamW, Embedding, LSTM, LSTMConfig, Linear, Optimizer, ParamsAdamW, RNN, VarBuilder, VarMap,
};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::early_stopping::EarlyStopping;
use super::{EpochMetrics, SequenceModel, TrainableModel, TrainingHistory};
use crate::catalog::{Padding, TrainingData};
use crate::config::{NetworkConfig, TrainingConfig};
use crate::vocab::Vocabulary;
use crate::{Error, Result};

/// Everything besides the weights needed to rebuild and use a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub network: NetworkConfig,
    pub vocabulary: Vocabulary,
    /// Feature width (max sequence length − 1).
    pub input_width: usize,
    pub padding: Padding,
}

impl ModelMeta {
    /// Metadata for a model trained on `data`.
    pub fn for_training_data(network: NetworkConfig, data: &TrainingData) -> Self {
        Self {
            network,
            vocabulary: data.vocabulary.clone(),
            input_width: data.input_width(),
            padding: data.padding,
        }
    }

    /// Sidecar path for a weights file.
    pub fn path_for(weights_path: &Path) -> PathBuf {
        weights_path.with_extension("json")
    }
}

/// One bidirectional LSTM layer: a forward and a backward cell.
struct BiLstm {
    forward: LSTM,
    backward: LSTM,
}

impl BiLstm {
    fn new(in_dim: usize, units: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            forward: candle_nn::lstm(in_dim, units, LSTMConfig::default(), vb.pp("forward"))?,
            backward: candle_nn::lstm(in_dim, units, LSTMConfig::default(), vb.pp("backward"))?,
        })
    }

    /// `[B, T, F]` → `[B, T, 2U]`, backward outputs re-aligned to forward time.
    fn sequence(&self, xs: &Tensor) -> Result<Tensor> {
        let fwd = self.forward.states_to_tensor(&self.forward.seq(xs)?)?;
        let bwd = self
            .backward
            .states_to_tensor(&self.backward.seq(&reverse_time(xs)?)?)?;
        Ok(Tensor::cat(&[&fwd, &reverse_time(&bwd)?], 2)?)
    }

    /// `[B, T, F]` → `[B, 2U]`: final hidden state of each direction.
    fn last(&self, xs: &Tensor) -> Result<Tensor> {
        let fwd = self.forward.seq(xs)?;
        let bwd = self.backward.seq(&reverse_time(xs)?)?;
        match (fwd.last(), bwd.last()) {
            (Some(f), Some(b)) => Ok(Tensor::cat(&[f.h(), b.h()], 1)?),
            _ => Err(Error::Config("LSTM input has no time steps".into())),
        }
    }
}

/// Reverse a `[B, T, ...]` tensor along the time axis.
fn reverse_time(xs: &Tensor) -> Result<Tensor> {
    let t = xs.dim(1)?;
    let idx: Vec<u32> = (0..t as u32).rev().collect();
    let idx = Tensor::from_vec(idx, t, xs.device())?;
    Ok(xs.index_select(&idx, 1)?)
}

/// Mean categorical cross-entropy of `logits` against one-hot `targets`.
fn categorical_cross_entropy(logits: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let log_probs = candle_nn::ops::log_softmax(logits, D::Minus1)?;
    Ok(targets.mul(&log_probs)?.sum(D::Minus1)?.neg()?.mean_all()?)
}

/// Fraction of rows whose argmax matches the one-hot target.
fn accuracy(logits: &Tensor, targets: &Tensor) -> Result<f64> {
    let predicted = logits.argmax(D::Minus1)?;
    let expected = targets.argmax(D::Minus1)?;
    let hits = predicted
        .eq(&expected)?
        .to_dtype(DType::F32)?
        .mean_all()?
        .to_scalar::<f32>()?;
    Ok(hits as f64)
}

/// Candle-backed next-word model.
pub struct LstmModel {
    varmap: VarMap,
    embedding: Embedding,
    layers: Vec<BiLstm>,
    output: Linear,
    meta: ModelMeta,
    device: Device,
}

impl LstmModel {
    /// Build a freshly initialised model.
    pub fn new(meta: ModelMeta, device: &Device) -> Result<Self> {
        let net = meta.network;
        if net.lstm_layers == 0 {
            return Err(Error::Config("lstm_layers must be at least 1".into()));
        }
        if meta.input_width == 0 {
            return Err(Error::Config("input_width must be at least 1".into()));
        }
        let vocab_size = meta.vocabulary.size();

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let embedding = candle_nn::embedding(vocab_size, net.embedding_dim, vb.pp("embedding"))?;
        let mut layers = Vec::with_capacity(net.lstm_layers);
        for i in 0..net.lstm_layers {
            let in_dim = if i == 0 {
                net.embedding_dim
            } else {
                2 * net.lstm_units
            };
            layers.push(BiLstm::new(in_dim, net.lstm_units, vb.pp(format!("lstm{i}")))?);
        }
        let output = candle_nn::linear(2 * net.lstm_units, vocab_size, vb.pp("output"))?;

        tracing::debug!(
            vocab_size,
            embedding_dim = net.embedding_dim,
            lstm_units = net.lstm_units,
            lstm_layers = net.lstm_layers,
            input_width = meta.input_width,
            "Built LSTM model"
        );

        Ok(Self {
            varmap,
            embedding,
            layers,
            output,
            meta,
            device: device.clone(),
        })
    }

    /// Load weights from `path` and metadata from its `.json` sidecar.
    pub fn load(path: impl AsRef<Path>, device: &Device) -> Result<Self> {
        let path = path.as_ref();
        let meta_path = ModelMeta::path_for(path);
        tracing::info!("Loading model metadata from {:?}", meta_path);
        let meta_json = std::fs::read_to_string(&meta_path)
            .map_err(|e| Error::WeightLoad(format!("{}: {e}", meta_path.display())))?;
        let meta: ModelMeta = serde_json::from_str(&meta_json)
            .map_err(|e| Error::WeightLoad(format!("{}: {e}", meta_path.display())))?;

        let mut model = Self::new(meta, device)?;
        tracing::info!("Loading model weights from {:?}", path);
        model
            .varmap
            .load(path)
            .map_err(|e| Error::WeightLoad(format!("{}: {e}", path.display())))?;
        Ok(model)
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.meta.vocabulary
    }

    /// Unnormalised scores `[B, V]` for index rows `[B, W]`.
    fn logits(&self, xs: &Tensor) -> Result<Tensor> {
        let mut hidden = self.embedding.forward(xs)?;
        let (last, stacked) = match self.layers.split_last() {
            Some(split) => split,
            None => return Err(Error::Config("model has no LSTM layers".into())),
        };
        for layer in stacked {
            hidden = layer.sequence(&hidden)?;
        }
        let hidden = last.last(&hidden)?;
        Ok(self.output.forward(&hidden)?)
    }

    /// Mean loss and accuracy over `rows`, evaluated in batches.
    fn evaluate(&self, data: &TrainingData, rows: &[usize], batch_size: usize) -> Result<(f64, f64)> {
        let mut loss_sum = 0.0;
        let mut acc_sum = 0.0;
        for batch in rows.chunks(batch_size) {
            let xs = data.features_tensor(batch, &self.device)?;
            let ys = data.labels_one_hot(batch, &self.device)?;
            let logits = self.logits(&xs)?;
            let loss = categorical_cross_entropy(&logits, &ys)?.to_scalar::<f32>()? as f64;
            loss_sum += loss * batch.len() as f64;
            acc_sum += accuracy(&logits, &ys)? * batch.len() as f64;
        }
        let n = rows.len().max(1) as f64;
        Ok((loss_sum / n, acc_sum / n))
    }
}

impl SequenceModel for LstmModel {
    fn input_width(&self) -> usize {
        self.meta.input_width
    }

    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let width = self.meta.input_width;
        let flat: Vec<u32> = batch
            .iter()
            .flat_map(|row| self.meta.padding.apply(row, width))
            .collect();
        let xs = Tensor::from_vec(flat, (batch.len(), width), &self.device)?;
        let probs = candle_nn::ops::softmax_last_dim(&self.logits(&xs)?)?;
        Ok(probs.to_device(&Device::Cpu)?.to_vec2::<f32>()?)
    }
}

impl TrainableModel for LstmModel {
    fn train(&mut self, data: &TrainingData, config: &TrainingConfig) -> Result<TrainingHistory> {
        config.validate()?;
        if data.vocabulary_size() != self.meta.vocabulary.size()
            || data.input_width() != self.meta.input_width
        {
            return Err(Error::Config(format!(
                "training data shape (vocab {}, width {}) does not match model (vocab {}, width {})",
                data.vocabulary_size(),
                data.input_width(),
                self.meta.vocabulary.size(),
                self.meta.input_width
            )));
        }

        let rows = data.rows();
        let mut rng = ChaCha8Rng::seed_from_u64(config.random_state);
        let mut order: Vec<usize> = (0..rows).collect();
        order.shuffle(&mut rng);
        let holdout = holdout_rows(rows, config.validation_split);
        let (valid, train) = order.split_at(holdout);
        let mut train = train.to_vec();

        tracing::info!(
            train_rows = train.len(),
            validation_rows = valid.len(),
            epochs = config.epochs,
            "Training LSTM model"
        );

        let params = ParamsAdamW {
            lr: config.learning_rate,
            weight_decay: 0.0,
            ..Default::default()
        };
        let mut optimizer = AdamW::new(self.varmap.all_vars(), params)?;
        let mut stopper = EarlyStopping::new(config.patience, config.min_delta);
        let mut history = TrainingHistory::default();

        for epoch in 1..=config.epochs {
            let started = std::time::Instant::now();
            train.shuffle(&mut rng);

            let mut loss_sum = 0.0;
            let mut acc_sum = 0.0;
            for batch in train.chunks(config.batch_size) {
                let xs = data.features_tensor(batch, &self.device)?;
                let ys = data.labels_one_hot(batch, &self.device)?;
                let logits = self.logits(&xs)?;
                let loss = categorical_cross_entropy(&logits, &ys)?;
                optimizer.backward_step(&loss)?;
                loss_sum += loss.to_scalar::<f32>()? as f64 * batch.len() as f64;
                acc_sum += accuracy(&logits, &ys)? * batch.len() as f64;
            }
            let n = train.len().max(1) as f64;
            let (loss, acc) = (loss_sum / n, acc_sum / n);

            let (val_loss, val_accuracy) = if valid.is_empty() {
                (None, None)
            } else {
                let (l, a) = self.evaluate(data, valid, config.batch_size)?;
                (Some(l), Some(a))
            };

            tracing::info!(
                epoch,
                loss,
                accuracy = acc,
                val_loss = ?val_loss,
                val_accuracy = ?val_accuracy,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "epoch done"
            );
            history.epochs.push(EpochMetrics {
                epoch,
                loss,
                accuracy: acc,
                val_loss,
                val_accuracy,
            });

            if stopper.observe(val_loss.unwrap_or(loss)) {
                tracing::info!(
                    epoch,
                    best = stopper.best(),
                    "validation loss stopped improving, stopping early"
                );
                history.stopped_early = true;
                break;
            }
        }

        Ok(history)
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        self.varmap.save(path)?;
        let meta_path = ModelMeta::path_for(path);
        std::fs::write(&meta_path, serde_json::to_string_pretty(&self.meta)?)?;
        tracing::info!("Saved model to {:?} (metadata {:?})", path, meta_path);
        Ok(())
    }
}

/// Rows held out for validation. The training share is rounded down, so any
/// non-zero split holds out at least one row; one row is always left for
/// training.
fn holdout_rows(rows: usize, split: f64) -> usize {
    let train = (rows as f64 * (1.0 - split)).floor() as usize;
    rows.saturating_sub(train).min(rows.saturating_sub(1))
}
