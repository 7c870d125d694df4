//! Deterministic sequence models for tests.

use super::SequenceModel;
use crate::Result;

/// Predicts the word after the last non-padding index, cycling through the
/// real words `1..=words`. An all-padding row predicts word 1.
pub struct CycleModel {
    pub words: u32,
    pub width: usize,
}

impl SequenceModel for CycleModel {
    fn input_width(&self) -> usize {
        self.width
    }

    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        Ok(batch
            .iter()
            .map(|row| {
                let last = row.iter().rev().find(|&&i| i != 0).copied().unwrap_or(0);
                let next = if last == 0 || last > self.words {
                    1
                } else {
                    last % self.words + 1
                };
                let mut probs = vec![0.0; self.words as usize + 2];
                probs[next as usize] = 1.0;
                probs
            })
            .collect())
    }
}

/// Always puts all probability mass on one fixed index.
pub struct FixedModel {
    pub index: u32,
    pub size: usize,
    pub width: usize,
}

impl SequenceModel for FixedModel {
    fn input_width(&self) -> usize {
        self.width
    }

    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        let mut probs = vec![0.0; self.size];
        if let Some(p) = probs.get_mut(self.index as usize) {
            *p = 1.0;
        }
        Ok(vec![probs; batch.len()])
    }
}
