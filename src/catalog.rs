//! Corpus catalog: raw lines in, vocabulary and n-gram training pairs out.
//!
//! Each tokenized line `w0 w1 ... w(L-1)` yields `L - 1` supervised pairs:
//!
//! ```text
//! [w0]            -> w1
//! [w0 w1]         -> w2
//! ...
//! [w0 .. w(L-2)]  -> w(L-1)
//! ```
//!
//! Features are padded with [`PAD_INDEX`] to a common width of
//! `max_sequence_length - 1`, where `max_sequence_length` is the longest
//! tokenized line in the corpus.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};

use crate::vocab::{PAD_INDEX, Vocabulary};
use crate::{Error, Result};

/// Which side of a short sequence receives padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    #[default]
    Pre,
    Post,
}

impl Padding {
    /// Fit `indices` to exactly `width` entries.
    ///
    /// Long sequences keep their most recent `width` indices; short ones are
    /// filled with [`PAD_INDEX`] on this side.
    pub fn apply(self, indices: &[u32], width: usize) -> Vec<u32> {
        let kept = &indices[indices.len().saturating_sub(width)..];
        let fill = width - kept.len();
        let mut out = Vec::with_capacity(width);
        if self == Padding::Pre {
            out.extend(std::iter::repeat_n(PAD_INDEX, fill));
        }
        out.extend_from_slice(kept);
        if self == Padding::Post {
            out.extend(std::iter::repeat_n(PAD_INDEX, fill));
        }
        out
    }
}

/// Supervised data produced by [`Catalog::tokenize`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    pub vocabulary: Vocabulary,
    /// Longest tokenized line; feature width is one less.
    pub max_sequence_length: usize,
    pub padding: Padding,
    /// Row-major `[rows, input_width]` feature matrix.
    pub features: Vec<u32>,
    /// Next-word index per row.
    pub labels: Vec<u32>,
}

impl TrainingData {
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.size()
    }

    /// Width of every feature row.
    pub fn input_width(&self) -> usize {
        self.max_sequence_length - 1
    }

    pub fn rows(&self) -> usize {
        self.labels.len()
    }

    /// Feature row `i`.
    pub fn feature(&self, i: usize) -> &[u32] {
        let w = self.input_width();
        &self.features[i * w..(i + 1) * w]
    }

    /// Features for the given rows as a `[rows.len(), input_width]` u32 tensor.
    pub fn features_tensor(&self, rows: &[usize], device: &Device) -> Result<Tensor> {
        let w = self.input_width();
        let mut flat = Vec::with_capacity(rows.len() * w);
        for &r in rows {
            flat.extend_from_slice(self.feature(r));
        }
        Ok(Tensor::from_vec(flat, (rows.len(), w), device)?)
    }

    /// One-hot labels for the given rows as a `[rows.len(), vocabulary_size]` f32 tensor.
    pub fn labels_one_hot(&self, rows: &[usize], device: &Device) -> Result<Tensor> {
        let indices: Vec<u32> = rows.iter().map(|&r| self.labels[r]).collect();
        let indices = Tensor::from_vec(indices, rows.len(), device)?;
        Ok(candle_nn::encoding::one_hot(
            indices,
            self.vocabulary_size(),
            1f32,
            0f32,
        )?)
    }
}

/// A corpus of lower-cased text lines.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append one line of text.
    pub fn add_line(&mut self, text: &str) {
        self.items.push(text.to_lowercase());
    }

    /// Append every line of a plain text file.
    pub fn add_text_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let before = self.items.len();
        for line in reader.lines() {
            self.add_line(&line?);
        }
        tracing::info!(
            "Added {} lines from {:?}",
            self.items.len() - before,
            path
        );
        Ok(())
    }

    /// Append column `text_column` (0-based) of every row of a delimited file.
    pub fn add_delimited_file(
        &mut self,
        path: impl AsRef<Path>,
        text_column: usize,
        delimiter: char,
        skip_header: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut rows = Vec::new();
        for (row, line) in reader.lines().enumerate() {
            let line = line?;
            if skip_header && row == 0 {
                continue;
            }
            let field = line.split(delimiter).nth(text_column).ok_or_else(|| {
                Error::Catalog(format!(
                    "{}: row {} has no column {text_column}",
                    path.display(),
                    row + 1
                ))
            })?;
            rows.push(field.to_lowercase());
        }
        tracing::info!("Added {} rows from {:?}", rows.len(), path);
        self.items.extend(rows);
        Ok(())
    }

    /// Build the vocabulary and the padded n-gram training pairs.
    pub fn tokenize(&self, padding: Padding) -> Result<TrainingData> {
        if self.items.is_empty() {
            return Err(Error::EmptyCorpus("catalog has no lines".into()));
        }

        let vocabulary = Vocabulary::build(self.items.iter().map(String::as_str));

        // (prefix, next word) for every cut point of every line
        let mut pairs: Vec<(&[u32], u32)> = Vec::new();
        let encoded: Vec<Vec<u32>> = self.items.iter().map(|i| vocabulary.encode(i)).collect();
        for tokens in &encoded {
            for end in 1..tokens.len() {
                pairs.push((&tokens[..end], tokens[end]));
            }
        }

        let Some(width) = pairs.iter().map(|(prefix, _)| prefix.len()).max() else {
            return Err(Error::EmptyCorpus(format!(
                "none of the {} lines has more than one word",
                self.items.len()
            )));
        };
        let max_sequence_length = width + 1;

        let mut features = Vec::with_capacity(pairs.len() * width);
        let mut labels = Vec::with_capacity(pairs.len());
        for (prefix, label) in pairs {
            features.extend(padding.apply(prefix, width));
            labels.push(label);
        }

        tracing::info!(
            lines = self.items.len(),
            vocabulary_size = vocabulary.size(),
            pairs = labels.len(),
            max_sequence_length,
            "Tokenized catalog"
        );

        Ok(TrainingData {
            vocabulary,
            max_sequence_length,
            padding,
            features,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn hello_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.add_line("hello world");
        catalog.add_line("Hello there world");
        catalog
    }

    #[test]
    fn test_padding_pre_and_post() {
        assert_eq!(Padding::Pre.apply(&[5, 6], 4), vec![0, 0, 5, 6]);
        assert_eq!(Padding::Post.apply(&[5, 6], 4), vec![5, 6, 0, 0]);
    }

    #[test]
    fn test_padding_truncates_to_most_recent() {
        assert_eq!(Padding::Pre.apply(&[1, 2, 3, 4, 5], 3), vec![3, 4, 5]);
        assert_eq!(Padding::Post.apply(&[1, 2, 3, 4, 5], 3), vec![3, 4, 5]);
        assert_eq!(Padding::Pre.apply(&[], 2), vec![0, 0]);
    }

    #[test]
    fn test_tokenize_hello_world() {
        let data = hello_catalog().tokenize(Padding::Pre).unwrap();
        assert_eq!(data.vocabulary_size(), 5);
        assert_eq!(data.max_sequence_length, 3);
        assert_eq!(data.input_width(), 2);
        assert_eq!(data.rows(), 3);
        // hello=1 world=2 there=3
        assert_eq!(data.features, vec![0, 1, 0, 1, 1, 3]);
        assert_eq!(data.labels, vec![2, 3, 2]);
    }

    #[test]
    fn test_tokenize_post_padding() {
        let data = hello_catalog().tokenize(Padding::Post).unwrap();
        assert_eq!(data.features, vec![1, 0, 1, 0, 1, 3]);
        assert_eq!(data.labels, vec![2, 3, 2]);
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let a = hello_catalog().tokenize(Padding::Pre).unwrap();
        let b = hello_catalog().tokenize(Padding::Pre).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tokenize_empty_catalog_fails() {
        let err = Catalog::new().tokenize(Padding::Pre).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus(_)));
    }

    #[test]
    fn test_tokenize_single_word_lines_fail() {
        let mut catalog = Catalog::new();
        catalog.add_line("nevermore");
        catalog.add_line("");
        catalog.add_line("  raven!  ");
        let err = catalog.tokenize(Padding::Pre).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus(_)));
    }

    #[test]
    fn test_labels_one_hot() {
        let data = hello_catalog().tokenize(Padding::Pre).unwrap();
        let one_hot = data.labels_one_hot(&[0, 1], &Device::Cpu).unwrap();
        assert_eq!(one_hot.dims(), &[2, 5]);
        let rows: Vec<Vec<f32>> = one_hot.to_vec2().unwrap();
        assert_eq!(rows[0], vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(rows[1], vec![0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_features_tensor_selects_rows() {
        let data = hello_catalog().tokenize(Padding::Pre).unwrap();
        let t = data.features_tensor(&[2, 0], &Device::Cpu).unwrap();
        let rows: Vec<Vec<u32>> = t.to_vec2().unwrap();
        assert_eq!(rows, vec![vec![1, 3], vec![0, 1]]);
    }

    #[test]
    fn test_add_text_file_lowercases_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "I Wish To See").unwrap();
        writeln!(file, "Green Fields Once More").unwrap();
        let mut catalog = Catalog::new();
        catalog.add_text_file(file.path()).unwrap();
        assert_eq!(catalog.items(), &["i wish to see", "green fields once more"]);
    }

    #[test]
    fn test_add_text_file_missing() {
        let mut catalog = Catalog::new();
        let err = catalog.add_text_file("/nonexistent/lyrics.txt").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_add_delimited_file_skips_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TEXT\tSONNET NUMBER\tLINE").unwrap();
        writeln!(file, "From fairest creatures we desire increase,\t1\t1").unwrap();
        writeln!(file, "That thereby beauty's rose might never die,\t1\t2").unwrap();
        let mut catalog = Catalog::new();
        catalog.add_delimited_file(file.path(), 0, '\t', true).unwrap();
        assert_eq!(
            catalog.items(),
            &[
                "from fairest creatures we desire increase,",
                "that thereby beauty's rose might never die,"
            ]
        );
    }

    #[test]
    fn test_add_delimited_file_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tb").unwrap();
        writeln!(file, "only one").unwrap();
        let mut catalog = Catalog::new();
        let err = catalog
            .add_delimited_file(file.path(), 1, '\t', false)
            .unwrap_err();
        assert!(err.to_string().contains("row 2 has no column 1"), "{err}");
        // Nothing from the failed file is kept.
        assert!(catalog.is_empty());
    }
}
