//! End-to-end training of one style: corpus → artifact → sample lyrics.
//!
//! Also hosts the sonnet converter that turns the raw sonnets text into the
//! tab-delimited corpus the Shakespeare style trains on.

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use candle_core::Device;

use crate::catalog::Catalog;
use crate::config::StyleConfig;
use crate::formatter::format_lyrics;
use crate::generator::TextGenerator;
use crate::model::lstm::{LstmModel, ModelMeta};
use crate::model::{TrainableModel, TrainingHistory};
use crate::validation::GenerationLimits;
use crate::{Error, Result};

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub catalog_lines: usize,
    pub vocabulary_size: usize,
    pub training_pairs: usize,
    pub history: TrainingHistory,
    pub history_path: PathBuf,
    /// Formatted sample lyrics, when the style asks for them.
    pub sample: Option<String>,
}

/// Path of the per-epoch history JSON written next to `model_path`.
pub fn history_path_for(model_path: &Path) -> PathBuf {
    model_path.with_extension("history.json")
}

/// Build the catalog for `config`, train a fresh model, save it with its
/// metadata and history, and write the sample lyrics file if configured.
pub fn train_style(config: &StyleConfig, device: &Device) -> Result<TrainingReport> {
    let style = config.model_id.name();

    let mut catalog = Catalog::new();
    for source in &config.corpus {
        source.load_into(&mut catalog)?;
    }
    tracing::info!(style, lines = catalog.len(), "corpus loaded");

    let data = catalog.tokenize(config.padding)?;
    tracing::info!(
        style,
        vocabulary = data.vocabulary_size(),
        pairs = data.rows(),
        input_width = data.input_width(),
        "training data ready"
    );

    let mut model = LstmModel::new(ModelMeta::for_training_data(config.network, &data), device)?;
    let history = model.train(&data, &config.training)?;
    model.save(&config.model_path)?;
    tracing::info!(style, path = ?config.model_path, "model saved");

    let history_path = history_path_for(&config.model_path);
    fs::write(&history_path, serde_json::to_string_pretty(&history)?)?;

    let sample = match &config.sample {
        Some(sample) => {
            let generator = TextGenerator::new(
                &model,
                model.vocabulary(),
                config.padding,
                GenerationLimits::default(),
            );
            let text = generator.generate(
                &sample.seed_text,
                sample.word_group_count,
                sample.words_to_generate,
            )?;
            let lyrics = format_lyrics(&text, sample.word_group_count);
            if let Some(parent) = sample.output_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            fs::write(&sample.output_path, &lyrics)?;
            tracing::info!(style, path = ?sample.output_path, "sample lyrics written");
            Some(lyrics)
        }
        None => None,
    };

    Ok(TrainingReport {
        catalog_lines: catalog.len(),
        vocabulary_size: data.vocabulary_size(),
        training_pairs: data.rows(),
        history,
        history_path,
        sample,
    })
}

// ── Sonnet conversion ───────────────────────────────────────────────────

/// Header row of the sonnets corpus.
pub const SONNETS_HEADER: &str = "TEXT\tSONNET NUMBER\tLINE";

/// Trimmed lines shorter than this are sonnet numbers, not verse.
const SONNET_MARKER_MAX_LEN: usize = 10;

/// Convert raw sonnets text into `TEXT\tSONNET NUMBER\tLINE` rows.
///
/// Blank lines are skipped; a short line (a numeral) starts the next sonnet
/// and resets the line counter. Returns the number of verse rows written.
pub fn sonnets_to_tsv<R: BufRead, W: Write>(input: R, mut output: W) -> Result<usize> {
    writeln!(output, "{SONNETS_HEADER}")?;
    let mut sonnet = 0usize;
    let mut line_number = 0usize;
    let mut rows = 0;
    for line in input.lines() {
        let line = line?;
        let clean = line.trim();
        if clean.is_empty() {
            continue;
        }
        if clean.chars().count() < SONNET_MARKER_MAX_LEN {
            sonnet += 1;
            line_number = 0;
            continue;
        }
        line_number += 1;
        writeln!(output, "{clean}\t{sonnet}\t{line_number}")?;
        rows += 1;
    }
    output.flush()?;
    Ok(rows)
}

/// File-to-file wrapper around [`sonnets_to_tsv`].
pub fn convert_sonnets_file(input: &Path, output: &Path) -> Result<usize> {
    let reader = fs::File::open(input)
        .map(BufReader::new)
        .map_err(|e| Error::Catalog(format!("cannot open {}: {e}", input.display())))?;
    let writer = BufWriter::new(fs::File::create(output)?);
    let rows = sonnets_to_tsv(reader, writer)?;
    tracing::info!(rows, input = ?input, output = ?output, "sonnets converted");
    Ok(rows)
}
