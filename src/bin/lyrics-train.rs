//! Train one lyric style from its JSON config.
//!
//! Loads the corpus, trains the LSTM with early stopping, saves the weights
//! (plus metadata and per-epoch history) and, when the config asks for it,
//! writes a sample of generated lyrics.
//!
//! Prints a one-line JSON summary to stdout on success:
//!
//! ```json
//! {"model_id":3,"model_path":"models/sonnets.safetensors","epochs":42,"stopped_early":true,"loss":1.93}
//! ```
//!
//! `--sonnets-to-tsv RAW OUT` converts the raw sonnets text into the
//! tab-delimited corpus instead of training.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lyrics_rnn_rs::{
    config::{StyleConfig, load_json},
    registry::preferred_device,
    training::{convert_sonnets_file, train_style},
};

#[derive(Parser, Debug)]
#[command(
    name = "lyrics-train",
    about = "Train a word-level LSTM lyric model for one style"
)]
struct Args {
    /// Style config JSON (corpus, network, training, artifact path).
    #[arg(long, short = 'c', required_unless_present = "sonnets_to_tsv")]
    config: Option<PathBuf>,

    /// Override the number of epochs from the config.
    #[arg(long)]
    epochs: Option<usize>,

    /// CUDA device ordinal. Falls back to CPU when CUDA is unavailable.
    #[arg(long, default_value_t = 0)]
    device: usize,

    /// Force CPU even when CUDA is available.
    #[arg(long, default_value_t = false)]
    cpu: bool,

    /// Convert raw sonnets text to a TSV corpus and exit.
    #[arg(long, num_args = 2, value_names = ["RAW", "OUT"])]
    sonnets_to_tsv: Option<Vec<PathBuf>>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Some(paths) = &args.sonnets_to_tsv
        && let [raw, out] = paths.as_slice()
    {
        let rows = convert_sonnets_file(raw, out)
            .with_context(|| format!("converting {}", raw.display()))?;
        println!("{}", serde_json::json!({ "rows": rows, "output": out }));
        return Ok(());
    }

    let Some(config_path) = args.config else {
        anyhow::bail!("--config is required");
    };
    let mut config: StyleConfig = load_json(&config_path)
        .with_context(|| format!("loading style config {}", config_path.display()))?;
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }

    let device = if args.cpu {
        candle_core::Device::Cpu
    } else {
        preferred_device(args.device)
    };
    tracing::info!("Using device: {:?}", device);
    tracing::info!(style = config.model_id.name(), "Training...");

    let report = train_style(&config, &device).context("training failed")?;

    let last = report.history.last();
    println!(
        "{}",
        serde_json::json!({
            "model_id": config.model_id,
            "model_path": config.model_path,
            "epochs": report.history.epochs.len(),
            "stopped_early": report.history.stopped_early,
            "loss": last.map(|m| m.loss),
            "val_loss": last.and_then(|m| m.val_loss),
        })
    );

    Ok(())
}
