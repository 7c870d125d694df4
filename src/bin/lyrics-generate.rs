//! Generate lyrics from a trained model on the command line.
//!
//! Single block:
//!
//! ```sh
//! lyrics-generate -m models/poe.safetensors -s "once upon a midnight" -n 48 -g 4
//! ```
//!
//! Structured, one `--section TYPE:WORDS:GROUP:SEED` per section (TYPE is a
//! section name such as `verse` or `pre_chorus`, or its number):
//!
//! ```sh
//! lyrics-generate -m models/irish.safetensors \
//!   --section "verse:32:4:green fields" --section "chorus:16:4:" --independent
//! ```
//!
//! Formatted lyrics go to stdout, or to `--output` when given.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lyrics_rnn_rs::{
    formatter::format_lyrics,
    generator::TextGenerator,
    model::lstm::LstmModel,
    registry::preferred_device,
    section::{LyricsSection, SectionType},
    validation::GenerationLimits,
};

#[derive(Parser, Debug)]
#[command(
    name = "lyrics-generate",
    about = "Generate lyrics from a trained LSTM lyric model"
)]
struct Args {
    /// Model weights (.safetensors); metadata is read from the .json beside it.
    #[arg(long, short = 'm')]
    model: PathBuf,

    /// Seed text for single-block generation.
    #[arg(long, short = 's', default_value = "")]
    seed: String,

    /// Total words, seed included.
    #[arg(long, short = 'n', default_value_t = 100)]
    words: usize,

    /// Words per line; two lines make a stanza.
    #[arg(long, short = 'g', default_value_t = 4)]
    group: usize,

    /// Structured section `TYPE:WORDS:GROUP:SEED`. Repeat for more sections.
    #[arg(long = "section")]
    sections: Vec<String>,

    /// Generate each section from its own seed only.
    #[arg(long, default_value_t = false)]
    independent: bool,

    /// Write lyrics here instead of stdout.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Force CPU even when CUDA is available.
    #[arg(long, default_value_t = false)]
    cpu: bool,
}

fn parse_section_type(raw: &str) -> anyhow::Result<SectionType> {
    if let Ok(n) = raw.parse::<u32>() {
        return Ok(SectionType::try_from(n)?);
    }
    let upper = raw.to_ascii_uppercase().replace('-', "_");
    (1..=6)
        .filter_map(|n| SectionType::try_from(n).ok())
        .find(|t| t.label() == upper)
        .with_context(|| format!("unknown section type '{raw}'"))
}

fn parse_section(index: usize, spec: &str) -> anyhow::Result<LyricsSection> {
    let mut parts = spec.splitn(4, ':');
    let (Some(kind), Some(words), Some(group)) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("section '{spec}' is not TYPE:WORDS:GROUP:SEED");
    };
    let seed = parts.next().unwrap_or("");
    Ok(LyricsSection::new(
        index,
        parse_section_type(kind)?,
        words
            .parse()
            .with_context(|| format!("bad word count in '{spec}'"))?,
        group
            .parse()
            .with_context(|| format!("bad word group count in '{spec}'"))?,
        seed,
    ))
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

    let device = if args.cpu {
        candle_core::Device::Cpu
    } else {
        preferred_device(0)
    };
    tracing::info!("Using device: {:?}", device);

    let model = LstmModel::load(&args.model, &device)
        .with_context(|| format!("failed to load model {}", args.model.display()))?;
    let generator = TextGenerator::new(
        &model,
        model.vocabulary(),
        model.meta().padding,
        GenerationLimits::default(),
    );

    let lyrics = if args.sections.is_empty() {
        let text = generator.generate(&args.seed, args.group, args.words)?;
        format_lyrics(&text, args.group)
    } else {
        let mut sections = args
            .sections
            .iter()
            .enumerate()
            .map(|(i, spec)| parse_section(i, spec))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if args.independent {
            generator.generate_independent_sections(&mut sections)?
        } else {
            generator.generate_cumulative_sections(&mut sections)?
        }
    };

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &lyrics)?;
            tracing::info!("Wrote lyrics to {}", path.display());
        }
        None => print!("{lyrics}"),
    }

    Ok(())
}
