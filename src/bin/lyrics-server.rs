//! Lyrics HTTP service: resident models, JSON in, plain-text lyrics out.
//!
//! Loads every model listed in the server config at startup, then serves
//! requests one at a time.
//!
//! # Endpoints
//!
//! `POST /lyrics-api`:
//! ```json
//! {"model_id": 2, "seed_text": "once upon a midnight", "word_count": 40, "word_group_count": 4}
//! ```
//!
//! `POST /structured-lyrics-api`:
//! ```json
//! {
//!   "model_id": 1,
//!   "independent_sections": false,
//!   "lyrics_sections": [
//!     {"section_type": 1, "word_count": 32, "word_group_count": 4, "seed_text": "green fields"},
//!     {"section_type": 2, "word_count": 16, "word_group_count": 4, "seed_text": ""}
//!   ]
//! }
//! ```
//!
//! Success is `200 text/plain` with the formatted lyrics. Failures carry a
//! JSON body `{"status": 400, "message": "...", "code": "seed_too_long"}`.
//!
//! # Example (shell)
//!
//! ```sh
//! curl -s -X POST localhost:5000/lyrics-api \
//!   -d '{"model_id":2,"seed_text":"a dreary midnight","word_count":24,"word_group_count":4}'
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lyrics_rnn_rs::{
    config::{ServerConfig, load_json},
    registry::{ModelRegistry, preferred_device},
    service::{LyricsService, Reply},
};
use tiny_http::{Header, Response, Server, StatusCode};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "lyrics-server",
    about = "Lyrics generation service: resident models, JSON over HTTP"
)]
struct Args {
    /// Server config JSON (bind address, limits, model artifacts).
    #[arg(long, short = 'c')]
    config: PathBuf,

    /// Override the bind address from the config.
    #[arg(long)]
    bind: Option<String>,

    /// CUDA device ordinal. Falls back to CPU when CUDA is unavailable.
    #[arg(long, default_value_t = 0)]
    device: usize,

    /// Force CPU even when CUDA is available.
    #[arg(long, default_value_t = false)]
    cpu: bool,
}

// ── Transport ────────────────────────────────────────────────────────────────

fn to_response(reply: Reply) -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_string(reply.body).with_status_code(StatusCode(reply.status));
    match Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config: ServerConfig = load_json(&args.config)
        .with_context(|| format!("loading server config {}", args.config.display()))?;
    if config.models.is_empty() {
        anyhow::bail!("server config lists no models");
    }

    let device = if args.cpu {
        candle_core::Device::Cpu
    } else {
        preferred_device(args.device)
    };
    tracing::info!("Using device: {:?}", device);

    let registry =
        ModelRegistry::load(&config.models, &device).context("failed to load models")?;
    let service = LyricsService::new(registry, config.limits);

    let bind = args.bind.unwrap_or(config.bind);
    let server = Server::http(&bind)
        .map_err(|e| anyhow::anyhow!("failed to bind {bind}: {e}"))?;
    tracing::info!(%bind, models = service.registry().len(), "listening");

    for mut request in server.incoming_requests() {
        let method = request.method().to_string();
        let url = request.url().to_string();

        let mut body = String::new();
        let reply = if let Err(e) = request.as_reader().read_to_string(&mut body) {
            tracing::warn!(%url, error = %e, "failed to read request body");
            Reply::error(400, format!("failed to read request body: {e}"), None)
        } else {
            service.handle(&method, &url, &body)
        };

        if let Err(e) = request.respond(to_response(reply)) {
            tracing::warn!(%url, error = %e, "failed to send response");
        }
    }

    Ok(())
}
