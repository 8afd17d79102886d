use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use visit_scribe::{create_router, AppState, Config, Reaper};

#[derive(Debug, Parser)]
#[command(name = "visit-scribe", about = "Clinical visit recording and live transcription service")]
struct Args {
    /// Configuration file to load (extension optional)
    #[arg(long, default_value = "config/visit-scribe")]
    config: String,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    match &cfg.transcribe.nats_url {
        Some(url) => info!("Streaming STT service configured at {}", url),
        None => info!("No STT service configured; sessions will run on the demo backend"),
    }

    tokio::fs::create_dir_all(&cfg.media.upload_dir).await?;

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(cfg);

    Reaper::new(Arc::clone(&state.registry)).spawn();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
