mod error;
mod routes;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use ration_world::load_content_with_overrides;
use routes::make_router_with_cors;
use state::AppState;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ration_daemon", about = "HTTP service for NRC ration calculations")]
struct Args {
    #[arg(long, default_value_t = 3001)]
    port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    bind: std::net::IpAddr,
    #[arg(long, default_value = "./content")]
    content_dir: String,
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
    /// Computed rations kept in memory for GET /api/v1/rations.
    #[arg(long, default_value_t = 100)]
    history_limit: usize,
    /// JSON object of constant overrides.
    #[arg(long)]
    overrides: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let content = load_content_with_overrides(&args.content_dir, args.overrides.as_deref())?;
    let state = AppState::new(content, args.history_limit);
    let app = make_router_with_cors(state, &args.cors_origin)?;

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, content_dir = %args.content_dir, "ration_daemon listening");
    axum::serve(listener, app).await.context("serving HTTP")?;
    Ok(())
}
