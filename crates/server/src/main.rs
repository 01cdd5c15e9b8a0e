use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use view_engine::ViewEngine;

mod api;
mod app_state;
mod config;
mod cors;

use api::build_router;
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let engine = ViewEngine::with_universe_size(settings.universe_size)
        .context("failed to generate item universe")?;
    info!(items = engine.universe().len(), "item universe generated");

    let app = build_router(Arc::new(AppState::new(engine)), &settings);

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
