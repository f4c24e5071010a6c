//! Todoist RSS service binary.
//!
//! Serves tasks carrying a label as an RSS feed at `/rss.xml`.
//!
//! # Environment Variables
//!
//! - `TOKEN` - Todoist API token (requests fail with a 500 until it is set)
//! - `LABEL` - Label selecting the tasks (default: `rss`)
//! - `ADDR` - Listen address (default: `:8080`)
//! - `CLOSE_USER_AGENT` - User-Agent marker that closes tasks on read
//! - `RUST_LOG` - Log filter (default: `info`)
//! - `LOG_FORMAT` - `text` or `json`

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use todoist_rss::config::{Config, LogFormat};
use todoist_rss::server::{self, AppState, FeedSettings};
use todoist_rss::{Lifecycle, TodoistClient};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,todoist_rss=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    info!(
        label = %config.label,
        version = env!("CARGO_PKG_VERSION"),
        "Starting todoist-rss"
    );

    if config.token.as_deref().unwrap_or_default().is_empty() {
        warn!("No TOKEN configured - feed requests will fail until it is set");
    }

    let client = TodoistClient::from_config(&config).context("Failed to build Todoist client")?;
    let lifecycle = Lifecycle::new(config.shutdown_grace());

    let state = AppState::new(
        Arc::new(client),
        FeedSettings::from_config(&config),
        lifecycle,
    );

    server::run_server(state, &config.listen_addr()).await
}
