//! Configuration for the feed service.
//!
//! Every setting can be passed as a flag or through the environment; the
//! environment names match the ones the service has always read (`TOKEN`,
//! `LABEL`, `ADDR`).

use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Default Todoist REST base for listing tasks.
pub const DEFAULT_API_URL: &str = "https://api.todoist.com/api/v1";

/// Default Todoist REST base for closing tasks.
pub const DEFAULT_CLOSE_URL: &str = "https://todoist.com/api/v1";

/// Default base of the Todoist web app, used for fallback item links.
pub const DEFAULT_WEB_APP_URL: &str = "https://app.todoist.com/app";

/// Default timeout for each Todoist API request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// User-agent marker of the reader whose fetches count as "read".
pub const DEFAULT_CLOSE_USER_AGENT: &str = "+https://miniflux.app";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Feed service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "todoist-rss")]
#[command(about = "Serve labeled Todoist tasks as an RSS feed")]
#[command(version)]
pub struct Config {
    /// Todoist API token (or set `TOKEN` env var)
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Label selecting which tasks appear in the feed
    #[arg(long, env = "LABEL", default_value = "rss")]
    pub label: String,

    /// Listen address; `:port` binds all interfaces
    #[arg(long, env = "ADDR", default_value = ":8080")]
    pub addr: String,

    /// Substring of the User-Agent that triggers close-on-read
    #[arg(long, env = "CLOSE_USER_AGENT", default_value = DEFAULT_CLOSE_USER_AGENT)]
    pub close_user_agent: String,

    /// Todoist API base used to list tasks
    #[arg(long, env = "TODOIST_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Todoist API base used to close tasks
    #[arg(long, env = "TODOIST_CLOSE_URL", default_value = DEFAULT_CLOSE_URL)]
    pub close_url: String,

    /// Todoist web app base for items without an explicit link
    #[arg(long, env = "TODOIST_WEB_APP_URL", default_value = DEFAULT_WEB_APP_URL)]
    pub web_app_url: String,

    /// Timeout for each Todoist API request, in seconds
    #[arg(long, env = "TODOIST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Time allowed for in-flight work after a shutdown signal, in seconds
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Socket address to bind, with a bare `:port` expanded to all interfaces.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        }
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
