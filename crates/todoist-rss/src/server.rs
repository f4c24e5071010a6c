//! HTTP server for the task feed.
//!
//! Provides:
//! - `GET /rss.xml` - labeled tasks as RSS, closing them when the known reader fetched them
//! - `GET /health` - liveness check

use std::convert::Infallible;
use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{
        header::{CONTENT_TYPE, USER_AGENT},
        HeaderMap,
    },
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use futures::{future, stream, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::client::TaskSource;
use crate::config::Config;
use crate::error::{AppError, CloseFailures};
use crate::feed::{build_feed, write_feed};
use crate::lifecycle::Lifecycle;
use crate::models::Task;

/// Content type of the feed response.
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// Per-service feed settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Label selecting the tasks.
    pub label: String,
    /// Base of fallback item links.
    pub web_app_url: String,
    /// User-Agent substring that marks a fetch as a read. Empty disables closing.
    pub close_user_agent: String,
}

impl FeedSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            label: config.label.clone(),
            web_app_url: config.web_app_url.clone(),
            close_user_agent: config.close_user_agent.clone(),
        }
    }

    /// Whether a request with these headers should close the served tasks.
    #[must_use]
    pub fn is_close_trigger(&self, headers: &HeaderMap) -> bool {
        if self.close_user_agent.is_empty() {
            return false;
        }
        headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ua| ua.contains(&self.close_user_agent))
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Where tasks come from and get closed.
    pub source: Arc<dyn TaskSource>,
    /// Feed settings.
    pub settings: Arc<FeedSettings>,
    /// Process lifecycle; close-on-read work is tracked here.
    pub lifecycle: Lifecycle,
}

impl AppState {
    #[must_use]
    pub fn new(source: Arc<dyn TaskSource>, settings: FeedSettings, lifecycle: Lifecycle) -> Self {
        Self {
            source,
            settings: Arc::new(settings),
            lifecycle,
        }
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/rss.xml", get(rss_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until a shutdown signal, then drain within the grace period.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let lifecycle = state.lifecycle.clone();
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(addr = %addr, "Server running");

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(lifecycle.shutdown_requested())
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        result = &mut server => {
            return result
                .context("Server task panicked")?
                .context("Error running http server");
        }
        () = lifecycle.wait_for_signal() => {}
    }

    info!(grace_secs = lifecycle.grace().as_secs(), "Shutting down");
    let deadline = Instant::now() + lifecycle.grace();

    match timeout_at(deadline, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!(error = %e, "Error shutting down http server"),
        Ok(Err(e)) => error!(error = %e, "Server task panicked during shutdown"),
        Err(_) => warn!("Grace period expired with requests still in flight"),
    }

    if !lifecycle.drain_until(deadline).await {
        warn!("Grace period expired before closing tasks finished");
    }

    info!("Server stopped");
    Ok(())
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "todoist-rss",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serve the labeled tasks as RSS.
///
/// This handler:
/// 1. Fetches the labeled tasks
/// 2. Builds and serializes the feed
/// 3. Streams it to the reader
/// 4. If the reader is the known one, closes every task once the body was delivered
async fn rss_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let settings = &state.settings;

    let tasks = state
        .source
        .list_tasks_by_label(&settings.label)
        .await
        .inspect_err(|e| error!(error = %e, label = %settings.label, "Error getting tasks"))?;

    let feed = build_feed(&tasks, &settings.web_app_url);
    let xml = write_feed(&feed).inspect_err(|e| error!(error = %e, "Error serializing feed"))?;

    let close_on_read = settings.is_close_trigger(&headers);
    info!(
        task_count = tasks.len(),
        close_on_read = close_on_read,
        "Serving feed"
    );

    let body = if close_on_read {
        let (body, delivered) = body_with_delivery_notice(xml);
        schedule_close_on_read(&state, tasks, delivered);
        body
    } else {
        Body::from(xml)
    };

    Ok(([(CONTENT_TYPE, RSS_CONTENT_TYPE)], body).into_response())
}

/// Response body that signals once it has been read to the end.
///
/// If the connection goes away first, the body is dropped and the receiver
/// sees the sender disappear instead.
fn body_with_delivery_notice(xml: Vec<u8>) -> (Body, oneshot::Receiver<()>) {
    let (delivered_tx, delivered_rx) = oneshot::channel();

    let payload = stream::once(future::ready(Ok::<_, Infallible>(Bytes::from(xml))));
    let notice = stream::once(async move {
        // Receiver may already be gone if the close task was abandoned.
        let _ = delivered_tx.send(());
    })
    .filter_map(|()| future::ready(None::<Result<Bytes, Infallible>>));

    (Body::from_stream(payload.chain(notice)), delivered_rx)
}

/// Close `tasks` in the background once the feed has been delivered.
fn schedule_close_on_read(state: &AppState, tasks: Vec<Task>, delivered: oneshot::Receiver<()>) {
    let source = Arc::clone(&state.source);

    state.lifecycle.spawn(async move {
        if delivered.await.is_err() {
            warn!(
                task_count = tasks.len(),
                "Feed was not fully delivered, leaving tasks open"
            );
            return;
        }

        if let Err(failures) = close_all(source.as_ref(), &tasks).await {
            let failed_task_ids: Vec<&str> = failures.task_ids().collect();
            error!(
                failed = failures.len(),
                failed_task_ids = ?failed_task_ids,
                error = %failures,
                "Failed to close all tasks"
            );
        }
    });
}

/// Close every task, attempting all of them even when some fail.
///
/// # Errors
///
/// Returns every per-task failure when at least one close failed.
pub async fn close_all(source: &dyn TaskSource, tasks: &[Task]) -> Result<(), CloseFailures> {
    let mut failures = CloseFailures::default();

    for task in tasks {
        match source.close_task(&task.id).await {
            Ok(()) => info!(task_id = %task.id, "Closed task"),
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Failed to close task");
                failures.push(task.id.clone(), e);
            }
        }
    }

    failures.into_result()
}
