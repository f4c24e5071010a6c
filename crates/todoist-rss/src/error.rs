//! Error types for the feed service.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors talking to the Todoist API.
#[derive(Debug, Error)]
pub enum TodoistError {
    /// Transport failure (connect, timeout, reset)
    #[error("Todoist API unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// Credential missing or rejected
    #[error("Todoist API rejected credentials: {reason}")]
    AuthRejected { reason: String },

    /// Non-success status that is not an auth failure
    #[error("Todoist API returned {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("Failed to decode Todoist API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors producing the XML document.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to serialize feed: {0}")]
    Serialization(#[from] rss::Error),

    /// The writer only produces RSS 2.0
    #[error("Unsupported RSS version: {0}")]
    UnsupportedVersion(String),
}

/// Errors that abort a feed request before anything is written.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Upstream(#[from] TodoistError),

    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Detail is logged by the handler; the reader only learns that it failed.
        (StatusCode::INTERNAL_SERVER_ERROR, "failed to generate feed").into_response()
    }
}

/// Per-task failures collected while closing tasks after a read.
#[derive(Debug, Default)]
pub struct CloseFailures {
    failures: Vec<(String, TodoistError)>,
}

impl CloseFailures {
    /// Record a failed close for `task_id`.
    pub fn push(&mut self, task_id: impl Into<String>, error: TodoistError) {
        self.failures.push((task_id.into(), error));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// IDs of the tasks that could not be closed, in attempt order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(id, _)| id.as_str())
    }

    /// `Err(self)` when at least one close failed.
    ///
    /// # Errors
    ///
    /// Returns the aggregate when it is non-empty.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for CloseFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (task_id, error)) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "task {task_id}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CloseFailures {}
