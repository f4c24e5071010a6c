//! Todoist API types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A Todoist task, as much of it as the feed needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    /// Task ID (opaque string assigned by Todoist).
    pub id: String,
    /// Task content; may hold a Markdown link `[title](url)`.
    pub content: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Creation time.
    pub added_at: DateTime<Utc>,
}

/// One page of `GET /tasks`.
#[derive(Debug, Deserialize)]
pub(crate) struct TaskPage {
    pub results: Vec<Task>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
