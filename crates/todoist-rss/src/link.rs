//! Markdown link extraction from task content.
//!
//! Tasks saved from a browser or share sheet usually carry their content as
//! `[page title](https://...)`. Such tasks become feed items pointing at the
//! saved page; everything else points back at the task in the web app.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Task;

/// First `[title](url)` in the text, both segments non-greedy.
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").unwrap());

/// Extract `(title, url)` from the first Markdown link in `content`.
///
/// Returns `None` when there is no link or either segment is empty.
#[must_use]
pub fn extract_link(content: &str) -> Option<(&str, &str)> {
    let captures = MARKDOWN_LINK.captures(content)?;
    let title = captures.get(1)?.as_str();
    let url = captures.get(2)?.as_str();

    if title.is_empty() || url.is_empty() {
        None
    } else {
        Some((title, url))
    }
}

/// Canonical web location of a task.
#[must_use]
pub fn task_url(web_app_url: &str, task_id: &str) -> String {
    format!("{}/task/{task_id}", web_app_url.trim_end_matches('/'))
}

/// Title and link for a task's feed item.
#[must_use]
pub fn title_and_link(task: &Task, web_app_url: &str) -> (String, String) {
    match extract_link(&task.content) {
        Some((title, url)) => (title.to_string(), url.to_string()),
        None => (task.content.clone(), task_url(web_app_url, &task.id)),
    }
}
