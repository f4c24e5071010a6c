use chrono::{DateTime, Utc};

use super::{Feed, FeedItem, GUID_PREFIX};
use crate::link::title_and_link;
use crate::models::Task;

/// RFC 822 layout with a two-digit year, e.g. `02 Jan 06 15:04 UTC`.
const PUB_DATE_FORMAT: &str = "%d %b %y %H:%M %Z";

/// Format a task timestamp for `<pubDate>`.
#[must_use]
pub fn format_pub_date(at: &DateTime<Utc>) -> String {
    at.format(PUB_DATE_FORMAT).to_string()
}

/// Feed item for a single task.
#[must_use]
pub fn build_item(task: &Task, web_app_url: &str) -> FeedItem {
    let (title, link) = title_and_link(task, web_app_url);

    FeedItem {
        title,
        link,
        description: task.description.clone(),
        guid: format!("{GUID_PREFIX}{}", task.id),
        pub_date: format_pub_date(&task.added_at),
    }
}

/// Build the feed for tasks in the order they were fetched.
#[must_use]
pub fn build_feed(tasks: &[Task], web_app_url: &str) -> Feed {
    Feed::new(
        tasks
            .iter()
            .map(|task| build_item(task, web_app_url))
            .collect(),
    )
}
