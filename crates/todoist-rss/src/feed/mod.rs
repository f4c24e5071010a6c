//! Feed model and generation.
//!
//! - [`build_feed`] turns fetched tasks into a [`Feed`]
//! - [`write_feed`] serializes a [`Feed`] as indented RSS 2.0 XML

mod builder;
mod writer;

pub use builder::{build_feed, build_item, format_pub_date};
pub use writer::write_feed;

/// RSS version emitted in the `<rss>` envelope.
pub const RSS_VERSION: &str = "2.0";

/// Channel title.
pub const CHANNEL_TITLE: &str = "Todoist RSS";

/// Channel link.
pub const CHANNEL_LINK: &str = "https://app.todoist.com";

/// Channel description.
pub const CHANNEL_DESCRIPTION: &str = "RSS items generated from Todoist tasks";

/// Prefix of every item GUID; the task ID follows.
pub const GUID_PREFIX: &str = "todoist-";

/// One feed entry, derived from exactly one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub guid: String,
    pub pub_date: String,
}

/// Channel metadata plus items in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}

/// An RSS document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub version: String,
    pub channel: Channel,
}

impl Feed {
    /// Wrap items in the standard channel envelope.
    #[must_use]
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self {
            version: RSS_VERSION.to_string(),
            channel: Channel {
                title: CHANNEL_TITLE.to_string(),
                link: CHANNEL_LINK.to_string(),
                description: CHANNEL_DESCRIPTION.to_string(),
                items,
            },
        }
    }

    #[must_use]
    pub fn items(&self) -> &[FeedItem] {
        &self.channel.items
    }
}
