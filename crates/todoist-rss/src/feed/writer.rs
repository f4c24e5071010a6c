use rss::{Guid, Item};

use super::{Feed, FeedItem, RSS_VERSION};
use crate::error::FeedError;

const INDENT_CHAR: u8 = b' ';
const INDENT_SIZE: usize = 2;

fn to_rss_item(item: &FeedItem) -> Item {
    let mut guid = Guid::default();
    guid.set_value(item.guid.as_str());
    guid.set_permalink(false);

    let mut rss_item = Item::default();
    rss_item.set_title(item.title.clone());
    rss_item.set_link(item.link.clone());
    // Written as CDATA so Markdown and raw markup survive unescaped.
    rss_item.set_description(item.description.clone());
    rss_item.set_guid(guid);
    rss_item.set_pub_date(item.pub_date.clone());
    rss_item
}

/// Serialize a feed as indented RSS 2.0 XML.
///
/// Element order is fixed, so equal feeds produce identical bytes.
///
/// # Errors
///
/// Returns [`FeedError::UnsupportedVersion`] for anything but RSS 2.0, and
/// [`FeedError::Serialization`] if the XML writer fails.
pub fn write_feed(feed: &Feed) -> Result<Vec<u8>, FeedError> {
    if feed.version != RSS_VERSION {
        return Err(FeedError::UnsupportedVersion(feed.version.clone()));
    }

    let mut channel = rss::Channel::default();
    channel.set_title(feed.channel.title.as_str());
    channel.set_link(feed.channel.link.as_str());
    channel.set_description(feed.channel.description.as_str());
    channel.set_items(feed.channel.items.iter().map(to_rss_item).collect::<Vec<_>>());

    let xml = channel.pretty_write_to(Vec::new(), INDENT_CHAR, INDENT_SIZE)?;
    Ok(xml)
}
