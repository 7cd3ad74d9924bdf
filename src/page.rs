use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::feed::{Enclosure, Feed, FeedEntry};

/// The query parameter carrying a percent-encoded feed URL
pub const RSS_PARAM: &str = "rss";

/// An incoming page load, reduced to the parts the loader reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: Url,
}

impl PageRequest {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// First value of the query parameter `name`, with the query string's
    /// own decoding applied
    pub fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn rss(&self) -> Option<Cow<'_, str>> {
        self.query_param(RSS_PARAM)
    }
}

/// Whatever the top podcasts endpoint answered with, untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopPodcasts(pub Value);

/// The four fields of a feed entry a page renders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    pub enclosure: Option<Enclosure>,
}

impl From<FeedEntry> for FeedItem {
    fn from(entry: FeedEntry) -> Self {
        Self {
            title: entry.title,
            link: entry.link,
            pub_date: entry.pub_date,
            enclosure: entry.enclosure,
        }
    }
}

/// Data handed to the page template.
///
/// Serializes as the feed's top level fields followed by `items` and
/// `topPodcasts`. Those two keys always come from the loader, never the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageData {
    #[serde(flatten)]
    pub feed: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<FeedItem>>,
    #[serde(rename = "topPodcasts")]
    pub top_podcasts: TopPodcasts,
}

impl PageData {
    pub fn top_podcasts_only(top_podcasts: TopPodcasts) -> Self {
        Self {
            feed: Map::new(),
            items: None,
            top_podcasts,
        }
    }

    pub fn with_feed(mut feed: Feed, top_podcasts: TopPodcasts) -> crate::Result<Self> {
        let items = std::mem::take(&mut feed.items)
            .into_iter()
            .map(FeedItem::from)
            .collect();
        let mut fields = match serde_json::to_value(&feed)? {
            Value::Object(map) => map,
            other => {
                log::warn!("feed serialized to a non-object: {other}");
                Map::new()
            }
        };
        fields.remove("items");
        fields.remove("topPodcasts");
        Ok(Self {
            feed: fields,
            items: Some(items),
            top_podcasts,
        })
    }
}
