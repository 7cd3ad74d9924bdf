use std::future::Future;

use atom_syndication::FixedDateTime;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::FeedError;

/// A parsed RSS or Atom document, normalised to one shape regardless of
/// the source format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_build_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<FeedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itunes: Option<ItunesMeta>,
    #[serde(default)]
    pub items: Vec<FeedEntry>,
    /// Top level fields with no dedicated slot above
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItunesMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ItunesOwner>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItunesOwner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosure: Option<Enclosure>,
}

/// Media attached to an entry, an episode's audio file for podcasts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enclosure {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Turns a feed URL into a parsed [`Feed`]
pub trait FeedParser {
    fn parse_url(&self, url: &str) -> impl Future<Output = Result<Feed, FeedError>> + Send;
}

/// Fetches feeds over HTTP and hands the body to the `rss` and
/// `atom_syndication` readers
#[derive(Debug, Clone, Default)]
pub struct HttpFeedParser {
    client: reqwest::Client,
}

impl HttpFeedParser {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl FeedParser for HttpFeedParser {
    async fn parse_url(&self, url: &str) -> Result<Feed, FeedError> {
        let url = Url::parse(url).inspect_err(|e| log::warn!("bad feed url `{url}`: {e}"))?;
        let raw_feed = self
            .client
            .get(url.clone())
            .send()
            .await
            .inspect_err(|e| log::warn!("Error fetching {url}: {e}"))?
            .error_for_status()
            .inspect_err(|e| log::warn!("Error fetching url: {e}"))?
            .bytes()
            .await
            .inspect_err(|e| log::warn!("Fetching feed failed to read body: {e}"))?;
        parse_feed_bytes(&raw_feed).inspect_err(|e| {
            log::warn!(
                "Failed to deserialize feed: {e}\n`{}`",
                String::from_utf8_lossy(&raw_feed)
            );
        })
    }
}

/// Parse a raw document as RSS, falling back to Atom when the root element
/// isn't an RSS one
pub fn parse_feed_bytes(raw: &[u8]) -> Result<Feed, FeedError> {
    match rss::Channel::read_from(raw) {
        Ok(channel) => return Ok(Feed::from(&channel)),
        Err(rss::Error::InvalidStartTag) => {
            log::debug!("document is not RSS, trying Atom");
        }
        Err(e) => return Err(e.into()),
    }
    match atom_syndication::Feed::read_from(raw) {
        Ok(feed) => Ok(Feed::from(&feed)),
        Err(atom_syndication::Error::InvalidStartTag) => Err(FeedError::Unrecognized),
        Err(e) => Err(e.into()),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// RFC 2822 `pubDate` to UTC RFC 3339 with millis, or `None` when it won't parse
fn iso_date(pub_date: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(pub_date.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn fixed_iso_date(date: &FixedDateTime) -> String {
    date.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&rss::Channel> for Feed {
    fn from(channel: &rss::Channel) -> Self {
        let feed_url = channel.atom_ext().and_then(|atom| {
            atom.links()
                .iter()
                .find(|link| link.rel() == "self")
                .map(|link| link.href().to_string())
        });
        Self {
            title: non_empty(channel.title()),
            description: non_empty(channel.description()),
            link: non_empty(channel.link()),
            feed_url,
            language: channel.language().map(str::to_string),
            copyright: channel.copyright().map(str::to_string),
            last_build_date: channel.last_build_date().map(str::to_string),
            generator: channel.generator().map(str::to_string),
            image: channel.image().map(|image| FeedImage {
                url: image.url().to_string(),
                title: non_empty(image.title()),
                link: non_empty(image.link()),
            }),
            itunes: channel.itunes_ext().map(|ext| ItunesMeta {
                author: ext.author().map(str::to_string),
                summary: ext.summary().map(str::to_string),
                image: ext.image().map(str::to_string),
                explicit: ext.explicit().map(str::to_string),
                owner: ext.owner().map(|owner| ItunesOwner {
                    name: owner.name().map(str::to_string),
                    email: owner.email().map(str::to_string),
                }),
                categories: ext
                    .categories()
                    .iter()
                    .map(|cat| cat.text().to_string())
                    .collect(),
                keywords: ext.keywords().map(str::to_string),
            }),
            items: channel.items().iter().map(FeedEntry::from).collect(),
            extensions: channel_extras(channel),
        }
    }
}

/// Channel elements that have no field of their own on [`Feed`]
fn channel_extras(channel: &rss::Channel) -> Map<String, Value> {
    let mut extras = Map::new();
    let text = [
        ("pubDate", channel.pub_date()),
        ("ttl", channel.ttl()),
        ("managingEditor", channel.managing_editor()),
        ("webMaster", channel.webmaster()),
        ("docs", channel.docs()),
        ("rating", channel.rating()),
    ];
    for (key, value) in text {
        if let Some(value) = value {
            extras.insert(key.to_string(), Value::from(value));
        }
    }
    if !channel.skip_hours().is_empty() {
        extras.insert("skipHours".into(), Value::from(channel.skip_hours().to_vec()));
    }
    if !channel.skip_days().is_empty() {
        extras.insert("skipDays".into(), Value::from(channel.skip_days().to_vec()));
    }
    extras
}

impl From<&rss::Item> for FeedEntry {
    fn from(item: &rss::Item) -> Self {
        let creator = item
            .dublin_core_ext()
            .and_then(|dc| dc.creators().first().cloned());
        Self {
            title: item.title().map(str::to_string),
            link: item.link().map(str::to_string),
            pub_date: item.pub_date().map(str::to_string),
            iso_date: item.pub_date().and_then(iso_date),
            creator,
            author: item.author().map(str::to_string),
            content: item.content().map(str::to_string),
            summary: item.description().map(str::to_string),
            guid: item.guid().map(|guid| guid.value().to_string()),
            categories: item
                .categories()
                .iter()
                .map(|cat| cat.name().to_string())
                .collect(),
            enclosure: item.enclosure().map(|enc| Enclosure {
                url: enc.url().to_string(),
                length: non_empty(enc.length()),
                mime_type: non_empty(enc.mime_type()),
            }),
        }
    }
}

impl From<&atom_syndication::Feed> for Feed {
    fn from(feed: &atom_syndication::Feed) -> Self {
        let link = feed
            .links()
            .iter()
            .find(|link| link.rel() == "alternate" || link.rel().is_empty())
            .map(|link| link.href().to_string());
        let feed_url = feed
            .links()
            .iter()
            .find(|link| link.rel() == "self")
            .map(|link| link.href().to_string());
        Self {
            title: non_empty(&feed.title().value),
            description: feed.subtitle().and_then(|text| non_empty(&text.value)),
            link,
            feed_url,
            language: feed.lang().map(str::to_string),
            copyright: feed.rights().map(|text| text.value.clone()),
            last_build_date: Some(feed.updated().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            generator: feed.generator().map(|generator| generator.value().to_string()),
            image: feed.logo().or(feed.icon()).map(|url| FeedImage {
                url: url.to_string(),
                ..Default::default()
            }),
            itunes: None,
            items: feed.entries().iter().map(FeedEntry::from).collect(),
            extensions: Map::new(),
        }
    }
}

impl From<&atom_syndication::Entry> for FeedEntry {
    fn from(entry: &atom_syndication::Entry) -> Self {
        let link = entry
            .links()
            .iter()
            .find(|link| link.rel() == "alternate" || link.rel().is_empty())
            .map(|link| link.href().to_string());
        let enclosure = entry
            .links()
            .iter()
            .find(|link| link.rel() == "enclosure")
            .map(|link| Enclosure {
                url: link.href().to_string(),
                length: link.length().map(str::to_string),
                mime_type: link.mime_type().map(str::to_string),
            });
        let date = entry.published().unwrap_or(entry.updated());
        Self {
            title: non_empty(&entry.title().value),
            link,
            pub_date: Some(date.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            iso_date: Some(fixed_iso_date(date)),
            creator: entry.authors().first().map(|p| p.name().to_string()),
            author: entry.authors().first().map(|p| p.name().to_string()),
            content: entry.content().and_then(|c| c.value()).map(str::to_string),
            summary: entry.summary().map(|text| text.value.clone()),
            guid: non_empty(entry.id()),
            categories: entry
                .categories()
                .iter()
                .map(|cat| cat.term().to_string())
                .collect(),
            enclosure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Night Shift</title>
    <link>https://nightshift.example.com</link>
    <description>Stories after dark</description>
    <language>en-us</language>
    <ttl>60</ttl>
    <skipDays><day>Sunday</day></skipDays>
    <atom:link href="https://nightshift.example.com/feed.xml" rel="self" type="application/rss+xml"/>
    <itunes:author>Night Shift Media</itunes:author>
    <itunes:category text="Fiction"/>
    <item>
      <title>Episode 2</title>
      <link>https://nightshift.example.com/2</link>
      <pubDate>Tue, 02 Jan 2024 10:00:00 +0100</pubDate>
      <dc:creator>Sam</dc:creator>
      <guid>ep-2</guid>
      <enclosure url="https://cdn.example.com/2.mp3" length="1024" type="audio/mpeg"/>
    </item>
    <item>
      <title>Episode 1</title>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Release Notes</title>
  <subtitle>What shipped</subtitle>
  <link href="https://notes.example.com/"/>
  <link rel="self" href="https://notes.example.com/atom.xml"/>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2024-03-01T12:00:00Z</updated>
  <entry>
    <title>v1.2</title>
    <link href="https://notes.example.com/v1.2"/>
    <link rel="enclosure" href="https://cdn.example.com/v1.2.mp3" type="audio/mpeg" length="42"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2024-03-01T12:00:00Z</updated>
    <author><name>Jo</name></author>
  </entry>
</feed>"#;

    #[test]
    fn reads_rss_channel() {
        let feed = parse_feed_bytes(RSS.as_bytes()).expect("rss should parse");
        assert_eq!(feed.title.as_deref(), Some("Night Shift"));
        assert_eq!(
            feed.feed_url.as_deref(),
            Some("https://nightshift.example.com/feed.xml")
        );
        let itunes = feed.itunes.as_ref().expect("itunes ext");
        assert_eq!(itunes.author.as_deref(), Some("Night Shift Media"));
        assert_eq!(itunes.categories, vec!["Fiction".to_string()]);
        assert_eq!(feed.extensions.get("ttl"), Some(&Value::from("60")));
        assert_eq!(
            feed.extensions.get("skipDays"),
            Some(&serde_json::json!(["Sunday"]))
        );
        assert_eq!(feed.extensions.get("docs"), None);

        assert_eq!(feed.items.len(), 2);
        let first = &feed.items[0];
        assert_eq!(first.title.as_deref(), Some("Episode 2"));
        assert_eq!(first.creator.as_deref(), Some("Sam"));
        assert_eq!(first.iso_date.as_deref(), Some("2024-01-02T09:00:00.000Z"));
        assert_eq!(
            first.enclosure,
            Some(Enclosure {
                url: "https://cdn.example.com/2.mp3".into(),
                length: Some("1024".into()),
                mime_type: Some("audio/mpeg".into()),
            })
        );
        assert_eq!(feed.items[1].enclosure, None);
        assert_eq!(feed.items[1].pub_date, None);
    }

    #[test]
    fn reads_atom_feed() {
        let feed = parse_feed_bytes(ATOM.as_bytes()).expect("atom should parse");
        assert_eq!(feed.title.as_deref(), Some("Release Notes"));
        assert_eq!(feed.description.as_deref(), Some("What shipped"));
        assert_eq!(feed.link.as_deref(), Some("https://notes.example.com/"));
        assert_eq!(
            feed.feed_url.as_deref(),
            Some("https://notes.example.com/atom.xml")
        );
        assert_eq!(feed.items.len(), 1);
        let entry = &feed.items[0];
        assert_eq!(entry.link.as_deref(), Some("https://notes.example.com/v1.2"));
        assert_eq!(entry.pub_date.as_deref(), Some("2024-03-01T12:00:00Z"));
        assert_eq!(entry.iso_date.as_deref(), Some("2024-03-01T12:00:00.000Z"));
        assert_eq!(feed.last_build_date.as_deref(), Some("2024-03-01T12:00:00Z"));
        assert_eq!(entry.creator.as_deref(), Some("Jo"));
        let enclosure = entry.enclosure.as_ref().expect("enclosure link");
        assert_eq!(enclosure.mime_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(enclosure.length.as_deref(), Some("42"));
    }

    #[test]
    fn other_xml_is_unrecognized() {
        let err = parse_feed_bytes(b"<html><body>nope</body></html>").unwrap_err();
        assert!(matches!(err, FeedError::Unrecognized), "{err:?}");
    }

    #[test]
    fn serialized_feed_uses_camel_case_and_skips_missing() {
        let feed = Feed {
            title: Some("t".into()),
            last_build_date: Some("today".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&feed).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "title": "t", "lastBuildDate": "today", "items": [] })
        );
    }

    #[test]
    fn unparseable_pub_date_has_no_iso_date() {
        assert_eq!(iso_date("last tuesday"), None);
    }
}
