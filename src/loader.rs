use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    config::default_top_podcasts_url,
    feed::{Feed, FeedParser, HttpFeedParser},
    page::{PageData, PageRequest, TopPodcasts},
    Config, Error, FeedError, Result,
};

/// Builds the data a podcast page renders: the top podcasts listing plus,
/// when the request names one with `?rss=`, a parsed feed.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PageDataLoader<P> {
    #[builder(default)]
    client: reqwest::Client,
    parser: P,
    #[builder(default = default_top_podcasts_url())]
    top_podcasts_url: Url,
}

impl PageDataLoader<HttpFeedParser> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .inspect_err(|e| log::warn!("Error building http client: {e}"))?;
        Ok(Self::builder()
            .parser(HttpFeedParser::new(client.clone()))
            .client(client)
            .top_podcasts_url(config.top_podcasts_url.clone())
            .build())
    }
}

impl<P: FeedParser> PageDataLoader<P> {
    pub fn top_podcasts_url(&self) -> &Url {
        &self.top_podcasts_url
    }

    pub async fn load(&self, request: &PageRequest) -> Result<PageData> {
        let url = &self.top_podcasts_url;
        log::debug!("fetching top podcasts from {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .inspect_err(|e| log::warn!("Error fetching {url}: {e}"))?;
        // decoding the body waits until we know whether a feed is wanted
        let top_podcasts = response.json::<TopPodcasts>();

        let Some(rss) = request.rss() else {
            let top_podcasts = top_podcasts
                .await
                .inspect_err(|e| log::warn!("Top podcasts failed to decode: {e}"))?;
            return Ok(PageData::top_podcasts_only(top_podcasts));
        };

        let (feed, top_podcasts) = tokio::join!(self.fetch_feed(&rss), top_podcasts);
        let feed = feed.map_err(Error::FeedParse)?;
        let top_podcasts =
            top_podcasts.inspect_err(|e| log::warn!("Top podcasts failed to decode: {e}"))?;
        PageData::with_feed(feed, top_podcasts)
    }

    async fn fetch_feed(&self, rss: &str) -> Result<Feed, FeedError> {
        check_escapes(rss)
            .inspect_err(|_| log::warn!("rss parameter `{rss}` has a bad escape"))?;
        let feed_url = urlencoding::decode(rss)
            .inspect_err(|e| log::warn!("rss parameter `{rss}` is not valid utf-8: {e}"))?;
        log::debug!("fetching feed {feed_url}");
        self.parser.parse_url(&feed_url).await
    }
}

/// Every `%` has to start a two hex digit escape
fn check_escapes(s: &str) -> Result<(), FeedError> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            match bytes.get(i + 1..i + 3) {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return Err(FeedError::Malformed),
            }
        } else {
            i += 1;
        }
    }
    Ok(())
}
