//! Feed fetching and parsing

use crate::error::{Error, Result};
use crate::types::FeedItem;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Something that can be asked for the current contents of a commit feed
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the feed and return its items in document order
    async fn fetch(&self) -> Result<Vec<FeedItem>>;
}

/// Atom/RSS feed fetched over HTTP
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    /// Create a source for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<Vec<FeedItem>> {
        debug!(url = %self.url, "fetching feed");
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::USER_AGENT, "cherry-sync")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Feed(format!("{} returned {status}", self.url)));
        }

        let body = response.bytes().await?;
        parse_feed(&body)
    }
}

/// Parse an Atom or RSS document into feed items.
///
/// Entries without a link cannot be mapped to a commit and are dropped.
pub fn parse_feed(body: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = feed_rs::parser::parse(body).map_err(|e| Error::FeedParse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
                warn!(id = %entry.id, "feed entry has no link; ignoring");
                return None;
            };
            Some(FeedItem {
                title: entry
                    .title
                    .map(|t| t.content.trim().to_string())
                    .unwrap_or_default(),
                link,
                published_at: entry.published.or(entry.updated),
            })
        })
        .collect();

    Ok(items)
}
