use crate::feed::error::{FetchError, FetchResult};
use crate::feed::types::FeedSnapshot;
use async_trait::async_trait;
use std::time::Duration;

/// Source of feed snapshots
#[async_trait]
pub trait FeedPoller: Send + Sync {
    /// Read the feed once. Failures are not fatal; callers treat them as an
    /// empty tick.
    async fn fetch(&self) -> FetchResult<FeedSnapshot>;
}

/// Reads the feed over HTTP
pub struct HttpFeedPoller {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedPoller {
    /// Default per-request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> FetchResult<Self> {
        Self::with_timeout(url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedPoller for HttpFeedPoller {
    async fn fetch(&self) -> FetchResult<FeedSnapshot> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(FeedSnapshot::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poller_keeps_url() {
        let poller = HttpFeedPoller::new("https://feed.example/ping.json").unwrap();
        assert_eq!(poller.url(), "https://feed.example/ping.json");
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_fetch_error() {
        // Port 9 (discard) on loopback is not expected to be serving HTTP
        let poller =
            HttpFeedPoller::with_timeout("http://127.0.0.1:9/ping.json", Duration::from_secs(2))
                .unwrap();

        let result = poller.fetch().await;
        assert!(matches!(
            result,
            Err(FetchError::Transport(_)) | Err(FetchError::Timeout)
        ));
    }
}
