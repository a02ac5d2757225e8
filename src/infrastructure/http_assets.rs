// Assets served over HTTP - feed download and image existence probes
use crate::application::asset_source::{FeedSource, ResourceProbe};
use crate::application::error::FeedError;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpAssets {
    client: reqwest::Client,
    base: String,
    feed_path: String,
}

impl HttpAssets {
    pub fn new(base: &str, feed_path: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            feed_path: feed_path.to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches("./").trim_start_matches('/');
        format!("{}/{}", self.base, path)
    }
}

#[async_trait]
impl FeedSource for HttpAssets {
    async fn fetch_feed(&self) -> Result<String, FeedError> {
        let url = self.url_for(&self.feed_path);
        tracing::debug!(%url, "fetching predictions feed");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ResourceProbe for HttpAssets {
    async fn exists(&self, path: &str) -> bool {
        let url = self.url_for(path);
        match self.client.head(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(%url, error = %e, "image probe failed");
                false
            }
        }
    }
}
