// Ports for fetching the predictions feed and probing optional images
use crate::application::error::FeedError;
use async_trait::async_trait;

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Raw text of the predictions feed
    async fn fetch_feed(&self) -> Result<String, FeedError>;
}

#[async_trait]
pub trait ResourceProbe: Send + Sync {
    /// Whether the asset at `path` exists. Any failure counts as absent.
    async fn exists(&self, path: &str) -> bool;
}
