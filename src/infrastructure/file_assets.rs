// Assets read from a local directory
use crate::application::asset_source::{FeedSource, ResourceProbe};
use crate::application::error::FeedError;
use async_trait::async_trait;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileAssets {
    root: PathBuf,
    feed_path: String,
}

impl FileAssets {
    pub fn new(root: impl Into<PathBuf>, feed_path: &str) -> Self {
        Self {
            root: root.into(),
            feed_path: feed_path.to_string(),
        }
    }

    /// Image paths arrive URL-encoded; the file on disk carries the raw sensor id.
    fn resolve(&self, path: &str) -> PathBuf {
        let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        let relative = decoded.trim_start_matches("./").trim_start_matches('/');
        self.root.join(Path::new(relative))
    }
}

#[async_trait]
impl FeedSource for FileAssets {
    async fn fetch_feed(&self) -> Result<String, FeedError> {
        let path = self.resolve(&self.feed_path);
        tracing::debug!(path = %path.display(), "reading predictions feed");
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

#[async_trait]
impl ResourceProbe for FileAssets {
    async fn exists(&self, path: &str) -> bool {
        tokio::fs::metadata(self.resolve(path))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}
