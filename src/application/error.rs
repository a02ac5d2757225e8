// Error types shared by the dashboard controllers
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    #[error("overlay `{0}` is already registered")]
    DuplicateOverlay(String),
    #[error("marker `{0}` is already on the map")]
    DuplicateMarker(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed with status {0}")]
    Status(u16),
    #[error("feed request failed: {0}")]
    Transport(String),
    #[error("failed to read feed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DashboardError {
    #[error("day {0} is not a configured forecast day")]
    UnknownDay(u32),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("dashboard task has stopped")]
    Stopped,
}
