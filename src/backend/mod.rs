//! Where analytics payloads come from: the live HTTP backend or a directory of
//! recorded responses.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::scene::{NodeId, ViewKind};

mod directory;
mod error;
mod http;
mod payload;

pub use directory::DirectorySource;
pub use error::BackendError;
pub use http::HttpSource;
pub use payload::{
    FriendCount, FriendDistributionPayload, FriendStats, GraphPayload, NO_PATH_MESSAGE,
    PathResponse, RawId, TimeSeriesPayload, TimeSeriesPoint, UserBehavior, UserBehaviorPayload,
    from_object,
};
pub(crate) use payload::{RawEdge, RawNode, value_kind};

pub const TIME_SERIES_ENDPOINT: &str = "api/by_timestamp";
pub const FRIEND_DISTRIBUTION_ENDPOINT: &str = "api/friend_distribution";
pub const USER_BEHAVIOR_ENDPOINT: &str = "api/user_behavior";

/// Shortest-path lookup between two nodes.
pub trait PathFinder {
    fn find_path(&self, start: &NodeId, end: &NodeId) -> Result<PathResponse, BackendError>;
}

pub trait AnalyticsSource: PathFinder + Send + Sync {
    /// Human readable origin, shown in the status bar and in logs.
    fn describe(&self) -> String;

    fn fetch_json(&self, endpoint: &str) -> Result<Value, BackendError>;

    fn graph(&self, view: ViewKind) -> Result<GraphPayload, BackendError> {
        fetch_object(self, view.endpoint())
    }

    fn time_series(&self) -> Result<TimeSeriesPayload, BackendError> {
        fetch_object(self, TIME_SERIES_ENDPOINT)
    }

    fn friend_distribution(&self) -> Result<FriendDistributionPayload, BackendError> {
        fetch_object(self, FRIEND_DISTRIBUTION_ENDPOINT)
    }

    fn user_behavior(&self) -> Result<UserBehaviorPayload, BackendError> {
        fetch_object(self, USER_BEHAVIOR_ENDPOINT)
    }
}

fn fetch_object<S, T>(source: &S, endpoint: &str) -> Result<T, BackendError>
where
    S: AnalyticsSource + ?Sized,
    T: DeserializeOwned,
{
    let value = source.fetch_json(endpoint)?;
    from_object(value).map_err(|error| BackendError::MalformedPayload {
        origin: format!("{} ({endpoint})", source.describe()),
        source: error,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLocation {
    Http(reqwest::Url),
    Directory(PathBuf),
}

pub fn connect(location: &SourceLocation) -> Result<Arc<dyn AnalyticsSource>, BackendError> {
    let source: Arc<dyn AnalyticsSource> = match location {
        SourceLocation::Http(base) => Arc::new(HttpSource::new(base.clone())?),
        SourceLocation::Directory(dir) => Arc::new(DirectorySource::new(dir.clone())),
    };
    tracing::info!(source = %source.describe(), "connected analytics source");
    Ok(source)
}
