use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::scene::NodeId;

use super::{AnalyticsSource, BackendError, PathFinder, PathResponse, from_object};

/// Serves recorded backend responses from disk: `api/hits` is read from
/// `<dir>/api_hits.json`, a path lookup from `<dir>/path_<start>_<end>.json`.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn endpoint_file(&self, endpoint: &str) -> PathBuf {
        let stem = endpoint.trim_matches('/').replace('/', "_");
        self.root.join(format!("{stem}.json"))
    }

    pub fn path_file(&self, start: &NodeId, end: &NodeId) -> PathBuf {
        self.root.join(format!(
            "path_{}_{}.json",
            file_safe(start.as_str()),
            file_safe(end.as_str())
        ))
    }

    fn read_json(path: &Path) -> Result<Value, BackendError> {
        let raw = fs::read_to_string(path).map_err(|source| BackendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| BackendError::MalformedPayload {
            origin: path.display().to_string(),
            source,
        })
    }
}

fn file_safe(id: &str) -> String {
    id.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' { ch } else { '_' })
        .collect()
}

impl PathFinder for DirectorySource {
    fn find_path(&self, start: &NodeId, end: &NodeId) -> Result<PathResponse, BackendError> {
        let path = self.path_file(start, end);
        let value = match Self::read_json(&path) {
            Ok(value) => value,
            Err(BackendError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no recorded path");
                return Ok(PathResponse::not_found());
            }
            Err(error) => return Err(error),
        };

        from_object(value).map_err(|source| BackendError::MalformedPayload {
            origin: path.display().to_string(),
            source,
        })
    }
}

impl AnalyticsSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn fetch_json(&self, endpoint: &str) -> Result<Value, BackendError> {
        Self::read_json(&self.endpoint_file(endpoint))
    }
}
