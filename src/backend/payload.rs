//! JSON contracts of the analytics backend.
//!
//! Graph payloads keep their sections, entries and optional fields as raw JSON
//! values so the normalizer can skip and report a malformed part instead of
//! rejecting the whole response.

use serde::Deserialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;

use crate::scene::NodeId;

/// Identifier as emitted by the backend: ids arrive as numbers on some
/// endpoints and as strings on others.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawId {
    pub fn canonical(&self) -> Option<NodeId> {
        let text = match self {
            Self::Integer(value) => value.to_string(),
            Self::Float(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 => {
                format!("{}", *value as i64)
            }
            Self::Float(value) if value.is_finite() => value.to_string(),
            Self::Float(_) => return None,
            Self::Text(value) => value.trim().to_owned(),
        };

        if text.is_empty() {
            None
        } else {
            Some(NodeId::from(text))
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Option<Value>,
    #[serde(default)]
    pub edges: Option<Value>,
    #[serde(default)]
    pub community_map: Option<Value>,
    #[serde(default)]
    pub colors: Option<Value>,
}

impl GraphPayload {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        from_object(value)
    }
}

/// Every endpoint answers with a JSON object; arrays and scalars are rejected
/// up front because serde would otherwise read an array positionally.
pub fn from_object<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    if !value.is_object() {
        return Err(serde_json::Error::custom(format!(
            "expected a JSON object, found {}",
            value_kind(&value)
        )));
    }
    T::deserialize(value)
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Only the id decides whether a node is usable; the other fields are checked
/// one by one so a wrongly typed value costs that field, not the node.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RawNode {
    pub(crate) id: Option<RawId>,
    #[serde(default)]
    pub(crate) username: Option<Value>,
    #[serde(default)]
    pub(crate) size: Option<Value>,
    #[serde(default)]
    pub(crate) community: Option<Value>,
    #[serde(default)]
    pub(crate) color: Option<Value>,
    #[serde(default)]
    pub(crate) centrality: Option<Value>,
    #[serde(default)]
    pub(crate) activity: Option<Value>,
    #[serde(default)]
    pub(crate) hub: Option<Value>,
    #[serde(default)]
    pub(crate) authority: Option<Value>,
    #[serde(default)]
    pub(crate) pagerank: Option<Value>,
    #[serde(default)]
    pub(crate) degree: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RawEdge {
    pub(crate) source: Option<RawId>,
    pub(crate) target: Option<RawId>,
    #[serde(default)]
    pub(crate) weight: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PathResponse {
    #[serde(default)]
    pub path: Option<Vec<RawId>>,
    #[serde(default)]
    pub steps: Option<u64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PathResponse {
    pub fn not_found() -> Self {
        Self {
            error: Some(NO_PATH_MESSAGE.to_owned()),
            ..Self::default()
        }
    }

    /// Canonical ids of the returned path; unusable entries are dropped.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.path
            .iter()
            .flatten()
            .filter_map(RawId::canonical)
            .collect()
    }
}

pub const NO_PATH_MESSAGE: &str = "未找到路径";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TimeSeriesPayload {
    #[serde(default)]
    pub time_series: Vec<TimeSeriesPoint>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: String,
    pub count: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FriendDistributionPayload {
    #[serde(default)]
    pub friend_data: Vec<FriendCount>,
    #[serde(default)]
    pub stats: Option<FriendStats>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FriendCount {
    pub user_id: RawId,
    pub friend_count: f64,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FriendStats {
    pub mean_friends: f64,
    pub median_friends: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UserBehaviorPayload {
    #[serde(default)]
    pub user_behavior: Vec<UserBehavior>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UserBehavior {
    pub user_id: RawId,
    pub username: String,
    pub message_count: f64,
    #[serde(default)]
    pub active_period: Option<Value>,
}
