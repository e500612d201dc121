//! Renderer-agnostic graph view-model: the base scene built from a backend
//! payload and everything derived from it on user interaction.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

mod categorize;
mod color;
mod community;
mod controller;
mod display;
mod error;
mod highlight;
mod normalize;
mod ranking;
mod search;
mod view;

pub use categorize::{Category, ThresholdTable, Tier, categorize};
pub use color::ColorToken;
pub use community::{Community, CommunityFilter, CommunityTable, LegendEntry, legend, project};
pub use controller::ViewController;
pub use display::{DisplayEdge, DisplayNode, DisplayScene, LayoutHints, compose};
pub use error::SceneError;
pub use highlight::{
    HighlightState, NoPathReason, Path, PathHighlighter, PathOverlay, PathRequest, RequestToken,
    Resolution,
};
pub use normalize::{Normalized, NormalizeReport, PayloadIssue, normalize, normalize_for};
pub use ranking::{LeaderboardEntry, leaderboard, top_k};
pub use search::search_nodes;
pub use view::{ColorSource, EdgePalette, ViewDescriptor, ViewKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ordering used for the cosmetic edge tint: numeric when both ids are
    /// numbers, lexicographic otherwise.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<f64>(), other.0.parse::<f64>()) {
            (Ok(left), Ok(right)) => left.total_cmp(&right),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CommunityId(pub u32);

impl CommunityId {
    /// One-based label shown in legends and checkbox lists.
    pub fn label(self) -> String {
        format!("社区 {}", u64::from(self.0) + 1)
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Centrality,
    Activity,
    Hub,
    Authority,
    Pagerank,
    Degree,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Centrality,
        Metric::Activity,
        Metric::Hub,
        Metric::Authority,
        Metric::Pagerank,
        Metric::Degree,
    ];

    /// Field name used by the backend payloads.
    pub fn key(self) -> &'static str {
        match self {
            Self::Centrality => "centrality",
            Self::Activity => "activity",
            Self::Hub => "hub",
            Self::Authority => "authority",
            Self::Pagerank => "pagerank",
            Self::Degree => "degree",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Centrality => "中心性",
            Self::Activity => "活跃度",
            Self::Hub => "Hub",
            Self::Authority => "Authority",
            Self::Pagerank => "PageRank",
            Self::Degree => "好友数",
        }
    }

    pub fn format_value(self, value: f64) -> String {
        match self {
            Self::Pagerank | Self::Hub | Self::Authority => format!("{value:.4}"),
            Self::Centrality | Self::Activity | Self::Degree => {
                if value.fract() == 0.0 {
                    format!("{value:.0}")
                } else {
                    format!("{value:.2}")
                }
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub username: String,
    pub size: Option<f64>,
    pub metrics: BTreeMap<Metric, f64>,
    pub community: Option<CommunityId>,
    pub color: Option<ColorToken>,
}

impl Node {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Option<f64>,
}

impl Edge {
    /// True when the edge joins `a` and `b` in either direction.
    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Scene {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Scene {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    #[test]
    fn display_cmp_is_numeric_for_numeric_ids() {
        assert_eq!(NodeId::from("10").display_cmp(&NodeId::from("9")), Ordering::Greater);
        assert_eq!(NodeId::from("b").display_cmp(&NodeId::from("a")), Ordering::Greater);
    }

    #[test]
    fn edge_connects_in_both_directions() {
        let edge = fixtures::edge("1", "2");
        assert!(edge.connects(&NodeId::from("2"), &NodeId::from("1")));
        assert!(!edge.connects(&NodeId::from("1"), &NodeId::from("3")));
    }

    #[test]
    fn community_label_is_one_based() {
        assert_eq!(CommunityId(0).label(), "社区 1");
    }

    #[test]
    fn metric_formatting_follows_metric_kind() {
        assert_eq!(Metric::Pagerank.format_value(0.06), "0.0600");
        assert_eq!(Metric::Activity.format_value(1801.0), "1801");
    }
}
