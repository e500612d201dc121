use std::fmt;

use serde::Serialize;

use super::{Category, ColorToken, Metric, SceneError, ThresholdTable, Tier};

const HIGH: &str = "#e74c3c";
const MID: &str = "#f39c12";
const LOW: &str = "#3498db";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Centrality,
    Messages,
    Hits,
    PageRank,
    SocialNetwork,
    Communities,
}

impl ViewKind {
    pub const ALL: [ViewKind; 6] = [
        ViewKind::Centrality,
        ViewKind::Messages,
        ViewKind::Hits,
        ViewKind::PageRank,
        ViewKind::SocialNetwork,
        ViewKind::Communities,
    ];

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Centrality => "api/centrality",
            Self::Messages => "api/messages",
            Self::Hits => "api/hits",
            Self::PageRank => "api/messages_pagerank",
            Self::SocialNetwork => "api/social_network",
            Self::Communities => "api/user_communities",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Centrality => "centrality",
            Self::Messages => "messages",
            Self::Hits => "hits",
            Self::PageRank => "pagerank",
            Self::SocialNetwork => "social",
            Self::Communities => "communities",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(slug.trim()))
    }

    pub fn descriptor(self) -> Result<ViewDescriptor, SceneError> {
        ViewDescriptor::for_kind(self)
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    /// Colour of the node's threshold category.
    Category,
    /// Colour the backend put on the node, category used for the legend only.
    Node,
    /// Colour of the node's community.
    Community,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePalette {
    /// Arrowed edges tinted by endpoint order.
    Directional,
    /// Plain undirected lines.
    Plain,
}

/// Everything that differs between the analytic graph views.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewDescriptor {
    pub kind: ViewKind,
    pub title: &'static str,
    pub category_metric: Option<Metric>,
    pub thresholds: Option<ThresholdTable>,
    pub ranking_metrics: Vec<Metric>,
    pub leaderboard_columns: Vec<Metric>,
    pub size_divisor: f64,
    pub fixed_symbol_size: Option<f64>,
    pub color_source: ColorSource,
    pub edge_palette: EdgePalette,
    pub repulsion: f32,
    pub edge_length: (f32, f32),
}

impl ViewDescriptor {
    pub const DEFAULT_SYMBOL_SIZE: f64 = 10.0;

    pub fn for_kind(kind: ViewKind) -> Result<Self, SceneError> {
        let descriptor = match kind {
            ViewKind::Centrality => Self {
                title: "用户中心性分析",
                category_metric: Some(Metric::Centrality),
                thresholds: Some(three_tier(1800.0, 300.0, ["高中心性", "中中心性", "低中心性"])?),
                ranking_metrics: vec![Metric::Centrality],
                repulsion: 180.0,
                ..Self::graph_defaults(kind)
            },
            ViewKind::Messages => Self {
                title: "消息互动网络",
                category_metric: Some(Metric::Activity),
                thresholds: Some(three_tier(1800.0, 300.0, ["高活跃", "中活跃", "低活跃"])?),
                ranking_metrics: vec![Metric::Activity],
                ..Self::graph_defaults(kind)
            },
            ViewKind::Hits => Self {
                title: "消息互动网络 (HITS)",
                category_metric: Some(Metric::Activity),
                thresholds: Some(three_tier(1800.0, 300.0, ["高活跃", "中活跃", "低活跃"])?),
                ranking_metrics: vec![Metric::Activity, Metric::Hub, Metric::Authority],
                leaderboard_columns: vec![Metric::Activity, Metric::Hub, Metric::Authority],
                repulsion: 180.0,
                ..Self::graph_defaults(kind)
            },
            ViewKind::PageRank => Self {
                title: "用户 PageRank 传播性网络",
                category_metric: Some(Metric::Pagerank),
                thresholds: Some(three_tier(0.05, 0.005, ["高影响力", "中影响力", "低影响力"])?),
                ranking_metrics: vec![Metric::Pagerank],
                ..Self::graph_defaults(kind)
            },
            ViewKind::SocialNetwork => Self {
                title: "社交关系网络",
                category_metric: Some(Metric::Degree),
                thresholds: Some(ThresholdTable::new(
                    vec![Tier {
                        bound: 5.0,
                        category: Category::new("活跃用户", HIGH),
                    }],
                    Category::new("普通用户", LOW),
                )?),
                ranking_metrics: vec![Metric::Degree],
                color_source: ColorSource::Node,
                edge_palette: EdgePalette::Plain,
                repulsion: 150.0,
                edge_length: (50.0, 200.0),
                ..Self::graph_defaults(kind)
            },
            ViewKind::Communities => Self {
                title: "用户社区划分网络",
                fixed_symbol_size: Some(20.0),
                color_source: ColorSource::Community,
                edge_palette: EdgePalette::Plain,
                ..Self::graph_defaults(kind)
            },
        };

        Ok(descriptor)
    }

    fn graph_defaults(kind: ViewKind) -> Self {
        Self {
            kind,
            title: "",
            category_metric: None,
            thresholds: None,
            ranking_metrics: Vec::new(),
            leaderboard_columns: Vec::new(),
            size_divisor: 100.0,
            fixed_symbol_size: None,
            color_source: ColorSource::Category,
            edge_palette: EdgePalette::Directional,
            repulsion: 230.0,
            edge_length: (60.0, 220.0),
        }
    }

    pub fn symbol_size(&self, size: Option<f64>) -> f64 {
        if let Some(fixed) = self.fixed_symbol_size {
            return fixed;
        }

        match size {
            Some(size) if self.size_divisor > 0.0 => size / self.size_divisor,
            _ => Self::DEFAULT_SYMBOL_SIZE,
        }
    }

    pub fn default_ranking_metric(&self) -> Option<Metric> {
        self.ranking_metrics.first().copied()
    }

    pub fn fallback_color(&self) -> ColorToken {
        ColorToken::from(LOW)
    }
}

fn three_tier(high: f64, mid: f64, labels: [&str; 3]) -> Result<ThresholdTable, SceneError> {
    let [high_label, mid_label, low_label] = labels;
    ThresholdTable::new(
        vec![
            Tier {
                bound: high,
                category: Category::new(high_label, HIGH),
            },
            Tier {
                bound: mid,
                category: Category::new(mid_label, MID),
            },
        ],
        Category::new(low_label, LOW),
    )
}
