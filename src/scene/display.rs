use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::{
    ColorSource, ColorToken, CommunityId, CommunityTable, EdgePalette, LegendEntry, Metric,
    NodeId, PathHighlighter, Scene, ViewDescriptor, categorize, legend, project,
};

const EMPHASIS_COLOR: &str = "#ff0000";
const EMPHASIS_SCALE: f64 = 1.4;
const EMPHASIS_WIDTH: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LayoutHints {
    pub repulsion: f32,
    pub edge_length: (f32, f32),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayNode {
    pub id: NodeId,
    pub label: String,
    pub symbol_size: f64,
    pub color: ColorToken,
    pub category: Option<String>,
    pub community: Option<CommunityId>,
    pub emphasized: bool,
    pub tooltip: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Option<f64>,
    pub color: ColorToken,
    pub width: f32,
    pub curveness: f32,
    pub directed: bool,
    pub emphasized: bool,
    pub tooltip: Vec<String>,
}

/// The declarative scene handed to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayScene {
    pub title: String,
    pub nodes: Vec<DisplayNode>,
    pub edges: Vec<DisplayEdge>,
    pub legend: Vec<LegendEntry>,
    pub layout: LayoutHints,
}

impl DisplayScene {
    pub fn node(&self, id: &NodeId) -> Option<&DisplayNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn emphasized_nodes(&self) -> impl Iterator<Item = &DisplayNode> {
        self.nodes.iter().filter(|node| node.emphasized)
    }

    pub fn emphasized_edges(&self) -> impl Iterator<Item = &DisplayEdge> {
        self.edges.iter().filter(|edge| edge.emphasized)
    }
}

/// Builds a fresh display scene from the immutable base scene and the current
/// interaction state. `visible` is `None` for views without communities.
pub fn compose(
    base: &Scene,
    descriptor: &ViewDescriptor,
    communities: &CommunityTable,
    visible: Option<&BTreeSet<CommunityId>>,
    highlighter: &PathHighlighter,
) -> DisplayScene {
    let scene = match visible {
        Some(visible) => Cow::Owned(project(base, visible)),
        None => Cow::Borrowed(base),
    };
    let overlay = highlighter.overlay(&scene);

    let nodes = scene
        .nodes
        .iter()
        .map(|node| {
            let category = match (descriptor.category_metric, &descriptor.thresholds) {
                (Some(metric), Some(thresholds)) => match categorize(node, metric, thresholds) {
                    Ok(category) => Some(category),
                    Err(error) => {
                        tracing::warn!("{error}");
                        None
                    }
                },
                _ => None,
            };

            let base_color = match descriptor.color_source {
                ColorSource::Category => category.map(|category| category.color.clone()),
                ColorSource::Node => node
                    .color
                    .clone()
                    .or_else(|| category.map(|category| category.color.clone())),
                ColorSource::Community => node
                    .community
                    .and_then(|community| communities.color_of(community))
                    .cloned(),
            }
            .unwrap_or_else(|| descriptor.fallback_color());

            let emphasized = overlay.nodes.contains(&node.id);
            let symbol_size = descriptor.symbol_size(node.size);

            let mut tooltip = vec![format!("用户: {}", node.username)];
            tooltip.extend(
                Metric::ALL
                    .into_iter()
                    .filter_map(|metric| {
                        node.metric(metric)
                            .map(|value| format!("{}: {}", metric.label(), metric.format_value(value)))
                    }),
            );
            if let Some(community) = node.community {
                tooltip.push(community.label());
            }

            DisplayNode {
                id: node.id.clone(),
                label: node.username.clone(),
                symbol_size: if emphasized {
                    symbol_size * EMPHASIS_SCALE
                } else {
                    symbol_size
                },
                color: if emphasized {
                    ColorToken::from(EMPHASIS_COLOR)
                } else {
                    base_color
                },
                category: category.map(|category| category.label.clone()),
                community: node.community,
                emphasized,
                tooltip,
            }
        })
        .collect::<Vec<_>>();

    let usernames = scene
        .nodes
        .iter()
        .map(|node| (&node.id, node.username.as_str()))
        .collect::<HashMap<_, _>>();
    let name_of = |id: &NodeId| usernames.get(id).map_or_else(|| id.to_string(), |name| (*name).to_owned());

    let directed = descriptor.edge_palette == EdgePalette::Directional;
    let edges = scene
        .edges
        .iter()
        .enumerate()
        .map(|(index, edge)| {
            let emphasized = overlay.edges.contains(&index);
            let (color, width, curveness) = match descriptor.edge_palette {
                EdgePalette::Directional => {
                    let tint = if edge.is_self_loop() {
                        "#BDC3C7"
                    } else if edge.source.display_cmp(&edge.target) == Ordering::Greater {
                        "#adcffa"
                    } else {
                        "#ffd2a8"
                    };
                    (ColorToken::from(tint), 2.0, 0.05)
                }
                EdgePalette::Plain => (ColorToken::from("#aaaaaa"), 1.0, 0.0),
            };

            let mut tooltip = if directed {
                vec![format!("发送: {} → 接收: {}", name_of(&edge.source), name_of(&edge.target))]
            } else {
                vec![format!("连接: {} ↔ {}", name_of(&edge.source), name_of(&edge.target))]
            };
            if let Some(weight) = edge.weight {
                tooltip.push(format!("消息数: {}", Metric::Activity.format_value(weight)));
            }

            DisplayEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                weight: edge.weight,
                color: if emphasized {
                    ColorToken::from(EMPHASIS_COLOR)
                } else {
                    color
                },
                width: if emphasized { EMPHASIS_WIDTH } else { width },
                curveness,
                directed,
                emphasized,
                tooltip,
            }
        })
        .collect();

    let legend = match (descriptor.color_source, visible) {
        (ColorSource::Community, Some(visible)) => legend(visible, communities),
        (ColorSource::Community, None) => Vec::new(),
        (ColorSource::Category | ColorSource::Node, _) => descriptor
            .thresholds
            .iter()
            .flat_map(|thresholds| thresholds.categories())
            .map(|category| LegendEntry {
                label: category.label.clone(),
                color: category.color.clone(),
                community: None,
            })
            .collect(),
    };

    DisplayScene {
        title: descriptor.title.to_owned(),
        nodes,
        edges,
        legend,
        layout: LayoutHints {
            repulsion: descriptor.repulsion,
            edge_length: descriptor.edge_length,
        },
    }
}
