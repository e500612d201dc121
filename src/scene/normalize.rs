use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::backend::{GraphPayload, RawEdge, RawId, RawNode, value_kind};

use super::{
    ColorToken, Community, CommunityId, CommunityTable, Edge, Metric, Node, NodeId, Scene,
};

#[derive(Clone, Debug, PartialEq)]
pub enum PayloadIssue {
    MissingSection(&'static str),
    MalformedSection { section: &'static str, found: &'static str },
    MalformedNode { index: usize, reason: String },
    InvalidNodeField { id: NodeId, field: &'static str, reason: String },
    MissingUsername { id: NodeId },
    DuplicateNode { id: NodeId },
    MissingMetric { id: NodeId, metric: Metric },
    MalformedEdge { index: usize, reason: String },
    InvalidEdgeWeight { source: NodeId, target: NodeId, reason: String },
    DanglingEdge { source: NodeId, target: NodeId },
    CommunityMismatch { id: NodeId, listed: CommunityId },
    MalformedCommunityMap { reason: String },
    MalformedColor { index: usize, found: &'static str },
}

impl fmt::Display for PayloadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSection(section) => write!(f, "payload has no `{section}` array"),
            Self::MalformedSection { section, found } => {
                write!(f, "`{section}` ignored: expected an array, found {found}")
            }
            Self::MalformedNode { index, reason } => write!(f, "node #{index} skipped: {reason}"),
            Self::InvalidNodeField { id, field, reason } => {
                write!(f, "node {id}: `{field}` ignored: {reason}")
            }
            Self::MissingUsername { id } => write!(f, "node {id} has no username"),
            Self::DuplicateNode { id } => write!(f, "duplicate node {id} skipped"),
            Self::MissingMetric { id, metric } => {
                write!(f, "node {id} skipped: no `{metric}` value")
            }
            Self::MalformedEdge { index, reason } => write!(f, "edge #{index} skipped: {reason}"),
            Self::InvalidEdgeWeight {
                source,
                target,
                reason,
            } => write!(f, "edge {source} -> {target}: weight ignored: {reason}"),
            Self::DanglingEdge { source, target } => {
                write!(f, "edge {source} -> {target} dropped: unknown endpoint")
            }
            Self::CommunityMismatch { id, listed } => {
                write!(f, "node {id} is listed under community {listed} but carries another")
            }
            Self::MalformedCommunityMap { reason } => write!(f, "community_map ignored: {reason}"),
            Self::MalformedColor { index, found } => {
                write!(f, "colors[{index}] ignored: expected a string, found {found}")
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizeReport {
    pub input_nodes: usize,
    pub input_edges: usize,
    pub issues: Vec<PayloadIssue>,
}

impl NormalizeReport {
    pub fn dropped_edges(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| {
                matches!(
                    issue,
                    PayloadIssue::MalformedEdge { .. } | PayloadIssue::DanglingEdge { .. }
                )
            })
            .count()
    }

    pub fn skipped_nodes(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| {
                matches!(
                    issue,
                    PayloadIssue::MalformedNode { .. }
                        | PayloadIssue::DuplicateNode { .. }
                        | PayloadIssue::MissingMetric { .. }
                )
            })
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, issue: PayloadIssue) {
        tracing::warn!("{issue}");
        self.issues.push(issue);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Normalized {
    pub scene: Scene,
    pub communities: CommunityTable,
    pub report: NormalizeReport,
}

pub fn normalize(payload: &GraphPayload) -> Normalized {
    normalize_for(payload, None)
}

/// Like [`normalize`], but nodes lacking `required` are skipped so that every
/// node in the scene can be categorized by it.
pub fn normalize_for(payload: &GraphPayload, required: Option<Metric>) -> Normalized {
    let mut report = NormalizeReport::default();

    let raw_nodes = section(payload.nodes.as_ref(), "nodes", &mut report);
    let raw_edges = section(payload.edges.as_ref(), "edges", &mut report);
    report.input_nodes = raw_nodes.len();
    report.input_edges = raw_edges.len();

    let nodes = collect_nodes(raw_nodes, required, &mut report);
    let known_ids = nodes.iter().map(|node| node.id.clone()).collect::<HashSet<_>>();
    let edges = collect_edges(raw_edges, &known_ids, &mut report);
    let communities = collect_communities(payload, &nodes, &mut report);

    tracing::info!(
        nodes = nodes.len(),
        edges = edges.len(),
        communities = communities.len(),
        issues = report.issues.len(),
        "normalized analytics payload"
    );

    Normalized {
        scene: Scene { nodes, edges },
        communities,
        report,
    }
}

/// A section that is absent or not an array is reported and read as empty.
fn section<'a>(value: Option<&'a Value>, name: &'static str, report: &mut NormalizeReport) -> &'a [Value] {
    match value {
        None | Some(Value::Null) => {
            report.push(PayloadIssue::MissingSection(name));
            &[]
        }
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            report.push(PayloadIssue::MalformedSection {
                section: name,
                found: value_kind(other),
            });
            &[]
        }
    }
}

fn collect_nodes(raw_nodes: &[Value], required: Option<Metric>, report: &mut NormalizeReport) -> Vec<Node> {
    let mut seen = HashSet::with_capacity(raw_nodes.len());
    let mut nodes = Vec::with_capacity(raw_nodes.len());

    for (index, value) in raw_nodes.iter().enumerate() {
        let raw = match RawNode::deserialize(value) {
            Ok(raw) => raw,
            Err(error) => {
                report.push(PayloadIssue::MalformedNode {
                    index,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        let Some(id) = raw.id.as_ref().and_then(RawId::canonical) else {
            report.push(PayloadIssue::MalformedNode {
                index,
                reason: "missing or empty id".to_owned(),
            });
            continue;
        };

        if !seen.insert(id.clone()) {
            report.push(PayloadIssue::DuplicateNode { id });
            continue;
        }

        let mut field = |name: &'static str, parsed: Result<Option<f64>, String>| {
            parsed.unwrap_or_else(|reason| {
                report.push(PayloadIssue::InvalidNodeField {
                    id: id.clone(),
                    field: name,
                    reason,
                });
                None
            })
        };

        let metrics = Metric::ALL
            .into_iter()
            .filter_map(|metric| {
                field(metric.key(), number_field(raw_metric(&raw, metric))).map(|value| (metric, value))
            })
            .collect::<BTreeMap<_, _>>();
        let size = field("size", number_field(raw.size.as_ref()));

        if let Some(metric) = required
            && !metrics.contains_key(&metric)
        {
            report.push(PayloadIssue::MissingMetric { id, metric });
            continue;
        }

        let community = community_field(raw.community.as_ref()).unwrap_or_else(|reason| {
            report.push(PayloadIssue::InvalidNodeField {
                id: id.clone(),
                field: "community",
                reason,
            });
            None
        });
        let color = text_field(raw.color.as_ref()).unwrap_or_else(|reason| {
            report.push(PayloadIssue::InvalidNodeField {
                id: id.clone(),
                field: "color",
                reason,
            });
            None
        });
        let username = match text_field(raw.username.as_ref()) {
            Ok(Some(name)) => name.to_owned(),
            Ok(None) => {
                report.push(PayloadIssue::MissingUsername { id: id.clone() });
                id.to_string()
            }
            Err(reason) => {
                report.push(PayloadIssue::InvalidNodeField {
                    id: id.clone(),
                    field: "username",
                    reason,
                });
                report.push(PayloadIssue::MissingUsername { id: id.clone() });
                id.to_string()
            }
        };

        nodes.push(Node {
            id,
            username,
            size,
            metrics,
            community,
            color: color.map(ColorToken::new),
        });
    }

    nodes
}

fn raw_metric(raw: &RawNode, metric: Metric) -> Option<&Value> {
    match metric {
        Metric::Centrality => raw.centrality.as_ref(),
        Metric::Activity => raw.activity.as_ref(),
        Metric::Hub => raw.hub.as_ref(),
        Metric::Authority => raw.authority.as_ref(),
        Metric::Pagerank => raw.pagerank.as_ref(),
        Metric::Degree => raw.degree.as_ref(),
    }
}

/// Finite number, or a string holding one. `null` reads as absent.
fn number_field(value: Option<&Value>) -> Result<Option<f64>, String> {
    let number = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(other) => return Err(format!("expected a number, found {}", value_kind(other))),
    };

    match number {
        Some(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(format!("`{}` is not a finite number", value.map_or_else(String::new, Value::to_string))),
    }
}

/// Community ids are non-negative integers; integral floats such as `1.0`
/// are accepted the same way node ids are.
fn community_field(value: Option<&Value>) -> Result<Option<CommunityId>, String> {
    let Some(number) = number_field(value)? else {
        return Ok(None);
    };

    if number.fract() != 0.0 || number < 0.0 || number > f64::from(u32::MAX) {
        return Err(format!("{number} is not a community id"));
    }
    Ok(Some(CommunityId(number as u32)))
}

/// Non-blank trimmed string. Blank strings and `null` read as absent.
fn text_field(value: Option<&Value>) -> Result<Option<&str>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => {
            let text = text.trim();
            Ok((!text.is_empty()).then_some(text))
        }
        Some(other) => Err(format!("expected a string, found {}", value_kind(other))),
    }
}

fn collect_edges(raw_edges: &[Value], known_ids: &HashSet<NodeId>, report: &mut NormalizeReport) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(raw_edges.len());

    for (index, value) in raw_edges.iter().enumerate() {
        let raw = match RawEdge::deserialize(value) {
            Ok(raw) => raw,
            Err(error) => {
                report.push(PayloadIssue::MalformedEdge {
                    index,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        let (Some(source), Some(target)) = (
            raw.source.as_ref().and_then(RawId::canonical),
            raw.target.as_ref().and_then(RawId::canonical),
        ) else {
            report.push(PayloadIssue::MalformedEdge {
                index,
                reason: "missing endpoint".to_owned(),
            });
            continue;
        };

        if !known_ids.contains(&source) || !known_ids.contains(&target) {
            report.push(PayloadIssue::DanglingEdge { source, target });
            continue;
        }

        let weight = number_field(raw.weight.as_ref()).unwrap_or_else(|reason| {
            report.push(PayloadIssue::InvalidEdgeWeight {
                source: source.clone(),
                target: target.clone(),
                reason,
            });
            None
        });

        edges.push(Edge {
            source,
            target,
            weight,
        });
    }

    edges
}

/// Payload colours by community index; unusable entries are `None` and fall
/// back to a hue slot.
fn collect_palette(value: Option<&Value>, report: &mut NormalizeReport) -> Vec<Option<ColorToken>> {
    let entries = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            report.push(PayloadIssue::MalformedSection {
                section: "colors",
                found: value_kind(other),
            });
            return Vec::new();
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::String(color) if !color.trim().is_empty() => Some(ColorToken::new(color.trim())),
            Value::String(_) => None,
            other => {
                report.push(PayloadIssue::MalformedColor {
                    index,
                    found: value_kind(other),
                });
                None
            }
        })
        .collect()
}

fn collect_communities(payload: &GraphPayload, nodes: &[Node], report: &mut NormalizeReport) -> CommunityTable {
    let mut members: BTreeMap<CommunityId, Vec<NodeId>> = BTreeMap::new();
    for node in nodes {
        if let Some(community) = node.community {
            members.entry(community).or_default().push(node.id.clone());
        }
    }

    if members.is_empty() {
        return CommunityTable::default();
    }

    match &payload.community_map {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => cross_check_community_map(map, nodes, report),
        Some(other) => report.push(PayloadIssue::MalformedCommunityMap {
            reason: format!("expected an object, found {}", value_kind(other)),
        }),
    }

    let palette = collect_palette(payload.colors.as_ref(), report);
    let palette_size = palette
        .len()
        .max(members.keys().next_back().map_or(0, |last| last.0 as usize + 1));

    let entries = members
        .into_iter()
        .map(|(id, members)| {
            let color = palette
                .get(id.0 as usize)
                .cloned()
                .flatten()
                .unwrap_or_else(|| ColorToken::from_hue_slot(id.0 as usize, palette_size));
            (id, Community { id, members, color })
        })
        .collect();

    CommunityTable::new(entries)
}

fn cross_check_community_map(
    map: &serde_json::Map<String, Value>,
    nodes: &[Node],
    report: &mut NormalizeReport,
) {
    let assigned = nodes
        .iter()
        .filter_map(|node| node.community.map(|community| (&node.id, community)))
        .collect::<HashMap<_, _>>();

    for (key, listed) in map {
        let Ok(listed_community) = key.trim().parse::<u32>().map(CommunityId) else {
            report.push(PayloadIssue::MalformedCommunityMap {
                reason: format!("community key `{key}` is not an integer"),
            });
            continue;
        };

        let ids = match Vec::<RawId>::deserialize(listed) {
            Ok(ids) => ids,
            Err(error) => {
                report.push(PayloadIssue::MalformedCommunityMap {
                    reason: error.to_string(),
                });
                continue;
            }
        };

        for id in ids.iter().filter_map(RawId::canonical) {
            if let Some(&actual) = assigned.get(&id)
                && actual != listed_community
            {
                report.push(PayloadIssue::CommunityMismatch {
                    id,
                    listed: listed_community,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> GraphPayload {
        GraphPayload::from_value(value).expect("valid payload shape")
    }

    fn assert_no_dangling(normalized: &Normalized) {
        for edge in &normalized.scene.edges {
            assert!(normalized.scene.contains(&edge.source), "dangling source {}", edge.source);
            assert!(normalized.scene.contains(&edge.target), "dangling target {}", edge.target);
        }
    }

    #[test]
    fn numeric_edge_endpoints_match_string_node_ids() {
        let normalized = normalize(&payload(json!({
            "nodes": [
                { "id": "1", "username": "alice", "size": 600, "pagerank": 0.06 },
                { "id": "2", "username": "bob", "size": 300, "pagerank": 0.001 }
            ],
            "edges": [{ "source": 1, "target": 2, "weight": 3 }]
        })));

        assert!(normalized.report.is_clean(), "{:?}", normalized.report.issues);
        assert_eq!(normalized.scene.edges.len(), 1);
        assert_eq!(normalized.scene.edges[0].weight, Some(3.0));
        assert_no_dangling(&normalized);
    }

    #[test]
    fn dangling_edges_are_dropped_and_counted() {
        let normalized = normalize(&payload(json!({
            "nodes": [{ "id": 1, "username": "a" }, { "id": 2, "username": "b" }],
            "edges": [
                { "source": 1, "target": 2 },
                { "source": 1, "target": 9 },
                { "source": 2 },
                "not an edge"
            ]
        })));

        assert_eq!(normalized.scene.edges.len(), 1);
        assert_eq!(
            normalized.report.dropped_edges(),
            normalized.report.input_edges - normalized.scene.edges.len()
        );
        assert_no_dangling(&normalized);
    }

    #[test]
    fn absent_fields_stay_absent() {
        let normalized = normalize(&payload(json!({
            "nodes": [{ "id": 5, "username": "eve", "activity": 12 }],
            "edges": []
        })));

        let node = &normalized.scene.nodes[0];
        assert_eq!(node.size, None);
        assert_eq!(node.community, None);
        assert_eq!(node.metric(Metric::Activity), Some(12.0));
        assert_eq!(node.metric(Metric::Hub), None);
    }

    #[test]
    fn malformed_and_duplicate_nodes_are_skipped() {
        let normalized = normalize(&payload(json!({
            "nodes": [
                { "id": 1, "username": "a" },
                { "username": "no id" },
                { "id": "1", "username": "again" },
                42
            ],
            "edges": []
        })));

        assert_eq!(normalized.scene.nodes.len(), 1);
        assert_eq!(normalized.scene.nodes[0].username, "a");
        assert_eq!(normalized.report.skipped_nodes(), 3);
    }

    #[test]
    fn required_metric_filters_nodes_and_their_edges() {
        let normalized = normalize_for(
            &payload(json!({
                "nodes": [
                    { "id": 1, "username": "a", "centrality": 2000 },
                    { "id": 2, "username": "b" }
                ],
                "edges": [{ "source": 1, "target": 2 }]
            })),
            Some(Metric::Centrality),
        );

        assert_eq!(normalized.scene.nodes.len(), 1);
        assert!(normalized.scene.edges.is_empty());
        assert!(normalized.report.issues.contains(&PayloadIssue::MissingMetric {
            id: NodeId::from("2"),
            metric: Metric::Centrality,
        }));
    }

    #[test]
    fn missing_sections_are_reported_not_fatal() {
        let normalized = normalize(&payload(json!({})));
        assert!(normalized.scene.is_empty());
        assert_eq!(
            normalized.report.issues,
            vec![
                PayloadIssue::MissingSection("nodes"),
                PayloadIssue::MissingSection("edges")
            ]
        );
    }

    #[test]
    fn communities_follow_node_fields_and_payload_colors() {
        let normalized = normalize(&payload(json!({
            "community_map": { "0": [1, 2], "1": [3] },
            "colors": ["#ff0000", "#00ffff"],
            "nodes": [
                { "id": 1, "username": "a", "community": 0 },
                { "id": 2, "username": "b", "community": 1 },
                { "id": 3, "username": "c", "community": 1 }
            ],
            "edges": []
        })));

        let communities = &normalized.communities;
        assert_eq!(communities.len(), 2);
        assert_eq!(
            communities.get(CommunityId(1)).map(|c| c.members.len()),
            Some(2)
        );
        assert_eq!(
            communities.get(CommunityId(0)).map(|c| c.color.as_str()),
            Some("#ff0000")
        );
        assert!(normalized.report.issues.contains(&PayloadIssue::CommunityMismatch {
            id: NodeId::from("2"),
            listed: CommunityId(0),
        }));
    }

    #[test]
    fn unusable_colors_fall_back_to_hue_slots() {
        let normalized = normalize(&payload(json!({
            "colors": ["#f00", null],
            "nodes": [
                { "id": 1, "username": "a", "community": 0 },
                { "id": 2, "username": "b", "community": 1 }
            ],
            "edges": [{ "source": 1, "target": 2 }]
        })));

        let communities = &normalized.communities;
        assert_eq!(communities.color_of(CommunityId(0)).map(ColorToken::as_str), Some("#f00"));
        assert_eq!(
            communities.color_of(CommunityId(1)),
            Some(&ColorToken::from_hue_slot(1, 2))
        );
        assert_eq!(
            normalized.report.issues,
            vec![PayloadIssue::MalformedColor {
                index: 1,
                found: "null"
            }]
        );
        assert_eq!(normalized.scene.edges.len(), 1);
    }

    #[test]
    fn non_array_sections_read_as_empty() {
        let normalized = normalize(&payload(json!({
            "nodes": { "1": { "id": 1, "username": "a" } },
            "edges": "none",
            "colors": "#ff0000"
        })));

        assert!(normalized.scene.is_empty());
        assert_eq!(
            normalized.report.issues,
            vec![
                PayloadIssue::MalformedSection {
                    section: "nodes",
                    found: "an object"
                },
                PayloadIssue::MalformedSection {
                    section: "edges",
                    found: "a string"
                }
            ]
        );
    }

    #[test]
    fn wrongly_typed_optional_fields_cost_the_field_not_the_node() {
        let normalized = normalize_for(
            &payload(json!({
                "nodes": [
                    { "id": 1, "username": "alice", "size": "600", "pagerank": "0.06" },
                    { "id": 2, "username": "bob", "size": [1], "pagerank": 0.001, "community": 1.0 },
                    { "id": 3, "username": 7, "pagerank": 0.01, "community": -1, "color": 5 }
                ],
                "edges": [
                    { "source": 1, "target": 2, "weight": "heavy" },
                    { "source": 2, "target": 3, "weight": "2" }
                ]
            })),
            Some(Metric::Pagerank),
        );

        let scene = &normalized.scene;
        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.edges.len(), 2);
        assert_no_dangling(&normalized);

        let alice = scene.node(&NodeId::from("1")).expect("alice kept");
        assert_eq!(alice.size, Some(600.0));
        assert_eq!(alice.metric(Metric::Pagerank), Some(0.06));

        let bob = scene.node(&NodeId::from("2")).expect("bob kept");
        assert_eq!(bob.size, None);
        assert_eq!(bob.community, Some(CommunityId(1)));

        let third = scene.node(&NodeId::from("3")).expect("node 3 kept");
        assert_eq!(third.username, "3");
        assert_eq!(third.community, None);
        assert_eq!(third.color, None);

        assert_eq!(scene.edges[0].weight, None);
        assert_eq!(scene.edges[1].weight, Some(2.0));

        let report = &normalized.report;
        assert_eq!(report.skipped_nodes(), 0);
        assert_eq!(report.dropped_edges(), 0);
        let invalid_fields = report
            .issues
            .iter()
            .filter_map(|issue| match issue {
                PayloadIssue::InvalidNodeField { id, field, .. } => Some(format!("{id}.{field}")),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(invalid_fields, ["2.size", "3.community", "3.color", "3.username"]);
        assert!(report.issues.iter().any(|issue| matches!(
            issue,
            PayloadIssue::InvalidEdgeWeight { source, .. } if source.as_str() == "1"
        )));
    }

    #[test]
    fn normalization_is_deterministic() {
        let raw = payload(json!({
            "nodes": [{ "id": 1, "username": "a", "hub": 0.5 }, { "id": 2, "username": "b" }],
            "edges": [{ "source": "2", "target": 1, "weight": 1.5 }]
        }));
        assert_eq!(normalize(&raw), normalize(&raw));
    }
}
