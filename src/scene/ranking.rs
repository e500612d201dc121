use std::cmp::Ordering;

use serde::Serialize;

use super::{Metric, Node, NodeId};

/// The `k` nodes with the largest `metric`, ties kept in input order.
/// Nodes without the metric rank after every node that has it.
pub fn top_k(nodes: &[Node], metric: Metric, k: usize) -> Vec<&Node> {
    let mut ranked = nodes.iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| match (a.metric(metric), b.metric(metric)) {
        (Some(a_value), Some(b_value)) => b_value.total_cmp(&a_value),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranked.truncate(k);
    ranked
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: NodeId,
    pub username: String,
    pub metric: Metric,
    pub value: Option<f64>,
    pub extra: Vec<(Metric, Option<f64>)>,
}

impl LeaderboardEntry {
    pub fn line(&self) -> String {
        let mut line = format!(
            "{} - {}: {}",
            self.username,
            self.metric.label(),
            format_optional(self.metric, self.value)
        );
        for (metric, value) in &self.extra {
            line.push_str(&format!(
                " - {}: {}",
                metric.label(),
                format_optional(*metric, *value)
            ));
        }
        line
    }
}

fn format_optional(metric: Metric, value: Option<f64>) -> String {
    value
        .map(|value| metric.format_value(value))
        .unwrap_or_else(|| "-".to_owned())
}

pub fn leaderboard(nodes: &[Node], metric: Metric, extra: &[Metric], k: usize) -> Vec<LeaderboardEntry> {
    top_k(nodes, metric, k)
        .into_iter()
        .enumerate()
        .map(|(index, node)| LeaderboardEntry {
            rank: index + 1,
            id: node.id.clone(),
            username: node.username.clone(),
            metric,
            value: node.metric(metric),
            extra: extra
                .iter()
                .filter(|candidate| **candidate != metric)
                .map(|candidate| (*candidate, node.metric(*candidate)))
                .collect(),
        })
        .collect()
}
