use std::collections::HashSet;

use crate::backend::{BackendError, PathFinder, PathResponse};

use super::{NodeId, Scene};

/// A non-empty ordered sequence of node ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path(Vec<NodeId>);

impl Path {
    pub fn new(ids: Vec<NodeId>) -> Option<Self> {
        if ids.is_empty() { None } else { Some(Self(ids)) }
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.0
    }

    pub fn hops(&self) -> usize {
        self.0.len() - 1
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HighlightState {
    #[default]
    Idle,
    Highlighted(Path),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathRequest {
    pub token: RequestToken,
    pub start: NodeId,
    pub end: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoPathReason {
    Empty,
    Backend(String),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Highlighted { hops: usize, unmatched_hops: usize },
    NoPath { reason: NoPathReason, message: String },
    /// A newer request was issued (or the highlight was cleared) before this
    /// response arrived; nothing changed.
    Stale,
}

/// Node ids and base-scene edge indices to emphasize.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathOverlay {
    pub nodes: HashSet<NodeId>,
    pub edges: HashSet<usize>,
}

impl PathOverlay {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct PathHighlighter {
    state: HighlightState,
    issued: u64,
    pending: Option<RequestToken>,
    notice: Option<String>,
}

impl PathHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.state {
            HighlightState::Idle => None,
            HighlightState::Highlighted(path) => Some(path),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Last user-facing message (for example "未找到路径"), if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Issues a new lookup. Every earlier in-flight request becomes stale.
    pub fn submit_path(&mut self, start: NodeId, end: NodeId) -> PathRequest {
        self.issued += 1;
        let token = RequestToken(self.issued);
        self.pending = Some(token);
        self.notice = None;
        tracing::debug!(?token, %start, %end, "submitted path lookup");
        PathRequest { token, start, end }
    }

    pub fn resolve(
        &mut self,
        base: &Scene,
        token: RequestToken,
        outcome: Result<PathResponse, BackendError>,
    ) -> Resolution {
        if self.pending != Some(token) {
            tracing::debug!(?token, "discarded stale path response");
            return Resolution::Stale;
        }
        self.pending = None;

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!("path lookup failed: {error}");
                return self.fall_back_to_idle(NoPathReason::Failed(error.to_string()));
            }
        };

        if let Some(message) = response.error.as_deref() {
            return self.fall_back_to_idle(NoPathReason::Backend(message.to_owned()));
        }

        let Some(path) = Path::new(response.node_ids()) else {
            return self.fall_back_to_idle(NoPathReason::Empty);
        };

        let unmatched_hops = path
            .ids()
            .windows(2)
            .filter(|pair| {
                if let [from, to] = pair {
                    !base.edges.iter().any(|edge| edge.connects(from, to))
                } else {
                    false
                }
            })
            .count();
        if unmatched_hops > 0 {
            tracing::warn!(unmatched_hops, "path contains hops without a matching edge");
        }

        let hops = path.hops();
        self.state = HighlightState::Highlighted(path);
        Resolution::Highlighted {
            hops,
            unmatched_hops,
        }
    }

    /// Submit and resolve in one go against a synchronous path finder.
    pub fn submit_with(
        &mut self,
        base: &Scene,
        finder: &dyn PathFinder,
        start: NodeId,
        end: NodeId,
    ) -> Resolution {
        let request = self.submit_path(start, end);
        let outcome = finder.find_path(&request.start, &request.end);
        self.resolve(base, request.token, outcome)
    }

    pub fn clear(&mut self) {
        self.state = HighlightState::Idle;
        self.pending = None;
        self.notice = None;
    }

    pub fn overlay(&self, base: &Scene) -> PathOverlay {
        let Some(path) = self.path() else {
            return PathOverlay::default();
        };

        let nodes = path.ids().iter().cloned().collect::<HashSet<_>>();
        let mut edges = HashSet::new();
        for pair in path.ids().windows(2) {
            if let [from, to] = pair {
                edges.extend(
                    base.edges
                        .iter()
                        .enumerate()
                        .filter(|(_, edge)| edge.connects(from, to))
                        .map(|(index, _)| index),
                );
            }
        }

        PathOverlay { nodes, edges }
    }

    fn fall_back_to_idle(&mut self, reason: NoPathReason) -> Resolution {
        let message = match &reason {
            NoPathReason::Backend(message) if !message.trim().is_empty() => message.clone(),
            _ => crate::backend::NO_PATH_MESSAGE.to_owned(),
        };
        self.state = HighlightState::Idle;
        self.notice = Some(message.clone());
        Resolution::NoPath { reason, message }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::fixtures::{edge, node};
    use super::*;

    fn scene() -> Scene {
        Scene {
            nodes: ["1", "2", "3", "4"].iter().map(|id| node(id, &[])).collect(),
            edges: vec![edge("1", "2"), edge("3", "2"), edge("1", "4")],
        }
    }

    fn found(ids: serde_json::Value) -> Result<PathResponse, BackendError> {
        Ok(serde_json::from_value(json!({ "path": ids })).expect("path response"))
    }

    fn highlighted_ids(highlighter: &PathHighlighter) -> Vec<String> {
        highlighter
            .path()
            .map(|path| path.ids().iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    #[test]
    fn found_path_highlights_nodes_and_edges_in_either_direction() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let request = highlighter.submit_path("1".into(), "3".into());

        let resolution = highlighter.resolve(&base, request.token, found(json!([1, 2, 3])));
        assert_eq!(
            resolution,
            Resolution::Highlighted {
                hops: 2,
                unmatched_hops: 0
            }
        );

        let overlay = highlighter.overlay(&base);
        assert_eq!(overlay.nodes.len(), 3);
        assert_eq!(overlay.edges, HashSet::from([0, 1]));
    }

    #[test]
    fn single_node_path_has_no_edges() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let request = highlighter.submit_path("2".into(), "2".into());
        highlighter.resolve(&base, request.token, found(json!(["2"])));

        let overlay = highlighter.overlay(&base);
        assert_eq!(overlay.nodes, HashSet::from([NodeId::from("2")]));
        assert!(overlay.edges.is_empty());
    }

    #[test]
    fn older_response_arriving_last_is_discarded() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let first = highlighter.submit_path("1".into(), "2".into());
        let second = highlighter.submit_path("1".into(), "3".into());

        highlighter.resolve(&base, second.token, found(json!([1, 2, 3])));
        let late = highlighter.resolve(&base, first.token, found(json!([1, 2])));

        assert_eq!(late, Resolution::Stale);
        assert_eq!(highlighted_ids(&highlighter), vec!["1", "2", "3"]);
    }

    #[test]
    fn older_response_arriving_first_is_discarded() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let first = highlighter.submit_path("1".into(), "2".into());
        let second = highlighter.submit_path("1".into(), "4".into());

        assert_eq!(
            highlighter.resolve(&base, first.token, found(json!([1, 2]))),
            Resolution::Stale
        );
        assert_eq!(highlighter.state(), &HighlightState::Idle);
        highlighter.resolve(&base, second.token, found(json!([1, 4])));
        assert_eq!(highlighted_ids(&highlighter), vec!["1", "4"]);
    }

    #[test]
    fn resubmitting_replaces_the_previous_overlay() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let first = highlighter.submit_path("1".into(), "3".into());
        highlighter.resolve(&base, first.token, found(json!([1, 2, 3])));
        let second = highlighter.submit_path("1".into(), "4".into());
        highlighter.resolve(&base, second.token, found(json!([1, 4])));

        let overlay = highlighter.overlay(&base);
        assert_eq!(overlay.nodes, HashSet::from([NodeId::from("1"), NodeId::from("4")]));
        assert_eq!(overlay.edges, HashSet::from([2]));
    }

    #[test]
    fn backend_error_returns_to_idle_with_a_notice() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let first = highlighter.submit_path("1".into(), "2".into());
        highlighter.resolve(&base, first.token, found(json!([1, 2])));

        let second = highlighter.submit_path("1".into(), "9".into());
        let outcome = Ok(PathResponse::not_found());
        let resolution = highlighter.resolve(&base, second.token, outcome);

        assert!(matches!(
            resolution,
            Resolution::NoPath {
                reason: NoPathReason::Backend(_),
                ..
            }
        ));
        assert_eq!(highlighter.state(), &HighlightState::Idle);
        assert_eq!(highlighter.notice(), Some("未找到路径"));
        assert!(highlighter.overlay(&base).is_empty());
    }

    #[test]
    fn empty_path_is_no_path() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let request = highlighter.submit_path("1".into(), "3".into());
        let resolution = highlighter.resolve(&base, request.token, found(json!([])));
        assert!(matches!(
            resolution,
            Resolution::NoPath {
                reason: NoPathReason::Empty,
                ..
            }
        ));
    }

    #[test]
    fn clear_invalidates_in_flight_requests() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let request = highlighter.submit_path("1".into(), "3".into());
        highlighter.clear();

        let resolution = highlighter.resolve(&base, request.token, found(json!([1, 2, 3])));
        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(highlighter.state(), &HighlightState::Idle);
    }

    #[test]
    fn hops_without_edges_are_counted() {
        let base = scene();
        let mut highlighter = PathHighlighter::new();
        let request = highlighter.submit_path("3".into(), "4".into());
        let resolution = highlighter.resolve(&base, request.token, found(json!([3, 4])));
        assert_eq!(
            resolution,
            Resolution::Highlighted {
                hops: 1,
                unmatched_hops: 1
            }
        );
        assert!(highlighter.overlay(&base).edges.is_empty());
    }
}
