use crate::backend::{BackendError, GraphPayload, PathFinder, PathResponse};

use super::{
    Category, ColorSource, CommunityFilter, CommunityId, CommunityTable, DisplayScene,
    LeaderboardEntry, Metric, NodeId, NormalizeReport, Normalized, PathHighlighter, PathRequest,
    RequestToken, Resolution, Scene, SceneError, ViewDescriptor, categorize, compose, leaderboard,
    normalize_for, search_nodes,
};

/// Interaction state of one loaded view. The base scene never changes after
/// construction; every mutation bumps `revision` so renderers can cache the
/// composed scene.
#[derive(Clone, Debug)]
pub struct ViewController {
    descriptor: ViewDescriptor,
    base: Scene,
    communities: CommunityTable,
    report: NormalizeReport,
    filter: Option<CommunityFilter>,
    highlighter: PathHighlighter,
    ranking_metric: Option<Metric>,
    top_k: usize,
    revision: u64,
}

impl ViewController {
    pub fn new(descriptor: ViewDescriptor, payload: &GraphPayload, top_k: usize) -> Self {
        let normalized = normalize_for(payload, descriptor.category_metric);
        Self::from_normalized(descriptor, normalized, top_k)
    }

    pub fn from_normalized(descriptor: ViewDescriptor, normalized: Normalized, top_k: usize) -> Self {
        let Normalized {
            scene,
            communities,
            report,
        } = normalized;

        let filter = (descriptor.color_source == ColorSource::Community)
            .then(|| CommunityFilter::new(&communities));
        let ranking_metric = descriptor.default_ranking_metric();

        Self {
            descriptor,
            base: scene,
            communities,
            report,
            filter,
            highlighter: PathHighlighter::new(),
            ranking_metric,
            top_k,
            revision: 0,
        }
    }

    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    pub fn base_scene(&self) -> &Scene {
        &self.base
    }

    pub fn communities(&self) -> &CommunityTable {
        &self.communities
    }

    pub fn report(&self) -> &NormalizeReport {
        &self.report
    }

    pub fn filter(&self) -> Option<&CommunityFilter> {
        self.filter.as_ref()
    }

    pub fn highlighter(&self) -> &PathHighlighter {
        &self.highlighter
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the community's new visibility, or `None` for views without
    /// community data.
    pub fn toggle_community(&mut self, id: CommunityId) -> Option<bool> {
        let visible = self.filter.as_mut()?.toggle(id);
        self.bump();
        Some(visible)
    }

    pub fn show_all_communities(&mut self) {
        if let Some(filter) = self.filter.as_mut() {
            filter.show_all();
            self.bump();
        }
    }

    pub fn hide_all_communities(&mut self) {
        if let Some(filter) = self.filter.as_mut() {
            filter.hide_all();
            self.bump();
        }
    }

    pub fn ranking_metric(&self) -> Option<Metric> {
        self.ranking_metric
    }

    /// Switches the leaderboard metric. Metrics the view does not rank by are
    /// rejected.
    pub fn set_ranking_metric(&mut self, metric: Metric) -> bool {
        if !self.descriptor.ranking_metrics.contains(&metric) {
            tracing::debug!(%metric, view = %self.descriptor.kind, "ranking metric not offered");
            return false;
        }

        if self.ranking_metric != Some(metric) {
            self.ranking_metric = Some(metric);
            self.bump();
        }
        true
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn set_top_k(&mut self, top_k: usize) {
        if self.top_k != top_k {
            self.top_k = top_k;
            self.bump();
        }
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let Some(metric) = self.ranking_metric else {
            return Vec::new();
        };
        leaderboard(
            &self.base.nodes,
            metric,
            &self.descriptor.leaderboard_columns,
            self.top_k,
        )
    }

    /// `None` when the view has no categories or the node is unknown.
    pub fn category_of(&self, id: &NodeId) -> Option<Result<&Category, SceneError>> {
        let metric = self.descriptor.category_metric?;
        let thresholds = self.descriptor.thresholds.as_ref()?;
        let node = self.base.node(id)?;
        Some(categorize(node, metric, thresholds))
    }

    pub fn submit_path(&mut self, start: NodeId, end: NodeId) -> PathRequest {
        let request = self.highlighter.submit_path(start, end);
        self.bump();
        request
    }

    pub fn resolve_path(
        &mut self,
        token: RequestToken,
        outcome: Result<PathResponse, BackendError>,
    ) -> Resolution {
        let resolution = self.highlighter.resolve(&self.base, token, outcome);
        if resolution != Resolution::Stale {
            self.bump();
        }
        resolution
    }

    pub fn find_path_with(
        &mut self,
        finder: &dyn PathFinder,
        start: NodeId,
        end: NodeId,
    ) -> Resolution {
        let resolution = self.highlighter.submit_with(&self.base, finder, start, end);
        self.bump();
        resolution
    }

    pub fn clear_path(&mut self) {
        self.highlighter.clear();
        self.bump();
    }

    pub fn display_scene(&self) -> DisplayScene {
        compose(
            &self.base,
            &self.descriptor,
            &self.communities,
            self.filter.as_ref().map(CommunityFilter::visible),
            &self.highlighter,
        )
    }

    pub fn search(&self, query: &str) -> Vec<NodeId> {
        search_nodes(&self.base, query)
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
