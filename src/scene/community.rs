use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use super::{ColorToken, CommunityId, NodeId, Scene};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Community {
    pub id: CommunityId,
    pub members: Vec<NodeId>,
    pub color: ColorToken,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommunityTable {
    entries: BTreeMap<CommunityId, Community>,
}

impl CommunityTable {
    pub fn new(entries: BTreeMap<CommunityId, Community>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: CommunityId) -> Option<&Community> {
        self.entries.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = CommunityId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Community> {
        self.entries.values()
    }

    pub fn color_of(&self, id: CommunityId) -> Option<&ColorToken> {
        self.entries.get(&id).map(|community| &community.color)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: ColorToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<CommunityId>,
}

/// Visible-community set; every community starts out visible.
#[derive(Clone, Debug, PartialEq)]
pub struct CommunityFilter {
    known: BTreeSet<CommunityId>,
    visible: BTreeSet<CommunityId>,
}

impl CommunityFilter {
    pub fn new(communities: &CommunityTable) -> Self {
        let known = communities.ids().collect::<BTreeSet<_>>();
        Self {
            visible: known.clone(),
            known,
        }
    }

    /// Flips visibility of `id` and returns the new state.
    pub fn toggle(&mut self, id: CommunityId) -> bool {
        let visible = if self.visible.remove(&id) {
            false
        } else {
            self.visible.insert(id);
            true
        };
        tracing::debug!(community = %id, visible, "toggled community");
        visible
    }

    pub fn set_visible(&mut self, id: CommunityId, visible: bool) {
        if visible {
            self.visible.insert(id);
        } else {
            self.visible.remove(&id);
        }
    }

    pub fn show_all(&mut self) {
        self.visible = self.known.clone();
    }

    pub fn hide_all(&mut self) {
        self.visible.clear();
    }

    pub fn is_visible(&self, id: CommunityId) -> bool {
        self.visible.contains(&id)
    }

    pub fn visible(&self) -> &BTreeSet<CommunityId> {
        &self.visible
    }
}

/// Sub-scene of nodes in a visible community and the edges between them.
pub fn project(scene: &Scene, visible: &BTreeSet<CommunityId>) -> Scene {
    let nodes = scene
        .nodes
        .iter()
        .filter(|node| node.community.is_some_and(|community| visible.contains(&community)))
        .cloned()
        .collect::<Vec<_>>();

    let kept = nodes.iter().map(|node| &node.id).collect::<HashSet<_>>();
    let edges = scene
        .edges
        .iter()
        .filter(|edge| kept.contains(&edge.source) && kept.contains(&edge.target))
        .cloned()
        .collect();

    Scene { nodes, edges }
}

pub fn legend(visible: &BTreeSet<CommunityId>, communities: &CommunityTable) -> Vec<LegendEntry> {
    visible
        .iter()
        .filter_map(|&id| {
            communities.color_of(id).map(|color| LegendEntry {
                label: id.label(),
                color: color.clone(),
                community: Some(id),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{edge, member, node};
    use super::*;

    fn scene() -> Scene {
        Scene {
            nodes: vec![member("1", 0), member("2", 0), member("3", 1), member("4", 2), node("5", &[])],
            edges: vec![edge("1", "2"), edge("2", "3"), edge("3", "4"), edge("4", "4")],
        }
    }

    fn table() -> CommunityTable {
        let entries = [(0, "#ff0000"), (1, "#00ff00"), (2, "#0000ff")]
            .into_iter()
            .map(|(id, color)| {
                let id = CommunityId(id);
                (
                    id,
                    Community {
                        id,
                        members: Vec::new(),
                        color: ColorToken::from(color),
                    },
                )
            })
            .collect();
        CommunityTable::new(entries)
    }

    #[test]
    fn starts_with_every_community_visible() {
        let filter = CommunityFilter::new(&table());
        assert_eq!(filter.visible().len(), 3);
        assert_eq!(project(&scene(), filter.visible()).nodes.len(), 4);
    }

    #[test]
    fn hidden_community_takes_its_edges_along() {
        let mut filter = CommunityFilter::new(&table());
        assert!(!filter.toggle(CommunityId(1)));

        let projected = project(&scene(), filter.visible());
        let ids = projected
            .nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "2", "4"]);
        assert_eq!(projected.edges, vec![edge("1", "2"), edge("4", "4")]);
    }

    #[test]
    fn projection_is_idempotent() {
        let mut filter = CommunityFilter::new(&table());
        filter.toggle(CommunityId(2));
        let once = project(&scene(), filter.visible());
        let twice = project(&once, filter.visible());
        assert_eq!(once, twice);
    }

    #[test]
    fn toggling_back_restores_the_projection() {
        let mut filter = CommunityFilter::new(&table());
        let original = project(&scene(), filter.visible());
        filter.toggle(CommunityId(0));
        assert_ne!(project(&scene(), filter.visible()), original);
        filter.toggle(CommunityId(0));
        assert_eq!(project(&scene(), filter.visible()), original);
    }

    #[test]
    fn legend_lists_visible_communities_in_ascending_order() {
        let mut filter = CommunityFilter::new(&table());
        filter.hide_all();
        filter.set_visible(CommunityId(2), true);
        filter.set_visible(CommunityId(0), true);

        let entries = legend(filter.visible(), &table());
        let labels = entries
            .iter()
            .map(|entry| format!("{}={}", entry.label, entry.color))
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["社区 1=#ff0000", "社区 3=#0000ff"]);

        filter.show_all();
        assert_eq!(legend(filter.visible(), &table()).len(), 3);
    }
}
