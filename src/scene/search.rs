use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::{NodeId, Scene};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Node ids whose username or id fuzzily matches `query`, best match first.
/// An empty query matches nothing.
pub fn search_nodes(scene: &Scene, query: &str) -> Vec<NodeId> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = scene
        .nodes
        .iter()
        .filter_map(|node| {
            let by_name = fuzzy_match_score(&matcher, &node.username, query);
            let by_id = fuzzy_match_score(&matcher, node.id.as_str(), query);
            by_name.max(by_id).map(|score| (score, &node.id))
        })
        .collect::<Vec<_>>();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, id)| id.clone()).collect()
}
