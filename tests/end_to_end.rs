use std::fs;
use std::path::Path;

use netgraph_lens::backend::{AnalyticsSource, DirectorySource, NO_PATH_MESSAGE};
use netgraph_lens::charts::{FriendDistributionChart, TimeSeriesChart, UserBehaviorTable};
use netgraph_lens::scene::{
    CommunityId, HighlightState, NoPathReason, NodeId, Resolution, ViewController, ViewKind,
};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write(dir: &Path, file: &str, body: Value) {
    fs::write(dir.join(file), body.to_string()).expect("write payload");
}

fn recorded_backend() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "api_messages_pagerank.json",
        json!({
            "nodes": [
                {"id": 1, "username": "alice", "pagerank": 0.06, "size": 30},
                {"id": 2, "username": "bob", "pagerank": 0.001, "size": 10},
                {"id": "3", "username": "carol", "pagerank": 0.01},
                {"username": "nobody"}
            ],
            "edges": [
                {"source": 1, "target": 2, "weight": 3},
                {"source": 2, "target": 3, "weight": 1},
                {"source": 3, "target": 42}
            ]
        }),
    );
    write(
        dir.path(),
        "api_user_communities.json",
        json!({
            "community_map": {"0": [1, 2], "1": [3]},
            "nodes": [
                {"id": 1, "username": "alice", "community": 0},
                {"id": 2, "username": "bob", "community": 0},
                {"id": 3, "username": "carol", "community": 1}
            ],
            "edges": [
                {"source": 1, "target": 2},
                {"source": 2, "target": 3}
            ],
            "colors": ["#e6194b", "#3cb44b"]
        }),
    );
    write(dir.path(), "path_1_3.json", json!({"path": [1, 2, 3], "steps": 2}));
    write(dir.path(), "path_2_1.json", json!({"error": NO_PATH_MESSAGE}));
    write(
        dir.path(),
        "api_by_timestamp.json",
        json!({"time_series": [
            {"timestamp": "2024-01-01 10:00", "count": 3},
            {"timestamp": "2024-01-01 11:00", "count": 7},
            {"timestamp": "2024-01-01 12:00", "count": 2},
            {"timestamp": "2024-01-01 13:00", "count": 5}
        ]}),
    );
    write(
        dir.path(),
        "api_friend_distribution.json",
        json!({
            "friend_data": [
                {"user_id": 1, "friend_count": 4, "color": "#ff0000"},
                {"user_id": 2, "friend_count": 2}
            ],
            "stats": {"mean_friends": 3.0, "median_friends": 3.0}
        }),
    );
    write(
        dir.path(),
        "api_user_behavior.json",
        json!({"user_behavior": (1..=12)
            .map(|id| json!({
                "user_id": id,
                "username": format!("user{id}"),
                "message_count": id * 2,
                "active_period": "09:00-18:00"
            }))
            .collect::<Vec<_>>()}),
    );
    dir
}

fn load(source: &DirectorySource, kind: ViewKind) -> ViewController {
    let payload = source.graph(kind).expect("recorded graph");
    ViewController::new(kind.descriptor().expect("descriptor"), &payload, 1)
}

#[test]
fn pagerank_view_categorizes_ranks_and_reports_skipped_data() {
    let dir = recorded_backend();
    let source = DirectorySource::new(dir.path());
    let controller = load(&source, ViewKind::PageRank);

    let scene = controller.display_scene();
    let alice = scene.node(&NodeId::from("1")).expect("alice");
    let bob = scene.node(&NodeId::from("2")).expect("bob");
    assert_eq!(alice.category.as_deref(), Some("高影响力"));
    assert_eq!(bob.category.as_deref(), Some("低影响力"));
    assert_eq!(scene.nodes.len(), 3);
    assert_eq!(scene.edges.len(), 2);

    let top = controller.leaderboard();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, NodeId::from("1"));

    let report = controller.report();
    assert_eq!(report.skipped_nodes(), 1);
    assert_eq!(report.dropped_edges(), 1);
}

#[test]
fn recorded_path_is_highlighted_then_cleared() {
    let dir = recorded_backend();
    let source = DirectorySource::new(dir.path());
    let mut controller = load(&source, ViewKind::PageRank);
    let plain = controller.display_scene();

    let resolution = controller.find_path_with(&source, "1".into(), "3".into());
    assert_eq!(
        resolution,
        Resolution::Highlighted {
            hops: 2,
            unmatched_hops: 0
        }
    );
    let highlighted = controller.display_scene();
    assert_eq!(highlighted.emphasized_nodes().count(), 3);
    assert_eq!(highlighted.emphasized_edges().count(), 2);

    controller.clear_path();
    assert_eq!(controller.display_scene(), plain);
}

#[test]
fn backend_no_path_and_missing_recordings_leave_the_scene_plain() {
    let dir = recorded_backend();
    let source = DirectorySource::new(dir.path());
    let mut controller = load(&source, ViewKind::PageRank);
    let plain = controller.display_scene();

    for (start, end) in [("2", "1"), ("3", "1")] {
        let resolution = controller.find_path_with(&source, start.into(), end.into());
        assert!(matches!(
            resolution,
            Resolution::NoPath {
                reason: NoPathReason::Backend(_),
                ..
            }
        ));
        assert_eq!(controller.highlighter().state(), &HighlightState::Idle);
        assert_eq!(controller.highlighter().notice(), Some(NO_PATH_MESSAGE));
        assert_eq!(controller.display_scene(), plain);
    }
}

#[test]
fn community_toggles_survive_path_highlights() {
    let dir = recorded_backend();
    let source = DirectorySource::new(dir.path());
    let mut controller = load(&source, ViewKind::Communities);

    assert_eq!(controller.toggle_community(CommunityId(1)), Some(false));
    controller.find_path_with(&source, "1".into(), "3".into());

    let scene = controller.display_scene();
    assert_eq!(scene.nodes.len(), 2);
    assert!(scene.node(&NodeId::from("3")).is_none());
    assert_eq!(scene.emphasized_nodes().count(), 2);
    assert_eq!(scene.emphasized_edges().count(), 1);
    assert_eq!(scene.legend.len(), 1);

    controller.show_all_communities();
    let scene = controller.display_scene();
    assert_eq!(scene.nodes.len(), 3);
    assert_eq!(scene.emphasized_nodes().count(), 3);
}

#[test]
fn chart_pages_load_from_recordings() {
    let dir = recorded_backend();
    let source = DirectorySource::new(dir.path());

    let trend = TimeSeriesChart::from_payload(&source.time_series().expect("time series"));
    assert_eq!(trend.points.len(), 4);
    assert_eq!(trend.window(), 2..4);
    assert_eq!(trend.max_count(), 5.0);

    let friends =
        FriendDistributionChart::from_payload(&source.friend_distribution().expect("friends"));
    assert_eq!(friends.bars.len(), 2);
    assert_eq!(friends.mean_label(), "均值: 3.0");

    let mut behavior = UserBehaviorTable::from_payload(&source.user_behavior().expect("behavior"));
    assert_eq!(behavior.page_count(), 2);
    behavior.next_page();
    assert_eq!(behavior.page_rows().count(), 2);
    behavior.next_page();
    assert_eq!(behavior.page(), 1);
}

#[test]
fn loosely_typed_recordings_still_render() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "api_messages_pagerank.json",
        json!({
            "nodes": [
                {"id": 1, "username": "alice", "pagerank": 0.06, "size": "600"},
                {"id": 2, "username": "bob", "pagerank": 0.001, "community": 1.0}
            ],
            "edges": [{"source": 1, "target": 2}]
        }),
    );
    write(
        dir.path(),
        "api_user_communities.json",
        json!({
            "nodes": [
                {"id": 1, "username": "alice", "community": 0},
                {"id": 2, "username": "bob", "community": 1}
            ],
            "edges": [{"source": 1, "target": 2}],
            "colors": ["#ff0000", null]
        }),
    );
    let source = DirectorySource::new(dir.path());

    let pagerank = load(&source, ViewKind::PageRank).display_scene();
    assert_eq!(pagerank.nodes.len(), 2);
    assert_eq!(pagerank.edges.len(), 1);

    let communities = load(&source, ViewKind::Communities);
    assert_eq!(communities.display_scene().legend.len(), 2);
    assert_eq!(communities.report().issues.len(), 1);
}

#[test]
fn missing_recording_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = DirectorySource::new(dir.path());
    assert!(source.graph(ViewKind::Hits).is_err());
}
