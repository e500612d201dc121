use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use eframe::egui::{self, Context, Vec2};
use netgraph_lens::backend::AnalyticsSource;
use netgraph_lens::scene::{LayoutHints, NodeId, Resolution, ViewController};

use super::GraphPage;
use super::layout::force_layout;

mod interaction;
mod view;

const LAYOUT_ITERATIONS_SMALL: usize = 320;
const LAYOUT_ITERATIONS_LARGE: usize = 120;
const LARGE_GRAPH_NODES: usize = 400;

impl GraphPage {
    pub(in crate::app) fn new(controller: ViewController) -> Self {
        let display = controller.display_scene();
        let display_revision = controller.revision();
        let positions = initial_positions(&controller);
        let (path_tx, path_rx) = mpsc::channel();

        let mut page = Self {
            controller,
            display,
            display_revision,
            display_index: HashMap::new(),
            positions,
            pan: Vec2::ZERO,
            zoom: 1.0,
            search: String::new(),
            search_matches: Vec::new(),
            selected: None,
            dragging: None,
            path_start: String::new(),
            path_end: String::new(),
            path_status: None,
            path_tx,
            path_rx,
        };
        page.rebuild_display_index();
        page
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, source: &Arc<dyn AnalyticsSource>) {
        self.poll_path_responses();
        self.sync_display();

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui, source));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        self.sync_display();

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        if self.controller.highlighter().is_pending() {
            ctx.request_repaint();
        }
    }

    fn sync_display(&mut self) {
        if self.controller.revision() == self.display_revision {
            return;
        }

        self.display = self.controller.display_scene();
        self.display_revision = self.controller.revision();
        self.rebuild_display_index();
    }

    fn rebuild_display_index(&mut self) {
        self.display_index = self
            .display
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
    }

    /// Accepts an id or an exact username.
    pub(in crate::app) fn resolve_endpoint(&self, text: &str) -> Option<NodeId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let base = self.controller.base_scene();
        let id = NodeId::from(text);
        if base.contains(&id) {
            return Some(id);
        }

        base.nodes
            .iter()
            .find(|node| node.username == text)
            .map(|node| node.id.clone())
            .or(Some(id))
    }

    pub(in crate::app) fn request_path(&mut self, source: &Arc<dyn AnalyticsSource>) {
        let (Some(start), Some(end)) = (
            self.resolve_endpoint(&self.path_start),
            self.resolve_endpoint(&self.path_end),
        ) else {
            self.path_status = Some("请输入起点和终点".to_owned());
            return;
        };

        let request = self.controller.submit_path(start, end);
        self.path_status = Some("查询中...".to_owned());

        let source = Arc::clone(source);
        let tx = self.path_tx.clone();
        thread::spawn(move || {
            let outcome = source.find_path(&request.start, &request.end);
            let _ = tx.send((request.token, outcome));
        });
    }

    pub(in crate::app) fn clear_path(&mut self) {
        self.controller.clear_path();
        self.path_status = None;
    }

    fn poll_path_responses(&mut self) {
        while let Ok((token, outcome)) = self.path_rx.try_recv() {
            match self.controller.resolve_path(token, outcome) {
                Resolution::Highlighted {
                    hops,
                    unmatched_hops,
                } => {
                    let mut status = format!("最短路径: {hops} 步");
                    if unmatched_hops > 0 {
                        status.push_str(&format!(" ({unmatched_hops} 段无对应边)"));
                    }
                    self.path_status = Some(status);
                }
                Resolution::NoPath { message, .. } => self.path_status = Some(message),
                Resolution::Stale => {}
            }
        }
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<NodeId>) {
        self.selected = selected;
    }

    pub(in crate::app) fn update_search(&mut self) {
        self.search_matches = self.controller.search(&self.search);
    }
}

fn initial_positions(controller: &ViewController) -> HashMap<NodeId, Vec2> {
    let scene = controller.base_scene();
    let descriptor = controller.descriptor();

    let index_by_id = scene
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (&node.id, index))
        .collect::<HashMap<_, _>>();
    let ids = scene.nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
    let edges = scene
        .edges
        .iter()
        .filter_map(|edge| Some((*index_by_id.get(&edge.source)?, *index_by_id.get(&edge.target)?)))
        .collect::<Vec<_>>();
    let radii = scene
        .nodes
        .iter()
        .map(|node| (descriptor.symbol_size(node.size) as f32 * 0.5).clamp(2.0, 40.0))
        .collect::<Vec<_>>();

    let iterations = if ids.len() > LARGE_GRAPH_NODES {
        LAYOUT_ITERATIONS_LARGE
    } else {
        LAYOUT_ITERATIONS_SMALL
    };
    let hints = LayoutHints {
        repulsion: descriptor.repulsion,
        edge_length: descriptor.edge_length,
    };

    let started = Instant::now();
    let positions = force_layout(&ids, &edges, &radii, hints, iterations);
    tracing::debug!(
        nodes = ids.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "computed layout"
    );

    scene
        .nodes
        .iter()
        .map(|node| node.id.clone())
        .zip(positions)
        .collect()
}
