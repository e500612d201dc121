use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::GraphPage;
use super::super::render_utils::screen_to_world;

impl GraphPage {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 8.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Primary drag on a node moves the node, anywhere else it pans.
    pub(in crate::app) fn handle_graph_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered_node: Option<usize>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.dragging = hovered_node
                .and_then(|index| self.display.nodes.get(index))
                .map(|node| node.id.clone());
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            match self.dragging.as_ref() {
                Some(id) => {
                    if let (Some(pointer), Some(position)) =
                        (response.interact_pointer_pos(), self.positions.get_mut(id))
                    {
                        *position = screen_to_world(rect, self.pan, self.zoom, pointer);
                    }
                }
                None => self.pan += response.drag_delta(),
            }
        }

        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }

        if response.drag_stopped() {
            self.dragging = None;
        }
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<(usize, f32)> {
        let pointer_pos = ui.input(|input| input.pointer.hover_pos());
        pointer_pos.and_then(|pointer| {
            visible_indices
                .iter()
                .filter_map(|index| {
                    let distance = screen_positions[*index].distance(pointer);
                    if distance <= screen_radii[*index] + 2.0 {
                        Some((*index, distance))
                    } else {
                        None
                    }
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
        })
    }
}
