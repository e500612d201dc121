use std::collections::HashSet;

use eframe::egui::epaint::QuadraticBezierShape;
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, Vec2, vec2};
use netgraph_lens::scene::NodeId;
use netgraph_lens::util::truncate_chars;

use super::super::GraphPage;
use super::super::render_utils::{
    circle_visible, curve_control, dim_color, distance_to_segment, draw_arrow_head,
    draw_background, edge_visible, quadratic_point, token_color, world_to_screen,
};

const EDGE_HOVER_DISTANCE: f32 = 4.0;
const LABEL_CHARS: usize = 16;

impl GraphPage {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_graph_zoom(ui, rect, &response);

        let zoom = self.zoom;
        let pan = self.pan;
        let screen_positions = self
            .display
            .nodes
            .iter()
            .map(|node| {
                let world = self.positions.get(&node.id).copied().unwrap_or(Vec2::ZERO);
                world_to_screen(rect, pan, zoom, world)
            })
            .collect::<Vec<_>>();
        let screen_radii = self
            .display
            .nodes
            .iter()
            .map(|node| (node.symbol_size as f32 * 0.5 * zoom.sqrt()).clamp(2.0, 60.0))
            .collect::<Vec<_>>();
        let visible_indices = (0..screen_positions.len())
            .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index]))
            .collect::<Vec<_>>();

        let hovered = Self::hovered_index(ui, &visible_indices, &screen_positions, &screen_radii);
        let hovered_index = hovered.map(|(index, _)| index);
        self.handle_graph_drag(rect, &response, hovered_index);

        let selected_neighbors = self.selected_neighbors();
        let selection_active = self.selected.is_some();
        let search_matches = self.search_matches.iter().collect::<HashSet<_>>();
        let search_active = !search_matches.is_empty();
        let pointer = ui.input(|input| input.pointer.hover_pos());
        let mut hovered_edge = None;

        for (edge_index, edge) in self.display.edges.iter().enumerate() {
            let (Some(&source), Some(&target)) = (
                self.display_index.get(&edge.source),
                self.display_index.get(&edge.target),
            ) else {
                continue;
            };

            let start = screen_positions[source];
            let end = screen_positions[target];
            let touches_selection = self.selected.as_ref().is_some_and(|selected| {
                &edge.source == selected || &edge.target == selected
            });

            let mut color = token_color(&edge.color);
            if selection_active && !edge.emphasized && !touches_selection {
                color = dim_color(color, 0.5);
            }
            let width = (edge.width * zoom.sqrt()).clamp(0.6, 6.0);
            let stroke = Stroke::new(width, color);

            if source == target {
                let radius = screen_radii[source];
                let center = start + vec2(0.0, -radius * 1.6);
                painter.circle_stroke(center, radius * 0.9, stroke);
                if hovered.is_none()
                    && let Some(pointer) = pointer
                    && (pointer.distance(center) - radius * 0.9).abs() <= EDGE_HOVER_DISTANCE
                {
                    hovered_edge = Some(edge_index);
                }
                continue;
            }

            if !edge_visible(rect, start, end, 4.0) {
                continue;
            }

            let (arrow_from, middle) = if edge.curveness > 0.0 {
                let control = curve_control(start, end, edge.curveness);
                painter.add(QuadraticBezierShape::from_points_stroke(
                    [start, control, end],
                    false,
                    Color32::TRANSPARENT,
                    stroke,
                ));
                (
                    quadratic_point(start, control, end, 0.9),
                    quadratic_point(start, control, end, 0.5),
                )
            } else {
                painter.line_segment([start, end], stroke);
                (start, start + (end - start) * 0.5)
            };

            if edge.directed {
                let direction = (end - arrow_from).normalized();
                let tip = end - direction * screen_radii[target];
                let size = (6.0 * zoom.sqrt()).clamp(4.0, 12.0);
                draw_arrow_head(&painter, tip, arrow_from, size, color);
            }

            if hovered.is_none()
                && let Some(pointer) = pointer
                && distance_to_segment(pointer, start, middle)
                    .min(distance_to_segment(pointer, middle, end))
                    <= EDGE_HOVER_DISTANCE
            {
                hovered_edge = Some(edge_index);
            }
        }

        let mut draw_order = visible_indices.clone();
        draw_order.sort_by_key(|&index| {
            let node = &self.display.nodes[index];
            (node.emphasized, self.selected.as_ref() == Some(&node.id))
        });

        for index in draw_order {
            let node = &self.display.nodes[index];
            let position = screen_positions[index];
            let radius = screen_radii[index];

            let is_selected = self.selected.as_ref() == Some(&node.id);
            let is_hovered = hovered_index == Some(index);
            let is_match = search_matches.contains(&node.id);
            let is_neighbor = selected_neighbors.contains(&node.id);

            let base_color = token_color(&node.color);
            let color = if is_selected || is_hovered || node.emphasized {
                base_color
            } else if selection_active && !is_neighbor {
                dim_color(base_color, 0.55)
            } else if search_active && !is_match {
                dim_color(base_color, 0.45)
            } else {
                base_color
            };

            painter.circle_filled(position, radius, color);
            let outline = if is_selected {
                Stroke::new(2.6, Color32::from_rgb(245, 176, 65))
            } else if is_match {
                Stroke::new(2.0, Color32::from_rgb(52, 152, 219))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(40, 40, 40, 150))
            };
            painter.circle_stroke(position, radius, outline);

            let should_draw_label = node.emphasized
                || is_selected
                || is_hovered
                || is_match
                || radius > 14.0
                || zoom > 1.6;
            if should_draw_label {
                painter.text(
                    position + vec2(radius + 4.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate_chars(&node.label, LABEL_CHARS),
                    FontId::proportional(12.0),
                    Color32::from_gray(35),
                );
            }
        }

        if self.display.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "没有可显示的节点",
                FontId::proportional(16.0),
                Color32::from_gray(110),
            );
        }

        self.draw_title_and_legend(&painter, rect);

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let selected = hovered_index
                .and_then(|index| self.display.nodes.get(index))
                .map(|node| node.id.clone());
            self.set_selected(selected);
        }

        let tooltip = match (hovered_index, hovered_edge) {
            (Some(index), _) => self.display.nodes.get(index).map(|node| node.tooltip.clone()),
            (None, Some(index)) => self.display.edges.get(index).map(|edge| edge.tooltip.clone()),
            (None, None) => None,
        };
        if let Some(lines) = tooltip
            && self.dragging.is_none()
        {
            response.on_hover_ui_at_pointer(|ui| {
                for line in lines {
                    ui.label(line);
                }
            });
        }

        if self.dragging.is_some() {
            ui.ctx().request_repaint();
        }
    }

    fn draw_title_and_legend(&self, painter: &egui::Painter, rect: egui::Rect) {
        painter.text(
            Pos2::new(rect.center().x, rect.top() + 14.0),
            Align2::CENTER_TOP,
            &self.display.title,
            FontId::proportional(18.0),
            Color32::from_gray(30),
        );

        let mut cursor = rect.left_top() + vec2(14.0, 16.0);
        for entry in &self.display.legend {
            painter.circle_filled(cursor + vec2(6.0, 0.0), 6.0, token_color(&entry.color));
            painter.text(
                cursor + vec2(18.0, 0.0),
                Align2::LEFT_CENTER,
                &entry.label,
                FontId::proportional(13.0),
                Color32::from_gray(40),
            );
            cursor.y += 20.0;
        }
    }

    fn selected_neighbors(&self) -> HashSet<NodeId> {
        let Some(selected) = self.selected.as_ref() else {
            return HashSet::new();
        };

        self.display
            .edges
            .iter()
            .filter_map(|edge| {
                if &edge.source == selected {
                    Some(edge.target.clone())
                } else if &edge.target == selected {
                    Some(edge.source.clone())
                } else {
                    None
                }
            })
            .collect()
    }
}
