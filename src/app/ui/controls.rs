use std::sync::Arc;

use eframe::egui::{self, RichText, Ui};
use netgraph_lens::backend::AnalyticsSource;

use super::super::GraphPage;

const MAX_TOP_K: usize = 50;
const SEARCH_RESULT_ROWS: usize = 12;

impl GraphPage {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, source: &Arc<dyn AnalyticsSource>) {
        ui.heading(self.controller.descriptor().title);
        ui.label(format!(
            "节点: {}  边: {}",
            self.display.nodes.len(),
            self.display.edges.len()
        ));
        ui.separator();

        self.draw_ranking_controls(ui);
        self.draw_search(ui);
        ui.separator();
        self.draw_path_form(ui, source);

        if self.controller.filter().is_some() {
            ui.separator();
            self.draw_community_toggles(ui);
        }
    }

    fn draw_ranking_controls(&mut self, ui: &mut Ui) {
        let metrics = self.controller.descriptor().ranking_metrics.clone();
        if metrics.is_empty() {
            return;
        }

        ui.label("排行指标");
        ui.horizontal_wrapped(|ui| {
            let mut chosen = self.controller.ranking_metric();
            for metric in &metrics {
                ui.selectable_value(&mut chosen, Some(*metric), metric.label());
            }
            if let Some(metric) = chosen
                && chosen != self.controller.ranking_metric()
            {
                self.controller.set_ranking_metric(metric);
            }
        });

        let mut top_k = self.controller.top_k();
        let slider = ui
            .add(egui::Slider::new(&mut top_k, 1..=MAX_TOP_K).text("Top-K"))
            .on_hover_text("Number of leaderboard rows.");
        if slider.changed() {
            self.controller.set_top_k(top_k);
        }
        ui.add_space(6.0);
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("搜索用户 (用户名或 ID)");
        let response = ui.text_edit_singleline(&mut self.search);
        if response.changed() {
            self.update_search();
        }

        let mut picked = None;
        let mut start = None;
        let mut end = None;
        for id in self.search_matches.iter().take(SEARCH_RESULT_ROWS) {
            let Some(node) = self.controller.base_scene().node(id) else {
                continue;
            };
            ui.horizontal(|ui| {
                if ui.link(format!("{} ({id})", node.username)).clicked() {
                    picked = Some(id.clone());
                }
                if ui.small_button("起点").clicked() {
                    start = Some(id.to_string());
                }
                if ui.small_button("终点").clicked() {
                    end = Some(id.to_string());
                }
            });
        }
        if self.search_matches.len() > SEARCH_RESULT_ROWS {
            ui.small(format!("... 共 {} 个匹配", self.search_matches.len()));
        }

        if let Some(id) = picked {
            self.set_selected(Some(id));
        }
        if let Some(id) = start {
            self.path_start = id;
        }
        if let Some(id) = end {
            self.path_end = id;
        }
    }

    fn draw_path_form(&mut self, ui: &mut Ui, source: &Arc<dyn AnalyticsSource>) {
        ui.label(RichText::new("最短路径").strong());
        egui::Grid::new("path_form").num_columns(2).show(ui, |ui| {
            ui.label("起点");
            ui.text_edit_singleline(&mut self.path_start);
            ui.end_row();
            ui.label("终点");
            ui.text_edit_singleline(&mut self.path_end);
            ui.end_row();
        });

        ui.horizontal(|ui| {
            if ui.button("查找路径").clicked() {
                self.request_path(source);
            }
            let can_clear = self.controller.highlighter().path().is_some()
                || self.controller.highlighter().is_pending();
            if ui.add_enabled(can_clear, egui::Button::new("清除")).clicked() {
                self.clear_path();
            }
        });

        if let Some(status) = &self.path_status {
            ui.label(status.as_str());
        }
        if let Some(path) = self.controller.highlighter().path() {
            let names = path
                .ids()
                .iter()
                .map(|id| {
                    self.controller
                        .base_scene()
                        .node(id)
                        .map_or_else(|| id.to_string(), |node| node.username.clone())
                })
                .collect::<Vec<_>>();
            ui.small(names.join(" → "));
        }
    }

    fn draw_community_toggles(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("社区").strong());
        ui.horizontal(|ui| {
            if ui.button("全部显示").clicked() {
                self.controller.show_all_communities();
            }
            if ui.button("全部隐藏").clicked() {
                self.controller.hide_all_communities();
            }
        });

        let communities = self
            .controller
            .communities()
            .iter()
            .map(|community| (community.id, community.members.len()))
            .collect::<Vec<_>>();

        egui::ScrollArea::vertical()
            .id_salt("community_toggles")
            .max_height(260.0)
            .show(ui, |ui| {
                for (id, members) in communities {
                    let mut visible = self
                        .controller
                        .filter()
                        .is_some_and(|filter| filter.is_visible(id));
                    let label = format!("{} ({members})", id.label());
                    if ui.checkbox(&mut visible, label).changed() {
                        self.controller.toggle_community(id);
                    }
                }
            });
    }
}
