use eframe::egui::{self, RichText, Ui};

use super::super::GraphPage;
use super::super::render_utils::token_color;

const REPORT_ROWS: usize = 200;

impl GraphPage {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        self.draw_leaderboard(ui);
        ui.separator();
        self.draw_selection(ui);
        ui.separator();
        self.draw_report(ui);
    }

    fn draw_leaderboard(&mut self, ui: &mut Ui) {
        let Some(metric) = self.controller.ranking_metric() else {
            return;
        };

        ui.heading(format!("Top {} {}", self.controller.top_k(), metric.label()));
        let rows = self.controller.leaderboard();
        let mut picked = None;

        egui::ScrollArea::vertical()
            .id_salt("leaderboard_scroll")
            .max_height(260.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for row in &rows {
                    let text = format!("{}. {}", row.rank, row.line());
                    let selected = self.selected.as_ref() == Some(&row.id);
                    if ui.selectable_label(selected, text).clicked() {
                        picked = Some(row.id.clone());
                    }
                }
            });

        if let Some(id) = picked {
            self.set_selected(Some(id));
        }
    }

    fn draw_selection(&mut self, ui: &mut Ui) {
        ui.heading("节点详情");
        ui.add_space(4.0);

        let Some(selected) = self.selected.clone() else {
            ui.label("在图中或排行榜中选择一个节点。");
            return;
        };

        let Some(index) = self.display_index.get(&selected).copied() else {
            ui.label("该节点当前被隐藏。");
            return;
        };
        let node = &self.display.nodes[index];

        ui.horizontal(|ui| {
            ui.label(RichText::new("●").color(token_color(&node.color)));
            ui.label(RichText::new(&node.label).strong());
        });
        ui.small(format!("ID: {}", node.id));
        for line in node.tooltip.iter().skip(1) {
            ui.label(line.as_str());
        }
        if let Some(category) = &node.category {
            ui.label(format!("分类: {category}"));
        }

        let degree = self
            .display
            .edges
            .iter()
            .filter(|edge| edge.source == selected || edge.target == selected)
            .count();
        ui.label(format!("可见连边: {degree}"));

        let mut use_as = None;
        ui.horizontal(|ui| {
            if ui.button("设为起点").clicked() {
                use_as = Some(true);
            }
            if ui.button("设为终点").clicked() {
                use_as = Some(false);
            }
        });
        match use_as {
            Some(true) => self.path_start = selected.to_string(),
            Some(false) => self.path_end = selected.to_string(),
            None => {}
        }
    }

    fn draw_report(&self, ui: &mut Ui) {
        let report = self.controller.report();
        let title = format!(
            "数据检查: {} 节点 / {} 边, {} 个问题",
            report.input_nodes,
            report.input_edges,
            report.issues.len()
        );

        egui::CollapsingHeader::new(title)
            .default_open(false)
            .show(ui, |ui| {
                ui.label(format!(
                    "跳过节点: {}  丢弃边: {}",
                    report.skipped_nodes(),
                    report.dropped_edges()
                ));
                egui::ScrollArea::vertical()
                    .id_salt("report_scroll")
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for issue in report.issues.iter().take(REPORT_ROWS) {
                            ui.small(issue.to_string());
                        }
                        if report.issues.len() > REPORT_ROWS {
                            ui.small(format!("... 另有 {} 条", report.issues.len() - REPORT_ROWS));
                        }
                    });
            });
    }
}
