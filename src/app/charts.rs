use eframe::egui::{
    self, Align2, Color32, Context, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, vec2,
};
use netgraph_lens::charts::{FriendDistributionChart, TimeSeriesChart, UserBehaviorTable};
use netgraph_lens::util::truncate_chars;

use super::render_utils::token_color;

const AXIS_MARGIN: f32 = 48.0;
const Y_TICKS: usize = 5;
const MEAN_COLOR: Color32 = Color32::from_rgb(220, 20, 60);
const MEDIAN_COLOR: Color32 = Color32::from_rgb(30, 90, 220);
const LINE_COLOR: Color32 = Color32::from_rgb(52, 152, 219);

pub(super) fn show_trend(ctx: &Context, chart: &mut TimeSeriesChart) {
    egui::TopBottomPanel::bottom("trend_window").show(ctx, |ui| {
        let len = chart.points.len();
        let window = chart.window();
        let (mut start, mut end) = (window.start, window.end);
        ui.horizontal(|ui| {
            ui.label("窗口");
            let upper = len.saturating_sub(1);
            let changed_start = ui
                .add(egui::Slider::new(&mut start, 0..=upper).text("起点"))
                .changed();
            let changed_end = ui
                .add(egui::Slider::new(&mut end, 1.min(len)..=len).text("终点"))
                .changed();
            if changed_start || changed_end {
                chart.set_window(start, end);
            }
            if ui.button("重置").clicked() {
                chart.reset_window();
            }
        });
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading(chart.title);
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter_at(rect);
        let plot = plot_area(rect);
        let max = nice_max(chart.max_count());
        draw_axes(&painter, plot, max);

        let window = chart.window();
        let visible = chart.visible();
        if visible.is_empty() {
            draw_empty(&painter, plot);
            return;
        }

        let step = if visible.len() > 1 {
            plot.width() / (visible.len() - 1) as f32
        } else {
            0.0
        };
        let points = visible
            .iter()
            .enumerate()
            .map(|(index, (_, count))| {
                Pos2::new(plot.left() + step * index as f32, value_y(plot, *count, max))
            })
            .collect::<Vec<_>>();

        painter.add(Shape::line(points.clone(), Stroke::new(2.0, LINE_COLOR)));
        for point in &points {
            painter.circle_filled(*point, 3.0, LINE_COLOR);
        }

        let label_every = (visible.len() / 8).max(1);
        for (index, (timestamp, _)) in visible.iter().enumerate().step_by(label_every) {
            painter.text(
                Pos2::new(points[index].x, plot.bottom() + 6.0),
                Align2::CENTER_TOP,
                truncate_chars(timestamp, 16),
                FontId::proportional(11.0),
                Color32::from_gray(70),
            );
        }

        let hovered = response.hover_pos().and_then(|pointer| {
            points
                .iter()
                .enumerate()
                .min_by(|a, b| (a.1.x - pointer.x).abs().total_cmp(&(b.1.x - pointer.x).abs()))
                .map(|(index, _)| index)
        });
        if let Some(index) = hovered
            && let Some(text) = chart.tooltip(window.start + index)
        {
            painter.circle_stroke(points[index], 6.0, Stroke::new(2.0, LINE_COLOR));
            response.on_hover_text_at_pointer(text);
        }
    });
}

pub(super) fn show_friends(ctx: &Context, chart: &mut FriendDistributionChart) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading(chart.title);
        ui.horizontal(|ui| {
            ui.colored_label(MEAN_COLOR, chart.mean_label());
            ui.colored_label(MEDIAN_COLOR, chart.median_label());
        });

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter_at(rect);
        let plot = plot_area(rect);
        let max = nice_max(chart.max_count().max(chart.mean).max(chart.median));
        draw_axes(&painter, plot, max);

        if chart.bars.is_empty() {
            draw_empty(&painter, plot);
            return;
        }

        let slot = plot.width() / chart.bars.len() as f32;
        let bar_width = (slot * 0.7).max(1.0);
        let mut hovered = None;
        let pointer = response.hover_pos();
        for (index, bar) in chart.bars.iter().enumerate() {
            let left = plot.left() + slot * index as f32 + (slot - bar_width) / 2.0;
            let bar_rect = Rect::from_min_max(
                Pos2::new(left, value_y(plot, bar.friend_count, max)),
                Pos2::new(left + bar_width, plot.bottom()),
            );
            painter.rect_filled(bar_rect, 0.0, token_color(&bar.color));
            if pointer.is_some_and(|pointer| bar_rect.expand2(vec2(slot * 0.15, 0.0)).contains(pointer)) {
                hovered = Some(index);
            }
        }

        draw_reference_line(&painter, plot, value_y(plot, chart.mean, max), MEAN_COLOR);
        draw_reference_line(&painter, plot, value_y(plot, chart.median, max), MEDIAN_COLOR);

        if let Some(text) = hovered.and_then(|index| chart.tooltip(index)) {
            response.on_hover_text_at_pointer(text);
        }
    });
}

pub(super) fn show_behavior(ctx: &Context, table: &mut UserBehaviorTable) {
    egui::TopBottomPanel::bottom("behavior_table")
        .resizable(true)
        .min_height(220.0)
        .show(ctx, |ui| draw_behavior_table(ui, table));

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading(table.title);
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter_at(rect);
        let plot = plot_area(rect);
        let max = nice_max(table.max_count());
        draw_axes(&painter, plot, max);

        let rows = table.page_rows().collect::<Vec<_>>();
        if rows.is_empty() {
            draw_empty(&painter, plot);
            return;
        }

        let slot = plot.width() / rows.len() as f32;
        let bar_width = (slot * 0.6).max(1.0);
        let pointer = response.hover_pos();
        let mut hovered = None;
        for (position, (index, row)) in rows.iter().enumerate() {
            let left = plot.left() + slot * position as f32 + (slot - bar_width) / 2.0;
            let bar_rect = Rect::from_min_max(
                Pos2::new(left, value_y(plot, row.message_count, max)),
                Pos2::new(left + bar_width, plot.bottom()),
            );
            painter.rect_filled(bar_rect, 2.0, token_color(&UserBehaviorTable::bar_color(*index)));
            painter.text(
                Pos2::new(bar_rect.center().x, plot.bottom() + 6.0),
                Align2::CENTER_TOP,
                truncate_chars(&row.username, 10),
                FontId::proportional(11.0),
                Color32::from_gray(60),
            );
            if pointer.is_some_and(|pointer| bar_rect.contains(pointer)) {
                hovered = Some(*row);
            }
        }

        if let Some(row) = hovered {
            response.on_hover_text_at_pointer(format!(
                "{}\n消息数: {}\n活跃时段: {}",
                row.username, row.message_count, row.active_period
            ));
        }
    });
}

fn draw_behavior_table(ui: &mut Ui, table: &mut UserBehaviorTable) {
    ui.horizontal(|ui| {
        if ui
            .add_enabled(table.page() > 0, egui::Button::new("上一页"))
            .clicked()
        {
            table.previous_page();
        }
        ui.label(format!("{} / {}", table.page() + 1, table.page_count()));
        if ui
            .add_enabled(table.page() + 1 < table.page_count(), egui::Button::new("下一页"))
            .clicked()
        {
            table.next_page();
        }
    });
    ui.separator();

    egui::ScrollArea::vertical()
        .id_salt("behavior_rows")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            egui::Grid::new("behavior_grid")
                .num_columns(4)
                .striped(true)
                .show(ui, |ui| {
                    ui.strong("用户 ID");
                    ui.strong("用户名");
                    ui.strong("消息数");
                    ui.strong("活跃时段");
                    ui.end_row();

                    for (_, row) in table.page_rows() {
                        ui.label(row.user.to_string());
                        ui.label(row.username.as_str());
                        ui.label(row.message_count.to_string());
                        ui.label(row.active_period.as_str());
                        ui.end_row();
                    }
                });
        });
}

fn plot_area(rect: Rect) -> Rect {
    Rect::from_min_max(
        rect.left_top() + vec2(AXIS_MARGIN, 16.0),
        rect.right_bottom() - vec2(16.0, AXIS_MARGIN * 0.6),
    )
}

fn value_y(plot: Rect, value: f64, max: f64) -> f32 {
    if max <= 0.0 {
        return plot.bottom();
    }
    let ratio = (value / max).clamp(0.0, 1.0) as f32;
    plot.bottom() - plot.height() * ratio
}

/// Rounds the axis ceiling up to 1, 2 or 5 times a power of ten.
fn nice_max(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32);
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|step| step * magnitude)
        .find(|candidate| *candidate >= value)
        .unwrap_or(10.0 * magnitude)
}

fn draw_axes(painter: &Painter, plot: Rect, max: f64) {
    painter.rect_filled(plot, 0.0, Color32::from_rgb(252, 252, 253));
    let axis = Stroke::new(1.0, Color32::from_gray(120));
    let grid = Stroke::new(1.0, Color32::from_gray(228));

    for tick in 0..=Y_TICKS {
        let value = max * tick as f64 / Y_TICKS as f64;
        let y = value_y(plot, value, max);
        if tick > 0 {
            painter.line_segment([Pos2::new(plot.left(), y), Pos2::new(plot.right(), y)], grid);
        }
        painter.text(
            Pos2::new(plot.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            format_tick(value),
            FontId::proportional(11.0),
            Color32::from_gray(80),
        );
    }

    painter.line_segment([plot.left_bottom(), plot.right_bottom()], axis);
    painter.line_segment([plot.left_top(), plot.left_bottom()], axis);
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn draw_reference_line(painter: &Painter, plot: Rect, y: f32, color: Color32) {
    painter.extend(Shape::dashed_line(
        &[Pos2::new(plot.left(), y), Pos2::new(plot.right(), y)],
        Stroke::new(1.5, color),
        8.0,
        5.0,
    ));
}

fn draw_empty(painter: &Painter, plot: Rect) {
    painter.text(
        plot.center(),
        Align2::CENTER_CENTER,
        "暂无数据",
        FontId::proportional(16.0),
        Color32::from_gray(110),
    );
}

#[cfg(test)]
mod tests {
    use super::nice_max;

    #[test]
    fn axis_ceiling_rounds_to_readable_steps() {
        assert_eq!(nice_max(0.0), 1.0);
        assert_eq!(nice_max(3.0), 5.0);
        assert_eq!(nice_max(12.0), 20.0);
        assert_eq!(nice_max(100.0), 100.0);
    }
}
