use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};
use netgraph_lens::scene::ColorToken;

const UNKNOWN_COLOR: Color32 = Color32::from_rgb(52, 152, 219);

pub(super) fn token_color(token: &ColorToken) -> Color32 {
    token
        .to_rgb()
        .map_or(UNKNOWN_COLOR, |[r, g, b]| Color32::from_rgb(r, g, b))
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(250, 250, 252));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(200, 205, 215, 90));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// Control point of a quadratic curve bending `curveness` of the segment
/// length to the left of `start -> end`.
pub(super) fn curve_control(start: Pos2, end: Pos2, curveness: f32) -> Pos2 {
    let mid = start + (end - start) * 0.5;
    let delta = end - start;
    let normal = Vec2::new(-delta.y, delta.x);
    mid + normal * curveness
}

pub(super) fn quadratic_point(start: Pos2, control: Pos2, end: Pos2, t: f32) -> Pos2 {
    let inverse = 1.0 - t;
    let point = start.to_vec2() * (inverse * inverse)
        + control.to_vec2() * (2.0 * inverse * t)
        + end.to_vec2() * (t * t);
    point.to_pos2()
}

pub(super) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

pub(super) fn draw_arrow_head(painter: &Painter, tip: Pos2, from: Pos2, size: f32, color: Color32) {
    let direction = tip - from;
    let length = direction.length();
    if length <= f32::EPSILON {
        return;
    }

    let direction = direction / length;
    let normal = Vec2::new(-direction.y, direction.x);
    let base = tip - direction * size;
    let left = base + normal * (size * 0.5);
    let right = base - normal * (size * 0.5);
    painter.add(eframe::egui::Shape::convex_polygon(
        vec![tip, left, right],
        color,
        Stroke::NONE,
    ));
}
