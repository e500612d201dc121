//! View-models for the non-graph pages: message trend, friend-count
//! distribution and the per-user behaviour table.

use std::ops::Range;

use serde::Serialize;
use serde_json::Value;

use crate::backend::{FriendDistributionPayload, TimeSeriesPayload, UserBehaviorPayload};
use crate::scene::{ColorToken, NodeId};

pub const BEHAVIOR_PAGE_SIZE: usize = 10;
pub const BEHAVIOR_BAR_COLORS: [&str; 5] = ["#FF5733", "#33FF57", "#3357FF", "#FF33A1", "#A133FF"];
const FRIEND_BAR_FALLBACK: &str = "#3498db";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeSeriesChart {
    pub title: &'static str,
    pub points: Vec<(String, f64)>,
    window: Range<usize>,
}

impl TimeSeriesChart {
    pub fn from_payload(payload: &TimeSeriesPayload) -> Self {
        let points = payload
            .time_series
            .iter()
            .filter(|point| point.count.is_finite())
            .map(|point| (point.timestamp.clone(), point.count))
            .collect::<Vec<_>>();
        // Latter half visible until the user zooms.
        let window = points.len() / 2..points.len();

        Self {
            title: "消息互动趋势",
            points,
            window,
        }
    }

    pub fn window(&self) -> Range<usize> {
        self.window.clone()
    }

    pub fn visible(&self) -> &[(String, f64)] {
        &self.points[self.window.clone()]
    }

    /// Moves the zoom window; bounds are clamped and a window always keeps at
    /// least one point when there are any.
    pub fn set_window(&mut self, start: usize, end: usize) {
        let len = self.points.len();
        let end = end.clamp(start.min(len).saturating_add(1).min(len), len);
        let start = start.min(end.saturating_sub(1));
        self.window = start..end;
    }

    pub fn reset_window(&mut self) {
        self.window = 0..self.points.len();
    }

    pub fn max_count(&self) -> f64 {
        self.visible()
            .iter()
            .map(|(_, count)| *count)
            .fold(0.0, f64::max)
    }

    pub fn tooltip(&self, index: usize) -> Option<String> {
        self.points
            .get(index)
            .map(|(timestamp, count)| format!("时间: {timestamp}\n消息数: {count:.1}"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FriendBar {
    pub user: NodeId,
    pub friend_count: f64,
    pub color: ColorToken,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FriendDistributionChart {
    pub title: &'static str,
    pub bars: Vec<FriendBar>,
    pub mean: f64,
    pub median: f64,
}

impl FriendDistributionChart {
    /// Uses the backend's statistics when present, otherwise derives them
    /// from the bars.
    pub fn from_payload(payload: &FriendDistributionPayload) -> Self {
        let bars = payload
            .friend_data
            .iter()
            .filter_map(|entry| {
                let user = entry.user_id.canonical()?;
                Some(FriendBar {
                    user,
                    friend_count: entry.friend_count,
                    color: entry
                        .color
                        .as_deref()
                        .map_or_else(|| ColorToken::from(FRIEND_BAR_FALLBACK), ColorToken::new),
                })
            })
            .collect::<Vec<_>>();

        let (mean, median) = match &payload.stats {
            Some(stats) => (stats.mean_friends, stats.median_friends),
            None => {
                tracing::debug!("friend distribution without stats, deriving them");
                let counts = bars.iter().map(|bar| bar.friend_count).collect::<Vec<_>>();
                (mean(&counts), median(&counts))
            }
        };

        Self {
            title: "好友数量分布",
            bars,
            mean,
            median,
        }
    }

    pub fn max_count(&self) -> f64 {
        self.bars
            .iter()
            .map(|bar| bar.friend_count)
            .fold(self.mean.max(self.median), f64::max)
    }

    pub fn mean_label(&self) -> String {
        format!("均值: {:.1}", self.mean)
    }

    pub fn median_label(&self) -> String {
        format!("中位数: {:.1}", self.median)
    }

    pub fn tooltip(&self, index: usize) -> Option<String> {
        self.bars
            .get(index)
            .map(|bar| format!("用户 ID: {}\n好友数: {}", bar.user, bar.friend_count))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    match sorted.len() {
        0 => 0.0,
        len if len % 2 == 1 => sorted[len / 2],
        len => (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BehaviorRow {
    pub user: NodeId,
    pub username: String,
    pub message_count: f64,
    pub active_period: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserBehaviorTable {
    pub title: &'static str,
    pub rows: Vec<BehaviorRow>,
    page: usize,
    page_size: usize,
}

impl UserBehaviorTable {
    pub fn from_payload(payload: &UserBehaviorPayload) -> Self {
        let rows = payload
            .user_behavior
            .iter()
            .filter_map(|entry| {
                Some(BehaviorRow {
                    user: entry.user_id.canonical()?,
                    username: entry.username.clone(),
                    message_count: entry.message_count,
                    active_period: describe_period(entry.active_period.as_ref()),
                })
            })
            .collect();

        Self {
            title: "用户行为分析",
            rows,
            page: 0,
            page_size: BEHAVIOR_PAGE_SIZE,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.page_count() - 1);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// Rows of the current page, with their index into `rows`.
    pub fn page_rows(&self) -> impl Iterator<Item = (usize, &BehaviorRow)> {
        self.rows
            .iter()
            .enumerate()
            .skip(self.page * self.page_size)
            .take(self.page_size)
    }

    pub fn max_count(&self) -> f64 {
        self.rows
            .iter()
            .map(|row| row.message_count)
            .fold(0.0, f64::max)
    }

    pub fn bar_color(index: usize) -> ColorToken {
        ColorToken::from(BEHAVIOR_BAR_COLORS[index % BEHAVIOR_BAR_COLORS.len()])
    }
}

fn describe_period(period: Option<&Value>) -> String {
    match period {
        None | Some(Value::Null) => "-".to_owned(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|part| describe_period(Some(part)))
            .collect::<Vec<_>>()
            .join(" ~ "),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn time_series(len: usize) -> TimeSeriesChart {
        let points = (0..len)
            .map(|index| json!({"timestamp": format!("2024-01-{:02}", index + 1), "count": index}))
            .collect::<Vec<_>>();
        let payload = serde_json::from_value(json!({ "time_series": points })).expect("payload");
        TimeSeriesChart::from_payload(&payload)
    }

    #[test]
    fn time_series_starts_on_the_latter_half() {
        let chart = time_series(6);
        assert_eq!(chart.window(), 3..6);
        assert_eq!(chart.visible()[0].0, "2024-01-04");
        assert_eq!(chart.max_count(), 5.0);
        assert_eq!(chart.tooltip(2).as_deref(), Some("时间: 2024-01-03\n消息数: 2.0"));
    }

    #[test]
    fn time_series_window_is_clamped() {
        let mut chart = time_series(4);
        chart.set_window(10, 20);
        assert_eq!(chart.window(), 3..4);
        chart.set_window(2, 1);
        assert_eq!(chart.window(), 2..3);
        chart.reset_window();
        assert_eq!(chart.window(), 0..4);

        let mut empty = time_series(0);
        empty.set_window(0, 5);
        assert!(empty.visible().is_empty());
    }

    #[test]
    fn friend_stats_are_derived_when_missing() {
        let payload = serde_json::from_value(json!({
            "friend_data": [
                {"user_id": 1, "friend_count": 4, "color": "#123456"},
                {"user_id": 2, "friend_count": 1},
                {"user_id": 3, "friend_count": 10},
                {"user_id": 4, "friend_count": 5}
            ]
        }))
        .expect("payload");
        let chart = FriendDistributionChart::from_payload(&payload);

        assert_eq!(chart.mean, 5.0);
        assert_eq!(chart.median, 4.5);
        assert_eq!(chart.mean_label(), "均值: 5.0");
        assert_eq!(chart.median_label(), "中位数: 4.5");
        assert_eq!(chart.bars[1].color.as_str(), FRIEND_BAR_FALLBACK);
        assert_eq!(chart.max_count(), 10.0);
    }

    #[test]
    fn friend_stats_from_backend_win() {
        let payload = serde_json::from_value(json!({
            "friend_data": [{"user_id": "7", "friend_count": 3}],
            "stats": {"mean_friends": 2.25, "median_friends": 2.0}
        }))
        .expect("payload");
        let chart = FriendDistributionChart::from_payload(&payload);
        assert_eq!((chart.mean, chart.median), (2.25, 2.0));
        assert_eq!(chart.tooltip(0).as_deref(), Some("用户 ID: 7\n好友数: 3"));
    }

    #[test]
    fn behavior_table_paginates_within_bounds() {
        let users = (0..23)
            .map(|index| {
                json!({
                    "user_id": index,
                    "username": format!("u{index}"),
                    "message_count": index * 2,
                    "active_period": ["2024-01-01", "2024-02-01"]
                })
            })
            .collect::<Vec<_>>();
        let payload = serde_json::from_value(json!({ "user_behavior": users })).expect("payload");
        let mut table = UserBehaviorTable::from_payload(&payload);

        assert_eq!(table.page_count(), 3);
        assert_eq!(table.page_rows().count(), 10);
        table.set_page(99);
        assert_eq!(table.page(), 2);
        assert_eq!(table.page_rows().count(), 3);
        table.next_page();
        assert_eq!(table.page(), 2);
        table.set_page(0);
        table.previous_page();
        assert_eq!(table.page(), 0);

        assert_eq!(table.rows[0].active_period, "2024-01-01 ~ 2024-02-01");
        assert_eq!(UserBehaviorTable::bar_color(6).as_str(), "#33FF57");
    }

    #[test]
    fn empty_behavior_table_has_one_page() {
        let table = UserBehaviorTable::from_payload(&UserBehaviorPayload::default());
        assert_eq!(table.page_count(), 1);
        assert_eq!(table.page_rows().count(), 0);
    }
}
