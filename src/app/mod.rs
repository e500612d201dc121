use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use netgraph_lens::backend::{AnalyticsSource, BackendError, PathResponse};
use netgraph_lens::charts::{FriendDistributionChart, TimeSeriesChart, UserBehaviorTable};
use netgraph_lens::scene::{DisplayScene, NodeId, RequestToken, ViewController, ViewKind};

mod charts;
mod graph;
mod layout;
mod render_utils;
mod ui;

type LoadResult = Result<PageModel, String>;
type PathOutcome = (RequestToken, Result<PathResponse, BackendError>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Page {
    Graph(ViewKind),
    MessageTrend,
    FriendDistribution,
    UserBehavior,
}

impl Page {
    pub(crate) const ALL: [Page; 9] = [
        Page::Graph(ViewKind::Centrality),
        Page::Graph(ViewKind::Messages),
        Page::Graph(ViewKind::Hits),
        Page::Graph(ViewKind::PageRank),
        Page::Graph(ViewKind::SocialNetwork),
        Page::Graph(ViewKind::Communities),
        Page::MessageTrend,
        Page::FriendDistribution,
        Page::UserBehavior,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Page::Graph(ViewKind::Centrality) => "中心性",
            Page::Graph(ViewKind::Messages) => "消息网络",
            Page::Graph(ViewKind::Hits) => "HITS",
            Page::Graph(ViewKind::PageRank) => "PageRank",
            Page::Graph(ViewKind::SocialNetwork) => "社交网络",
            Page::Graph(ViewKind::Communities) => "社区",
            Page::MessageTrend => "消息趋势",
            Page::FriendDistribution => "好友分布",
            Page::UserBehavior => "用户行为",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct NetGraphApp {
    source: Arc<dyn AnalyticsSource>,
    page: Page,
    top_k: usize,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<PageModel>),
    Error(String),
}

enum PageModel {
    Graph(Box<GraphPage>),
    Trend(TimeSeriesChart),
    Friends(FriendDistributionChart),
    Behavior(UserBehaviorTable),
}

/// Renderer state of one graph view: the controller owns the semantics, this
/// owns positions, camera and the widgets' text buffers.
struct GraphPage {
    controller: ViewController,
    display: DisplayScene,
    display_revision: u64,
    display_index: HashMap<NodeId, usize>,
    positions: HashMap<NodeId, Vec2>,
    pan: Vec2,
    zoom: f32,
    search: String,
    search_matches: Vec<NodeId>,
    selected: Option<NodeId>,
    dragging: Option<NodeId>,
    path_start: String,
    path_end: String,
    path_status: Option<String>,
    path_tx: Sender<PathOutcome>,
    path_rx: Receiver<PathOutcome>,
}

impl NetGraphApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        source: Arc<dyn AnalyticsSource>,
        initial_view: ViewKind,
        top_k: usize,
        cjk_font: Option<Vec<u8>>,
    ) -> Self {
        if let Some(bytes) = cjk_font {
            install_cjk_font(&cc.egui_ctx, bytes);
        }

        let page = Page::Graph(initial_view);
        let state = Self::start_load(Arc::clone(&source), page, top_k);
        Self {
            source,
            page,
            top_k,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: Arc<dyn AnalyticsSource>, page: Page, top_k: usize) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_page(source.as_ref(), page, top_k).map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                tracing::error!(%page, "{error}");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: Arc<dyn AnalyticsSource>, page: Page, top_k: usize) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source, page, top_k),
        }
    }

    fn switch_page(&mut self, page: Page) {
        tracing::info!(%page, "switching page");
        self.page = page;
        self.reload_rx = None;
        self.state = Self::start_load(Arc::clone(&self.source), page, self.top_k);
    }

    fn draw_navigation(&mut self, ctx: &Context, is_reloading: bool) -> (Option<Page>, bool) {
        let mut next_page = None;
        let mut reload_requested = false;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.heading("netgraph-lens");
                    ui.separator();
                    let mut chosen = self.page;
                    for page in Page::ALL {
                        ui.selectable_value(&mut chosen, page, page.label());
                    }
                    if chosen != self.page {
                        next_page = Some(chosen);
                    }
                    ui.separator();
                    let refresh = ui.add_enabled(!is_reloading, egui::Button::new("刷新"));
                    if refresh.clicked() {
                        reload_requested = true;
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.small(self.source.describe());
                    });
                });
            });

        (next_page, reload_requested)
    }
}

fn load_page(source: &dyn AnalyticsSource, page: Page, top_k: usize) -> anyhow::Result<PageModel> {
    use anyhow::Context as _;

    let model = match page {
        Page::Graph(kind) => {
            let descriptor = kind.descriptor()?;
            let payload = source
                .graph(kind)
                .with_context(|| format!("failed to load the {kind} view"))?;
            let controller = ViewController::new(descriptor, &payload, top_k);
            PageModel::Graph(Box::new(GraphPage::new(controller)))
        }
        Page::MessageTrend => PageModel::Trend(TimeSeriesChart::from_payload(
            &source.time_series().context("failed to load the message trend")?,
        )),
        Page::FriendDistribution => PageModel::Friends(FriendDistributionChart::from_payload(
            &source
                .friend_distribution()
                .context("failed to load the friend distribution")?,
        )),
        Page::UserBehavior => PageModel::Behavior(UserBehaviorTable::from_payload(
            &source.user_behavior().context("failed to load user behaviour")?,
        )),
    };

    Ok(model)
}

fn install_cjk_font(ctx: &Context, bytes: Vec<u8>) {
    const FONT_NAME: &str = "cjk";

    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(
        FONT_NAME.to_owned(),
        Arc::new(egui::FontData::from_owned(bytes)),
    );
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push(FONT_NAME.to_owned());
    }
    ctx.set_fonts(fonts);
}

impl eframe::App for NetGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let is_reloading = self.reload_rx.is_some();
        let (next_page, reload_requested) = self.draw_navigation(ctx, is_reloading);

        if let Some(page) = next_page {
            self.switch_page(page);
            return;
        }

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(model) => AppState::Ready(Box::new(model)),
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("正在加载 {} ...", self.page));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("数据加载失败");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    transition = Some(Self::start_load(
                        Arc::clone(&self.source),
                        self.page,
                        self.top_k,
                    ));
                }
            }
            AppState::Ready(model) => {
                match model.as_mut() {
                    PageModel::Graph(page) => page.show(ctx, &self.source),
                    PageModel::Trend(chart) => charts::show_trend(ctx, chart),
                    PageModel::Friends(chart) => charts::show_friends(ctx, chart),
                    PageModel::Behavior(table) => charts::show_behavior(ctx, table),
                }

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(
                        Arc::clone(&self.source),
                        self.page,
                        self.top_k,
                    ));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(model) => AppState::Ready(Box::new(model)),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
