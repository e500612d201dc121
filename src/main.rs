mod app;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use netgraph_lens::backend;
use netgraph_lens::config::{Args, DEFAULT_LOG_FILTER, LOG_ENV, Settings};
use tracing_subscriber::EnvFilter;

fn setup_logging(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_env(LOG_ENV).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.log_filter.as_deref());

    let settings = Settings::from_args(&args)?;
    let cjk_font = settings
        .cjk_font
        .as_ref()
        .map(|path| {
            fs::read(path).with_context(|| format!("failed to read font {}", path.display()))
        })
        .transpose()?;
    let source = backend::connect(&settings.source)?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "netgraph-lens",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::NetGraphApp::new(
                cc,
                source,
                settings.initial_view,
                settings.top_k,
                cjk_font,
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("failed to start the window: {error}"))
}
