use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use reqwest::Url;

use crate::backend::SourceLocation;
use crate::scene::ViewKind;

pub const LOG_ENV: &str = "NETGRAPH_LOG";
pub const DEFAULT_LOG_FILTER: &str = "netgraph_lens=info";

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Base address of the analytics backend.
    #[arg(long, default_value = "http://127.0.0.1:5000/")]
    pub backend: String,

    /// Read recorded JSON responses from this directory instead of the backend.
    #[arg(long)]
    pub payload_dir: Option<PathBuf>,

    /// Page shown on startup (centrality, messages, hits, pagerank, social, communities).
    #[arg(long, default_value = "pagerank")]
    pub view: String,

    #[arg(long, default_value_t = 10)]
    pub top_k: usize,

    /// tracing filter directive, overrides NETGRAPH_LOG.
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Font file with CJK glyphs, needed for the Chinese labels.
    #[arg(long)]
    pub cjk_font: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub source: SourceLocation,
    pub initial_view: ViewKind,
    pub top_k: usize,
    pub cjk_font: Option<PathBuf>,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self> {
        let source = match &args.payload_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    bail!("payload directory {} does not exist", dir.display());
                }
                SourceLocation::Directory(dir.clone())
            }
            None => SourceLocation::Http(parse_backend(&args.backend)?),
        };

        let initial_view = ViewKind::from_slug(&args.view).with_context(|| {
            let known = ViewKind::ALL.map(ViewKind::slug).join(", ");
            format!("unknown view `{}` (expected one of: {known})", args.view)
        })?;

        if args.top_k == 0 {
            bail!("--top-k must be at least 1");
        }

        Ok(Self {
            source,
            initial_view,
            top_k: args.top_k,
            cjk_font: args.cjk_font.clone(),
        })
    }
}

/// Parses the backend address; a trailing slash is added so endpoints join
/// below the given path instead of replacing its last segment.
fn parse_backend(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).with_context(|| format!("invalid backend address `{raw}`"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("backend address `{raw}` must use http or https");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("netgraph-lens").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn defaults_point_at_the_local_backend() {
        let args = parse(&[]);
        let settings = Settings::from_args(&args).expect("settings");

        assert_eq!(
            settings.source,
            SourceLocation::Http(Url::parse("http://127.0.0.1:5000/").expect("url"))
        );
        assert_eq!(settings.initial_view, ViewKind::PageRank);
        assert_eq!(settings.top_k, 10);
        assert!(args.log_filter.is_none());
    }

    #[test]
    fn backend_without_trailing_slash_keeps_its_path() {
        let args = parse(&["--backend", "http://example.test/netgraph", "--view", "hits"]);
        let settings = Settings::from_args(&args).expect("settings");
        assert_eq!(
            settings.source,
            SourceLocation::Http(Url::parse("http://example.test/netgraph/").expect("url"))
        );
        assert_eq!(settings.initial_view, ViewKind::Hits);
    }

    #[test]
    fn payload_dir_overrides_the_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().to_string_lossy().into_owned();
        let settings = Settings::from_args(&parse(&["--payload-dir", &path])).expect("settings");
        assert_eq!(settings.source, SourceLocation::Directory(dir.path().to_path_buf()));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(Settings::from_args(&parse(&["--view", "nope"])).is_err());
        assert!(Settings::from_args(&parse(&["--top-k", "0"])).is_err());
        assert!(Settings::from_args(&parse(&["--backend", "ftp://host/"])).is_err());
        assert!(Settings::from_args(&parse(&["--payload-dir", "/definitely/missing"])).is_err());
    }
}
