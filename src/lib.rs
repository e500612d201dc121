//! Interactive view-models for social-network analytics: turns the JSON
//! produced by a graph-analysis backend into explorable scenes and charts.

pub mod backend;
pub mod charts;
pub mod config;
pub mod scene;
pub mod util;
