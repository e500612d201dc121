use thiserror::Error;

use super::{Metric, NodeId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Categorization asked for a metric the node does not carry.
    #[error("node {node} has no `{metric}` value")]
    MissingMetric { node: NodeId, metric: Metric },

    #[error("threshold bound {0} is not a finite number")]
    InvalidThreshold(f64),
}
