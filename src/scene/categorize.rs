use serde::Serialize;

use super::{ColorToken, Metric, Node, SceneError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub label: String,
    pub color: ColorToken,
}

impl Category {
    pub fn new(label: impl Into<String>, color: impl Into<ColorToken>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
        }
    }
}

/// A tier is entered when the metric value is strictly greater than `bound`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tier {
    pub bound: f64,
    pub category: Category,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThresholdTable {
    tiers: Vec<Tier>,
    fallback: Category,
}

impl ThresholdTable {
    pub fn new(mut tiers: Vec<Tier>, fallback: Category) -> Result<Self, SceneError> {
        if let Some(tier) = tiers.iter().find(|tier| !tier.bound.is_finite()) {
            return Err(SceneError::InvalidThreshold(tier.bound));
        }

        tiers.sort_by(|a, b| b.bound.total_cmp(&a.bound));
        Ok(Self { tiers, fallback })
    }

    pub fn tier_for(&self, value: f64) -> &Category {
        self.tiers
            .iter()
            .find(|tier| value > tier.bound)
            .map(|tier| &tier.category)
            .unwrap_or(&self.fallback)
    }

    /// Every category, highest tier first, catch-all last.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.tiers
            .iter()
            .map(|tier| &tier.category)
            .chain(std::iter::once(&self.fallback))
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }
}

pub fn categorize<'a>(
    node: &Node,
    metric: Metric,
    thresholds: &'a ThresholdTable,
) -> Result<&'a Category, SceneError> {
    let value = node.metric(metric).ok_or_else(|| SceneError::MissingMetric {
        node: node.id.clone(),
        metric,
    })?;

    Ok(thresholds.tier_for(value))
}
