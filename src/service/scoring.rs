//! Weighted-mean scoring shared by the category, page and audit roll-ups.

use std::cmp::Ordering;

use crate::config::ScoringPolicy;
use crate::domain::models::FactorItem;

/// Running importance-weighted mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMean {
    sum: f64,
    weight: f64,
}

impl WeightedMean {
    pub fn add(&mut self, value: f64, weight: f64) {
        if weight > 0.0 {
            self.sum += value * weight;
            self.weight += weight;
        }
    }

    /// `None` until at least one positively weighted value was added.
    pub fn value(&self) -> Option<f64> {
        (self.weight > 0.0).then(|| self.sum / self.weight)
    }
}

/// Score an item contributes: its explicit score, else the status default.
/// NotApplicable items contribute nothing, even with an explicit score.
pub fn item_contribution(item: &FactorItem, policy: &ScoringPolicy) -> Option<f64> {
    let implicit = policy.status_score(item.status)?;
    Some(item.score.unwrap_or(implicit))
}

/// Importance-weighted mean over the scorable items, unrounded.
pub fn weighted_score<'a>(
    items: impl IntoIterator<Item = &'a FactorItem>,
    policy: &ScoringPolicy,
) -> Option<f64> {
    let mut mean = WeightedMean::default();
    for item in items {
        if let Some(value) = item_contribution(item, policy) {
            mean.add(value, policy.importance_weight(item.importance));
        }
    }
    mean.value()
}

/// Round to one decimal place, the precision every published score uses.
pub fn round1(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Worst first: severity desc, then importance desc. Equal items compare equal
/// so a stable sort keeps input order.
pub fn by_severity(a: &FactorItem, b: &FactorItem) -> Ordering {
    b.status
        .severity()
        .cmp(&a.status.severity())
        .then_with(|| b.importance.rank().cmp(&a.importance.rank()))
}
