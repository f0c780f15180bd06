//! History Differencer - compares two audit versions of the same site.

use std::collections::BTreeMap;

use super::scoring::round1;
use crate::domain::models::{AuditChanges, AuditSummary, FactorKey, FactorStatus, ScoreTrend};

/// Status per factor identity. The first occurrence of a duplicated identity wins.
fn index(summary: &AuditSummary) -> BTreeMap<FactorKey, FactorStatus> {
    let mut map = BTreeMap::new();
    for item in summary.items() {
        map.entry(item.identity()).or_insert(item.status);
    }
    map
}

/// Changes from `previous` to `current`. Lists are ordered by factor identity.
pub fn diff(previous: &AuditSummary, current: &AuditSummary) -> AuditChanges {
    let before = index(previous);
    let after = index(current);

    let removed = before
        .keys()
        .filter(|key| !after.contains_key(*key))
        .map(|key| key.name.clone())
        .collect();

    let mut added = Vec::new();
    let mut modified = Vec::new();
    for (key, status) in &after {
        match before.get(key) {
            None => added.push(key.name.clone()),
            Some(old) if old != status => modified.push(key.name.clone()),
            Some(_) => {}
        }
    }

    let (score_change, score_trend) = score_delta(previous.overall_score, current.overall_score);

    AuditChanges {
        added,
        removed,
        modified,
        score_change,
        score_trend,
    }
}

/// Changes for the first stored version: every factor counts as added.
pub fn initial(current: &AuditSummary) -> AuditChanges {
    AuditChanges {
        added: index(current).into_keys().map(|key| key.name).collect(),
        removed: Vec::new(),
        modified: Vec::new(),
        score_change: 0.0,
        score_trend: ScoreTrend::Indeterminate,
    }
}

fn score_delta(previous: Option<f64>, current: Option<f64>) -> (f64, ScoreTrend) {
    match (previous, current) {
        (Some(before), Some(after)) => {
            let change = round1(after - before);
            let trend = if change > 0.0 {
                ScoreTrend::Increased
            } else if change < 0.0 {
                ScoreTrend::Decreased
            } else {
                ScoreTrend::Unchanged
            };
            (change, trend)
        }
        _ => (0.0, ScoreTrend::Indeterminate),
    }
}
