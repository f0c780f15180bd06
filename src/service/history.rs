//! Audit history: versions each recorded summary and diffs it against the
//! previous version of the same audit.

use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use tracing::info;

use super::history_differ;
use crate::domain::models::{AuditHistoryEntry, AuditSummary};
use crate::error::Result;
use crate::repository::AuditStore;

pub struct AuditHistory<S: AuditStore> {
    store: S,
}

impl<S: AuditStore> AuditHistory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store `summary` as the next version of `audit_id`.
    ///
    /// Returns the store's id for the new row and the entry written. Two
    /// concurrent writers for one audit race on the version number; the loser
    /// gets `VersionConflict`.
    pub async fn record(
        &self,
        audit_id: &str,
        summary: AuditSummary,
    ) -> Result<(String, AuditHistoryEntry)> {
        let previous = self.store.latest(audit_id).await?;

        let (version, changes) = match &previous {
            Some(prev) => (prev.version + 1, history_differ::diff(&prev.summary, &summary)),
            None => (1, history_differ::initial(&summary)),
        };

        let entry = AuditHistoryEntry {
            audit_id: audit_id.to_string(),
            version,
            summary,
            changes,
            created_at: Utc::now(),
        };
        let id = self.store.save(audit_id, version, &entry).await?;

        info!(
            "[HISTORY] {} v{}: +{} -{} ~{} (score change {:+.1})",
            audit_id,
            version,
            entry.changes.added.len(),
            entry.changes.removed.len(),
            entry.changes.modified.len(),
            entry.changes.score_change
        );
        Ok((id, entry))
    }

    /// Every stored version of `audit_id`, oldest first.
    pub async fn timeline(&self, audit_id: &str) -> Result<Vec<AuditHistoryEntry>> {
        let versions = self.store.list(audit_id).await?;
        futures::stream::iter(versions)
            .map(|info| async move { self.store.get(audit_id, info.version).await })
            .buffered(4)
            .try_collect()
            .await
    }
}
