use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::to_u32;
use crate::domain::models::{AuditHistoryEntry, AuditVersionInfo};
use crate::error::{AuditError, Result};
use crate::repository::AuditStore;

#[derive(Clone)]
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Undecodable rows surface as `Storage` errors rather than generic ones.
    fn decode(row: &SqliteRow) -> Result<AuditHistoryEntry> {
        Self::map_entry(row).map_err(|e| AuditError::storage(format!("{:#}", e)))
    }

    fn map_entry(row: &SqliteRow) -> anyhow::Result<AuditHistoryEntry> {
        let summary_json: String = row.try_get("summary_json")?;
        let changes_json: String = row.try_get("changes_json")?;
        Ok(AuditHistoryEntry {
            audit_id: row.try_get("audit_id")?,
            version: to_u32(row.try_get("version")?, "version")?,
            summary: serde_json::from_str(&summary_json).context("Corrupt stored summary")?,
            changes: serde_json::from_str(&changes_json).context("Corrupt stored changes")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn save(&self, audit_id: &str, version: u32, entry: &AuditHistoryEntry) -> Result<String> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let latest: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM audit_history WHERE audit_id = ?")
                .bind(audit_id)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to read latest version")?;
        let latest = latest.map(|v| to_u32(v, "version")).transpose()?.unwrap_or(0);

        if version <= latest {
            return Err(AuditError::VersionConflict {
                audit_id: audit_id.to_string(),
                attempted: version,
                latest,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let summary_json = serde_json::to_string(&entry.summary)?;
        let changes_json = serde_json::to_string(&entry.changes)?;

        let inserted = sqlx::query(
            "INSERT INTO audit_history \
             (id, audit_id, version, overall_score, total_factors, bucket_mapping_version, \
              summary_json, changes_json, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(audit_id)
        .bind(i64::from(version))
        .bind(entry.summary.overall_score)
        .bind(i64::from(entry.summary.total_factors))
        .bind(i64::from(entry.summary.bucket_mapping_version))
        .bind(summary_json)
        .bind(changes_json)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AuditError::VersionConflict {
                    audit_id: audit_id.to_string(),
                    attempted: version,
                    latest: version,
                });
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert audit version").into()),
        }

        tx.commit().await.context("Failed to commit audit version")?;
        debug!("[STORE] saved {} v{} as {}", audit_id, version, id);
        Ok(id)
    }

    async fn latest(&self, audit_id: &str) -> Result<Option<AuditHistoryEntry>> {
        let row = sqlx::query(
            "SELECT audit_id, version, summary_json, changes_json, created_at \
             FROM audit_history WHERE audit_id = ? ORDER BY version DESC LIMIT 1",
        )
        .bind(audit_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch latest audit version")?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn get(&self, audit_id: &str, version: u32) -> Result<AuditHistoryEntry> {
        let row = sqlx::query(
            "SELECT audit_id, version, summary_json, changes_json, created_at \
             FROM audit_history WHERE audit_id = ? AND version = ?",
        )
        .bind(audit_id)
        .bind(i64::from(version))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch audit version")?
        .ok_or_else(|| AuditError::AuditNotFound {
            audit_id: audit_id.to_string(),
            version: Some(version),
        })?;

        Self::decode(&row)
    }

    async fn list(&self, audit_id: &str) -> Result<Vec<AuditVersionInfo>> {
        let rows = sqlx::query(
            "SELECT id, audit_id, version, overall_score, total_factors, created_at \
             FROM audit_history WHERE audit_id = ? ORDER BY version ASC",
        )
        .bind(audit_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list audit versions")?;

        let versions = rows
            .iter()
            .map(|row| -> anyhow::Result<AuditVersionInfo> {
                Ok(AuditVersionInfo {
                    id: row.try_get("id")?,
                    audit_id: row.try_get("audit_id")?,
                    version: to_u32(row.try_get("version")?, "version")?,
                    overall_score: row.try_get("overall_score")?,
                    total_factors: to_u32(row.try_get("total_factors")?, "total_factors")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AuditChanges, ScoreTrend};
    use crate::service::AuditEngine;
    use crate::test_utils::fixtures;

    fn entry(audit_id: &str, version: u32) -> AuditHistoryEntry {
        let summary = AuditEngine::default()
            .run(fixtures::sample_batch().into())
            .unwrap();
        AuditHistoryEntry {
            audit_id: audit_id.to_string(),
            version,
            summary,
            changes: AuditChanges {
                added: vec![],
                removed: vec![],
                modified: vec![],
                score_change: 0.0,
                score_trend: ScoreTrend::Indeterminate,
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let pool = fixtures::setup_test_db().await;
        let store = SqliteAuditStore::new(pool);

        assert!(store.latest("site").await.unwrap().is_none());

        let first = entry("site", 1);
        let id = store.save("site", 1, &first).await.unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        let loaded = store.get("site", 1).await.unwrap();
        assert_eq!(loaded.summary, first.summary);
        assert_eq!(loaded.version, 1);

        store.save("site", 2, &entry("site", 2)).await.unwrap();
        assert_eq!(store.latest("site").await.unwrap().unwrap().version, 2);

        let listed = store.list("site").await.unwrap();
        assert_eq!(listed.iter().map(|v| v.version).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(listed[0].overall_score, first.summary.overall_score);
    }

    #[tokio::test]
    async fn test_stale_version_rejected() {
        let pool = fixtures::setup_test_db().await;
        let store = SqliteAuditStore::new(pool);

        store.save("site", 1, &entry("site", 1)).await.unwrap();
        store.save("site", 2, &entry("site", 2)).await.unwrap();

        let err = store.save("site", 2, &entry("site", 2)).await.unwrap_err();
        assert!(matches!(
            err,
            AuditError::VersionConflict {
                attempted: 2,
                latest: 2,
                ..
            }
        ));
        assert!(store.save("site", 1, &entry("site", 1)).await.is_err());
        assert_eq!(store.list("site").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_audits_are_isolated() {
        let pool = fixtures::setup_test_db().await;
        let store = SqliteAuditStore::new(pool);

        store.save("a", 1, &entry("a", 1)).await.unwrap();
        store.save("b", 1, &entry("b", 1)).await.unwrap();
        assert_eq!(store.list("a").await.unwrap().len(), 1);

        let missing = store.get("a", 7).await.unwrap_err();
        assert!(matches!(missing, AuditError::AuditNotFound { version: Some(7), .. }));
    }

    #[tokio::test]
    async fn test_corrupt_row_is_storage_error() {
        let pool = fixtures::setup_test_db().await;
        sqlx::query(
            "INSERT INTO audit_history \
             (id, audit_id, version, overall_score, total_factors, bucket_mapping_version, \
              summary_json, changes_json, created_at) \
             VALUES ('x', 'site', 1, NULL, 0, 1, '{not json', '{}', '2025-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = SqliteAuditStore::new(pool);
        let err = store.latest("site").await.unwrap_err();
        assert!(matches!(err, AuditError::Storage(_)));
        assert!(err.to_string().contains("Corrupt stored summary"));
    }
}
