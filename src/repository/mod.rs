use async_trait::async_trait;

use crate::domain::models::{AuditHistoryEntry, AuditVersionInfo};
use crate::error::Result;

pub mod sqlite;

/// Versioned storage of audit history entries.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist `entry` as `version` of `audit_id` and return its opaque id.
    /// Fails with `VersionConflict` unless `version` is newer than every stored one.
    async fn save(&self, audit_id: &str, version: u32, entry: &AuditHistoryEntry) -> Result<String>;
    async fn latest(&self, audit_id: &str) -> Result<Option<AuditHistoryEntry>>;
    async fn get(&self, audit_id: &str, version: u32) -> Result<AuditHistoryEntry>;
    async fn list(&self, audit_id: &str) -> Result<Vec<AuditVersionInfo>>;
}
