//! Error types for the audit engine.
//!
//! This module provides structured error handling with:
//! - `AuditError`: failures surfaced to callers of the engine and the history store
//! - `CrawlError`: rejected transitions and updates on a crawl tracker
//! - `Result<T>`: Type alias for Results using AuditError
//!
//! Sparse input and upstream collaborator failures are not errors. They
//! produce an `AuditSummary` with omitted scores or populated
//! `crawlMetadata.errors` / `aiInsights.error` instead.

use thiserror::Error;

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Errors returned by aggregation, configuration and persistence.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A factor item failed validation; the whole batch is rejected.
    #[error(
        "Malformed factor item at index {index} (category: {category}): {reason}",
        category = .category.as_deref().unwrap_or("unknown")
    )]
    MalformedInput {
        index: usize,
        category: Option<String>,
        reason: String,
    },

    /// Scoring policy failed validation
    #[error("Invalid scoring policy: {0}")]
    InvalidPolicy(String),

    /// Crawl tracker rejected an update
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    /// A history entry was saved with a version that is not newer than the stored one
    #[error("Version conflict for audit {audit_id}: version {attempted} is not newer than {latest}")]
    VersionConflict {
        audit_id: String,
        attempted: u32,
        latest: u32,
    },

    /// Requested history entry does not exist
    #[error("Audit not found: {audit_id} (version {version:?})")]
    AuditNotFound {
        audit_id: String,
        version: Option<u32>,
    },

    /// Database operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A concurrent aggregation task panicked or was aborted
    #[error("Aggregation task failed: {0}")]
    Task(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AuditError {
    /// Create a malformed-input error for the item at `index`.
    pub fn malformed(index: usize, category: Option<&str>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            index,
            category: category.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Create a policy error
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::InvalidPolicy(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput { .. } | Self::InvalidPolicy(_) | Self::VersionConflict { .. }
        )
    }
}

/// Result type alias using AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;

// ============================================================================
// CRAWL TRACKER ERRORS
// ============================================================================

/// Rejections raised by `CrawlTracker` and `CrawlRegistry`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlError {
    #[error("Cannot {action} a crawl in state '{from}'")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("Invalid crawl progress: {0}")]
    InvalidProgress(String),

    #[error("Unknown crawl job: {0}")]
    UnknownJob(String),
}
