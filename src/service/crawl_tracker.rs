//! Crawl State Tracker
//!
//! Lifecycle of one crawl job: `pending -> running -> {completed, failed}`.
//! Both terminal states keep whatever the crawl gathered so far, so a failed
//! crawl still yields usable `CrawlMetadata` for the audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CrawlSettings;
use crate::domain::models::{CrawlMetadata, SiteStructure};
use crate::error::CrawlError;

/// Externally visible state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CrawlState {
    Pending,
    Running {
        progress: f64,
        pages_found: u32,
        pages_analyzed: u32,
    },
    Completed {
        pages_found: u32,
        pages_analyzed: u32,
    },
    Failed {
        reason: String,
        pages_found: u32,
        pages_analyzed: u32,
    },
}

impl CrawlState {
    pub fn name(&self) -> &'static str {
        match self {
            CrawlState::Pending => "pending",
            CrawlState::Running { .. } => "running",
            CrawlState::Completed { .. } => "completed",
            CrawlState::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Running,
    Completed,
    Failed,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Running => "running",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlTracker {
    job_id: String,
    settings: CrawlSettings,
    phase: Phase,
    progress: f64,
    pages_found: u32,
    pages_analyzed: u32,
    failure: Option<String>,
    site_structure: SiteStructure,
    errors: Vec<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl CrawlTracker {
    pub fn new(job_id: impl Into<String>, settings: CrawlSettings) -> Self {
        Self {
            job_id: job_id.into(),
            settings,
            phase: Phase::Pending,
            progress: 0.0,
            pages_found: 0,
            pages_analyzed: 0,
            failure: None,
            site_structure: SiteStructure::default(),
            errors: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn start(&mut self) -> Result<(), CrawlError> {
        self.expect_phase(Phase::Pending, "start")?;
        self.phase = Phase::Running;
        self.started_at = Some(Utc::now());
        info!("[CRAWL] {} started (max {} pages)", self.job_id, self.settings.max_pages);
        Ok(())
    }

    /// Total pages discovered so far. Never below the analyzed count.
    pub fn record_pages_found(&mut self, pages_found: u32) -> Result<(), CrawlError> {
        self.expect_phase(Phase::Running, "record pages for")?;
        if pages_found < self.pages_analyzed {
            return Err(CrawlError::InvalidProgress(format!(
                "pagesFound {} is below pagesAnalyzed {}",
                pages_found, self.pages_analyzed
            )));
        }
        if pages_found < self.pages_found {
            warn!(
                "[CRAWL] {} ignoring pagesFound regression {} -> {}",
                self.job_id, self.pages_found, pages_found
            );
            return Ok(());
        }
        self.pages_found = pages_found;
        Ok(())
    }

    /// Count one more analyzed page.
    pub fn record_page_analyzed(&mut self) -> Result<(), CrawlError> {
        self.expect_phase(Phase::Running, "analyze pages for")?;
        if self.pages_analyzed >= self.pages_found {
            return Err(CrawlError::InvalidProgress(format!(
                "pagesAnalyzed would exceed pagesFound {}",
                self.pages_found
            )));
        }
        self.pages_analyzed += 1;
        debug!(
            "[CRAWL] {} analyzed {}/{}",
            self.job_id, self.pages_analyzed, self.pages_found
        );
        Ok(())
    }

    /// Percent complete, 0-100. Lower reports than the current value are ignored.
    pub fn set_progress(&mut self, progress: f64) -> Result<(), CrawlError> {
        self.expect_phase(Phase::Running, "report progress for")?;
        if !progress.is_finite() || !(0.0..=100.0).contains(&progress) {
            return Err(CrawlError::InvalidProgress(format!(
                "progress must be within 0-100 (got {})",
                progress
            )));
        }
        if progress < self.progress {
            warn!(
                "[CRAWL] {} ignoring progress regression {:.1} -> {:.1}",
                self.job_id, self.progress, progress
            );
            return Ok(());
        }
        self.progress = progress;
        Ok(())
    }

    pub fn set_site_structure(&mut self, site_structure: SiteStructure) -> Result<(), CrawlError> {
        if self.is_terminal() {
            return Err(self.invalid("update the site structure of"));
        }
        self.site_structure = site_structure;
        Ok(())
    }

    /// Errors are accepted in every state; they are upstream facts, not transitions.
    pub fn record_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        warn!("[CRAWL] {} error: {}", self.job_id, error);
        self.errors.push(error);
    }

    pub fn complete(&mut self) -> Result<(), CrawlError> {
        self.expect_phase(Phase::Running, "complete")?;
        self.phase = Phase::Completed;
        self.progress = 100.0;
        self.finished_at = Some(Utc::now());
        info!(
            "[CRAWL] {} completed: {}/{} pages",
            self.job_id, self.pages_analyzed, self.pages_found
        );
        Ok(())
    }

    /// Fail the crawl, keeping counts, site structure and errors gathered so far.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), CrawlError> {
        if self.is_terminal() {
            return Err(self.invalid("fail"));
        }
        let reason = reason.into();
        warn!(
            "[CRAWL] {} failed after {}/{} pages: {}",
            self.job_id, self.pages_analyzed, self.pages_found, reason
        );
        self.phase = Phase::Failed;
        self.errors.push(reason.clone());
        self.failure = Some(reason);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn state(&self) -> CrawlState {
        match self.phase {
            Phase::Pending => CrawlState::Pending,
            Phase::Running => CrawlState::Running {
                progress: self.progress,
                pages_found: self.pages_found,
                pages_analyzed: self.pages_analyzed,
            },
            Phase::Completed => CrawlState::Completed {
                pages_found: self.pages_found,
                pages_analyzed: self.pages_analyzed,
            },
            Phase::Failed => CrawlState::Failed {
                reason: self.failure.clone().unwrap_or_default(),
                pages_found: self.pages_found,
                pages_analyzed: self.pages_analyzed,
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Completed | Phase::Failed)
    }

    pub fn site_structure(&self) -> &SiteStructure {
        &self.site_structure
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Snapshot for the audit. Duration runs to now while the crawl is live.
    pub fn crawl_metadata(&self) -> CrawlMetadata {
        let crawl_duration = self.started_at.map(|started| {
            let end = self.finished_at.unwrap_or_else(Utc::now);
            (end - started).num_milliseconds().max(0) as u64
        });

        CrawlMetadata {
            pages_analyzed: self.pages_analyzed,
            pages_found: self.pages_found,
            max_pages_reached: self.pages_found >= self.settings.max_pages,
            crawl_duration,
            errors: self.errors.clone(),
        }
    }

    fn expect_phase(&self, phase: Phase, action: &'static str) -> Result<(), CrawlError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> CrawlError {
        CrawlError::InvalidTransition {
            from: self.phase.name(),
            action,
        }
    }
}
