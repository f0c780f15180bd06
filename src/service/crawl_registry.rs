use dashmap::DashMap;
use std::sync::Arc;

use super::crawl_tracker::{CrawlState, CrawlTracker};
use crate::config::CrawlSettings;
use crate::domain::models::CrawlMetadata;
use crate::error::CrawlError;

/// Live crawl trackers keyed by job id. Cloning shares the same map.
#[derive(Clone)]
pub struct CrawlRegistry {
    trackers: Arc<DashMap<String, CrawlTracker>>,
    settings: CrawlSettings,
}

impl CrawlRegistry {
    pub fn new(settings: CrawlSettings) -> Self {
        Self {
            trackers: Arc::new(DashMap::with_capacity(10)),
            settings,
        }
    }

    /// Register a pending tracker for `job_id`, replacing any previous one.
    pub fn register(&self, job_id: &str) {
        self.trackers.insert(
            job_id.to_string(),
            CrawlTracker::new(job_id, self.settings.clone()),
        );
    }

    /// Apply `f` to the tracker of `job_id` while holding its shard lock.
    pub fn update<T>(
        &self,
        job_id: &str,
        f: impl FnOnce(&mut CrawlTracker) -> Result<T, CrawlError>,
    ) -> Result<T, CrawlError> {
        let mut tracker = self
            .trackers
            .get_mut(job_id)
            .ok_or_else(|| CrawlError::UnknownJob(job_id.to_string()))?;
        f(tracker.value_mut())
    }

    pub fn state(&self, job_id: &str) -> Option<CrawlState> {
        self.trackers.get(job_id).map(|t| t.state())
    }

    pub fn metadata(&self, job_id: &str) -> Option<CrawlMetadata> {
        self.trackers.get(job_id).map(|t| t.crawl_metadata())
    }

    pub fn remove(&self, job_id: &str) -> Option<CrawlTracker> {
        self.trackers.remove(job_id).map(|(_, tracker)| tracker)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}

impl Default for CrawlRegistry {
    fn default() -> Self {
        Self::new(CrawlSettings::default())
    }
}
