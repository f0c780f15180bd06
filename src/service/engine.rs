//! Audit Engine - orchestrates one audit run over an immutable factor batch.
//!
//! ```text
//! items ──┬─> CategoryAggregator (one per category) ─┐
//!         └─> PageSummarizer     (one per page)     ─┴─> AuditComposer ─> AuditSummary
//! ```
//!
//! Aggregators and summarizers share nothing, so `run_concurrent` fans them
//! out on the blocking pool and joins before composing. Both entry points
//! return identical summaries for the same input.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use super::audit_composer::{AuditComposer, ComposeInput};
use super::category_aggregator::CategoryAggregator;
use super::ingest::validate_items;
use super::page_summarizer::{group_by_page, PageSummarizer};
use crate::config::ScoringPolicy;
use crate::domain::models::{
    AuditSummary, Category, CategorySection, CrawlMetadata, FactorItem, PageIssueSummary,
};
use crate::error::{AuditError, Result};

/// One audit's worth of input: the factor batch plus collaborator outputs
/// merged verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditInput {
    pub items: Vec<FactorItem>,
    pub crawl_metadata: Option<CrawlMetadata>,
    pub competitor_comparison: Option<serde_json::Value>,
    pub ai_insights: Option<serde_json::Value>,
}

impl From<Vec<FactorItem>> for AuditInput {
    fn from(items: Vec<FactorItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }
}

enum Partial {
    Section(Category, CategorySection),
    Page(usize, PageIssueSummary),
}

#[derive(Clone)]
pub struct AuditEngine {
    policy: Arc<ScoringPolicy>,
}

impl AuditEngine {
    pub fn new(policy: ScoringPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy: Arc::new(policy),
        })
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Sequential audit run.
    pub fn run(&self, input: AuditInput) -> Result<AuditSummary> {
        validate_items(&input.items)?;
        let item_count = input.items.len();

        let aggregator = CategoryAggregator::new(&self.policy);
        let sections = group_by_category(&input.items)
            .into_iter()
            .map(|(category, items)| (category, aggregator.aggregate(category, items)))
            .collect();
        let pages = PageSummarizer::new(&self.policy).summarize_all(&input.items);

        let summary = self.compose(sections, pages, input);
        info!(
            "[ENGINE] Audit run complete: {} items, overall score {:?}",
            item_count, summary.overall_score
        );
        Ok(summary)
    }

    /// Same result as [`run`](Self::run), with every category aggregation and
    /// page summary computed on its own blocking task.
    pub async fn run_concurrent(&self, input: AuditInput) -> Result<AuditSummary> {
        validate_items(&input.items)?;
        let item_count = input.items.len();

        let limit = Arc::new(Semaphore::new(num_cpus::get().max(1)));
        let mut tasks = JoinSet::new();

        for (category, items) in group_by_category(&input.items) {
            let policy = Arc::clone(&self.policy);
            let permit = Arc::clone(&limit)
                .acquire_owned()
                .await
                .map_err(|e| AuditError::Task(e.to_string()))?;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let section = CategoryAggregator::new(&policy).aggregate(category, items);
                Partial::Section(category, section)
            });
        }

        for (index, (url, items)) in group_by_page(&input.items).into_iter().enumerate() {
            let policy = Arc::clone(&self.policy);
            let permit = Arc::clone(&limit)
                .acquire_owned()
                .await
                .map_err(|e| AuditError::Task(e.to_string()))?;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                Partial::Page(index, PageSummarizer::new(&policy).summarize(&url, &items))
            });
        }

        debug!("[ENGINE] Joining {} aggregation tasks", tasks.len());

        let mut sections = BTreeMap::new();
        let mut indexed_pages = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(|e| AuditError::Task(e.to_string()))? {
                Partial::Section(category, section) => {
                    sections.insert(category, section);
                }
                Partial::Page(index, page) => indexed_pages.push((index, page)),
            }
        }
        // Restore first-appearance order so the composer's stable sort matches `run`.
        indexed_pages.sort_by_key(|(index, _)| *index);
        let pages = indexed_pages.into_iter().map(|(_, page)| page).collect();

        let summary = self.compose(sections, pages, input);
        info!(
            "[ENGINE] Concurrent audit run complete: {} items, overall score {:?}",
            item_count, summary.overall_score
        );
        Ok(summary)
    }

    fn compose(
        &self,
        sections: BTreeMap<Category, CategorySection>,
        pages: Vec<PageIssueSummary>,
        input: AuditInput,
    ) -> AuditSummary {
        AuditComposer::new(&self.policy).compose(ComposeInput {
            sections,
            pages,
            crawl_metadata: input.crawl_metadata,
            competitor_comparison: input.competitor_comparison,
            ai_insights: input.ai_insights,
        })
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self {
            policy: Arc::new(ScoringPolicy::default()),
        }
    }
}

/// Items per category, input order preserved within each category.
fn group_by_category(items: &[FactorItem]) -> BTreeMap<Category, Vec<FactorItem>> {
    let mut groups: BTreeMap<Category, Vec<FactorItem>> = BTreeMap::new();
    for item in items {
        groups.entry(item.category).or_default().push(item.clone());
    }
    groups
}
