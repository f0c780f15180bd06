//! Audit Composer - merges category sections and page summaries into the
//! audit-level `AuditSummary`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use super::scoring::{round1, WeightedMean};
use crate::config::ScoringPolicy;
use crate::domain::models::{
    AuditSummary, Bucket, BucketScores, Category, CategorySection, CrawlMetadata, FactorItem,
    FactorStatus, PageIssueSummary,
};

/// Everything the composer joins on.
#[derive(Debug, Clone, Default)]
pub struct ComposeInput {
    pub sections: BTreeMap<Category, CategorySection>,
    pub pages: Vec<PageIssueSummary>,
    pub crawl_metadata: Option<CrawlMetadata>,
    pub competitor_comparison: Option<serde_json::Value>,
    pub ai_insights: Option<serde_json::Value>,
}

pub struct AuditComposer<'a> {
    policy: &'a ScoringPolicy,
}

impl<'a> AuditComposer<'a> {
    pub fn new(policy: &'a ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn compose(&self, input: ComposeInput) -> AuditSummary {
        let ComposeInput {
            mut sections,
            mut pages,
            crawl_metadata,
            competitor_comparison,
            ai_insights,
        } = input;

        for category in Category::ALL {
            sections
                .entry(category)
                .or_insert_with(|| CategorySection::empty(category));
        }

        let count = |status: FactorStatus| sections.values().map(|s| s.count(status)).sum::<u32>();
        let priority_ofi_count = count(FactorStatus::PriorityOfi);
        let ofi_count = count(FactorStatus::Ofi);
        let ok_count = count(FactorStatus::Ok);
        let na_count = count(FactorStatus::NotApplicable);
        let total_factors = sections.values().map(|s| s.items.len() as u32).sum();

        let overall_score = self.mean_of(&sections, Category::ALL.iter());
        let category_scores = self.bucket_scores(&sections);

        let outstanding: Vec<&FactorItem> = sections
            .values()
            .flat_map(|s| s.items.iter())
            .filter(|i| i.status.is_issue())
            .collect();
        let recommendations = self.recommendations(&outstanding);
        let estimated_fix_time = self.estimated_fix_time(&outstanding);

        let page_analysis = if pages.is_empty() {
            None
        } else {
            pages.sort_by(rank_pages);
            Some(pages)
        };

        if let Some(meta) = &crawl_metadata {
            if !meta.errors.is_empty() {
                debug!("[COMPOSE] crawl reported {} errors", meta.errors.len());
            }
        }

        info!(
            "[COMPOSE] {} factors ({} priority, {} ofi), overall score {:?}",
            total_factors, priority_ofi_count, ofi_count, overall_score
        );

        AuditSummary {
            total_factors,
            priority_ofi_count,
            ofi_count,
            ok_count,
            na_count,
            overall_score,
            category_scores,
            bucket_mapping_version: self.policy.bucket_mapping.version,
            recommendations,
            estimated_fix_time,
            sections,
            page_analysis,
            competitor_comparison,
            crawl_metadata,
            ai_insights,
        }
    }

    /// Category-weighted mean of the present section scores; sections without
    /// a score are left out rather than counted as zero.
    fn mean_of<'c>(
        &self,
        sections: &BTreeMap<Category, CategorySection>,
        categories: impl Iterator<Item = &'c Category>,
    ) -> Option<f64> {
        let mut mean = WeightedMean::default();
        for category in categories {
            if let Some(score) = sections.get(category).and_then(|s| s.score) {
                mean.add(score, self.policy.category_weight(*category));
            }
        }
        mean.value().map(round1)
    }

    fn bucket_scores(&self, sections: &BTreeMap<Category, CategorySection>) -> BucketScores {
        let mapping = &self.policy.bucket_mapping;
        let mut scores = BucketScores::default();
        for bucket in Bucket::ALL {
            scores.set(bucket, self.mean_of(sections, mapping.categories(bucket).iter()));
        }
        scores
    }

    /// Deduplicated recommendations ranked by impact desc, difficulty asc,
    /// severity desc, then first appearance.
    fn recommendations(&self, outstanding: &[&FactorItem]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ranked = Vec::new();

        for item in outstanding {
            let impact = item.estimated_impact().map(|i| i.rank()).unwrap_or(0);
            let difficulty = item.difficulty().map(|d| d.rank()).unwrap_or(u8::MAX);
            for text in item.recommendations() {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                let key = text.to_lowercase();
                ranked.push((key, impact, difficulty, item.status.severity(), text.to_string()));
            }
        }

        // Stable sort, so the first-seen spelling of equal-rank duplicates wins.
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.2.cmp(&b.2))
                .then_with(|| b.3.cmp(&a.3))
        });

        ranked
            .into_iter()
            .filter(|(key, ..)| seen.insert(key.clone()))
            .map(|(.., text)| text)
            .take(self.policy.limits.max_recommendations)
            .collect()
    }

    /// Coarse effort estimate; depends only on the outstanding issues.
    fn estimated_fix_time(&self, outstanding: &[&FactorItem]) -> String {
        if outstanding.is_empty() {
            return "No fixes needed".to_string();
        }
        let effort = &self.policy.fix_effort;
        let hours: f64 = outstanding
            .iter()
            .map(|i| effort.hours_for(i.difficulty()))
            .sum();

        let label = if hours <= effort.few_hours_max {
            "a few hours"
        } else if hours <= effort.couple_days_max {
            "1-2 days"
        } else if hours <= effort.several_days_max {
            "3-5 days"
        } else {
            "1+ weeks"
        };
        label.to_string()
    }
}

/// Worst page first: priority weight desc, weighted score asc (missing last),
/// then page URL for a total order.
fn rank_pages(a: &PageIssueSummary, b: &PageIssueSummary) -> Ordering {
    let weight = |p: &PageIssueSummary| p.priority_weight.unwrap_or(0.0);
    weight(b)
        .total_cmp(&weight(a))
        .then_with(|| match (a.weighted_score, b.weighted_score) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.page_url.cmp(&b.page_url))
}
