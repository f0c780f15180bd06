//! Scoring policy and crawl settings.
//!
//! Every numeric constant the engine uses lives here so that a deployment can
//! tune it from a JSON file. Missing keys fall back to the defaults below.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::models::{Bucket, Category, Difficulty, FactorStatus, Importance, PageType};
use crate::error::{AuditError, Result};

// ============================================================================
// WEIGHT TABLES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceWeights {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ImportanceWeights {
    fn default() -> Self {
        Self {
            high: 3.0,
            medium: 2.0,
            low: 1.0,
        }
    }
}

/// Implicit score of an item that carries no explicit `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusScores {
    pub ok: f64,
    pub ofi: f64,
    pub priority_ofi: f64,
}

impl Default for StatusScores {
    fn default() -> Self {
        Self {
            ok: 100.0,
            ofi: 50.0,
            priority_ofi: 0.0,
        }
    }
}

/// Multipliers used for page priority: one PriorityOFI outweighs several OFIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeverityWeights {
    pub priority_ofi: f64,
    pub ofi: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            priority_ofi: 3.0,
            ofi: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageTypeWeights {
    pub homepage: f64,
    pub contact_page: f64,
    pub service_page: f64,
    pub location_page: f64,
    pub other: f64,
}

impl Default for PageTypeWeights {
    fn default() -> Self {
        Self {
            homepage: 2.0,
            contact_page: 1.5,
            service_page: 1.5,
            location_page: 1.5,
            other: 1.0,
        }
    }
}

// ============================================================================
// BUCKET MAPPING
// ============================================================================

/// Versioned mapping from the nine categories to the four overview buckets.
///
/// Bump `version` whenever the table changes; summaries record the version
/// they were computed with so historical bucket scores stay comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketMapping {
    pub version: u32,
    pub buckets: BTreeMap<Bucket, Vec<Category>>,
}

impl BucketMapping {
    /// Version 1:
    /// - contentQuality: onPage, contentQuality, servicePages
    /// - technicalSEO: technicalSEO, structureNavigation
    /// - localSEO: localSEO, contactPage, locationPages
    /// - uxPerformance: uxPerformance
    pub fn v1() -> Self {
        let buckets = BTreeMap::from([
            (
                Bucket::ContentQuality,
                vec![Category::OnPage, Category::ContentQuality, Category::ServicePages],
            ),
            (
                Bucket::TechnicalSeo,
                vec![Category::TechnicalSeo, Category::StructureNavigation],
            ),
            (
                Bucket::LocalSeo,
                vec![Category::LocalSeo, Category::ContactPage, Category::LocationPages],
            ),
            (Bucket::UxPerformance, vec![Category::UxPerformance]),
        ]);
        Self { version: 1, buckets }
    }

    pub fn categories(&self, bucket: Bucket) -> &[Category] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bucket_for(&self, category: Category) -> Option<Bucket> {
        self.buckets
            .iter()
            .find(|(_, categories)| categories.contains(&category))
            .map(|(bucket, _)| *bucket)
    }

    /// The fixed table a published version number stands for.
    pub fn published(version: u32) -> Option<Self> {
        match version {
            1 => Some(Self::v1()),
            _ => None,
        }
    }

    /// Every category in exactly one bucket, and a published version number
    /// only with its own table.
    fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(AuditError::policy("bucket mapping version must be at least 1"));
        }
        for category in Category::ALL {
            let mapped = self
                .buckets
                .values()
                .flatten()
                .filter(|c| **c == category)
                .count();
            match mapped {
                1 => {}
                0 => {
                    return Err(AuditError::policy(format!(
                        "category '{}' is not mapped to any bucket",
                        category
                    )))
                }
                _ => {
                    return Err(AuditError::policy(format!(
                        "category '{}' is mapped to more than one bucket",
                        category
                    )))
                }
            }
        }
        if let Some(published) = Self::published(self.version) {
            if *self != published {
                return Err(AuditError::policy(format!(
                    "bucket mapping version {} is reserved for the built-in table; \
                     use a new version number for a custom mapping",
                    self.version
                )));
            }
        }
        Ok(())
    }
}

impl Default for BucketMapping {
    fn default() -> Self {
        Self::v1()
    }
}

// ============================================================================
// LIMITS AND FIX-TIME ESTIMATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputLimits {
    pub max_insights: usize,
    pub max_top_issues: usize,
    pub max_recommendations: usize,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            max_insights: 5,
            max_top_issues: 5,
            max_recommendations: 10,
        }
    }
}

/// Effort per outstanding issue and the hour thresholds of each fix-time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixEffort {
    pub easy_hours: f64,
    pub medium_hours: f64,
    pub hard_hours: f64,
    pub few_hours_max: f64,
    pub couple_days_max: f64,
    pub several_days_max: f64,
}

impl Default for FixEffort {
    fn default() -> Self {
        Self {
            easy_hours: 0.5,
            medium_hours: 2.0,
            hard_hours: 8.0,
            few_hours_max: 4.0,
            couple_days_max: 16.0,
            several_days_max: 40.0,
        }
    }
}

impl FixEffort {
    /// Unknown difficulty is costed as medium.
    pub fn hours_for(&self, difficulty: Option<Difficulty>) -> f64 {
        match difficulty {
            Some(Difficulty::Easy) => self.easy_hours,
            Some(Difficulty::Hard) => self.hard_hours,
            Some(Difficulty::Medium) | None => self.medium_hours,
        }
    }
}

// ============================================================================
// SCORING POLICY
// ============================================================================

/// All weighting and tie-breaking policy used by the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringPolicy {
    pub importance_weights: ImportanceWeights,
    pub status_scores: StatusScores,
    pub severity_weights: SeverityWeights,
    pub page_type_weights: PageTypeWeights,
    /// Weight of each category in the overall and bucket means; absent means 1.0
    pub category_weights: BTreeMap<Category, f64>,
    pub bucket_mapping: BucketMapping,
    pub limits: OutputLimits,
    pub fix_effort: FixEffort,
}

impl ScoringPolicy {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring policy {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn importance_weight(&self, importance: Importance) -> f64 {
        match importance {
            Importance::High => self.importance_weights.high,
            Importance::Medium => self.importance_weights.medium,
            Importance::Low => self.importance_weights.low,
        }
    }

    /// Implicit score for a status; `None` for NotApplicable.
    pub fn status_score(&self, status: FactorStatus) -> Option<f64> {
        match status {
            FactorStatus::Ok => Some(self.status_scores.ok),
            FactorStatus::Ofi => Some(self.status_scores.ofi),
            FactorStatus::PriorityOfi => Some(self.status_scores.priority_ofi),
            FactorStatus::NotApplicable => None,
        }
    }

    /// Pages without a type are weighted as generic content pages.
    pub fn page_weight(&self, page_type: Option<PageType>) -> f64 {
        let w = &self.page_type_weights;
        match page_type {
            Some(PageType::Homepage) => w.homepage,
            Some(PageType::ContactPage) => w.contact_page,
            Some(PageType::ServicePage) => w.service_page,
            Some(PageType::LocationPage) => w.location_page,
            Some(PageType::Other) | None => w.other,
        }
    }

    pub fn category_weight(&self, category: Category) -> f64 {
        self.category_weights.get(&category).copied().unwrap_or(1.0)
    }

    /// Reject weights that would make scores meaningless.
    pub fn validate(&self) -> Result<()> {
        let iw = &self.importance_weights;
        let sw = &self.severity_weights;
        let pw = &self.page_type_weights;
        let fe = &self.fix_effort;

        let weights = [
            ("importanceWeights.high", iw.high),
            ("importanceWeights.medium", iw.medium),
            ("importanceWeights.low", iw.low),
            ("severityWeights.priorityOfi", sw.priority_ofi),
            ("severityWeights.ofi", sw.ofi),
            ("pageTypeWeights.homepage", pw.homepage),
            ("pageTypeWeights.contactPage", pw.contact_page),
            ("pageTypeWeights.servicePage", pw.service_page),
            ("pageTypeWeights.locationPage", pw.location_page),
            ("pageTypeWeights.other", pw.other),
            ("fixEffort.easyHours", fe.easy_hours),
            ("fixEffort.mediumHours", fe.medium_hours),
            ("fixEffort.hardHours", fe.hard_hours),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(AuditError::policy(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("importanceWeights.high", iw.high),
            ("importanceWeights.medium", iw.medium),
            ("importanceWeights.low", iw.low),
        ] {
            if value <= 0.0 {
                return Err(AuditError::policy(format!(
                    "{} must be greater than zero (got {})",
                    name, value
                )));
            }
        }

        for (category, weight) in &self.category_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(AuditError::policy(format!(
                    "categoryWeights.{} must be a finite, non-negative number (got {})",
                    category, weight
                )));
            }
        }

        if Category::ALL.iter().all(|c| self.category_weight(*c) == 0.0) {
            return Err(AuditError::policy(
                "categoryWeights must leave at least one category with a positive weight",
            ));
        }

        let ss = &self.status_scores;
        for (name, value) in [
            ("statusScores.ok", ss.ok),
            ("statusScores.ofi", ss.ofi),
            ("statusScores.priorityOfi", ss.priority_ofi),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(AuditError::policy(format!(
                    "{} must be within 0-100 (got {})",
                    name, value
                )));
            }
        }

        if !(fe.few_hours_max <= fe.couple_days_max && fe.couple_days_max <= fe.several_days_max) {
            return Err(AuditError::policy(
                "fixEffort thresholds must be non-decreasing",
            ));
        }

        let limits = &self.limits;
        if limits.max_insights == 0 || limits.max_top_issues == 0 || limits.max_recommendations == 0 {
            return Err(AuditError::policy("output limits must be positive"));
        }

        self.bucket_mapping.validate()
    }
}

// ============================================================================
// CRAWL SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrawlSettings {
    pub max_pages: u32,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self { max_pages: 100 }
    }
}
