//! Rich domain entities - behavior lives WITH data
//!
//! Every field name and enumeration value here is part of the persisted JSON
//! contract consumed by the UI, exports and history comparisons.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ====== Enums ======

/// Outcome of a single factor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorStatus {
    /// Priority opportunity for improvement
    #[serde(rename = "PriorityOFI")]
    PriorityOfi,
    /// Opportunity for improvement
    #[serde(rename = "OFI")]
    Ofi,
    #[serde(rename = "OK")]
    Ok,
    NotApplicable,
}

impl FactorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorStatus::PriorityOfi => "PriorityOFI",
            FactorStatus::Ofi => "OFI",
            FactorStatus::Ok => "OK",
            FactorStatus::NotApplicable => "NotApplicable",
        }
    }

    /// Ranking used for issue ordering: PriorityOFI > OFI > OK > NotApplicable.
    pub fn severity(&self) -> u8 {
        match self {
            FactorStatus::PriorityOfi => 3,
            FactorStatus::Ofi => 2,
            FactorStatus::Ok => 1,
            FactorStatus::NotApplicable => 0,
        }
    }

    /// Outstanding issue (PriorityOFI or OFI).
    pub fn is_issue(&self) -> bool {
        matches!(self, FactorStatus::PriorityOfi | FactorStatus::Ofi)
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, FactorStatus::NotApplicable)
    }
}

impl fmt::Display for FactorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub const ALL: [Importance; 3] = [Importance::High, Importance::Medium, Importance::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::High => "High",
            Importance::Medium => "Medium",
            Importance::Low => "Low",
        }
    }

    /// Key used in `CategorySection::category_scores`.
    pub fn key(&self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Importance::High => 3,
            Importance::Medium => 2,
            Importance::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Lower is quicker to fix.
    pub fn rank(&self) -> u8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn rank(&self) -> u8 {
        match self {
            Impact::Low => 1,
            Impact::Medium => 2,
            Impact::High => 3,
        }
    }
}

/// The nine detailed factor categories.
///
/// Declaration order is the canonical ordering used for sections, diffs and
/// serialized maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "onPage")]
    OnPage,
    #[serde(rename = "structureNavigation")]
    StructureNavigation,
    #[serde(rename = "contactPage")]
    ContactPage,
    #[serde(rename = "servicePages")]
    ServicePages,
    #[serde(rename = "locationPages", alias = "serviceAreaPages")]
    LocationPages,
    #[serde(rename = "contentQuality")]
    ContentQuality,
    #[serde(rename = "technicalSEO")]
    TechnicalSeo,
    #[serde(rename = "localSEO")]
    LocalSeo,
    #[serde(rename = "uxPerformance")]
    UxPerformance,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::OnPage,
        Category::StructureNavigation,
        Category::ContactPage,
        Category::ServicePages,
        Category::LocationPages,
        Category::ContentQuality,
        Category::TechnicalSeo,
        Category::LocalSeo,
        Category::UxPerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::OnPage => "onPage",
            Category::StructureNavigation => "structureNavigation",
            Category::ContactPage => "contactPage",
            Category::ServicePages => "servicePages",
            Category::LocationPages => "locationPages",
            Category::ContentQuality => "contentQuality",
            Category::TechnicalSeo => "technicalSEO",
            Category::LocalSeo => "localSEO",
            Category::UxPerformance => "uxPerformance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four top-level score buckets shown on the audit overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "contentQuality")]
    ContentQuality,
    #[serde(rename = "technicalSEO")]
    TechnicalSeo,
    #[serde(rename = "localSEO")]
    LocalSeo,
    #[serde(rename = "uxPerformance")]
    UxPerformance,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::ContentQuality,
        Bucket::TechnicalSeo,
        Bucket::LocalSeo,
        Bucket::UxPerformance,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    #[serde(rename = "homepage", alias = "home")]
    Homepage,
    #[serde(rename = "contactPage", alias = "contact")]
    ContactPage,
    #[serde(rename = "servicePage", alias = "service")]
    ServicePage,
    #[serde(rename = "locationPage", alias = "location", alias = "serviceAreaPage")]
    LocationPage,
    #[serde(rename = "other")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTrend {
    Increased,
    Decreased,
    Unchanged,
    /// At least one side had no overall score
    Indeterminate,
}

// ====== Factor Item ======

/// Extra output of a factor check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_impact: Option<Impact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

/// One evaluated SEO factor. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub status: FactorStatus,
    pub importance: Importance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<PageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_details: Option<AnalysisDetails>,
}

impl FactorItem {
    /// Site-wide item with no page scope or details.
    pub fn new(
        name: impl Into<String>,
        category: Category,
        status: FactorStatus,
        importance: Importance,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category,
            status,
            importance,
            notes: None,
            score: None,
            page_url: None,
            page_title: None,
            page_type: None,
            analysis_details: None,
        }
    }

    /// Identity used when comparing audit versions.
    pub fn identity(&self) -> FactorKey {
        FactorKey {
            category: self.category,
            name: self.name.clone(),
            page_url: self.page_url.clone(),
        }
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.analysis_details.as_ref().and_then(|d| d.difficulty)
    }

    pub fn estimated_impact(&self) -> Option<Impact> {
        self.analysis_details.as_ref().and_then(|d| d.estimated_impact)
    }

    pub fn recommendations(&self) -> &[String] {
        self.analysis_details
            .as_ref()
            .map(|d| d.recommendations.as_slice())
            .unwrap_or(&[])
    }
}

/// `(category, name, pageUrl)` identity of a factor across audit versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactorKey {
    pub category: Category,
    pub name: String,
    pub page_url: Option<String>,
}

// ====== Aggregation Results ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySection {
    pub category: Category,
    pub items: Vec<FactorItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f64>,
    #[serde(default)]
    pub category_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub insights: Vec<String>,
}

impl CategorySection {
    pub fn empty(category: Category) -> Self {
        Self {
            category,
            items: Vec::new(),
            score: None,
            completion_rate: None,
            category_scores: BTreeMap::new(),
            insights: Vec::new(),
        }
    }

    pub fn count(&self, status: FactorStatus) -> u32 {
        self.items.iter().filter(|i| i.status == status).count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageIssueSummary {
    pub page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<PageType>,
    pub priority_ofi_count: u32,
    pub ofi_count: u32,
    pub ok_count: u32,
    pub na_count: u32,
    pub total_issues: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_score: Option<f64>,
    pub top_issues: Vec<FactorItem>,
}

/// Scores for the four overview buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketScores {
    #[serde(rename = "contentQuality", default, skip_serializing_if = "Option::is_none")]
    pub content_quality: Option<f64>,
    #[serde(rename = "technicalSEO", default, skip_serializing_if = "Option::is_none")]
    pub technical_seo: Option<f64>,
    #[serde(rename = "localSEO", default, skip_serializing_if = "Option::is_none")]
    pub local_seo: Option<f64>,
    #[serde(rename = "uxPerformance", default, skip_serializing_if = "Option::is_none")]
    pub ux_performance: Option<f64>,
}

impl BucketScores {
    pub fn get(&self, bucket: Bucket) -> Option<f64> {
        match bucket {
            Bucket::ContentQuality => self.content_quality,
            Bucket::TechnicalSeo => self.technical_seo,
            Bucket::LocalSeo => self.local_seo,
            Bucket::UxPerformance => self.ux_performance,
        }
    }

    pub fn set(&mut self, bucket: Bucket, score: Option<f64>) {
        let slot = match bucket {
            Bucket::ContentQuality => &mut self.content_quality,
            Bucket::TechnicalSeo => &mut self.technical_seo,
            Bucket::LocalSeo => &mut self.local_seo,
            Bucket::UxPerformance => &mut self.ux_performance,
        };
        *slot = score;
    }
}

/// Crawl facts carried into the audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlMetadata {
    pub pages_analyzed: u32,
    #[serde(default)]
    pub pages_found: u32,
    pub max_pages_reached: bool,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawl_duration: Option<u64>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Pages discovered by the crawler, classified by role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteStructure {
    pub homepage: Option<String>,
    pub contact_page: Option<String>,
    pub service_pages: Vec<String>,
    pub location_pages: Vec<String>,
    pub other_pages: Vec<String>,
    pub sitemap_urls: Vec<String>,
    pub robots_txt: Option<String>,
}

impl SiteStructure {
    /// Number of distinct classified pages.
    pub fn page_count(&self) -> usize {
        self.homepage.iter().count()
            + self.contact_page.iter().count()
            + self.service_pages.len()
            + self.location_pages.len()
            + self.other_pages.len()
    }
}

// ====== Audit Summary ======

/// Root aggregate of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total_factors: u32,
    pub priority_ofi_count: u32,
    pub ofi_count: u32,
    pub ok_count: u32,
    pub na_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    pub category_scores: BucketScores,
    /// Version of the bucket mapping `category_scores` was computed with
    pub bucket_mapping_version: u32,
    pub recommendations: Vec<String>,
    pub estimated_fix_time: String,
    pub sections: BTreeMap<Category, CategorySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_analysis: Option<Vec<PageIssueSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_comparison: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawl_metadata: Option<CrawlMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insights: Option<serde_json::Value>,
}

impl AuditSummary {
    /// All items across every section, in canonical category order.
    pub fn items(&self) -> impl Iterator<Item = &FactorItem> {
        self.sections.values().flat_map(|s| s.items.iter())
    }

    pub fn section(&self, category: Category) -> Option<&CategorySection> {
        self.sections.get(&category)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Placeholder for a failed AI insight call, merged as `aiInsights`.
pub fn ai_insights_error(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "error": message.into() })
}

// ====== History ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
    pub score_change: f64,
    pub score_trend: ScoreTrend,
}

/// One persisted version of an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditHistoryEntry {
    pub audit_id: String,
    pub version: u32,
    pub summary: AuditSummary,
    pub changes: AuditChanges,
    pub created_at: DateTime<Utc>,
}

/// Lightweight listing row for an audit's stored versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditVersionInfo {
    pub id: String,
    pub audit_id: String,
    pub version: u32,
    pub overall_score: Option<f64>,
    pub total_factors: u32,
    pub created_at: DateTime<Utc>,
}
