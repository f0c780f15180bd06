//! Page Summarizer - per-page issue tallies, priority weighting and top issues.

use tracing::debug;

use super::scoring::{by_severity, round1, weighted_score};
use crate::config::ScoringPolicy;
use crate::domain::models::{FactorItem, FactorStatus, PageIssueSummary};

pub struct PageSummarizer<'a> {
    policy: &'a ScoringPolicy,
}

impl<'a> PageSummarizer<'a> {
    pub fn new(policy: &'a ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Summarize the items that share `page_url`.
    pub fn summarize(&self, page_url: &str, items: &[FactorItem]) -> PageIssueSummary {
        let count = |status: FactorStatus| items.iter().filter(|i| i.status == status).count() as u32;
        let priority_ofi_count = count(FactorStatus::PriorityOfi);
        let ofi_count = count(FactorStatus::Ofi);
        let ok_count = count(FactorStatus::Ok);
        let na_count = count(FactorStatus::NotApplicable);

        let page_title = items.iter().find_map(|i| i.page_title.clone());
        let page_type = items.iter().find_map(|i| i.page_type);

        let page_weight = self.policy.page_weight(page_type);
        let severity = &self.policy.severity_weights;
        let priority_weight = page_weight
            * (severity.priority_ofi * priority_ofi_count as f64 + severity.ofi * ofi_count as f64);

        let score = weighted_score(items, self.policy).map(round1);
        let weighted = score.map(|s| round1(s * page_weight));

        let mut ranked: Vec<&FactorItem> = items.iter().filter(|i| i.status.is_issue()).collect();
        ranked.sort_by(|a, b| by_severity(a, b));
        let top_issues = ranked
            .into_iter()
            .take(self.policy.limits.max_top_issues)
            .cloned()
            .collect();

        debug!(
            "[PAGE] {}: {} priority / {} ofi, weight {:.1}",
            page_url, priority_ofi_count, ofi_count, priority_weight
        );

        PageIssueSummary {
            page_url: page_url.to_string(),
            page_title,
            page_type,
            priority_ofi_count,
            ofi_count,
            ok_count,
            na_count,
            total_issues: priority_ofi_count + ofi_count,
            priority: Some(page_weight),
            priority_weight: Some(round1(priority_weight)),
            score,
            weighted_score: weighted,
            top_issues,
        }
    }

    /// Summarize every page-scoped item, one summary per page in
    /// first-appearance order.
    pub fn summarize_all(&self, items: &[FactorItem]) -> Vec<PageIssueSummary> {
        group_by_page(items)
            .into_iter()
            .map(|(url, page_items)| self.summarize(&url, &page_items))
            .collect()
    }
}

/// Group page-scoped items by exact `pageUrl`, preserving first-appearance
/// order of pages and input order within a page. Site-wide items are skipped.
pub fn group_by_page(items: &[FactorItem]) -> Vec<(String, Vec<FactorItem>)> {
    let mut groups: Vec<(String, Vec<FactorItem>)> = Vec::new();
    let mut index = std::collections::HashMap::new();

    for item in items {
        let Some(url) = item.page_url.as_deref() else {
            continue;
        };
        let slot = *index.entry(url.to_string()).or_insert_with(|| {
            groups.push((url.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item.clone());
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Category, Importance, PageType};

    fn page_item(name: &str, url: &str, status: FactorStatus, importance: Importance) -> FactorItem {
        let mut item = FactorItem::new(name, Category::OnPage, status, importance);
        item.page_url = Some(url.to_string());
        item
    }

    #[test]
    fn test_counts_are_exact() {
        let policy = ScoringPolicy::default();
        let url = "https://example.com/about";
        let items = vec![
            page_item("a", url, FactorStatus::PriorityOfi, Importance::High),
            page_item("b", url, FactorStatus::Ofi, Importance::Low),
            page_item("c", url, FactorStatus::Ofi, Importance::Low),
            page_item("d", url, FactorStatus::Ok, Importance::Low),
            page_item("e", url, FactorStatus::NotApplicable, Importance::Low),
        ];
        let summary = PageSummarizer::new(&policy).summarize(url, &items);

        assert_eq!(summary.priority_ofi_count, 1);
        assert_eq!(summary.ofi_count, 2);
        assert_eq!(summary.ok_count, 1);
        assert_eq!(summary.na_count, 1);
        assert_eq!(summary.total_issues, 3);
        // generic page: 1.0 * (3*1 + 1*2)
        assert_eq!(summary.priority_weight, Some(5.0));
        assert_eq!(summary.priority, Some(1.0));
    }

    #[test]
    fn test_priority_ofi_outweighs_plain_ofis() {
        let policy = ScoringPolicy::default();
        let summarizer = PageSummarizer::new(&policy);
        let one_priority = summarizer.summarize(
            "https://example.com/a",
            &[page_item("x", "https://example.com/a", FactorStatus::PriorityOfi, Importance::Low)],
        );
        let two_ofis = summarizer.summarize(
            "https://example.com/b",
            &[
                page_item("x", "https://example.com/b", FactorStatus::Ofi, Importance::Low),
                page_item("y", "https://example.com/b", FactorStatus::Ofi, Importance::Low),
            ],
        );
        assert!(one_priority.priority_weight > two_ofis.priority_weight);
    }

    #[test]
    fn test_page_type_weight_applies() {
        let policy = ScoringPolicy::default();
        let url = "https://example.com/";
        let mut item = page_item("title", url, FactorStatus::Ok, Importance::High);
        item.page_type = Some(PageType::Homepage);
        item.page_title = Some("Home".into());
        let mut issue = page_item("h1", url, FactorStatus::Ofi, Importance::High);
        issue.page_type = Some(PageType::Homepage);

        let summary = PageSummarizer::new(&policy).summarize(url, &[item, issue]);
        assert_eq!(summary.page_type, Some(PageType::Homepage));
        assert_eq!(summary.page_title.as_deref(), Some("Home"));
        assert_eq!(summary.priority, Some(2.0));
        assert_eq!(summary.priority_weight, Some(2.0));
        assert_eq!(summary.score, Some(75.0));
        assert_eq!(summary.weighted_score, Some(150.0));
    }

    #[test]
    fn test_top_issues_severity_order_regardless_of_input() {
        let policy = ScoringPolicy::default();
        let url = "https://example.com/services";
        let items = vec![
            page_item("ok", url, FactorStatus::Ok, Importance::High),
            page_item("ofi-high", url, FactorStatus::Ofi, Importance::High),
            page_item("na", url, FactorStatus::NotApplicable, Importance::High),
            page_item("ofi-low", url, FactorStatus::Ofi, Importance::Low),
            page_item("prio-low", url, FactorStatus::PriorityOfi, Importance::Low),
            page_item("prio-high", url, FactorStatus::PriorityOfi, Importance::High),
        ];
        let summary = PageSummarizer::new(&policy).summarize(url, &items);
        let names: Vec<_> = summary.top_issues.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["prio-high", "prio-low", "ofi-high", "ofi-low"]);
    }

    #[test]
    fn test_top_issues_skip_passing_and_inapplicable_items() {
        let policy = ScoringPolicy::default();
        let url = "https://example.com/about";
        let items = vec![
            page_item("ok", url, FactorStatus::Ok, Importance::High),
            page_item("na", url, FactorStatus::NotApplicable, Importance::Low),
        ];
        let summary = PageSummarizer::new(&policy).summarize(url, &items);
        assert!(summary.top_issues.is_empty());
        assert_eq!(summary.total_issues, 0);
        assert_eq!(summary.ok_count + summary.na_count, 2);
    }

    #[test]
    fn test_no_scorable_items() {
        let policy = ScoringPolicy::default();
        let url = "https://example.com/legal";
        let items = vec![page_item("n", url, FactorStatus::NotApplicable, Importance::High)];
        let summary = PageSummarizer::new(&policy).summarize(url, &items);
        assert_eq!(summary.score, None);
        assert_eq!(summary.weighted_score, None);
        assert_eq!(summary.priority_weight, Some(0.0));
    }

    #[test]
    fn test_group_by_page_skips_site_wide_items() {
        let items = vec![
            page_item("a", "https://example.com/b", FactorStatus::Ok, Importance::Low),
            FactorItem::new("robots", Category::TechnicalSeo, FactorStatus::Ok, Importance::High),
            page_item("b", "https://example.com/a", FactorStatus::Ofi, Importance::Low),
            page_item("c", "https://example.com/b", FactorStatus::Ofi, Importance::Low),
        ];
        let groups = group_by_page(&items);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "https://example.com/b");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "https://example.com/a");

        let policy = ScoringPolicy::default();
        let summaries = PageSummarizer::new(&policy).summarize_all(&items);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].ofi_count, 1);
    }
}
