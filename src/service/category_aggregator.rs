//! Category Aggregator - reduces one category's factor items to a `CategorySection`.

use std::collections::BTreeMap;

use tracing::debug;

use super::scoring::{by_severity, round1, weighted_score};
use crate::config::ScoringPolicy;
use crate::domain::models::{Category, CategorySection, FactorItem, FactorStatus, Importance};

pub struct CategoryAggregator<'a> {
    policy: &'a ScoringPolicy,
}

impl<'a> CategoryAggregator<'a> {
    pub fn new(policy: &'a ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Aggregate every site-wide and page-scoped item of `category`.
    ///
    /// An empty list yields an empty section with no score and no completion
    /// rate; it never fails.
    pub fn aggregate(&self, category: Category, items: Vec<FactorItem>) -> CategorySection {
        if items.is_empty() {
            debug!("[AGGREGATE] {} has no items", category);
            return CategorySection::empty(category);
        }
        debug_assert!(items.iter().all(|i| i.category == category));

        let score = weighted_score(&items, self.policy).map(round1);
        let completion_rate = Some(completion_rate(&items));
        let category_scores = self.importance_breakdown(&items);
        let insights = self.insights(&items);

        debug!(
            "[AGGREGATE] {}: {} items, score {:?}, completion {:?}",
            category,
            items.len(),
            score,
            completion_rate
        );

        CategorySection {
            category,
            items,
            score,
            completion_rate,
            category_scores,
            insights,
        }
    }

    /// Score restricted to each importance level that has scorable items.
    fn importance_breakdown(&self, items: &[FactorItem]) -> BTreeMap<String, f64> {
        Importance::ALL
            .into_iter()
            .filter_map(|level| {
                weighted_score(items.iter().filter(|i| i.importance == level), self.policy)
                    .map(|score| (level.key().to_string(), round1(score)))
            })
            .collect()
    }

    fn insights(&self, items: &[FactorItem]) -> Vec<String> {
        let mut issues: Vec<&FactorItem> = items.iter().filter(|i| i.status.is_issue()).collect();

        if issues.is_empty() {
            let applicable = items.iter().filter(|i| i.status.is_applicable()).count();
            return if applicable > 0 {
                vec![format!("All {} applicable checks passed", applicable)]
            } else {
                Vec::new()
            };
        }

        issues.sort_by(|a, b| by_severity(a, b));
        issues
            .into_iter()
            .take(self.policy.limits.max_insights)
            .map(describe_issue)
            .collect()
    }
}

/// Share of items that were applicable. NotApplicable items count toward the
/// total but never toward the considered set.
pub fn completion_rate(items: &[FactorItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let considered = items.iter().filter(|i| i.status.is_applicable()).count();
    considered as f64 / items.len() as f64
}

fn describe_issue(item: &FactorItem) -> String {
    let label = match item.status {
        FactorStatus::PriorityOfi => "Priority fix",
        _ => "Improve",
    };
    let importance = item.importance.key();
    match &item.page_url {
        Some(url) => format!("{}: {} ({} importance) on {}", label, item.name, importance, url),
        None => format!("{}: {} ({} importance)", label, item.name, importance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Importance::{High, Low, Medium};

    fn item(name: &str, status: FactorStatus, importance: Importance) -> FactorItem {
        FactorItem::new(name, Category::TechnicalSeo, status, importance)
    }

    #[test]
    fn test_empty_category() {
        let policy = ScoringPolicy::default();
        let section = CategoryAggregator::new(&policy).aggregate(Category::TechnicalSeo, vec![]);

        assert!(section.items.is_empty());
        assert_eq!(section.score, None);
        assert_eq!(section.completion_rate, None);
        assert!(section.insights.is_empty());
    }

    #[test]
    fn test_completion_rate_excludes_not_applicable() {
        let policy = ScoringPolicy::default();
        let mut items: Vec<_> = (0..7)
            .map(|i| item(&format!("ok-{}", i), FactorStatus::Ok, Medium))
            .collect();
        items.extend((0..3).map(|i| item(&format!("na-{}", i), FactorStatus::NotApplicable, Medium)));

        let section = CategoryAggregator::new(&policy).aggregate(Category::TechnicalSeo, items);
        assert_eq!(section.completion_rate, Some(0.7));
        assert_eq!(section.score, Some(100.0));
        assert_eq!(section.items.len(), 10);
    }

    #[test]
    fn test_all_not_applicable() {
        let policy = ScoringPolicy::default();
        let items = vec![
            item("a", FactorStatus::NotApplicable, High),
            item("b", FactorStatus::NotApplicable, Low),
        ];
        let section = CategoryAggregator::new(&policy).aggregate(Category::TechnicalSeo, items);

        assert_eq!(section.completion_rate, Some(0.0));
        assert_eq!(section.score, None, "no applicable checks must not read as failing");
        assert!(section.category_scores.is_empty());
        assert!(section.insights.is_empty());
    }

    #[test]
    fn test_unweighted_baseline() {
        let policy = ScoringPolicy::default();
        let items = vec![
            item("https", FactorStatus::Ok, High),
            item("sitemap", FactorStatus::Ok, High),
            item("robots", FactorStatus::PriorityOfi, High),
        ];
        let section = CategoryAggregator::new(&policy).aggregate(Category::TechnicalSeo, items);
        assert_eq!(section.score, Some(66.7));
        assert_eq!(section.category_scores.get("high"), Some(&66.7));
        assert!(section.category_scores.get("low").is_none());
    }

    #[test]
    fn test_explicit_and_implicit_scores_combine() {
        let policy = ScoringPolicy::default();
        let mut readability = item("readability", FactorStatus::Ofi, Low);
        readability.score = Some(40.0);
        // (40*1 + 100*2) / 3 = 80
        let items = vec![readability, item("schema", FactorStatus::Ok, Medium)];
        let section = CategoryAggregator::new(&policy).aggregate(Category::TechnicalSeo, items);
        assert_eq!(section.score, Some(80.0));
        assert_eq!(section.category_scores.get("low"), Some(&40.0));
        assert_eq!(section.category_scores.get("medium"), Some(&100.0));
    }

    #[test]
    fn test_insights_rank_priority_first_and_cap() {
        let mut policy = ScoringPolicy::default();
        policy.limits.max_insights = 3;
        let items = vec![
            item("alt text", FactorStatus::Ofi, High),
            item("canonical", FactorStatus::PriorityOfi, Low),
            item("h1", FactorStatus::PriorityOfi, High),
            item("meta", FactorStatus::Ofi, Low),
            item("ssl", FactorStatus::Ok, High),
        ];
        let section = CategoryAggregator::new(&policy).aggregate(Category::TechnicalSeo, items);

        assert_eq!(
            section.insights,
            vec![
                "Priority fix: h1 (high importance)",
                "Priority fix: canonical (low importance)",
                "Improve: alt text (high importance)",
            ]
        );
    }

    #[test]
    fn test_insight_mentions_page() {
        let policy = ScoringPolicy::default();
        let mut missing_h1 = item("Missing H1", FactorStatus::PriorityOfi, High);
        missing_h1.page_url = Some("https://example.com/contact".into());
        let section =
            CategoryAggregator::new(&policy).aggregate(Category::TechnicalSeo, vec![missing_h1]);
        assert_eq!(
            section.insights,
            vec!["Priority fix: Missing H1 (high importance) on https://example.com/contact"]
        );
    }

    #[test]
    fn test_all_passed_insight() {
        let policy = ScoringPolicy::default();
        let items = vec![
            item("a", FactorStatus::Ok, High),
            item("b", FactorStatus::NotApplicable, High),
        ];
        let section = CategoryAggregator::new(&policy).aggregate(Category::TechnicalSeo, items);
        assert_eq!(section.insights, vec!["All 1 applicable checks passed"]);
    }

    #[test]
    fn test_completion_rate_bounds() {
        assert_eq!(completion_rate(&[]), 0.0);
        let items = vec![item("a", FactorStatus::Ofi, Low)];
        let rate = completion_rate(&items);
        assert!((0.0..=1.0).contains(&rate));
        assert_eq!(rate, 1.0);
    }
}
