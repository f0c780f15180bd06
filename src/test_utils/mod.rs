//! Shared fixtures for unit tests, integration tests and benchmarks.

pub mod fixtures {
    use sqlx::SqlitePool;

    use crate::domain::models::{
        AnalysisDetails, Category, Difficulty, FactorItem, FactorStatus, Impact, Importance,
        PageType,
    };

    /// Creates an in-memory SQLite database with migrations applied
    pub async fn setup_test_db() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    /// Site-wide item
    pub fn item(name: &str, category: Category, status: FactorStatus, importance: Importance) -> FactorItem {
        FactorItem::new(name, category, status, importance)
    }

    /// Page-scoped item
    pub fn page_item(
        name: &str,
        category: Category,
        status: FactorStatus,
        url: &str,
        page_type: PageType,
    ) -> FactorItem {
        let mut item = FactorItem::new(name, category, status, Importance::Medium);
        item.page_url = Some(url.to_string());
        item.page_type = Some(page_type);
        item
    }

    pub fn with_recommendation(
        mut item: FactorItem,
        text: &str,
        impact: Impact,
        difficulty: Difficulty,
    ) -> FactorItem {
        let details = item.analysis_details.get_or_insert_with(AnalysisDetails::default);
        details.recommendations.push(text.to_string());
        details.estimated_impact = Some(impact);
        details.difficulty = Some(difficulty);
        item
    }

    /// A small local-business site: homepage, contact page, two service pages
    /// and a handful of site-wide checks.
    pub fn sample_batch() -> Vec<FactorItem> {
        use Category::*;
        use FactorStatus::*;

        let home = "https://example.com/";
        let contact = "https://example.com/contact";
        let drains = "https://example.com/services/drains";
        let boilers = "https://example.com/services/boilers";

        vec![
            with_recommendation(
                page_item("Title tag length", OnPage, Ofi, home, PageType::Homepage),
                "Shorten the homepage title to under 60 characters",
                Impact::Medium,
                Difficulty::Easy,
            ),
            page_item("Single H1", OnPage, Ok, home, PageType::Homepage),
            with_recommendation(
                page_item("NAP consistency", ContactPage, PriorityOfi, contact, PageType::ContactPage),
                "Use the same business address on the contact page and footer",
                Impact::High,
                Difficulty::Easy,
            ),
            page_item("Click-to-call link", ContactPage, Ok, contact, PageType::ContactPage),
            page_item("Embedded map", ContactPage, NotApplicable, contact, PageType::ContactPage),
            with_recommendation(
                page_item("Thin content", ServicePages, PriorityOfi, drains, PageType::ServicePage),
                "Expand the drain cleaning page to at least 500 words",
                Impact::High,
                Difficulty::Medium,
            ),
            page_item("Service schema", ServicePages, Ok, boilers, PageType::ServicePage),
            with_recommendation(
                item("XML sitemap", TechnicalSeo, Ofi, Importance::High),
                "Submit the sitemap in Search Console",
                Impact::Medium,
                Difficulty::Easy,
            ),
            item("HTTPS", TechnicalSeo, Ok, Importance::High),
            item("Breadcrumbs", StructureNavigation, Ok, Importance::Low),
            with_recommendation(
                item("Google Business Profile", LocalSeo, PriorityOfi, Importance::High),
                "Claim and verify the Google Business Profile",
                Impact::High,
                Difficulty::Easy,
            ),
            item("Core Web Vitals", UxPerformance, Ofi, Importance::Medium),
            item("Readability", ContentQuality, Ok, Importance::Medium),
        ]
    }
}
