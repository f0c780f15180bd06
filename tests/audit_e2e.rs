//! End-to-end audit runs through the public API.

use audit_engine::config::{CrawlSettings, ScoringPolicy};
use audit_engine::domain::models::{
    ai_insights_error, AuditSummary, Category, FactorItem, FactorStatus, Importance, ScoreTrend,
};
use audit_engine::repository::sqlite::SqliteAuditStore;
use audit_engine::service::{ingest, AuditInput, CrawlRegistry};
use audit_engine::test_utils::fixtures;
use audit_engine::{AuditEngine, AuditError, AuditHistory};

fn engine() -> AuditEngine {
    AuditEngine::new(ScoringPolicy::default()).expect("default policy")
}

#[test]
fn four_categories_two_ok_one_priority() {
    let mut items = Vec::new();
    for category in [
        Category::OnPage,
        Category::TechnicalSeo,
        Category::LocalSeo,
        Category::UxPerformance,
    ] {
        items.push(fixtures::item("a", category, FactorStatus::Ok, Importance::High));
        items.push(fixtures::item("b", category, FactorStatus::Ok, Importance::High));
        items.push(fixtures::item("c", category, FactorStatus::PriorityOfi, Importance::High));
    }

    let summary = engine().run(items.into()).unwrap();

    for category in [
        Category::OnPage,
        Category::TechnicalSeo,
        Category::LocalSeo,
        Category::UxPerformance,
    ] {
        assert_eq!(summary.section(category).unwrap().score, Some(66.7), "{}", category);
    }
    assert_eq!(summary.overall_score, Some(66.7));
    assert_eq!(summary.total_factors, 12);
    assert_eq!(summary.priority_ofi_count, 4);
    assert!(summary.page_analysis.is_none());
}

#[test]
fn sample_site_summary() {
    let summary = engine().run(fixtures::sample_batch().into()).unwrap();

    assert_eq!(summary.total_factors, 13);
    assert_eq!(summary.priority_ofi_count, 3);
    assert_eq!(summary.ofi_count, 3);
    assert_eq!(summary.ok_count, 6);
    assert_eq!(summary.na_count, 1);
    assert_eq!(summary.bucket_mapping_version, 1);

    // High-impact, easy fixes first.
    assert_eq!(
        summary.recommendations[0],
        "Use the same business address on the contact page and footer"
    );
    assert_eq!(summary.recommendations.len(), 5);
    // 4 easy (0.5h) + 2 medium or unknown (2h) = 6h
    assert_eq!(summary.estimated_fix_time, "1-2 days");

    let pages = summary.page_analysis.as_ref().unwrap();
    assert_eq!(pages.len(), 4);
    // Contact and drains pages tie at 1.5 * 3; the lower weighted score ranks first.
    assert_eq!(pages[0].page_url, "https://example.com/services/drains");
    assert_eq!(pages[1].page_url, "https://example.com/contact");
    assert_eq!(pages[1].na_count, 1);
    assert_eq!(pages.last().unwrap().page_url, "https://example.com/services/boilers");

    let contact = summary.section(Category::ContactPage).unwrap();
    assert!((contact.completion_rate.unwrap() - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn output_is_idempotent_and_round_trips() {
    let engine = engine();
    let first = engine.run(fixtures::sample_batch().into()).unwrap();
    let second = engine.run(fixtures::sample_batch().into()).unwrap();

    let json = first.to_json().unwrap();
    assert_eq!(json, second.to_json().unwrap());

    let parsed = AuditSummary::from_json(&json).unwrap();
    assert_eq!(parsed, first);
    assert_eq!(parsed.to_json().unwrap(), json);
}

#[test]
fn sparse_input_omits_rather_than_zeroes() {
    let items = vec![fixtures::item(
        "Map embed",
        Category::ContactPage,
        FactorStatus::NotApplicable,
        Importance::Low,
    )];
    let summary = engine().run(items.into()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();

    assert!(json.get("overallScore").is_none());
    assert_eq!(json["categoryScores"], serde_json::json!({}));
    assert!(json["sections"]["contactPage"].get("score").is_none());
    assert_eq!(json["sections"]["contactPage"]["completionRate"], 0.0);
    assert_eq!(json["estimatedFixTime"], "No fixes needed");
}

#[test]
fn malformed_batch_reports_index_and_category() {
    let json = r#"[
        {"name":"Title","category":"onPage","status":"OK","importance":"High"},
        {"name":"Speed","category":"uxPerformance","status":"OK","importance":"High","score":"fast"}
    ]"#;
    match ingest::parse_batch(json).unwrap_err() {
        AuditError::MalformedInput { index, category, .. } => {
            assert_eq!(index, 1);
            assert_eq!(category.as_deref(), Some("uxPerformance"));
        }
        other => panic!("expected malformed input, got {:?}", other),
    }
}

#[test]
fn failed_crawl_still_produces_summary() {
    let registry = CrawlRegistry::new(CrawlSettings { max_pages: 25 });
    registry.register("job-42");
    registry
        .update("job-42", |crawl| {
            crawl.start()?;
            crawl.record_pages_found(10)?;
            for _ in 0..5 {
                crawl.record_page_analyzed()?;
            }
            crawl.set_progress(50.0)?;
            crawl.fail("upstream returned 503")
        })
        .unwrap();

    let input = AuditInput {
        items: fixtures::sample_batch(),
        crawl_metadata: registry.metadata("job-42"),
        competitor_comparison: None,
        ai_insights: Some(ai_insights_error("AI provider timed out")),
    };
    let summary = engine().run(input).unwrap();

    let meta = summary.crawl_metadata.as_ref().unwrap();
    assert_eq!(meta.pages_analyzed, 5);
    assert_eq!(meta.pages_found, 10);
    assert!(!meta.max_pages_reached);
    assert!(!meta.errors.is_empty());
    assert_eq!(summary.ai_insights.as_ref().unwrap()["error"], "AI provider timed out");
    assert!(summary.overall_score.is_some());
}

#[tokio::test]
async fn concurrent_run_matches_sequential() {
    let engine = engine();
    let input = AuditInput::from(fixtures::sample_batch());

    let sequential = engine.run(input.clone()).unwrap();
    let concurrent = engine.run_concurrent(input).await.unwrap();

    assert_eq!(sequential.to_json().unwrap(), concurrent.to_json().unwrap());
}

#[tokio::test]
async fn history_versions_and_stale_writes() {
    let pool = fixtures::setup_test_db().await;
    let history = AuditHistory::new(SqliteAuditStore::new(pool));
    let engine = engine();

    let before = engine.run(fixtures::sample_batch().into()).unwrap();
    let mut fixed_items = fixtures::sample_batch();
    for item in fixed_items.iter_mut() {
        if item.status == FactorStatus::PriorityOfi {
            item.status = FactorStatus::Ok;
        }
    }
    let after = engine.run(fixed_items.into()).unwrap();

    let (_, v1) = history.record("example.com", before.clone()).await.unwrap();
    let (_, v2) = history.record("example.com", after).await.unwrap();
    assert_eq!((v1.version, v2.version), (1, 2));
    assert_eq!(v2.changes.modified.len(), 3);
    assert_eq!(v2.changes.score_trend, ScoreTrend::Increased);
    assert!(v2.changes.score_change > 0.0);

    use audit_engine::repository::AuditStore;
    let stale = history.store().save("example.com", 2, &v1).await.unwrap_err();
    assert!(matches!(stale, AuditError::VersionConflict { .. }));
}

#[test]
fn duplicate_identities_are_counted_but_diffed_once() {
    let items = vec![
        FactorItem::new("Alt text", Category::OnPage, FactorStatus::Ofi, Importance::Low),
        FactorItem::new("Alt text", Category::OnPage, FactorStatus::Ok, Importance::Low),
    ];
    let summary = engine().run(items.into()).unwrap();
    assert_eq!(summary.total_factors, 2);

    let changes = audit_engine::service::history_differ::initial(&summary);
    assert_eq!(changes.added, vec!["Alt text"]);
}

#[test]
fn audit_input_file_with_policy_override() {
    let policy = ScoringPolicy::from_json_str(r#"{"statusScores":{"ofi":70}}"#).unwrap();
    let engine = AuditEngine::new(policy).unwrap();

    let input = ingest::parse_input(
        r#"{"items":[{"name":"Meta description","category":"onPage","status":"OFI","importance":"Medium"}]}"#,
    )
    .unwrap();
    let summary = engine.run(input).unwrap();
    assert_eq!(summary.overall_score, Some(70.0));
    assert_eq!(summary.category_scores.content_quality, Some(70.0));
}

#[test]
fn async_helpers_run_under_tokio_test() {
    let versions = tokio_test::block_on(async {
        use audit_engine::repository::AuditStore;
        let store = SqliteAuditStore::new(fixtures::setup_test_db().await);
        store.list("nothing-yet").await
    })
    .unwrap();
    assert!(versions.is_empty());
}
