pub mod audit_composer;
pub mod category_aggregator;
pub mod crawl_registry;
pub mod crawl_tracker;
pub mod engine;
pub mod history;
pub mod history_differ;
pub mod ingest;
pub mod page_summarizer;
pub mod scoring;

pub use audit_composer::{AuditComposer, ComposeInput};
pub use category_aggregator::CategoryAggregator;
pub use crawl_registry::CrawlRegistry;
pub use crawl_tracker::{CrawlState, CrawlTracker};
pub use engine::{AuditEngine, AuditInput};
pub use history::AuditHistory;
pub use page_summarizer::PageSummarizer;
