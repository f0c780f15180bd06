pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod repository;
pub mod service;
pub mod test_utils;

pub use config::{CrawlSettings, ScoringPolicy};
pub use error::{AuditError, CrawlError, Result};
pub use service::{AuditEngine, AuditHistory, AuditInput};
