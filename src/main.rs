//! `audit-engine` command line.
//!
//! ```bash
//! audit-engine compose --input items.json [--policy policy.json] [--previous summary.json]
//! audit-engine diff --previous old.json --current new.json
//! audit-engine record --input items.json --audit-id example.com --database history.db
//! audit-engine history --audit-id example.com --database history.db
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use audit_engine::domain::models::AuditSummary;
use audit_engine::repository::sqlite::SqliteAuditStore;
use audit_engine::repository::AuditStore;
use audit_engine::service::{history_differ, ingest};
use audit_engine::{db, lifecycle, AuditEngine, AuditHistory, ScoringPolicy};

/// SEO audit aggregation and scoring
#[derive(Parser, Debug)]
#[command(name = "audit-engine", version)]
#[command(about = "Aggregate SEO factor checks into a scored audit summary")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a factor batch and print the audit summary
    Compose {
        /// Factor item array or audit input object (JSON)
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Scoring policy overrides (JSON)
        #[arg(long, value_name = "FILE", env = "AUDIT_ENGINE_POLICY")]
        policy: Option<PathBuf>,

        /// Previous audit summary; when given, changes are printed alongside
        #[arg(long, value_name = "FILE")]
        previous: Option<PathBuf>,

        /// Aggregate categories and pages on parallel tasks
        #[arg(long)]
        concurrent: bool,
    },

    /// Compare two audit summaries
    Diff {
        #[arg(long, value_name = "FILE")]
        previous: PathBuf,

        #[arg(long, value_name = "FILE")]
        current: PathBuf,
    },

    /// Score a factor batch and store it as the next version of an audit
    Record {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        #[arg(long)]
        audit_id: String,

        #[arg(long, value_name = "FILE", env = "AUDIT_ENGINE_DB", default_value = "audit-history.db")]
        database: PathBuf,

        #[arg(long, value_name = "FILE", env = "AUDIT_ENGINE_POLICY")]
        policy: Option<PathBuf>,
    },

    /// List the stored versions of an audit
    History {
        #[arg(long)]
        audit_id: String,

        #[arg(long, value_name = "FILE", env = "AUDIT_ENGINE_DB", default_value = "audit-history.db")]
        database: PathBuf,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ComposeOutput {
    summary: AuditSummary,
    changes: audit_engine::domain::models::AuditChanges,
}

#[tokio::main]
async fn main() -> Result<()> {
    lifecycle::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Compose {
            input,
            policy,
            previous,
            concurrent,
        } => {
            let engine = engine(policy.as_deref())?;
            let audit_input = ingest::parse_input(&read(&input)?)?;
            let summary = if concurrent {
                engine.run_concurrent(audit_input).await?
            } else {
                engine.run(audit_input)?
            };

            match previous {
                Some(path) => {
                    let previous = read_summary(&path)?;
                    let changes = history_differ::diff(&previous, &summary);
                    print_json(&ComposeOutput { summary, changes }, cli.pretty)
                }
                None => print_json(&summary, cli.pretty),
            }
        }
        Command::Diff { previous, current } => {
            let changes = history_differ::diff(&read_summary(&previous)?, &read_summary(&current)?);
            print_json(&changes, cli.pretty)
        }
        Command::Record {
            input,
            audit_id,
            database,
            policy,
        } => {
            let engine = engine(policy.as_deref())?;
            let summary = engine.run(ingest::parse_input(&read(&input)?)?)?;

            let pool = db::init_db(&database).await?;
            let history = AuditHistory::new(SqliteAuditStore::new(pool));
            let (id, entry) = history.record(&audit_id, summary).await?;
            info!("Recorded {} version {} as {}", audit_id, entry.version, id);
            print_json(&entry, cli.pretty)
        }
        Command::History { audit_id, database } => {
            let pool = db::init_db(&database).await?;
            let versions = SqliteAuditStore::new(pool).list(&audit_id).await?;
            print_json(&versions, cli.pretty)
        }
    }
}

fn engine(policy: Option<&Path>) -> Result<AuditEngine> {
    let policy = match policy {
        Some(path) => ScoringPolicy::from_json_file(path)?,
        None => ScoringPolicy::default(),
    };
    Ok(AuditEngine::new(policy)?)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_summary(path: &Path) -> Result<AuditSummary> {
    AuditSummary::from_json(&read(path)?)
        .with_context(|| format!("{} is not an audit summary", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
