//! Process-level setup shared by the CLI and embedding applications.

use tracing_subscriber::filter::Directive;

/// Initialize logging with tracing_subscriber.
///
/// `RUST_LOG` is honoured; the default directives keep sqlx quiet and the
/// engine verbose. Safe to call more than once.
pub fn init_logging() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["sqlx=warn", "audit_engine=debug", "info"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
