//! Span constructors for the `tracing` feature.
//!
//! Kept in one place so span names and fields stay consistent between the executor, the
//! connection helper and the migrator.

use tracing::{info_span, Span};

/// Longest statement prefix recorded on a query span.
const MAX_STATEMENT_LEN: usize = 128;

/// Span around opening a migration session.
pub fn connect_span() -> Span {
    info_span!("lifeguard_schema.connect")
}

/// Span around a single statement or batch sent to the database.
pub fn execute_query_span(query: &str) -> Span {
    let statement = match query.char_indices().nth(MAX_STATEMENT_LEN) {
        Some((end, _)) => &query[..end],
        None => query,
    };
    info_span!("lifeguard_schema.query", db.statement = statement.trim())
}

/// Span around one `Migrator::migrate()` call.
pub fn migrate_span(group: &str) -> Span {
    info_span!("lifeguard_schema.migrate", group = group)
}

/// Span around `Migrator::baseline()`.
pub fn baseline_span(group: &str) -> Span {
    info_span!("lifeguard_schema.baseline", group = group)
}

/// Span around one committed phase.
pub fn phase_span(phase: &'static str) -> Span {
    info_span!("lifeguard_schema.phase", phase = phase)
}

/// Span around the execution of one migration's section inside a phase.
pub fn migration_batch_span(id: i64) -> Span {
    info_span!("lifeguard_schema.batch", migration.id = id)
}
