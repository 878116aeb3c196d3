//! # Lifeguard Schema
//!
//! Checksum-driven PostgreSQL schema migrations on the `may` runtime.
//!
//! Migrations declare their latest schema and the hops that reach it from older revisions. A
//! run compares stored checksums with the latest ones, stages the bridging SQL and applies it in
//! three transactional phases under a PostgreSQL advisory lock, so concurrent deployments never
//! migrate the same database twice.
//!
//! See the [`migration`] module for the moving parts.

pub mod config;
pub mod connection;
pub mod executor;
pub mod migration;
pub mod transaction;

#[cfg(feature = "tracing")]
pub mod tracing_helpers;

#[cfg(any(test, feature = "test-helpers"))]
pub mod tests_cfg;

pub use config::MigrateConfig;
pub use connection::{connect, connect_from_config, ConnectionError};
pub use executor::{LifeError, LifeExecutor, MayPostgresExecutor};
pub use migration::{
    Migration, MigrationError, MigrationResult, Migrator, PostgresStateStore, SchemaMigration,
    SchemaStateStore, SqlWriter,
};
pub use transaction::{Transaction, TransactionError};
