//! Migration trait definition

use super::{MigrationError, SqlWriter};

/// Trait that all migrations must implement
///
/// A migration owns one row of the state table, keyed by [`Migration::id`]. On each run the
/// migrator hands it the checksum currently stored for that id and a [`SqlWriter`]; the
/// migration appends whatever SQL brings the database from that checksum to its latest one
/// and returns the checksum the database will hold once that SQL has run.
///
/// Returning `current` unchanged means "nothing to do" and must leave the writer empty.
///
/// Most migrations are declared with [`super::SchemaMigration`] rather than by implementing
/// this trait by hand.
pub trait Migration: Send + Sync {
    /// Stable identifier, unique within a group
    fn id(&self) -> i64;

    /// Human-readable name used in errors and logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Latest checksum, when it can be known without generating SQL
    ///
    /// Migrations reporting `Some` are skipped without calling [`Migration::migrate`] when the
    /// stored checksum already matches.
    fn latest_checksum(&self) -> Option<i64> {
        None
    }

    /// Stage the SQL upgrading the database from `current` and return the resulting checksum
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::CannotUpgradeSchema` when no upgrade path starts at `current`.
    fn migrate(&self, current: i64, sql: &mut SqlWriter) -> Result<i64, MigrationError>;

    /// True if this migration must run after the migration with id `id`
    ///
    /// Only consulted for migrations staged in the same run.
    fn is_dependent_on(&self, _id: i64) -> bool {
        false
    }
}
