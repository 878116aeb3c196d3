//! Migration-specific error types

use crate::migration::Phase;
use crate::LifeError;

/// Migration-specific errors
#[derive(Debug)]
pub enum MigrationError {
    /// Database error outside of any migration's SQL (lock, state table, transaction control)
    Database(LifeError),
    /// Two candidates in the same run share an id
    DuplicateSchemaIdentifier {
        id: i64,
        name: String,
        conflicting_name: String,
    },
    /// No upgrade path leads from the stored checksum to the latest one
    CannotUpgradeSchema {
        id: i64,
        name: String,
        current_checksum: i64,
        latest_checksum: i64,
    },
    /// Ordering could not make progress; `ids` are the migrations left unordered
    CyclicalOrUnsatisfiedDependency { ids: Vec<i64> },
    /// A migration's SQL failed while its phase was executing
    FailedToMigrate { id: i64, cause: LifeError },
    /// An enumerated entry has no constructible migration behind it
    MissingMigrationImplementation { id: i64, name: String },
    /// A SQL fragment supplied to a migration is not terminated by `;`
    InvalidSql { id: i64, section: Phase },
    /// Text cannot be used as a PostgreSQL identifier
    InvalidIdentifier(String),
    /// Invalid migration configuration
    Config(String),
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationError::Database(e) => write!(f, "Database error: {e}"),
            MigrationError::DuplicateSchemaIdentifier {
                id,
                name,
                conflicting_name,
            } => {
                write!(
                    f,
                    "Schema id {id} is declared by both '{conflicting_name}' and '{name}'.\n\
                     Suggestion: every migration in a group needs its own id"
                )
            }
            MigrationError::CannotUpgradeSchema {
                id,
                name,
                current_checksum,
                latest_checksum,
            } => {
                write!(
                    f,
                    "Migration '{name}' (id {id}) has no upgrade path from checksum \
                     {current_checksum} to {latest_checksum}"
                )
            }
            MigrationError::CyclicalOrUnsatisfiedDependency { ids } => {
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "Migrations [{}] could not be ordered: their dependencies are cyclical or not part of this run",
                    ids.join(", ")
                )
            }
            MigrationError::FailedToMigrate { id, cause } => {
                write!(f, "Migration {id} failed during execution: {cause}")
            }
            MigrationError::MissingMigrationImplementation { id, name } => {
                write!(
                    f,
                    "No implementation registered for migration '{name}' (id {id})"
                )
            }
            MigrationError::InvalidSql { id, section } => {
                write!(
                    f,
                    "Migration {id}: {section} SQL must end with ';'"
                )
            }
            MigrationError::InvalidIdentifier(name) => {
                write!(f, "Invalid identifier: {name:?}")
            }
            MigrationError::Config(msg) => write!(f, "Invalid migration configuration: {msg}"),
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrationError::Database(e) | MigrationError::FailedToMigrate { cause: e, .. } => {
                Some(e)
            }
            _ => None,
        }
    }
}

impl From<LifeError> for MigrationError {
    fn from(error: LifeError) -> Self {
        MigrationError::Database(error)
    }
}

impl From<crate::transaction::TransactionError> for MigrationError {
    fn from(error: crate::transaction::TransactionError) -> Self {
        MigrationError::Database(error.into())
    }
}

impl From<config::ConfigError> for MigrationError {
    fn from(error: config::ConfigError) -> Self {
        MigrationError::Config(error.to_string())
    }
}
