//! Migration status reporting

use crate::migration::SchemaStateRow;

/// Status of a group against the state table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Group the report covers
    pub group: String,

    /// Candidates whose stored checksum equals their latest one
    pub applied: Vec<SchemaStateRow>,

    /// Candidates a `migrate()` would stage
    pub pending: Vec<PendingMigration>,

    /// Stored rows with no candidate in this group (other groups or removed migrations)
    pub untracked: Vec<SchemaStateRow>,
}

/// A candidate whose stored checksum differs from its latest one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMigration {
    pub id: i64,

    pub name: String,

    /// Stored checksum, 0 when never applied
    pub current_checksum: i64,

    pub latest_checksum: i64,
}

impl MigrationStatus {
    /// Create a new `MigrationStatus`
    #[must_use]
    pub fn new(
        group: String,
        applied: Vec<SchemaStateRow>,
        pending: Vec<PendingMigration>,
        untracked: Vec<SchemaStateRow>,
    ) -> Self {
        Self {
            group,
            applied,
            pending,
            untracked,
        }
    }

    /// Check if nothing is pending
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pending migrations that were never applied
    pub fn never_applied(&self) -> impl Iterator<Item = &PendingMigration> {
        self.pending.iter().filter(|p| p.current_checksum == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let status = MigrationStatus::new(
            "default".to_string(),
            vec![SchemaStateRow::new(1, 10)],
            vec![
                PendingMigration {
                    id: 2,
                    name: "sauce".to_string(),
                    current_checksum: 0,
                    latest_checksum: 20,
                },
                PendingMigration {
                    id: 3,
                    name: "knight".to_string(),
                    current_checksum: 29,
                    latest_checksum: 30,
                },
            ],
            Vec::new(),
        );

        assert!(!status.is_up_to_date());
        assert_eq!(status.applied_count(), 1);
        assert_eq!(status.pending_count(), 2);
        assert_eq!(status.never_applied().map(|p| p.id).collect::<Vec<_>>(), vec![2]);
    }
}
