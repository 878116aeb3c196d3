//! `SchemaStateRow` - Represents entries in the schema state table

use super::checksum;

/// One `(id, checksum)` row of the state table
///
/// Presence of a row means the migration has been applied at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaStateRow {
    /// Migration id
    pub id: i64,

    /// Composite checksum of the applied SQL
    pub checksum: i64,
}

impl SchemaStateRow {
    #[must_use]
    pub fn new(id: i64, checksum: i64) -> Self {
        Self { id, checksum }
    }

    /// Create a `SchemaStateRow` from a database row
    ///
    /// Expected column order: `id`, `checksum`
    ///
    /// # Errors
    ///
    /// Returns `LifeError::ParseError` if either column is missing or not a `BIGINT`.
    pub fn from_row(row: &may_postgres::Row) -> Result<Self, crate::LifeError> {
        let id: i64 = row
            .try_get(0)
            .map_err(|e| crate::LifeError::ParseError(format!("Invalid state table id: {e}")))?;
        let checksum: i64 = row.try_get(1).map_err(|e| {
            crate::LifeError::ParseError(format!("Invalid state table checksum: {e}"))
        })?;
        Ok(Self { id, checksum })
    }

    /// Normal (hop-chained) half of the stored checksum
    #[must_use]
    pub fn normal_checksum(&self) -> u32 {
        checksum::normal_part(self.checksum)
    }

    /// Repeatable half of the stored checksum
    #[must_use]
    pub fn repeatable_checksum(&self) -> u32 {
        checksum::repeatable_part(self.checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves() {
        let row = SchemaStateRow::new(9, checksum::combine(0xDEAD_BEEF, 0x0BAD_F00D));
        assert_eq!(row.normal_checksum(), 0xDEAD_BEEF);
        assert_eq!(row.repeatable_checksum(), 0x0BAD_F00D);
    }
}
