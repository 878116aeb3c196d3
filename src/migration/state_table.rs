//! Migration state table management
//!
//! The state table holds one `(id, checksum)` row per migration that has been applied at least
//! once. Every statement is built with `sea_query` and rendered with literal values so it can
//! be appended to a migration's main section and shipped in the same batch as its SQL.

use super::{quote, MigrationError, DEFAULT_STATE_TABLE};
use sea_query::{ColumnDef, Expr, ExprTrait, Iden, PostgresQueryBuilder, Query, Table};

const ID_COLUMN: &str = "id";
const CHECKSUM_COLUMN: &str = "checksum";

struct TableName(String);

impl Iden for TableName {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

/// Name and statement builder for the state table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTable {
    name: String,
}

impl Default for StateTable {
    fn default() -> Self {
        Self {
            name: DEFAULT_STATE_TABLE.to_string(),
        }
    }
}

impl StateTable {
    /// Use `name` as the state table
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::InvalidIdentifier` if `name` cannot be quoted as an identifier.
    pub fn new(name: &str) -> Result<Self, MigrationError> {
        quote::enquote_identifier(name)?;
        let name = name
            .strip_prefix('"')
            .and_then(|n| n.strip_suffix('"'))
            .unwrap_or(name);
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn iden(&self) -> TableName {
        TableName(self.name.clone())
    }

    /// `CREATE TABLE IF NOT EXISTS` for the `(id, checksum)` table
    pub fn create_sql(&self) -> String {
        let sql = Table::create()
            .table(self.iden())
            .if_not_exists()
            .col(
                ColumnDef::new(ID_COLUMN)
                    .big_integer()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(CHECKSUM_COLUMN).big_integer().not_null())
            .build(PostgresQueryBuilder);
        terminate(sql)
    }

    /// Snapshot of every stored row
    pub fn select_sql(&self) -> String {
        let sql = Query::select()
            .columns([ID_COLUMN, CHECKSUM_COLUMN])
            .from(self.iden())
            .to_string(PostgresQueryBuilder);
        terminate(sql)
    }

    pub fn insert_sql(&self, id: i64, checksum: i64) -> String {
        let sql = Query::insert()
            .into_table(self.iden())
            .columns([ID_COLUMN, CHECKSUM_COLUMN])
            .values_panic([id.into(), checksum.into()])
            .to_string(PostgresQueryBuilder);
        terminate(sql)
    }

    pub fn update_sql(&self, id: i64, checksum: i64) -> String {
        let sql = Query::update()
            .table(self.iden())
            .value(CHECKSUM_COLUMN, checksum)
            .and_where(Expr::col(ID_COLUMN).eq(id))
            .to_string(PostgresQueryBuilder);
        terminate(sql)
    }

    pub fn delete_sql(&self, id: i64) -> String {
        let sql = Query::delete()
            .from_table(self.iden())
            .and_where(Expr::col(ID_COLUMN).eq(id))
            .to_string(PostgresQueryBuilder);
        terminate(sql)
    }

    pub fn truncate_sql(&self) -> String {
        let sql = Table::truncate()
            .table(self.iden())
            .build(PostgresQueryBuilder);
        terminate(sql)
    }

    /// Row mutation recording that migration `id` moved from `from` to `to`
    ///
    /// Leaving 0 inserts the row, reaching 0 deletes it, anything else updates it. Returns
    /// `None` when the checksum does not change.
    pub fn transition_sql(&self, id: i64, from: i64, to: i64) -> Option<String> {
        if from == to {
            None
        } else if from == super::checksum::EMPTY_CHECKSUM {
            Some(self.insert_sql(id, to))
        } else if to == super::checksum::EMPTY_CHECKSUM {
            Some(self.delete_sql(id))
        } else {
            Some(self.update_sql(id, to))
        }
    }
}

fn terminate(mut sql: String) -> String {
    sql.push(';');
    sql
}
