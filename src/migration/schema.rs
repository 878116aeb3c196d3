//! Declarative migrations
//!
//! [`SchemaMigration`] covers the common case: one creation statement, a chain of upgrade
//! hops from older revisions of it, and optional idempotent SQL (repeatable statements, enum
//! types, epilogue statements) that is reissued whenever any of it changes.
//!
//! ```
//! use lifeguard_schema::migration::{checksum, Migration, SchemaMigration, SqlWriter};
//!
//! # fn main() -> Result<(), lifeguard_schema::migration::MigrationError> {
//! const APPLE_V1: &str = "CREATE TABLE \"apple\" (\"id\" BIGINT PRIMARY KEY);";
//! const APPLE: &str = "CREATE TABLE \"apple\" (\"id\" BIGINT PRIMARY KEY, \"name\" TEXT);";
//!
//! let apple = SchemaMigration::builder(42)
//!     .name("apple")
//!     .schema(APPLE)
//!     .upgrade(checksum::crc32(APPLE_V1), checksum::crc32(APPLE),
//!              "ALTER TABLE \"apple\" ADD COLUMN \"name\" TEXT;")
//!     .build()?;
//!
//! let mut sql = SqlWriter::new();
//! let reached = apple.migrate(checksum::combine(checksum::crc32(APPLE_V1), 0), &mut sql)?;
//! assert_eq!(Some(reached), apple.latest_checksum());
//! assert_eq!(sql.main(), "ALTER TABLE \"apple\" ADD COLUMN \"name\" TEXT;");
//! # Ok(())
//! # }
//! ```

use super::checksum;
use super::quote::{enquote_identifier, enquote_literal};
use super::{Migration, MigrationError, Phase, SqlWriter, DEFAULT_GROUP};

/// One `(from, to)` step of the normal checksum chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaUpgrade {
    pub from: u32,
    pub to: u32,
    pub sql: String,
}

/// An enumerated type kept in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    pub name: String,
    pub values: Vec<String>,
}

/// Migration declared from SQL fragments
#[derive(Debug, Clone)]
pub struct SchemaMigration {
    id: i64,
    name: String,
    group: String,
    schema: Option<String>,
    upgrades: Vec<SchemaUpgrade>,
    repeatable: Option<String>,
    enums: Vec<EnumSchema>,
    enum_sql: String,
    epilogue: Option<String>,
    dependencies: Vec<i64>,
    latest_checksum: i64,
}

/// Builder for [`SchemaMigration`]
#[derive(Debug, Clone)]
pub struct SchemaMigrationBuilder {
    id: i64,
    name: Option<String>,
    group: String,
    schema: Option<String>,
    upgrades: Vec<SchemaUpgrade>,
    repeatable: Option<String>,
    enums: Vec<(String, Vec<String>, Vec<String>)>,
    epilogue: Option<String>,
    dependencies: Vec<i64>,
}

impl SchemaMigrationBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Statement creating the current revision from nothing
    #[must_use]
    pub fn schema(mut self, sql: impl Into<String>) -> Self {
        self.schema = Some(sql.into());
        self
    }

    /// Statement upgrading revision `from` to revision `to` (normal checksums)
    #[must_use]
    pub fn upgrade(mut self, from: u32, to: u32, sql: impl Into<String>) -> Self {
        self.upgrades.push(SchemaUpgrade {
            from,
            to,
            sql: sql.into(),
        });
        self
    }

    /// Idempotent SQL rerun in the main phase whenever the repeatable checksum changes
    #[must_use]
    pub fn repeatable(mut self, sql: impl Into<String>) -> Self {
        self.repeatable = Some(sql.into());
        self
    }

    /// Enumerated type created in the prologue, holding `values` minus `values_to_ignore`
    #[must_use]
    pub fn enum_schema<V, I>(mut self, name: impl Into<String>, values: V, values_to_ignore: I) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.enums.push((
            name.into(),
            values.into_iter().map(Into::into).collect(),
            values_to_ignore.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Idempotent SQL rerun in the epilogue phase whenever the repeatable checksum changes
    #[must_use]
    pub fn epilogue(mut self, sql: impl Into<String>) -> Self {
        self.epilogue = Some(sql.into());
        self
    }

    /// Run after the migration with id `id` when both are staged together
    #[must_use]
    pub fn depends_on(mut self, id: i64) -> Self {
        self.dependencies.push(id);
        self
    }

    /// Validate the fragments and compute the latest checksum
    ///
    /// # Errors
    ///
    /// - `MigrationError::InvalidSql` if a fragment does not end with `;`
    /// - `MigrationError::InvalidIdentifier` if an enum name cannot be quoted
    /// - `MigrationError::CyclicalOrUnsatisfiedDependency` if the migration depends on itself
    pub fn build(self) -> Result<SchemaMigration, MigrationError> {
        let id = self.id;
        if self.dependencies.contains(&id) {
            return Err(MigrationError::CyclicalOrUnsatisfiedDependency { ids: vec![id] });
        }

        let main_fragments = self
            .schema
            .iter()
            .chain(self.upgrades.iter().map(|u| &u.sql))
            .chain(self.repeatable.iter());
        for sql in main_fragments {
            check_terminated(id, Phase::Main, sql)?;
        }
        if let Some(sql) = &self.epilogue {
            check_terminated(id, Phase::Epilogue, sql)?;
        }

        let enums = self
            .enums
            .into_iter()
            .map(|(name, values, ignored)| EnumSchema {
                name,
                values: values.into_iter().filter(|v| !ignored.contains(v)).collect(),
            })
            .collect::<Vec<_>>();
        let enum_sql = enum_sql(&enums)?;

        let normal = self.schema.as_deref().map_or(0, checksum::crc32);
        let repeatable = [self.repeatable.as_deref(), Some(enum_sql.as_str()), self.epilogue.as_deref()]
            .into_iter()
            .flatten()
            .filter(|sql| !sql.is_empty())
            .fold(0, |acc, sql| acc ^ checksum::crc32(sql));

        Ok(SchemaMigration {
            id,
            name: self.name.unwrap_or_else(|| format!("schema_{id}")),
            group: self.group,
            schema: self.schema,
            upgrades: self.upgrades,
            repeatable: self.repeatable,
            enums,
            enum_sql,
            epilogue: self.epilogue,
            dependencies: self.dependencies,
            latest_checksum: checksum::combine(normal, repeatable),
        })
    }
}

fn check_terminated(id: i64, section: Phase, sql: &str) -> Result<(), MigrationError> {
    let trimmed = sql.trim_end();
    if trimmed.is_empty() || trimmed.ends_with(';') {
        Ok(())
    } else {
        Err(MigrationError::InvalidSql { id, section })
    }
}

/// Idempotent DDL creating each enum and adding its values in declaration order
///
/// The last value is added unconditionally, then every earlier value is placed `BEFORE` the
/// one added just after it, so the final order holds even when some values already exist.
fn enum_sql(enums: &[EnumSchema]) -> Result<String, MigrationError> {
    let mut sql = String::new();
    for schema in enums {
        let identifier = enquote_identifier(&schema.name)?;
        // pg_type stores the bare name
        let type_name = enquote_literal(&identifier[1..identifier.len() - 1]);
        sql.push_str(&format!(
            "DO $$ BEGIN IF {type_name} NOT IN (SELECT T.typname FROM pg_type AS T \
             JOIN pg_namespace AS N ON N.oid = T.typnamespace \
             WHERE N.nspname = CURRENT_SCHEMA()) THEN CREATE TYPE {identifier} AS ENUM (); \
             END IF; END; $$;\n"
        ));

        let mut values = schema.values.iter().rev().map(|v| enquote_literal(v));
        if let Some(last) = values.next() {
            sql.push_str(&format!(
                "ALTER TYPE {identifier} ADD VALUE IF NOT EXISTS {last};\n"
            ));
            let mut next = last;
            for value in values {
                sql.push_str(&format!(
                    "ALTER TYPE {identifier} ADD VALUE IF NOT EXISTS {value} BEFORE {next};\n"
                ));
                next = value;
            }
        }
    }
    Ok(sql)
}

impl SchemaMigration {
    /// Start declaring the migration with id `id`
    pub fn builder(id: i64) -> SchemaMigrationBuilder {
        SchemaMigrationBuilder {
            id,
            name: None,
            group: DEFAULT_GROUP.to_string(),
            schema: None,
            upgrades: Vec::new(),
            repeatable: None,
            enums: Vec::new(),
            epilogue: None,
            dependencies: Vec::new(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn upgrades(&self) -> &[SchemaUpgrade] {
        &self.upgrades
    }

    pub fn enums(&self) -> &[EnumSchema] {
        &self.enums
    }

    /// Generated enum DDL, empty without enums
    pub fn enum_sql(&self) -> &str {
        &self.enum_sql
    }

    pub fn dependencies(&self) -> &[i64] {
        &self.dependencies
    }

    fn cannot_upgrade(&self, current: i64) -> MigrationError {
        MigrationError::CannotUpgradeSchema {
            id: self.id,
            name: self.name.clone(),
            current_checksum: current,
            latest_checksum: self.latest_checksum,
        }
    }

    /// Hop SQL leading from normal checksum `from` to the latest one
    fn upgrade_path(&self, current: i64) -> Result<Vec<&str>, MigrationError> {
        let (mut normal, _) = checksum::split(current);
        let (latest, _) = checksum::split(self.latest_checksum);

        if normal == 0 {
            if let Some(schema) = &self.schema {
                return Ok(vec![schema.as_str()]);
            }
        }

        let mut path = Vec::new();
        while normal != latest {
            if path.len() >= self.upgrades.len() {
                return Err(self.cannot_upgrade(current));
            }
            let hop = self
                .upgrades
                .iter()
                .find(|u| u.from == normal)
                .ok_or_else(|| self.cannot_upgrade(current))?;
            path.push(hop.sql.as_str());
            normal = hop.to;
        }
        Ok(path)
    }
}

impl Migration for SchemaMigration {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn latest_checksum(&self) -> Option<i64> {
        Some(self.latest_checksum)
    }

    fn migrate(&self, current: i64, sql: &mut SqlWriter) -> Result<i64, MigrationError> {
        let path = self.upgrade_path(current)?;
        let repeat = checksum::repeatable_part(current) != checksum::repeatable_part(self.latest_checksum);

        if repeat && !self.enum_sql.is_empty() {
            sql.append_to_prologue(&self.enum_sql);
        }
        for step in path {
            sql.append(step);
        }
        if repeat {
            if let Some(repeatable) = &self.repeatable {
                sql.append(repeatable);
            }
            if let Some(epilogue) = &self.epilogue {
                sql.append_to_epilogue(epilogue);
            }
        }

        Ok(self.latest_checksum)
    }

    fn is_dependent_on(&self, id: i64) -> bool {
        self.dependencies.contains(&id)
    }
}
