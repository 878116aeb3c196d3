//! In-memory `SchemaStateStore` for tests
//!
//! Sessions created with [`MemoryStateStore::connect`] share one database: the advisory lock
//! and the state table rows are visible to all of them, while transactions and the event log
//! are per session. State table statements (`CREATE TABLE`, `INSERT`, `UPDATE`, `DELETE`,
//! `TRUNCATE`) are recognised in executed batches and applied to the rows; every other
//! statement is only recorded.

use super::{SchemaStateStore, StateTable};
use crate::LifeError;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Something a session did, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    TryLock(bool),
    Unlock,
    EnsureTable,
    ReadAll,
    Begin,
    Execute(String),
    Commit,
    Rollback,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    exists: bool,
    rows: BTreeMap<i64, i64>,
}

#[derive(Debug, Default)]
struct Database {
    tables: Tables,
    lock_holder: Option<u64>,
    next_session: u64,
}

#[derive(Debug, Default)]
struct Session {
    transaction: Option<Tables>,
    events: Vec<StoreEvent>,
    fail_on: Vec<String>,
}

struct Statements {
    create: Regex,
    insert: Regex,
    update: Regex,
    delete: Regex,
    truncate: Regex,
}

impl Statements {
    fn new(table: &str) -> Result<Self, LifeError> {
        let table = format!(r#""?{}"?"#, regex::escape(table));
        let id = r#""?id"?"#;
        let checksum = r#""?checksum"?"#;
        let compile = |pattern: String| {
            Regex::new(&format!("(?is)^{pattern}$"))
                .map_err(|e| LifeError::Other(format!("Invalid statement pattern: {e}")))
        };
        Ok(Self {
            create: compile(format!(r"CREATE\s+TABLE\s+IF\s+NOT\s+EXISTS\s+{table}\s*\(.*\)"))?,
            insert: compile(format!(
                r"INSERT\s+INTO\s+{table}\s*\(\s*{id}\s*,\s*{checksum}\s*\)\s*VALUES\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)"
            ))?,
            update: compile(format!(
                r"UPDATE\s+{table}\s+SET\s+{checksum}\s*=\s*(-?\d+)\s+WHERE\s+\(?\s*{id}\s*=\s*(-?\d+)\s*\)?"
            ))?,
            delete: compile(format!(
                r"DELETE\s+FROM\s+{table}\s+WHERE\s+\(?\s*{id}\s*=\s*(-?\d+)\s*\)?"
            ))?,
            truncate: compile(format!(r"TRUNCATE\s+(TABLE\s+)?{table}"))?,
        })
    }
}

fn number(caps: &regex::Captures<'_>, group: usize) -> Result<i64, LifeError> {
    caps.get(group)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .parse()
        .map_err(|e| LifeError::ParseError(format!("Invalid number in statement: {e}")))
}

/// In-memory state store session
pub struct MemoryStateStore {
    database: Arc<Mutex<Database>>,
    session_id: u64,
    session: Mutex<Session>,
    table: StateTable,
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStateStore {
    /// First session of a fresh, empty database
    pub fn new() -> Self {
        Self::with_table(StateTable::default())
    }

    /// First session of a fresh database using `table` as state table
    pub fn with_table(table: StateTable) -> Self {
        let database = Arc::new(Mutex::new(Database {
            next_session: 1,
            ..Database::default()
        }));
        Self {
            database,
            session_id: 0,
            session: Mutex::new(Session::default()),
            table,
        }
    }

    /// Pre-populate the state table
    #[must_use]
    pub fn with_rows(self, rows: impl IntoIterator<Item = (i64, i64)>) -> Self {
        {
            let mut database = self.database();
            database.tables.exists = true;
            database.tables.rows.extend(rows);
        }
        self
    }

    /// Open another session on the same database
    pub fn connect(&self) -> Self {
        let session_id = {
            let mut database = self.database();
            let id = database.next_session;
            database.next_session += 1;
            id
        };
        Self {
            database: Arc::clone(&self.database),
            session_id,
            session: Mutex::new(Session::default()),
            table: self.table.clone(),
        }
    }

    /// Make every batch containing `pattern` fail
    pub fn fail_on(&self, pattern: &str) {
        self.session().fail_on.push(pattern.to_string());
    }

    /// Committed state table rows
    pub fn rows(&self) -> BTreeMap<i64, i64> {
        self.database().tables.rows.clone()
    }

    pub fn table_exists(&self) -> bool {
        self.database().tables.exists
    }

    pub fn is_locked(&self) -> bool {
        self.database().lock_holder.is_some()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.session().events.clone()
    }

    /// Batches this session executed, in order, including failed ones
    pub fn executed(&self) -> Vec<String> {
        self.session()
            .events
            .iter()
            .filter_map(|event| match event {
                StoreEvent::Execute(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.session().events.clear();
    }

    fn database(&self) -> MutexGuard<'_, Database> {
        self.database.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: StoreEvent) {
        self.session().events.push(event);
    }

    fn apply(&self, tables: &mut Tables, sql: &str) -> Result<(), LifeError> {
        let statements = Statements::new(self.table.name())?;
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            if statements.create.is_match(statement) {
                tables.exists = true;
                continue;
            }

            let targets_table = statements.insert.is_match(statement)
                || statements.update.is_match(statement)
                || statements.delete.is_match(statement)
                || statements.truncate.is_match(statement);
            if targets_table && !tables.exists {
                return Err(LifeError::QueryError(format!(
                    "relation \"{}\" does not exist",
                    self.table.name()
                )));
            }

            if let Some(caps) = statements.insert.captures(statement) {
                let id = number(&caps, 1)?;
                if tables.rows.contains_key(&id) {
                    return Err(LifeError::QueryError(format!(
                        "duplicate key value violates unique constraint: id={id}"
                    )));
                }
                tables.rows.insert(id, number(&caps, 2)?);
            } else if let Some(caps) = statements.update.captures(statement) {
                let id = number(&caps, 2)?;
                if let Some(row) = tables.rows.get_mut(&id) {
                    *row = number(&caps, 1)?;
                }
            } else if let Some(caps) = statements.delete.captures(statement) {
                tables.rows.remove(&number(&caps, 1)?);
            } else if statements.truncate.is_match(statement) {
                tables.rows.clear();
            }
        }
        Ok(())
    }
}

impl SchemaStateStore for MemoryStateStore {
    fn state_table(&self) -> &StateTable {
        &self.table
    }

    fn try_lock(&self) -> Result<bool, LifeError> {
        let acquired = {
            let mut database = self.database();
            match database.lock_holder {
                Some(holder) if holder != self.session_id => false,
                _ => {
                    database.lock_holder = Some(self.session_id);
                    true
                }
            }
        };
        self.record(StoreEvent::TryLock(acquired));
        Ok(acquired)
    }

    fn unlock(&self) -> Result<(), LifeError> {
        {
            let mut database = self.database();
            if database.lock_holder == Some(self.session_id) {
                database.lock_holder = None;
            }
        }
        self.record(StoreEvent::Unlock);
        Ok(())
    }

    fn ensure_table_exists(&self) -> Result<(), LifeError> {
        self.database().tables.exists = true;
        self.record(StoreEvent::EnsureTable);
        Ok(())
    }

    fn read_all(&self) -> Result<HashMap<i64, i64>, LifeError> {
        self.record(StoreEvent::ReadAll);
        let database = self.database();
        if !database.tables.exists {
            return Err(LifeError::QueryError(format!(
                "relation \"{}\" does not exist",
                self.table.name()
            )));
        }
        Ok(database.tables.rows.iter().map(|(&id, &c)| (id, c)).collect())
    }

    fn begin(&self) -> Result<(), LifeError> {
        let snapshot = self.database().tables.clone();
        let mut session = self.session();
        session.transaction = Some(snapshot);
        session.events.push(StoreEvent::Begin);
        Ok(())
    }

    fn batch_execute(&self, sql: &str) -> Result<(), LifeError> {
        self.record(StoreEvent::Execute(sql.to_string()));

        let failing = self
            .session()
            .fail_on
            .iter()
            .find(|pattern| sql.contains(pattern.as_str()))
            .cloned();
        if let Some(pattern) = failing {
            return Err(LifeError::QueryError(format!(
                "statement failed near \"{pattern}\""
            )));
        }

        let mut session = self.session();
        if let Some(tables) = session.transaction.as_mut() {
            return self.apply(tables, sql);
        }
        drop(session);

        // autocommit
        let mut tables = self.database().tables.clone();
        self.apply(&mut tables, sql)?;
        self.database().tables = tables;
        Ok(())
    }

    fn commit(&self) -> Result<(), LifeError> {
        let mut session = self.session();
        session.events.push(StoreEvent::Commit);
        match session.transaction.take() {
            Some(tables) => {
                self.database().tables = tables;
                Ok(())
            }
            None => Err(LifeError::Other("COMMIT without a transaction".to_string())),
        }
    }

    fn rollback(&self) -> Result<(), LifeError> {
        let mut session = self.session();
        session.events.push(StoreEvent::Rollback);
        session.transaction = None;
        Ok(())
    }
}
