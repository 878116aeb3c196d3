//! Sources of candidate migrations
//!
//! A [`MigrationProvider`] yields the migrations of a group. Two are provided:
//!
//! - [`MigrationRegistry`]: migrations registered in code, grouped eagerly.
//! - [`MigrationManifest`]: a JSON manifest of `(id, name, checksum)` entries resolved against
//!   a constructor table. Entries are only instantiated when they need to run.

use super::{Migration, MigrationError, SchemaMigration, SqlWriter};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Yields the candidate migrations of a group
pub trait MigrationProvider {
    /// Every migration belonging to `group`, in a stable order
    ///
    /// # Errors
    ///
    /// Returns `MigrationError` if the provider cannot produce its migrations.
    fn enumerate(&self, group: &str) -> Result<Vec<Arc<dyn Migration>>, MigrationError>;
}

impl<P: MigrationProvider + ?Sized> MigrationProvider for Arc<P> {
    fn enumerate(&self, group: &str) -> Result<Vec<Arc<dyn Migration>>, MigrationError> {
        (**self).enumerate(group)
    }
}

/// Migrations registered in code
///
/// # Examples
///
/// ```
/// use lifeguard_schema::migration::{MigrationProvider, MigrationRegistry, SchemaMigration};
///
/// # fn main() -> Result<(), lifeguard_schema::migration::MigrationError> {
/// let mut registry = MigrationRegistry::new();
/// registry.register_schema(
///     SchemaMigration::builder(1)
///         .group("person")
///         .schema("CREATE TABLE \"person\" (\"id\" BIGINT PRIMARY KEY);")
///         .build()?,
/// );
///
/// assert_eq!(registry.enumerate("person")?.len(), 1);
/// assert!(registry.enumerate("default")?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MigrationRegistry {
    groups: HashMap<String, Vec<Arc<dyn Migration>>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `migration` to `group`
    pub fn register(&mut self, group: &str, migration: impl Migration + 'static) -> &mut Self {
        self.register_arc(group, Arc::new(migration))
    }

    pub fn register_arc(&mut self, group: &str, migration: Arc<dyn Migration>) -> &mut Self {
        self.groups
            .entry(group.to_string())
            .or_default()
            .push(migration);
        self
    }

    /// Add a declarative migration to the group it declares
    pub fn register_schema(&mut self, migration: SchemaMigration) -> &mut Self {
        let group = migration.group().to_string();
        self.register(&group, migration)
    }

    /// Names of the groups with at least one migration
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        groups.sort_unstable();
        groups
    }
}

impl MigrationProvider for MigrationRegistry {
    fn enumerate(&self, group: &str) -> Result<Vec<Arc<dyn Migration>>, MigrationError> {
        Ok(self.groups.get(group).cloned().unwrap_or_default())
    }
}

/// Builds the migration behind a manifest entry
pub type MigrationConstructor = fn() -> Arc<dyn Migration>;

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub id: i64,
    pub name: String,
    /// Latest checksum, when known ahead of time
    #[serde(default)]
    pub checksum: Option<i64>,
}

/// Manifest of migrations per group, resolved lazily against constructors
///
/// The manifest is JSON keyed by group:
///
/// ```json
/// { "default": [ { "id": 1, "name": "apple", "checksum": 2882400001 } ] }
/// ```
#[derive(Clone, Default)]
pub struct MigrationManifest {
    groups: HashMap<String, Vec<ManifestEntry>>,
    constructors: HashMap<String, MigrationConstructor>,
}

impl MigrationManifest {
    /// Parse a JSON manifest
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Config` if the manifest is not valid JSON of the expected shape.
    pub fn from_json(json: &str) -> Result<Self, MigrationError> {
        let groups: HashMap<String, Vec<ManifestEntry>> = serde_json::from_str(json)
            .map_err(|e| MigrationError::Config(format!("Invalid migration manifest: {e}")))?;
        Ok(Self {
            groups,
            constructors: HashMap::new(),
        })
    }

    pub fn add_entry(&mut self, group: &str, entry: ManifestEntry) -> &mut Self {
        self.groups.entry(group.to_string()).or_default().push(entry);
        self
    }

    /// Register the constructor for entries named `name`
    pub fn with_constructor(mut self, name: &str, constructor: MigrationConstructor) -> Self {
        self.constructors.insert(name.to_string(), constructor);
        self
    }

    pub fn entries(&self, group: &str) -> &[ManifestEntry] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or_default()
    }
}

impl MigrationProvider for MigrationManifest {
    fn enumerate(&self, group: &str) -> Result<Vec<Arc<dyn Migration>>, MigrationError> {
        Ok(self
            .entries(group)
            .iter()
            .map(|entry| {
                Arc::new(LazyMigration {
                    entry: entry.clone(),
                    constructor: self.constructors.get(&entry.name).copied(),
                    instance: OnceLock::new(),
                }) as Arc<dyn Migration>
            })
            .collect())
    }
}

/// Manifest entry standing in for its migration until the migration is needed
struct LazyMigration {
    entry: ManifestEntry,
    constructor: Option<MigrationConstructor>,
    instance: OnceLock<Arc<dyn Migration>>,
}

impl LazyMigration {
    fn instance(&self) -> Result<&Arc<dyn Migration>, MigrationError> {
        let missing = || MigrationError::MissingMigrationImplementation {
            id: self.entry.id,
            name: self.entry.name.clone(),
        };

        let instance = match self.instance.get() {
            Some(instance) => instance,
            None => {
                let constructor = self.constructor.ok_or_else(missing)?;
                log::debug!("Instantiating migration '{}'", self.entry.name);
                self.instance.get_or_init(constructor)
            }
        };

        if instance.id() == self.entry.id {
            Ok(instance)
        } else {
            Err(missing())
        }
    }
}

impl Migration for LazyMigration {
    fn id(&self) -> i64 {
        self.entry.id
    }

    fn name(&self) -> &str {
        &self.entry.name
    }

    fn latest_checksum(&self) -> Option<i64> {
        self.entry.checksum
    }

    fn migrate(&self, current: i64, sql: &mut SqlWriter) -> Result<i64, MigrationError> {
        self.instance()?.migrate(current, sql)
    }

    /// Ordering only ever sees staged entries, and staging has already built them
    fn is_dependent_on(&self, id: i64) -> bool {
        debug_assert!(
            self.instance.get().is_some(),
            "migration '{}' ordered before it was built",
            self.entry.name
        );
        self.instance()
            .map(|migration| migration.is_dependent_on(id))
            .unwrap_or(false)
    }
}
