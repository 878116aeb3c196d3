//! Dependency ordering for staged migrations
//!
//! Ordering works in layers: each pass takes every remaining item that depends on no other
//! remaining item, sorts that layer by the active [`ExecutionDirection`] and appends it. A pass
//! that takes nothing means the rest form a cycle or depend on something that was not staged.

use super::MigrationError;
use serde::Deserialize;
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// Tie-break among migrations that do not depend on each other
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionDirection {
    /// Keep enumeration order
    #[default]
    Unstable,
    /// Ascending id
    Forward,
    /// Descending id
    Backward,
}

impl fmt::Display for ExecutionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionDirection::Unstable => "unstable",
            ExecutionDirection::Forward => "forward",
            ExecutionDirection::Backward => "backward",
        })
    }
}

impl FromStr for ExecutionDirection {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unstable" => Ok(ExecutionDirection::Unstable),
            "forward" => Ok(ExecutionDirection::Forward),
            "backward" => Ok(ExecutionDirection::Backward),
            other => Err(MigrationError::Config(format!(
                "Unknown execution direction '{other}', expected unstable, forward or backward"
            ))),
        }
    }
}

/// Something that can be placed in dependency order
pub trait DependencyNode {
    fn id(&self) -> i64;

    /// True if this node must come after the node with id `other`
    fn is_dependent_on(&self, other: i64) -> bool;
}

/// Order `items` so every item follows everything it depends on, layer by layer
///
/// # Errors
///
/// Returns `MigrationError::CyclicalOrUnsatisfiedDependency` listing the ids that could not be
/// placed, in ascending order.
pub fn resolve_layers<T: DependencyNode>(
    items: Vec<T>,
    direction: ExecutionDirection,
) -> Result<Vec<Vec<T>>, MigrationError> {
    let mut remaining = items;
    let mut layers = Vec::new();

    while !remaining.is_empty() {
        let ids: Vec<i64> = remaining.iter().map(DependencyNode::id).collect();
        let (mut ready, blocked): (Vec<T>, Vec<T>) = remaining.into_iter().partition(|item| {
            let own = item.id();
            !ids.iter().any(|&other| other != own && item.is_dependent_on(other))
        });

        if ready.is_empty() {
            let mut ids: Vec<i64> = blocked.iter().map(DependencyNode::id).collect();
            ids.sort_unstable();
            return Err(MigrationError::CyclicalOrUnsatisfiedDependency { ids });
        }

        match direction {
            ExecutionDirection::Unstable => {}
            ExecutionDirection::Forward => ready.sort_by_key(DependencyNode::id),
            ExecutionDirection::Backward => ready.sort_by_key(|item| Reverse(item.id())),
        }

        layers.push(ready);
        remaining = blocked;
    }

    Ok(layers)
}

/// Flattened [`resolve_layers`]
///
/// # Errors
///
/// Same as [`resolve_layers`].
pub fn resolve<T: DependencyNode>(
    items: Vec<T>,
    direction: ExecutionDirection,
) -> Result<Vec<T>, MigrationError> {
    Ok(resolve_layers(items, direction)?
        .into_iter()
        .flatten()
        .collect())
}
