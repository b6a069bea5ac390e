//! Entity identity, naming, grouping, metadata and permission contracts.
//!
//! # Responsibility
//! - Define the conventions every stored entity shares, so repositories and
//!   services stay generic over concrete domain records.
//!
//! # Invariants
//! - An entity's id is immutable after construction.
//! - Repositories hand out clones, so metadata returned to a caller never
//!   aliases stored state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Separator between group path and name in derived full names.
pub const GROUP_SEPARATOR: &str = "/";

/// Extensible string-keyed attribute map carried by every entity.
///
/// Values are free-form JSON so domain modules can attach attributes
/// without schema changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, serde_json::Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces one attribute, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// One permission grant attached to an entity.
///
/// Convention only: this core threads permission lists through storage
/// untouched; enforcement lives in external authorization collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Principal the grant applies to (user or role identifier).
    pub principal: String,
    /// Named operation the principal may perform.
    pub operation: String,
}

impl Permission {
    pub fn new(principal: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            operation: operation.into(),
        }
    }
}

/// Base contract for every record managed by a repository.
///
/// The identifier type is generic: string, UUID, integer, or a composite,
/// as long as it is ordered, comparable and printable.
pub trait Entity: Clone + Send + 'static {
    /// Unique identifier type. Immutable after construction.
    type Id: Clone + Eq + Ord + Display + Send + 'static;

    /// Returns the unique identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the display name, when the entity carries one.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Returns the extensible attribute map.
    fn metadata(&self) -> &Metadata;

    /// Returns the attribute map for mutation on an owned/cloned entity.
    fn metadata_mut(&mut self) -> &mut Metadata;

    /// Returns attached permission grants.
    fn permissions(&self) -> &[Permission] {
        &[]
    }
}

/// Contract for entities organized under a group path.
pub trait Grouped: Entity {
    /// Returns the group path, empty when the entity sits at the root.
    fn group(&self) -> &str;

    /// Derives the full name from group path and name.
    fn full_name(&self) -> String {
        let name = self.name().unwrap_or_default();
        let group = self.group();
        if group.is_empty() {
            name.to_string()
        } else if name.is_empty() {
            group.to_string()
        } else {
            format!("{group}{GROUP_SEPARATOR}{name}")
        }
    }
}
