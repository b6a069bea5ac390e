//! Persisted connection description.
//!
//! A descriptor names the provider type to instantiate and the connection
//! string to hand it. Descriptors are plain entities: the
//! administrator-facing store keeping them is just another repository.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::model::{Entity, Metadata, Permission};
use crate::query::{FieldAccessor, FieldKind, FieldValue, Queryable};

/// Named, persisted description of how to construct a live
/// service/repository pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Stable connection id; resolution results are cached under it.
    pub id: String,
    /// Human-facing connection name.
    pub name: Option<String>,
    /// Backend-specific connection string.
    pub connection_string: String,
    /// Registered provider type to instantiate.
    pub repository_type_name: String,
    /// Auxiliary provider arguments (e.g. a secondary connection string).
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl ConnectionDescriptor {
    /// Creates a descriptor with a generated stable id.
    pub fn new(
        name: impl Into<String>,
        repository_type_name: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            name,
            repository_type_name,
            connection_string,
        )
    }

    /// Creates a descriptor with a caller-provided stable id.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        repository_type_name: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            connection_string: connection_string.into(),
            repository_type_name: repository_type_name.into(),
            arguments: BTreeMap::new(),
            metadata: Metadata::new(),
            permissions: Vec::new(),
        }
    }

    /// Adds one auxiliary provider argument.
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Returns one auxiliary argument value.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).map(String::as_str)
    }
}

impl Entity for ConnectionDescriptor {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

fn id_field(descriptor: &ConnectionDescriptor) -> FieldValue {
    FieldValue::Text(descriptor.id.clone())
}

fn name_field(descriptor: &ConnectionDescriptor) -> FieldValue {
    FieldValue::optional_text(descriptor.name.as_deref())
}

fn connection_string_field(descriptor: &ConnectionDescriptor) -> FieldValue {
    FieldValue::Text(descriptor.connection_string.clone())
}

fn repository_type_field(descriptor: &ConnectionDescriptor) -> FieldValue {
    FieldValue::Text(descriptor.repository_type_name.clone())
}

impl Queryable for ConnectionDescriptor {
    fn schema() -> &'static [FieldAccessor<Self>] {
        const SCHEMA: &[FieldAccessor<ConnectionDescriptor>] = &[
            FieldAccessor {
                name: "id",
                kind: FieldKind::Text,
                get: id_field,
            },
            FieldAccessor {
                name: "name",
                kind: FieldKind::Text,
                get: name_field,
            },
            FieldAccessor {
                name: "connection_string",
                kind: FieldKind::Text,
                get: connection_string_field,
            },
            FieldAccessor {
                name: "repository_type_name",
                kind: FieldKind::Text,
                get: repository_type_field,
            },
        ];
        SCHEMA
    }
}
