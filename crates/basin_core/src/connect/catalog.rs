//! Per-capability provider catalog.
//!
//! # Responsibility
//! - Collect provider registrations for one pluggable capability and
//!   construct repositories from stored descriptors.
//!
//! # Invariants
//! - Registration is idempotent at startup: duplicate provider type names
//!   are skipped, not overwritten.
//! - Backend construction failures surface the backend's own error; a bad
//!   connection string stays diagnosable apart from a bad type name.

use log::warn;
use std::collections::BTreeMap;
use std::error::Error;

use super::{ConnectError, ConnectResult, ConnectionDescriptor};
use crate::model::Entity;
use crate::repo::EntityRepository;

/// Name of the provider slot every capability carries.
pub const REPOSITORY_SLOT: &str = "repository";

/// Connection class name reported in catalog metadata.
const CONNECTION_CLASS: &str = "ConnectionDescriptor";

/// One argument a capability's connections must or may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderArgument {
    pub name: String,
    /// Declared value type, e.g. `text` or `path`. Informational.
    pub value_type: String,
    pub mandatory: bool,
}

impl ProviderArgument {
    pub fn new(name: impl Into<String>, value_type: impl Into<String>, mandatory: bool) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            mandatory,
        }
    }
}

/// One named slot of pluggable implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSlot {
    pub name: String,
    pub mandatory: bool,
    /// Concrete implementation types currently registered.
    pub available: Vec<String>,
}

/// Catalog metadata for one pluggable capability.
///
/// Built once per process from provider registrations; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionType {
    /// Capability id the catalog serves.
    pub id: String,
    /// Connection class the capability binds to.
    pub connection_class: String,
    pub arguments: Vec<ProviderArgument>,
    pub slots: Vec<ProviderSlot>,
}

/// Construction request handed to a provider factory.
#[derive(Debug, Clone, Copy)]
pub struct ProviderRequest<'a> {
    pub connection_string: &'a str,
    pub arguments: &'a BTreeMap<String, String>,
}

impl<'a> ProviderRequest<'a> {
    pub fn argument(&self, name: &str) -> Option<&'a str> {
        self.arguments.get(name).map(String::as_str)
    }
}

/// Factory a backend registers for one provider type.
///
/// The error type is the backend's own; the catalog preserves it as the
/// source of a `BackendConstruction` failure.
pub type ProviderFactory<E> = Box<
    dyn Fn(&ProviderRequest<'_>) -> Result<Box<dyn EntityRepository<E>>, Box<dyn Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Provider registrations for one capability.
pub struct ConnectionCatalog<E: Entity> {
    capability_id: String,
    arguments: Vec<ProviderArgument>,
    providers: BTreeMap<String, ProviderFactory<E>>,
}

impl<E: Entity> ConnectionCatalog<E> {
    /// Creates an empty catalog for `capability_id`.
    pub fn new(capability_id: impl Into<String>) -> Self {
        Self {
            capability_id: capability_id.into(),
            arguments: Vec::new(),
            providers: BTreeMap::new(),
        }
    }

    pub fn capability_id(&self) -> &str {
        &self.capability_id
    }

    /// Declares one provider argument connections of this capability carry.
    pub fn declare_argument(&mut self, argument: ProviderArgument) {
        if self.arguments.iter().any(|known| known.name == argument.name) {
            return;
        }
        self.arguments.push(argument);
    }

    /// Registers one provider factory under `type_name`.
    ///
    /// Returns `Ok(true)` when registered, `Ok(false)` when the name was
    /// already taken (skipped, keeping the first registration).
    ///
    /// # Errors
    /// - `InvalidProviderName` for names outside
    ///   `[a-z0-9_-]`.
    pub fn register_provider(
        &mut self,
        type_name: &str,
        factory: ProviderFactory<E>,
    ) -> ConnectResult<bool> {
        let type_name = type_name.trim();
        if !is_valid_provider_name(type_name) {
            return Err(ConnectError::InvalidProviderName {
                type_name: type_name.to_string(),
            });
        }
        if self.providers.contains_key(type_name) {
            warn!(
                "event=provider_register module=connect status=skipped capability={} type={}",
                self.capability_id, type_name
            );
            return Ok(false);
        }
        self.providers.insert(type_name.to_string(), factory);
        Ok(true)
    }

    /// Returns registered provider type names, sorted.
    ///
    /// Discovery helper for administrative surfaces populating choice
    /// lists.
    pub fn provider_type_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn contains_provider(&self, type_name: &str) -> bool {
        self.providers.contains_key(type_name.trim())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Builds the catalog metadata snapshot from current registrations.
    pub fn connection_type(&self) -> ConnectionType {
        ConnectionType {
            id: self.capability_id.clone(),
            connection_class: CONNECTION_CLASS.to_string(),
            arguments: self.arguments.clone(),
            slots: vec![ProviderSlot {
                name: REPOSITORY_SLOT.to_string(),
                mandatory: true,
                available: self.provider_type_names(),
            }],
        }
    }

    /// Constructs a repository from a stored descriptor.
    ///
    /// # Errors
    /// - `MissingArgument` when the descriptor omits a mandatory declared
    ///   argument.
    /// - `ProviderNotFound` when the named type is unregistered.
    /// - `BackendConstruction` when the factory itself fails; the
    ///   backend's error is preserved as the source.
    pub fn build(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> ConnectResult<Box<dyn EntityRepository<E>>> {
        for argument in &self.arguments {
            if argument.mandatory && !descriptor.arguments.contains_key(&argument.name) {
                return Err(ConnectError::MissingArgument {
                    name: argument.name.clone(),
                });
            }
        }

        let type_name = descriptor.repository_type_name.trim();
        let factory = self
            .providers
            .get(type_name)
            .ok_or_else(|| ConnectError::ProviderNotFound {
                type_name: type_name.to_string(),
            })?;

        let request = ProviderRequest {
            connection_string: &descriptor.connection_string,
            arguments: &descriptor.arguments,
        };
        factory(&request).map_err(|source| ConnectError::BackendConstruction {
            type_name: type_name.to_string(),
            source,
        })
    }
}

fn is_valid_provider_name(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::{ConnectionCatalog, ProviderArgument, REPOSITORY_SLOT};
    use crate::connect::{ConnectError, ConnectionDescriptor};
    use crate::repo::MemoryRepository;

    type Catalog = ConnectionCatalog<ConnectionDescriptor>;

    fn memory_factory() -> super::ProviderFactory<ConnectionDescriptor> {
        Box::new(|_request| {
            let repo: MemoryRepository<ConnectionDescriptor> = MemoryRepository::new();
            Ok(Box::new(repo))
        })
    }

    #[test]
    fn duplicate_registration_is_skipped_not_overwritten() {
        let mut catalog = Catalog::new("document_store");
        assert!(catalog
            .register_provider("memory", memory_factory())
            .expect("first registration"));
        assert!(!catalog
            .register_provider("memory", memory_factory())
            .expect("duplicate registration is skipped"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn rejects_invalid_provider_names() {
        let mut catalog = Catalog::new("document_store");
        let err = catalog
            .register_provider("In Memory", memory_factory())
            .expect_err("spaced name must fail");
        assert!(matches!(err, ConnectError::InvalidProviderName { .. }));
        let err = catalog
            .register_provider("   ", memory_factory())
            .expect_err("blank name must fail");
        assert!(matches!(err, ConnectError::InvalidProviderName { .. }));
    }

    #[test]
    fn connection_type_reflects_registrations() {
        let mut catalog = Catalog::new("document_store");
        catalog.declare_argument(ProviderArgument::new("index_path", "path", false));
        catalog
            .register_provider("memory", memory_factory())
            .expect("registration");

        let connection_type = catalog.connection_type();
        assert_eq!(connection_type.id, "document_store");
        assert_eq!(connection_type.slots.len(), 1);
        assert_eq!(connection_type.slots[0].name, REPOSITORY_SLOT);
        assert!(connection_type.slots[0].mandatory);
        assert_eq!(connection_type.slots[0].available, vec!["memory"]);
        assert_eq!(connection_type.arguments.len(), 1);
    }

    #[test]
    fn build_fails_for_unknown_provider_type() {
        let catalog = Catalog::new("document_store");
        let descriptor = ConnectionDescriptor::new("d", "unknown_provider", "");
        let err = catalog.build(&descriptor).expect_err("unknown type must fail");
        assert!(matches!(err, ConnectError::ProviderNotFound { .. }));
    }

    #[test]
    fn build_enforces_mandatory_arguments() {
        let mut catalog = Catalog::new("document_store");
        catalog.declare_argument(ProviderArgument::new("index_path", "path", true));
        catalog
            .register_provider("memory", memory_factory())
            .expect("registration");

        let descriptor = ConnectionDescriptor::new("d", "memory", "");
        let err = catalog
            .build(&descriptor)
            .expect_err("missing mandatory argument must fail");
        assert!(matches!(err, ConnectError::MissingArgument { name } if name == "index_path"));

        let descriptor = ConnectionDescriptor::new("d", "memory", "")
            .with_argument("index_path", "/tmp/idx");
        catalog
            .build(&descriptor)
            .expect("descriptor with mandatory argument builds");
    }
}
