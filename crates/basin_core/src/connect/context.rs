//! Connection resolution context.
//!
//! # Responsibility
//! - Own the descriptor store, the provider catalog and the cache of
//!   resolved services for one capability.
//!
//! # Invariants
//! - The cache lock is held across construction, so concurrent first
//!   resolutions of the same connection yield one live instance.
//! - Failed resolutions cache nothing; the capability stays unavailable
//!   until its descriptor is corrected, with no automatic retry.

use log::{error, info};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::{ConnectError, ConnectResult, ConnectionCatalog, ConnectionDescriptor};
use crate::model::Entity;
use crate::repo::{CallerIdentity, EntityRepository};
use crate::service::EntityService;

/// Startup-created context through which callers obtain live services.
///
/// Create one per capability and pass it to everything that resolves
/// connections; there is no ambient global catalog state.
pub struct ConnectionContext<E: Entity> {
    catalog: ConnectionCatalog<E>,
    store: Box<dyn EntityRepository<ConnectionDescriptor>>,
    resolved: Mutex<BTreeMap<String, Arc<EntityService<E>>>>,
}

impl<E: Entity> ConnectionContext<E> {
    /// Creates a context over a finished catalog and a descriptor store.
    pub fn new(
        catalog: ConnectionCatalog<E>,
        store: Box<dyn EntityRepository<ConnectionDescriptor>>,
    ) -> Self {
        Self {
            catalog,
            store,
            resolved: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the capability's catalog.
    pub fn catalog(&self) -> &ConnectionCatalog<E> {
        &self.catalog
    }

    /// Returns the administrator-facing descriptor store.
    pub fn descriptor_store(&self) -> &dyn EntityRepository<ConnectionDescriptor> {
        self.store.as_ref()
    }

    /// Resolves a stored connection into a live service.
    ///
    /// The first resolution constructs the backend and caches the service
    /// under the connection id for the process lifetime; later calls
    /// return the cached instance.
    ///
    /// # Errors
    /// - `ConnectionNotFound` when no descriptor has `connection_id`.
    /// - `ProviderNotFound` / `MissingArgument` for misconfigured
    ///   descriptors.
    /// - `BackendConstruction` when the backend constructor itself fails.
    pub fn resolve(
        &self,
        connection_id: &str,
        caller: Option<&CallerIdentity>,
    ) -> ConnectResult<Arc<EntityService<E>>> {
        let mut resolved = self.lock_resolved();
        if let Some(service) = resolved.get(connection_id) {
            return Ok(Arc::clone(service));
        }

        let started_at = Instant::now();
        info!(
            "event=connection_resolve module=connect status=start capability={} connection={}",
            self.catalog.capability_id(),
            connection_id
        );

        match self.construct(connection_id, caller) {
            Ok(service) => {
                let service = Arc::new(service);
                resolved.insert(connection_id.to_string(), Arc::clone(&service));
                info!(
                    "event=connection_resolve module=connect status=ok capability={} connection={} duration_ms={}",
                    self.catalog.capability_id(),
                    connection_id,
                    started_at.elapsed().as_millis()
                );
                Ok(service)
            }
            Err(err) => {
                error!(
                    "event=connection_resolve module=connect status=error capability={} connection={} duration_ms={} error={}",
                    self.catalog.capability_id(),
                    connection_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Resolves a connection by its human-facing name.
    ///
    /// Shares the id-keyed cache with [`resolve`](Self::resolve).
    ///
    /// # Errors
    /// - `ConnectionNotFound` when no stored descriptor carries `name`.
    pub fn resolve_by_name(
        &self,
        name: &str,
        caller: Option<&CallerIdentity>,
    ) -> ConnectResult<Arc<EntityService<E>>> {
        let matches = self
            .store
            .get_matching(&|descriptor| descriptor.name() == Some(name), caller)?;
        let descriptor = matches
            .first()
            .ok_or_else(|| ConnectError::ConnectionNotFound {
                connection: name.to_string(),
            })?;
        self.resolve(&descriptor.id, caller)
    }

    fn construct(
        &self,
        connection_id: &str,
        caller: Option<&CallerIdentity>,
    ) -> ConnectResult<EntityService<E>> {
        let descriptor = self
            .store
            .get(&connection_id.to_string(), caller)?
            .into_option()
            .ok_or_else(|| ConnectError::ConnectionNotFound {
                connection: connection_id.to_string(),
            })?;
        let repo = self.catalog.build(&descriptor)?;
        Ok(EntityService::new(repo))
    }

    fn lock_resolved(&self) -> MutexGuard<'_, BTreeMap<String, Arc<EntityService<E>>>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
