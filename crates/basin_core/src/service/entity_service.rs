//! Entity use-case service.
//!
//! # Responsibility
//! - Wrap one repository with cancelable lifecycle events, `try` variants
//!   and upsert semantics.
//! - Compile declarative conditions against the entity schema for ad-hoc
//!   filtering.
//!
//! # Invariants
//! - A canceled mutation never reaches the repository, raises no error,
//!   and suppresses the corresponding "-ed" event.
//! - Service APIs never bypass repository contracts; the layer stays
//!   storage-agnostic.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{PoisonError, RwLock};

use crate::maybe::Maybe;
use crate::model::Entity;
use crate::query::{compile_conditions, QueryCondition, QueryError, Queryable};
use crate::repo::{CallerIdentity, EntityRepository, RepoError, RepoResult};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for operations that involve query compilation.
#[derive(Debug)]
pub enum ServiceError {
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Condition list failed to compile; no data was scanned.
    Query(QueryError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Query(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

/// Cancel flag handed to "-ing" lifecycle handlers.
#[derive(Debug, Default)]
pub struct CancelGate {
    canceled: bool,
}

impl CancelGate {
    /// Aborts the pending mutation before it reaches the repository.
    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }
}

/// Outcome of a mutation routed through lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The repository applied the mutation.
    Applied,
    /// A lifecycle handler canceled it; nothing changed.
    Canceled,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

type EntityGateHook<E> = Box<dyn Fn(&E, &mut CancelGate) + Send + Sync>;
type EntityNoticeHook<E> = Box<dyn Fn(&E) + Send + Sync>;
type IdGateHook<I> = Box<dyn Fn(&I, &mut CancelGate) + Send + Sync>;
type IdNoticeHook<I> = Box<dyn Fn(&I) + Send + Sync>;

struct LifecycleHooks<E: Entity> {
    adding: Vec<EntityGateHook<E>>,
    added: Vec<EntityNoticeHook<E>>,
    updating: Vec<EntityGateHook<E>>,
    updated: Vec<EntityNoticeHook<E>>,
    deleting: Vec<IdGateHook<E::Id>>,
    deleted: Vec<IdNoticeHook<E::Id>>,
}

impl<E: Entity> Default for LifecycleHooks<E> {
    fn default() -> Self {
        Self {
            adding: Vec::new(),
            added: Vec::new(),
            updating: Vec::new(),
            updated: Vec::new(),
            deleting: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

/// Use-case service wrapping one repository implementation.
pub struct EntityService<E: Entity> {
    repo: Box<dyn EntityRepository<E>>,
    hooks: RwLock<LifecycleHooks<E>>,
}

impl<E: Entity> EntityService<E> {
    /// Creates a service delegating to the provided repository.
    pub fn new(repo: Box<dyn EntityRepository<E>>) -> Self {
        Self {
            repo,
            hooks: RwLock::new(LifecycleHooks::default()),
        }
    }

    /// Subscribes a cancelable pre-add handler.
    pub fn on_adding(&self, hook: impl Fn(&E, &mut CancelGate) + Send + Sync + 'static) {
        self.write_hooks().adding.push(Box::new(hook));
    }

    /// Subscribes a post-add notification.
    pub fn on_added(&self, hook: impl Fn(&E) + Send + Sync + 'static) {
        self.write_hooks().added.push(Box::new(hook));
    }

    /// Subscribes a cancelable pre-update handler.
    pub fn on_updating(&self, hook: impl Fn(&E, &mut CancelGate) + Send + Sync + 'static) {
        self.write_hooks().updating.push(Box::new(hook));
    }

    /// Subscribes a post-update notification.
    pub fn on_updated(&self, hook: impl Fn(&E) + Send + Sync + 'static) {
        self.write_hooks().updated.push(Box::new(hook));
    }

    /// Subscribes a cancelable pre-delete handler.
    pub fn on_deleting(&self, hook: impl Fn(&E::Id, &mut CancelGate) + Send + Sync + 'static) {
        self.write_hooks().deleting.push(Box::new(hook));
    }

    /// Subscribes a post-delete notification.
    pub fn on_deleted(&self, hook: impl Fn(&E::Id) + Send + Sync + 'static) {
        self.write_hooks().deleted.push(Box::new(hook));
    }

    /// Adds one entity, raising `adding`/`added` around the mutation.
    ///
    /// # Errors
    /// - `AlreadyExists` when the id is present.
    pub fn add(
        &self,
        entity: &E,
        caller: Option<&CallerIdentity>,
    ) -> RepoResult<MutationOutcome> {
        if self.raise_adding(entity) {
            return Ok(MutationOutcome::Canceled);
        }
        self.repo.add(entity, caller)?;
        self.raise_added(entity);
        Ok(MutationOutcome::Applied)
    }

    /// Updates one entity, raising `updating`/`updated` around the
    /// mutation.
    ///
    /// # Errors
    /// - `NotFound` when the id is absent.
    pub fn update(
        &self,
        entity: &E,
        caller: Option<&CallerIdentity>,
    ) -> RepoResult<MutationOutcome> {
        if self.raise_updating(entity) {
            return Ok(MutationOutcome::Canceled);
        }
        self.repo.update(entity, caller)?;
        self.raise_updated(entity);
        Ok(MutationOutcome::Applied)
    }

    /// Removes one entity by id, raising `deleting`/`deleted` around the
    /// mutation.
    ///
    /// # Errors
    /// - `NotFound` when the id is absent.
    pub fn remove(
        &self,
        id: &E::Id,
        caller: Option<&CallerIdentity>,
    ) -> RepoResult<MutationOutcome> {
        if self.raise_deleting(id) {
            return Ok(MutationOutcome::Canceled);
        }
        self.repo.remove(id, caller)?;
        self.raise_deleted(id);
        Ok(MutationOutcome::Applied)
    }

    /// Removes every entity matching `filter`; zero matches is fine.
    ///
    /// Bulk removal bypasses per-id lifecycle events.
    pub fn remove_matching(
        &self,
        filter: &dyn Fn(&E) -> bool,
        caller: Option<&CallerIdentity>,
    ) -> RepoResult<usize> {
        self.repo.remove_matching(filter, caller)
    }

    /// Adds when absent, otherwise updates, raising the event pair of the
    /// branch actually taken.
    pub fn add_or_update(
        &self,
        entity: &E,
        caller: Option<&CallerIdentity>,
    ) -> RepoResult<MutationOutcome> {
        if self.repo.contains(entity.id(), caller)? {
            return self.update(entity, caller);
        }
        match self.add(entity, caller) {
            // Lost the race against a concurrent add; fall through to
            // update semantics.
            Err(RepoError::AlreadyExists { .. }) => self.update(entity, caller),
            other => other,
        }
    }

    /// Adds without raising `AlreadyExists`; returns whether the entity
    /// was applied. A canceled add also reports `false`.
    pub fn try_add(&self, entity: &E, caller: Option<&CallerIdentity>) -> RepoResult<bool> {
        match self.add(entity, caller) {
            Ok(outcome) => Ok(outcome.is_applied()),
            Err(RepoError::AlreadyExists { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Updates without raising `NotFound`; returns whether the entity was
    /// applied. A canceled update also reports `false`.
    pub fn try_update(&self, entity: &E, caller: Option<&CallerIdentity>) -> RepoResult<bool> {
        match self.update(entity, caller) {
            Ok(outcome) => Ok(outcome.is_applied()),
            Err(RepoError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Looks up one entity by id.
    pub fn get(&self, id: &E::Id, caller: Option<&CallerIdentity>) -> RepoResult<Maybe<E>> {
        self.repo.get(id, caller)
    }

    /// Looks up one entity, returning a plain option instead of `Maybe`.
    pub fn try_get(&self, id: &E::Id, caller: Option<&CallerIdentity>) -> RepoResult<Option<E>> {
        Ok(self.repo.get(id, caller)?.into_option())
    }

    /// Returns copies of every entity matching `filter`.
    pub fn get_matching(
        &self,
        filter: &dyn Fn(&E) -> bool,
        caller: Option<&CallerIdentity>,
    ) -> RepoResult<Vec<E>> {
        self.repo.get_matching(filter, caller)
    }

    /// Returns copies of every entity.
    pub fn get_all(&self, caller: Option<&CallerIdentity>) -> RepoResult<Vec<E>> {
        self.repo.get_all(caller)
    }

    /// Returns every stored id.
    pub fn ids(&self, caller: Option<&CallerIdentity>) -> RepoResult<Vec<E::Id>> {
        self.repo.ids(caller)
    }

    /// Returns whether an entity with `id` exists.
    pub fn contains(&self, id: &E::Id, caller: Option<&CallerIdentity>) -> RepoResult<bool> {
        self.repo.contains(id, caller)
    }

    /// Returns the number of stored entities.
    pub fn count(&self, caller: Option<&CallerIdentity>) -> RepoResult<usize> {
        self.repo.count(caller)
    }

    fn write_hooks(&self) -> std::sync::RwLockWriteGuard<'_, LifecycleHooks<E>> {
        self.hooks.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_hooks(&self) -> std::sync::RwLockReadGuard<'_, LifecycleHooks<E>> {
        self.hooks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn raise_adding(&self, entity: &E) -> bool {
        let hooks = self.read_hooks();
        let mut gate = CancelGate::default();
        for hook in &hooks.adding {
            hook(entity, &mut gate);
        }
        gate.is_canceled()
    }

    fn raise_added(&self, entity: &E) {
        for hook in &self.read_hooks().added {
            hook(entity);
        }
    }

    fn raise_updating(&self, entity: &E) -> bool {
        let hooks = self.read_hooks();
        let mut gate = CancelGate::default();
        for hook in &hooks.updating {
            hook(entity, &mut gate);
        }
        gate.is_canceled()
    }

    fn raise_updated(&self, entity: &E) {
        for hook in &self.read_hooks().updated {
            hook(entity);
        }
    }

    fn raise_deleting(&self, id: &E::Id) -> bool {
        let hooks = self.read_hooks();
        let mut gate = CancelGate::default();
        for hook in &hooks.deleting {
            hook(id, &mut gate);
        }
        gate.is_canceled()
    }

    fn raise_deleted(&self, id: &E::Id) {
        for hook in &self.read_hooks().deleted {
            hook(id);
        }
    }
}

impl<E: Entity + Queryable> EntityService<E> {
    /// Compiles `conditions` against the entity schema and scans.
    ///
    /// Compilation failures surface before any entity is read.
    pub fn find(
        &self,
        conditions: &[QueryCondition],
        caller: Option<&CallerIdentity>,
    ) -> ServiceResult<Vec<E>> {
        let compiled = compile_conditions::<E>(conditions)?;
        Ok(self
            .repo
            .get_matching(&|entity| compiled.matches(entity), caller)?)
    }

    /// Removes every entity matching `conditions`; returns the count.
    pub fn remove_where(
        &self,
        conditions: &[QueryCondition],
        caller: Option<&CallerIdentity>,
    ) -> ServiceResult<usize> {
        let compiled = compile_conditions::<E>(conditions)?;
        Ok(self
            .repo
            .remove_matching(&|entity| compiled.matches(entity), caller)?)
    }
}
