//! Generic repository contract.
//!
//! # Responsibility
//! - Define the CRUD/enumeration boundary every backend implements.
//!
//! # Invariants
//! - Implementations are safe under concurrent callers; any method may be
//!   invoked from multiple threads.
//! - Returned entities never alias internal storage.

use crate::maybe::Maybe;
use crate::model::Entity;
use crate::repo::RepoResult;

/// Opaque caller-identity token threaded through every operation.
///
/// This core does not interpret it; external authorization collaborators
/// intercept operations and inspect the token there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Persistence boundary for one entity type.
///
/// All operations take an optional caller identity. Backends must treat it
/// as opaque pass-through data.
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// Persists a new entity.
    ///
    /// # Errors
    /// - `AlreadyExists` when an entity with the same id is present.
    fn add(&self, entity: &E, caller: Option<&CallerIdentity>) -> RepoResult<()>;

    /// Replaces an existing entity.
    ///
    /// # Errors
    /// - `NotFound` when no entity with that id exists.
    fn update(&self, entity: &E, caller: Option<&CallerIdentity>) -> RepoResult<()>;

    /// Removes one entity by id.
    ///
    /// # Errors
    /// - `NotFound` when no entity with that id exists.
    fn remove(&self, id: &E::Id, caller: Option<&CallerIdentity>) -> RepoResult<()>;

    /// Removes every entity matching `filter`; zero matches is not an
    /// error. Returns the number removed.
    fn remove_matching(
        &self,
        filter: &dyn Fn(&E) -> bool,
        caller: Option<&CallerIdentity>,
    ) -> RepoResult<usize>;

    /// Looks up one entity by id; absence is not an error.
    fn get(&self, id: &E::Id, caller: Option<&CallerIdentity>) -> RepoResult<Maybe<E>>;

    /// Returns copies of every entity matching `filter`.
    fn get_matching(
        &self,
        filter: &dyn Fn(&E) -> bool,
        caller: Option<&CallerIdentity>,
    ) -> RepoResult<Vec<E>>;

    /// Returns copies of every entity.
    fn get_all(&self, caller: Option<&CallerIdentity>) -> RepoResult<Vec<E>>;

    /// Returns every stored id.
    fn ids(&self, caller: Option<&CallerIdentity>) -> RepoResult<Vec<E::Id>>;

    /// Returns whether an entity with `id` exists.
    fn contains(&self, id: &E::Id, caller: Option<&CallerIdentity>) -> RepoResult<bool>;

    /// Returns the number of stored entities.
    fn count(&self, caller: Option<&CallerIdentity>) -> RepoResult<usize>;
}
