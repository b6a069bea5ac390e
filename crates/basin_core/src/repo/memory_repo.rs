//! In-memory repository backend.
//!
//! Same contract and locking discipline as the file-backed reference
//! implementation, without a backing document. Used for ephemeral
//! catalogs and as a registered provider in tests and tooling.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::maybe::Maybe;
use crate::model::Entity;
use crate::repo::{CallerIdentity, EntityRepository, RepoError, RepoResult};

/// Mutex-guarded map repository with copy-on-read semantics.
pub struct MemoryRepository<E: Entity> {
    state: Mutex<BTreeMap<E::Id, E>>,
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BTreeMap<E::Id, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityRepository<E> for MemoryRepository<E> {
    fn add(&self, entity: &E, _caller: Option<&CallerIdentity>) -> RepoResult<()> {
        let mut state = self.lock_state();
        let id = entity.id();
        if state.contains_key(id) {
            return Err(RepoError::already_exists(id));
        }
        state.insert(id.clone(), entity.clone());
        Ok(())
    }

    fn update(&self, entity: &E, _caller: Option<&CallerIdentity>) -> RepoResult<()> {
        let mut state = self.lock_state();
        let id = entity.id();
        if !state.contains_key(id) {
            return Err(RepoError::not_found(id));
        }
        state.insert(id.clone(), entity.clone());
        Ok(())
    }

    fn remove(&self, id: &E::Id, _caller: Option<&CallerIdentity>) -> RepoResult<()> {
        let mut state = self.lock_state();
        if state.remove(id).is_none() {
            return Err(RepoError::not_found(id));
        }
        Ok(())
    }

    fn remove_matching(
        &self,
        filter: &dyn Fn(&E) -> bool,
        _caller: Option<&CallerIdentity>,
    ) -> RepoResult<usize> {
        let mut state = self.lock_state();
        let doomed: Vec<E::Id> = state
            .values()
            .filter(|entity| filter(entity))
            .map(|entity| entity.id().clone())
            .collect();
        for id in &doomed {
            state.remove(id);
        }
        Ok(doomed.len())
    }

    fn get(&self, id: &E::Id, _caller: Option<&CallerIdentity>) -> RepoResult<Maybe<E>> {
        Ok(self.lock_state().get(id).cloned().into())
    }

    fn get_matching(
        &self,
        filter: &dyn Fn(&E) -> bool,
        _caller: Option<&CallerIdentity>,
    ) -> RepoResult<Vec<E>> {
        Ok(self
            .lock_state()
            .values()
            .filter(|entity| filter(entity))
            .cloned()
            .collect())
    }

    fn get_all(&self, _caller: Option<&CallerIdentity>) -> RepoResult<Vec<E>> {
        Ok(self.lock_state().values().cloned().collect())
    }

    fn ids(&self, _caller: Option<&CallerIdentity>) -> RepoResult<Vec<E::Id>> {
        Ok(self.lock_state().keys().cloned().collect())
    }

    fn contains(&self, id: &E::Id, _caller: Option<&CallerIdentity>) -> RepoResult<bool> {
        Ok(self.lock_state().contains_key(id))
    }

    fn count(&self, _caller: Option<&CallerIdentity>) -> RepoResult<usize> {
        Ok(self.lock_state().len())
    }
}
