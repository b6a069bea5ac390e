//! File-backed reference repository.
//!
//! # Responsibility
//! - Keep the whole collection in memory, mirrored to one JSON document on
//!   every mutation.
//!
//! # Invariants
//! - One mutex serializes all reads and writes; callers never observe a
//!   mutation interleaved with a scan or a partially written document.
//! - Every operation refreshes in-memory state from the file first, so
//!   multiple process instances sharing a file converge. The whole document
//!   is re-read per call; acceptable for small-to-moderate catalogs, not
//!   for high-frequency writes.
//! - Duplicate ids in a persisted document are rejected, not merged.

use log::{error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::maybe::Maybe;
use crate::model::Entity;
use crate::repo::{CallerIdentity, EntityRepository, RepoError, RepoResult};

#[derive(Serialize, Deserialize)]
#[serde(bound(serialize = "E: Serialize", deserialize = "E: DeserializeOwned"))]
struct StoreDocument<E> {
    entities: Vec<E>,
}

/// Repository mirroring its collection to a single JSON document.
///
/// Polymorphic collections are supported through the entity type's own
/// serde discriminator tag; one document may hold several concrete
/// variants behind one declared entity type.
pub struct JsonFileRepository<E: Entity> {
    path: PathBuf,
    state: Mutex<BTreeMap<E::Id, E>>,
}

impl<E> JsonFileRepository<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    /// Opens a repository over `path`, loading the document when present.
    ///
    /// A missing file is an empty repository; the document is created on
    /// the first mutation.
    ///
    /// # Side effects
    /// - Emits `store_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let started_at = Instant::now();
        info!(
            "event=store_open module=repo status=start path={}",
            path.display()
        );

        match load_document::<E>(&path) {
            Ok(entities) => {
                info!(
                    "event=store_open module=repo status=ok path={} entities={} duration_ms={}",
                    path.display(),
                    entities.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    path,
                    state: Mutex::new(entities),
                })
            }
            Err(err) => {
                error!(
                    "event=store_open module=repo status=error path={} duration_ms={} error={}",
                    path.display(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Returns the backing document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_state(&self) -> MutexGuard<'_, BTreeMap<E::Id, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh(&self, state: &mut BTreeMap<E::Id, E>) -> RepoResult<()> {
        *state = load_document::<E>(&self.path)?;
        Ok(())
    }

    fn persist(&self, state: &BTreeMap<E::Id, E>) -> RepoResult<()> {
        let document = StoreDocument {
            entities: state.values().cloned().collect(),
        };
        let encoded = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, encoded)?;
        Ok(())
    }
}

fn load_document<E>(path: &Path) -> RepoResult<BTreeMap<E::Id, E>>
where
    E: Entity + DeserializeOwned,
{
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => return Err(err.into()),
    };

    let document: StoreDocument<E> = serde_json::from_str(&raw)?;
    let mut entities = BTreeMap::new();
    for entity in document.entities {
        let id = entity.id().clone();
        if entities.insert(id.clone(), entity).is_some() {
            return Err(RepoError::InvalidData(format!(
                "duplicate entity id `{id}` in {}",
                path.display()
            )));
        }
    }
    Ok(entities)
}

impl<E> EntityRepository<E> for JsonFileRepository<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    fn add(&self, entity: &E, _caller: Option<&CallerIdentity>) -> RepoResult<()> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        let id = entity.id();
        if state.contains_key(id) {
            return Err(RepoError::already_exists(id));
        }
        state.insert(id.clone(), entity.clone());
        self.persist(&state)
    }

    fn update(&self, entity: &E, _caller: Option<&CallerIdentity>) -> RepoResult<()> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        let id = entity.id();
        if !state.contains_key(id) {
            return Err(RepoError::not_found(id));
        }
        state.insert(id.clone(), entity.clone());
        self.persist(&state)
    }

    fn remove(&self, id: &E::Id, _caller: Option<&CallerIdentity>) -> RepoResult<()> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        if state.remove(id).is_none() {
            return Err(RepoError::not_found(id));
        }
        self.persist(&state)
    }

    fn remove_matching(
        &self,
        filter: &dyn Fn(&E) -> bool,
        _caller: Option<&CallerIdentity>,
    ) -> RepoResult<usize> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        let doomed: Vec<E::Id> = state
            .values()
            .filter(|entity| filter(entity))
            .map(|entity| entity.id().clone())
            .collect();
        for id in &doomed {
            state.remove(id);
        }
        if !doomed.is_empty() {
            self.persist(&state)?;
        }
        Ok(doomed.len())
    }

    fn get(&self, id: &E::Id, _caller: Option<&CallerIdentity>) -> RepoResult<Maybe<E>> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        Ok(state.get(id).cloned().into())
    }

    fn get_matching(
        &self,
        filter: &dyn Fn(&E) -> bool,
        _caller: Option<&CallerIdentity>,
    ) -> RepoResult<Vec<E>> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        Ok(state
            .values()
            .filter(|entity| filter(entity))
            .cloned()
            .collect())
    }

    fn get_all(&self, _caller: Option<&CallerIdentity>) -> RepoResult<Vec<E>> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        Ok(state.values().cloned().collect())
    }

    fn ids(&self, _caller: Option<&CallerIdentity>) -> RepoResult<Vec<E::Id>> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        Ok(state.keys().cloned().collect())
    }

    fn contains(&self, id: &E::Id, _caller: Option<&CallerIdentity>) -> RepoResult<bool> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        Ok(state.contains_key(id))
    }

    fn count(&self, _caller: Option<&CallerIdentity>) -> RepoResult<usize> {
        let mut state = self.lock_state();
        self.refresh(&mut state)?;
        Ok(state.len())
    }
}
