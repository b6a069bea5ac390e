//! Repository abstraction and reference backends.
//!
//! # Responsibility
//! - Define the persistence boundary shared by every entity type.
//! - Provide the file-backed reference implementation and the in-memory
//!   backend.
//!
//! # Invariants
//! - Every entity handed to a caller is a copy, independent of stored state.
//! - `NotFound`/`AlreadyExists` are recoverable conditions callers branch
//!   on; storage failures carry their underlying cause.

mod entity_repo;
mod file_repo;
mod memory_repo;

pub use entity_repo::{CallerIdentity, EntityRepository};
pub use file_repo::JsonFileRepository;
pub use memory_repo::MemoryRepository;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy shared by all backends.
#[derive(Debug)]
pub enum RepoError {
    /// No entity with the given id exists.
    NotFound { id: String },
    /// An entity with the given id is already present.
    AlreadyExists { id: String },
    /// Backing file could not be read or written.
    Io(std::io::Error),
    /// Backing document could not be encoded or decoded.
    Serialization(serde_json::Error),
    /// Persisted state violates a storage invariant.
    InvalidData(String),
    /// Failure raised by a third-party backend, cause preserved.
    Backend(Box<dyn Error + Send + Sync>),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "entity not found: {id}"),
            Self::AlreadyExists { id } => write!(f, "entity already exists: {id}"),
            Self::Io(err) => write!(f, "storage i/o failure: {err}"),
            Self::Serialization(err) => write!(f, "storage document failure: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Backend(err) => write!(f, "backend failure: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Backend(err) => Some(err.as_ref()),
            Self::NotFound { .. } | Self::AlreadyExists { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl RepoError {
    /// Builds a `NotFound` from any printable id.
    pub fn not_found(id: impl Display) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Builds an `AlreadyExists` from any printable id.
    pub fn already_exists(id: impl Display) -> Self {
        Self::AlreadyExists { id: id.to_string() }
    }
}
