//! Connection descriptors, provider catalog and resolution.
//!
//! # Responsibility
//! - Let the rest of the system add new storage backends without
//!   recompiling this core: backends register provider factories with a
//!   per-capability catalog at startup, and stored connection descriptors
//!   are resolved into live service/repository pairs on first use.
//!
//! # Invariants
//! - The catalog is immutable after startup registration.
//! - Resolution is idempotent per connection id; failed resolutions are
//!   never cached.

mod catalog;
mod context;
mod descriptor;

pub use catalog::{
    ConnectionCatalog, ConnectionType, ProviderArgument, ProviderFactory, ProviderRequest,
    ProviderSlot, REPOSITORY_SLOT,
};
pub use context::ConnectionContext;
pub use descriptor::ConnectionDescriptor;

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ConnectResult<T> = Result<T, ConnectError>;

/// Connection catalog and resolution errors.
#[derive(Debug)]
pub enum ConnectError {
    /// No stored descriptor matches the requested connection.
    ConnectionNotFound { connection: String },
    /// Descriptor names a provider type no backend has registered.
    ProviderNotFound { type_name: String },
    /// Provider type name violates naming rules.
    InvalidProviderName { type_name: String },
    /// Descriptor is missing a mandatory provider argument.
    MissingArgument { name: String },
    /// The backend's own constructor failed; cause surfaced verbatim.
    BackendConstruction {
        type_name: String,
        source: Box<dyn Error + Send + Sync>,
    },
    /// Descriptor store failure.
    Store(RepoError),
}

impl Display for ConnectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionNotFound { connection } => {
                write!(f, "connection not found: {connection}")
            }
            Self::ProviderNotFound { type_name } => {
                write!(f, "provider type not found: {type_name}")
            }
            Self::InvalidProviderName { type_name } => {
                write!(f, "provider type name is invalid: {type_name}")
            }
            Self::MissingArgument { name } => {
                write!(f, "mandatory provider argument is missing: {name}")
            }
            Self::BackendConstruction { type_name, source } => {
                write!(f, "backend `{type_name}` failed to construct: {source}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConnectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BackendConstruction { source, .. } => Some(source.as_ref()),
            Self::Store(err) => Some(err),
            Self::ConnectionNotFound { .. }
            | Self::ProviderNotFound { .. }
            | Self::InvalidProviderName { .. }
            | Self::MissingArgument { .. } => None,
        }
    }
}

impl From<RepoError> for ConnectError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}
