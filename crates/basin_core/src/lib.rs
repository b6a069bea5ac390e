//! Storage-agnostic entity repository/service framework.
//!
//! Domain modules define an entity type and compose this crate to get
//! CRUD, lifecycle events, option-typed lookups, declarative filtering
//! and dynamically constructed storage backends.

pub mod connect;
pub mod logging;
pub mod maybe;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use connect::{
    ConnectError, ConnectResult, ConnectionCatalog, ConnectionContext, ConnectionDescriptor,
    ConnectionType, ProviderArgument, ProviderFactory, ProviderRequest, ProviderSlot,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use maybe::{EmptyMaybeError, Maybe};
pub use model::{Entity, Grouped, Metadata, Permission};
pub use query::{
    compile_conditions, CompiledQuery, FieldAccessor, FieldKind, FieldValue, Query, QueryCondition,
    QueryError, QueryOperator, QueryResult, Queryable,
};
pub use repo::{
    CallerIdentity, EntityRepository, JsonFileRepository, MemoryRepository, RepoError, RepoResult,
};
pub use service::{CancelGate, EntityService, MutationOutcome, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
