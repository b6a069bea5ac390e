//! Behavioral service wrapper over repositories.

mod entity_service;

pub use entity_service::{CancelGate, EntityService, MutationOutcome, ServiceError, ServiceResult};
