//! Shared entity base contracts.

mod entity;

pub use entity::{Entity, Grouped, Metadata, Permission};
