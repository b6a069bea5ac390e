//! Declarative query engine.
//!
//! # Responsibility
//! - Turn an ordered list of (field, operator, value) conditions into one
//!   reusable predicate over an entity type.
//!
//! # Invariants
//! - Conditions combine with logical AND; an empty list matches everything.
//! - Unknown fields and operator/type mismatches fail at compile time,
//!   before any data is scanned.
//! - Compilation happens once per query; evaluation is per-entity.

mod compile;
mod condition;

pub use compile::{compile_conditions, CompiledQuery, FieldAccessor, Queryable};
pub use condition::{FieldKind, FieldValue, Query, QueryCondition, QueryOperator};

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type QueryResult<T> = Result<T, QueryError>;

/// Query compilation error, identifying the offending condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Condition references a field the entity schema does not declare.
    UnknownField { field: String },
    /// Ordering operator applied to a non-orderable field kind.
    NotOrderable {
        field: String,
        operator: QueryOperator,
    },
    /// Operator is not defined for the field kind (e.g. `Contains` on a
    /// scalar field).
    UnsupportedOperator {
        field: String,
        operator: QueryOperator,
    },
    /// Comparison value cannot be compared with the field kind.
    IncomparableValue {
        field: String,
        operator: QueryOperator,
    },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { field } => {
                write!(f, "query references unknown field `{field}`")
            }
            Self::NotOrderable { field, operator } => write!(
                f,
                "operator {operator} requires an orderable field, `{field}` is not"
            ),
            Self::UnsupportedOperator { field, operator } => {
                write!(f, "operator {operator} is not defined for field `{field}`")
            }
            Self::IncomparableValue { field, operator } => write!(
                f,
                "comparison value is incomparable with field `{field}` under {operator}"
            ),
        }
    }
}

impl Error for QueryError {}
