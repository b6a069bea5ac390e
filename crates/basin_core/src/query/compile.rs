//! Condition-list-to-predicate compiler.
//!
//! Field names resolve against a static schema table published by each
//! queryable entity type instead of runtime member lookup, so every
//! resolution and type mismatch is caught before a scan starts.

use std::cmp::Ordering;

use super::condition::{FieldKind, FieldValue, QueryCondition, QueryOperator};
use super::{QueryError, QueryResult};

/// One schema entry: field name, declared kind, typed accessor.
pub struct FieldAccessor<E> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub get: fn(&E) -> FieldValue,
}

/// Contract for entity types that publish a queryable field schema.
///
/// The schema is built once alongside the entity type; the compiler
/// consults it by field name, case-sensitively.
pub trait Queryable: Sized {
    fn schema() -> &'static [FieldAccessor<Self>];
}

#[derive(Debug)]
struct CompiledCondition<E> {
    get: fn(&E) -> FieldValue,
    operator: QueryOperator,
    value: FieldValue,
}

/// Reusable predicate compiled from an ordered condition list.
///
/// Compilation validates every condition up front; evaluation is a cheap
/// per-entity scan with no further lookups.
#[derive(Debug)]
pub struct CompiledQuery<E> {
    conditions: Vec<CompiledCondition<E>>,
}

impl<E> CompiledQuery<E> {
    /// Returns whether `entity` satisfies every condition.
    pub fn matches(&self, entity: &E) -> bool {
        self.conditions.iter().all(|condition| {
            evaluate((condition.get)(entity), condition.operator, &condition.value)
        })
    }

    /// Number of compiled conditions; zero matches every entity.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Compiles `conditions` into a reusable predicate over `E`.
///
/// # Errors
/// - [`QueryError::UnknownField`] when a field name is not in the schema.
/// - [`QueryError::NotOrderable`] for ordering operators on non-orderable
///   kinds.
/// - [`QueryError::UnsupportedOperator`] for operator/kind pairs with no
///   defined meaning (e.g. `Contains` on a scalar).
/// - [`QueryError::IncomparableValue`] when the comparison value cannot be
///   compared with the field kind.
pub fn compile_conditions<E: Queryable + 'static>(
    conditions: &[QueryCondition],
) -> QueryResult<CompiledQuery<E>> {
    let schema = E::schema();
    let mut compiled = Vec::with_capacity(conditions.len());

    for condition in conditions {
        let accessor = schema
            .iter()
            .find(|entry| entry.name == condition.field)
            .ok_or_else(|| QueryError::UnknownField {
                field: condition.field.clone(),
            })?;

        validate(accessor.kind, condition)?;
        compiled.push(CompiledCondition {
            get: accessor.get,
            operator: condition.operator,
            value: condition.value.clone(),
        });
    }

    Ok(CompiledQuery {
        conditions: compiled,
    })
}

fn validate(kind: FieldKind, condition: &QueryCondition) -> QueryResult<()> {
    let field = || condition.field.clone();
    let operator = condition.operator;

    if operator == QueryOperator::Contains {
        if kind != FieldKind::TextList {
            return Err(QueryError::UnsupportedOperator {
                field: field(),
                operator,
            });
        }
        return match condition.value {
            FieldValue::Text(_) => Ok(()),
            _ => Err(QueryError::IncomparableValue {
                field: field(),
                operator,
            }),
        };
    }

    if kind == FieldKind::TextList {
        // Collection-valued fields only support membership tests.
        return Err(QueryError::UnsupportedOperator {
            field: field(),
            operator,
        });
    }

    if operator.is_ordering() {
        let orderable = matches!(
            kind,
            FieldKind::Text | FieldKind::Integer | FieldKind::Float | FieldKind::Symbol
        );
        if !orderable {
            return Err(QueryError::NotOrderable {
                field: field(),
                operator,
            });
        }
        let comparable = match kind {
            FieldKind::Text => matches!(condition.value, FieldValue::Text(_)),
            FieldKind::Integer | FieldKind::Float => matches!(
                condition.value,
                FieldValue::Integer(_) | FieldValue::Float(_)
            ),
            // Enumeration ordering compares the underlying ordinal.
            FieldKind::Symbol => matches!(
                condition.value,
                FieldValue::Symbol { .. } | FieldValue::Integer(_)
            ),
            _ => false,
        };
        if !comparable {
            return Err(QueryError::IncomparableValue {
                field: field(),
                operator,
            });
        }
        return Ok(());
    }

    // Equal / NotEqual. Null compares against any scalar kind.
    if condition.value == FieldValue::Null {
        return Ok(());
    }
    let comparable = match kind {
        FieldKind::Text => matches!(condition.value, FieldValue::Text(_)),
        FieldKind::Integer | FieldKind::Float => matches!(
            condition.value,
            FieldValue::Integer(_) | FieldValue::Float(_)
        ),
        FieldKind::Bool => matches!(condition.value, FieldValue::Bool(_)),
        FieldKind::Symbol => matches!(
            condition.value,
            FieldValue::Symbol { .. } | FieldValue::Text(_) | FieldValue::Integer(_)
        ),
        FieldKind::TextList => false,
    };
    if !comparable {
        return Err(QueryError::IncomparableValue {
            field: field(),
            operator,
        });
    }
    Ok(())
}

fn evaluate(field: FieldValue, operator: QueryOperator, value: &FieldValue) -> bool {
    match operator {
        QueryOperator::Equal => equals(&field, value),
        QueryOperator::NotEqual => !equals(&field, value),
        QueryOperator::GreaterThan => {
            matches!(compare(&field, value), Some(Ordering::Greater))
        }
        QueryOperator::GreaterThanOrEqual => matches!(
            compare(&field, value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        QueryOperator::LessThan => matches!(compare(&field, value), Some(Ordering::Less)),
        QueryOperator::LessThanOrEqual => matches!(
            compare(&field, value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        QueryOperator::Contains => match (&field, value) {
            (FieldValue::TextList(items), FieldValue::Text(needle)) => {
                items.iter().any(|item| item == needle)
            }
            _ => false,
        },
    }
}

fn equals(field: &FieldValue, value: &FieldValue) -> bool {
    match (field, value) {
        (FieldValue::Null, FieldValue::Null) => true,
        (FieldValue::Null, _) | (_, FieldValue::Null) => false,
        (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
        (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
        (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
        (FieldValue::Float(a), FieldValue::Float(b)) => a == b,
        (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64) == *b,
        (FieldValue::Float(a), FieldValue::Integer(b)) => *a == (*b as f64),
        (FieldValue::Symbol { token: a, .. }, FieldValue::Symbol { token: b, .. }) => a == b,
        (FieldValue::Symbol { token, .. }, FieldValue::Text(text)) => token == text,
        (FieldValue::Symbol { ordinal, .. }, FieldValue::Integer(int)) => ordinal == int,
        _ => false,
    }
}

fn compare(field: &FieldValue, value: &FieldValue) -> Option<Ordering> {
    match (field, value) {
        (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
        (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
        (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
        (FieldValue::Float(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
        (FieldValue::Symbol { ordinal: a, .. }, FieldValue::Symbol { ordinal: b, .. }) => {
            Some(a.cmp(b))
        }
        (FieldValue::Symbol { ordinal, .. }, FieldValue::Integer(int)) => Some(ordinal.cmp(int)),
        _ => None,
    }
}
