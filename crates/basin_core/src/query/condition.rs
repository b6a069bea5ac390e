//! Condition triples and the typed comparison-value vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

use super::compile::{compile_conditions, CompiledQuery, Queryable};
use super::QueryResult;

/// Comparison operator of one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    /// Membership test for collection-valued fields.
    Contains,
}

impl QueryOperator {
    /// Returns whether this operator needs an ordering between values.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterThanOrEqual | Self::LessThan | Self::LessThanOrEqual
        )
    }
}

impl Display for QueryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Contains => "contains",
        };
        write!(f, "{symbol}")
    }
}

/// Declared kind of one queryable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Bool,
    /// Enumeration value; ordering operators compare the ordinal.
    Symbol,
    /// Collection of text values; supports `Contains` only.
    TextList,
}

/// Typed value read from an entity field or supplied for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Enumeration value: stable token plus underlying ordinal.
    Symbol { token: String, ordinal: i64 },
    TextList(Vec<String>),
    /// Absent optional field. Equal only to another absent value.
    Null,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn symbol(token: impl Into<String>, ordinal: i64) -> Self {
        Self::Symbol {
            token: token.into(),
            ordinal,
        }
    }

    /// Wraps an optional text field, mapping `None` to `Null`.
    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(text) => Self::Text(text.to_string()),
            None => Self::Null,
        }
    }
}

/// One declarative (field, operator, value) filter triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: FieldValue,
}

impl QueryCondition {
    pub fn new(field: impl Into<String>, operator: QueryOperator, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

impl Display for QueryCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.operator, self.value)
    }
}

/// Ordered, implicitly AND-ed condition list over one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<E> {
    conditions: Vec<QueryCondition>,
    _entity: PhantomData<fn(&E)>,
}

impl<E> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Query<E> {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Appends one condition, keeping insertion order.
    pub fn and(mut self, condition: QueryCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[QueryCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl<E: Queryable + 'static> Query<E> {
    /// Compiles this query into a reusable predicate.
    pub fn compile(&self) -> QueryResult<CompiledQuery<E>> {
        compile_conditions(&self.conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, QueryCondition, QueryOperator};

    #[test]
    fn ordering_classification_matches_operator_semantics() {
        assert!(QueryOperator::GreaterThan.is_ordering());
        assert!(QueryOperator::LessThanOrEqual.is_ordering());
        assert!(!QueryOperator::Equal.is_ordering());
        assert!(!QueryOperator::Contains.is_ordering());
    }

    #[test]
    fn optional_text_maps_absence_to_null() {
        assert_eq!(FieldValue::optional_text(None), FieldValue::Null);
        assert_eq!(
            FieldValue::optional_text(Some("basin")),
            FieldValue::Text("basin".to_string())
        );
    }

    #[test]
    fn condition_display_names_field_and_operator() {
        let condition = QueryCondition::new("level", QueryOperator::GreaterThan, FieldValue::Integer(2));
        let rendered = condition.to_string();
        assert!(rendered.contains("level"));
        assert!(rendered.contains('>'));
    }
}
