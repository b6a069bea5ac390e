//! Explicit present/absent option value.
//!
//! # Responsibility
//! - Give lookups a uniform "might not exist" vocabulary so that finding
//!   nothing stays distinguishable from an error.
//!
//! # Invariants
//! - A `Maybe` holds exactly one value or nothing; `value()` on an empty
//!   option is an error, never a panic.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error returned when `value()` is called on an empty option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyMaybeError;

impl Display for EmptyMaybeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "no value present")
    }
}

impl Error for EmptyMaybeError {}

/// Option value holding exactly one `T` or nothing.
///
/// Used as the return type of every lookup that may legitimately not find
/// a result. Serialized transparently as the inner value or null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Maybe<T>(Option<T>);

impl<T> Maybe<T> {
    /// Creates an option with no value.
    pub fn empty() -> Self {
        Self(None)
    }

    /// Creates an option holding `value`.
    pub fn of(value: T) -> Self {
        Self(Some(value))
    }

    /// Returns whether a value is present.
    pub fn has_value(&self) -> bool {
        self.0.is_some()
    }

    /// Consumes the option and returns the held value.
    ///
    /// # Errors
    /// - Returns [`EmptyMaybeError`] when no value is present.
    pub fn value(self) -> Result<T, EmptyMaybeError> {
        self.0.ok_or(EmptyMaybeError)
    }

    /// Returns the held value or `default` without raising an error.
    pub fn value_or(self, default: T) -> T {
        self.0.unwrap_or(default)
    }

    /// Returns the held value or computes a fallback.
    pub fn value_or_else(self, fallback: impl FnOnce() -> T) -> T {
        self.0.unwrap_or_else(fallback)
    }

    /// Maps the held value, preserving emptiness.
    pub fn map<U>(self, transform: impl FnOnce(T) -> U) -> Maybe<U> {
        Maybe(self.0.map(transform))
    }

    /// Borrows the held value as a standard option.
    pub fn as_option(&self) -> Option<&T> {
        self.0.as_ref()
    }

    /// Consumes the option into a standard option.
    pub fn into_option(self) -> Option<T> {
        self.0
    }
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T> From<Maybe<T>> for Option<T> {
    fn from(value: Maybe<T>) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::{EmptyMaybeError, Maybe};

    #[test]
    fn of_holds_value_and_empty_does_not() {
        assert!(Maybe::of(7).has_value());
        assert!(!Maybe::<i32>::empty().has_value());
    }

    #[test]
    fn value_returns_held_value() {
        let value = Maybe::of("layer").value().expect("value should be present");
        assert_eq!(value, "layer");
    }

    #[test]
    fn value_on_empty_is_an_error_not_a_panic() {
        let err = Maybe::<i32>::empty()
            .value()
            .expect_err("empty option must fail");
        assert_eq!(err, EmptyMaybeError);
        assert_eq!(err.to_string(), "no value present");
    }

    #[test]
    fn value_or_returns_default_without_error() {
        assert_eq!(Maybe::empty().value_or(42), 42);
        assert_eq!(Maybe::of(7).value_or(42), 7);
    }

    #[test]
    fn value_or_else_computes_fallback_only_when_empty() {
        assert_eq!(Maybe::<u32>::empty().value_or_else(|| 3), 3);
        assert_eq!(Maybe::of(9u32).value_or_else(|| unreachable!()), 9);
    }

    #[test]
    fn map_preserves_emptiness() {
        assert_eq!(Maybe::of(2).map(|v| v * 10), Maybe::of(20));
        assert_eq!(Maybe::<i32>::empty().map(|v| v * 10), Maybe::empty());
    }

    #[test]
    fn converts_to_and_from_standard_option() {
        let maybe: Maybe<i32> = Some(5).into();
        assert_eq!(maybe, Maybe::of(5));
        let option: Option<i32> = Maybe::of(5).into();
        assert_eq!(option, Some(5));
        assert_eq!(Maybe::<i32>::empty().into_option(), None);
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&Maybe::of(3)).expect("serialize present");
        assert_eq!(json, "3");
        let json = serde_json::to_string(&Maybe::<i32>::empty()).expect("serialize empty");
        assert_eq!(json, "null");
    }
}
