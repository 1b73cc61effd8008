//! Error taxonomy for reflection lookups and registry construction.
//!
//! Lookup failures (`Unknown*`, `InaccessibleMethod`) are normal query
//! outcomes the analyzer must tell apart from "found but undocumented",
//! which is never an error. `DuplicateFact`, `MalformedFact` and
//! `HierarchyCycle` mean the input facts are corrupt and abort registry
//! construction.

use thiserror::Error;

use crate::facts::Producer;

/// Errors produced by the registry, the inheritance walker and the
/// reflection provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectionError {
    /// No producer supplied a fact for this function.
    #[error("function '{name}' not found")]
    UnknownFunction { name: String },

    /// No producer supplied a fact for this class.
    #[error("class '{name}' not found")]
    UnknownClass { name: String },

    /// The method exists at no level of the class's hierarchy.
    #[error("method '{class}::{method}' not found")]
    UnknownMethod { class: String, method: String },

    /// The method exists, but only at levels the caller cannot see.
    #[error("method '{class}::{method}' is not accessible from {scope}")]
    InaccessibleMethod {
        class: String,
        method: String,
        scope: String,
    },

    /// The class hierarchy revisits a class.
    #[error("class hierarchy of '{class}' contains a cycle at '{revisited}'")]
    HierarchyCycle { class: String, revisited: String },

    /// Two facts from the same producer were registered for one level.
    #[error("duplicate {producer} fact for '{symbol}'")]
    DuplicateFact { symbol: String, producer: Producer },

    /// A fact's kind and owning class disagree.
    #[error("malformed {producer} fact for '{symbol}': {reason}")]
    MalformedFact {
        symbol: String,
        producer: Producer,
        reason: String,
    },
}

/// Result type for reflection operations.
pub type ReflectionResult<T> = Result<T, ReflectionError>;

impl ReflectionError {
    /// Whether this error indicates corrupt input facts rather than a
    /// query outcome.
    pub fn is_construction_defect(&self) -> bool {
        matches!(
            self,
            ReflectionError::DuplicateFact { .. }
                | ReflectionError::HierarchyCycle { .. }
                | ReflectionError::MalformedFact { .. }
        )
    }

    pub(crate) fn unknown_function(name: &str) -> Self {
        ReflectionError::UnknownFunction {
            name: name.to_string(),
        }
    }

    pub(crate) fn unknown_class(name: &str) -> Self {
        ReflectionError::UnknownClass {
            name: name.to_string(),
        }
    }
}
