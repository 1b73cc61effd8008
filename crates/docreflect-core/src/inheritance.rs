//! Inheritance walk for method documentation.
//!
//! When a method level resolves to no doc comment, its documentation is
//! taken from the nearest ancestor level that has one. The walk:
//!
//! 1. Resolves the starting level. A present doc comment there ends the
//!    walk: own documentation (source or stub) always shadows ancestors.
//! 2. Otherwise climbs to the parent class. Ancestor levels where the method
//!    has no facts are skipped, and so are ancestor levels whose effective
//!    visibility is private, since a private method is not inherited.
//! 3. Reaching the top of the chain yields an absent result.
//!
//! Class hierarchies are external data, so the walk is iterative and keeps a
//! visited set. Revisiting a class fails with `HierarchyCycle` even on a
//! registry built without hierarchy validation.

use std::collections::HashSet;

use serde::Serialize;
use tracing::trace;

use crate::error::{ReflectionError, ReflectionResult};
use crate::facts::{Producer, Visibility};
use crate::name::{display_name, SymbolKey};
use crate::precedence;
use crate::registry::DeclarationRegistry;

/// Result of an inheritance walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InheritedDoc {
    /// Effective doc comment, if any level supplied one.
    pub doc: Option<String>,
    /// Producer of the supplying fact.
    pub producer: Option<Producer>,
    /// Class level that supplied the doc comment.
    pub supplying_class: Option<String>,
}

impl InheritedDoc {
    /// The absent result.
    pub fn absent() -> Self {
        Self::default()
    }

    /// Whether a doc comment was found.
    pub fn is_present(&self) -> bool {
        self.doc.is_some()
    }
}

/// Walks a class chain looking for the nearest documented method level.
#[derive(Debug, Clone, Copy)]
pub struct InheritanceWalker<'a> {
    registry: &'a DeclarationRegistry,
}

impl<'a> InheritanceWalker<'a> {
    pub fn new(registry: &'a DeclarationRegistry) -> Self {
        InheritanceWalker { registry }
    }

    /// Resolve `method`'s doc comment starting at `starting_class`.
    ///
    /// # Errors
    ///
    /// `HierarchyCycle` if the chain above `starting_class` revisits a class.
    pub fn resolve_with_inheritance(
        &self,
        method: &str,
        starting_class: &str,
    ) -> ReflectionResult<InheritedDoc> {
        let start = self
            .registry
            .class_name(starting_class)
            .unwrap_or_else(|| display_name(starting_class));

        let mut visited = HashSet::new();
        let mut current = Some(start);
        let mut at_start = true;

        while let Some(class) = current {
            if !visited.insert(SymbolKey::new(class)) {
                return Err(ReflectionError::HierarchyCycle {
                    class: start.to_string(),
                    revisited: class.to_string(),
                });
            }

            let level = self.registry.facts_for(method, Some(class));
            let skip = level.is_empty()
                || (!at_start
                    && self.registry.method_visibility(class, method) == Visibility::Private);

            if !skip {
                if let Some(doc) = precedence::resolve(level) {
                    trace!(method, class, producer = %doc.producer, "method doc resolved");
                    return Ok(InheritedDoc {
                        doc: Some(doc.text.to_string()),
                        producer: Some(doc.producer),
                        supplying_class: Some(class.to_string()),
                    });
                }
            }

            at_start = false;
            current = self.registry.parent_of(class);
        }

        Ok(InheritedDoc::absent())
    }
}
