//! Caller scopes and method visibility checks.
//!
//! A method lookup is made from somewhere: the global scope, or the body of
//! some class. [`AccessScope`] is the capability check the reflection
//! provider consults to decide whether a method level is visible:
//!
//! | Visibility | Visible from |
//! |------------|--------------|
//! | public     | anywhere |
//! | protected  | the declaring class or any subclass of it |
//! | private    | exactly the declaring class |
//!
//! Analyzers with richer scope information can implement the trait
//! themselves; [`CallerScope`] covers the common cases.

use crate::facts::Visibility;
use crate::name::SymbolKey;
use crate::registry::DeclarationRegistry;

/// Where a method lookup is made from.
pub trait AccessScope {
    /// The class whose body the caller is in, if any.
    fn class_name(&self) -> Option<&str>;

    /// Human-readable scope description for error messages.
    fn describe(&self) -> String {
        match self.class_name() {
            Some(class) => format!("class '{}'", class),
            None => "global scope".to_string(),
        }
    }

    /// Whether a method with `visibility`, declared at `declaring_class`, is
    /// visible from this scope.
    fn can_access_method(
        &self,
        registry: &DeclarationRegistry,
        declaring_class: &str,
        visibility: Visibility,
    ) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Protected => self
                .class_name()
                .is_some_and(|caller| registry.is_subclass_of(caller, declaring_class)),
            Visibility::Private => self
                .class_name()
                .is_some_and(|caller| SymbolKey::new(caller) == SymbolKey::new(declaring_class)),
        }
    }
}

/// Stock [`AccessScope`]: global code or the body of one class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallerScope {
    class: Option<String>,
}

impl CallerScope {
    /// Code outside any class.
    pub fn global() -> Self {
        CallerScope { class: None }
    }

    /// Code inside the body of `class`.
    pub fn in_class(class: impl Into<String>) -> Self {
        CallerScope {
            class: Some(class.into()),
        }
    }
}

impl AccessScope for CallerScope {
    fn class_name(&self) -> Option<&str> {
        self.class.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{DeclarationFact, Producer};

    fn registry() -> DeclarationRegistry {
        DeclarationRegistry::from_facts([
            DeclarationFact::class(Producer::Source, "Base"),
            DeclarationFact::class(Producer::Source, "Child").with_parent("Base"),
            DeclarationFact::class(Producer::Source, "Other"),
        ])
        .unwrap()
    }

    #[test]
    fn public_is_visible_everywhere() {
        let registry = registry();
        assert!(CallerScope::global().can_access_method(&registry, "Base", Visibility::Public));
    }

    #[test]
    fn protected_requires_declaring_class_or_subclass() {
        let registry = registry();
        let check = |scope: CallerScope| {
            scope.can_access_method(&registry, "Base", Visibility::Protected)
        };
        assert!(check(CallerScope::in_class("Base")));
        assert!(check(CallerScope::in_class("child")));
        assert!(!check(CallerScope::in_class("Other")));
        assert!(!check(CallerScope::global()));
    }

    #[test]
    fn private_requires_exact_declaring_class() {
        let registry = registry();
        let check = |scope: CallerScope| {
            scope.can_access_method(&registry, "\\Base", Visibility::Private)
        };
        assert!(check(CallerScope::in_class("base")));
        assert!(!check(CallerScope::in_class("Child")));
        assert!(!check(CallerScope::global()));
    }

    #[test]
    fn describe_names_the_class() {
        assert_eq!(CallerScope::global().describe(), "global scope");
        assert_eq!(CallerScope::in_class("Foo").describe(), "class 'Foo'");
    }
}
