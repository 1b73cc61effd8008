//! Reflection provider: the lookup facade over a built registry.
//!
//! ```
//! use std::sync::Arc;
//! use docreflect_core::{
//!     CallerScope, DeclarationFact, DeclarationRegistry, Producer, ReflectionProvider,
//! };
//!
//! let registry = DeclarationRegistry::from_facts([
//!     DeclarationFact::class(Producer::Source, "Base"),
//!     DeclarationFact::method(Producer::Source, "Base", "run").with_doc_comment("/** run */"),
//!     DeclarationFact::class(Producer::Source, "Child").with_parent("Base"),
//!     DeclarationFact::method(Producer::Source, "Child", "run"),
//! ])
//! .unwrap();
//! let provider = ReflectionProvider::new(Arc::new(registry));
//!
//! let class = provider.get_class("Child").unwrap();
//! let method = class.get_method("run", &CallerScope::global()).unwrap();
//! assert_eq!(method.declaring_class, "Child");
//! assert_eq!(method.doc_comment.as_deref(), Some("/** run */"));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::cache::ResolutionCache;
use crate::error::{ReflectionError, ReflectionResult};
use crate::facts::{Producer, Signature, Visibility};
use crate::inheritance::{InheritanceWalker, InheritedDoc};
use crate::name::{display_name, SymbolKey};
use crate::precedence;
use crate::registry::DeclarationRegistry;
use crate::scope::AccessScope;

// ============================================================================
// Reflection Values
// ============================================================================

/// Resolved view of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionReflection {
    pub name: String,
    pub doc_comment: Option<String>,
    pub doc_producer: Option<Producer>,
    pub signature: Option<Signature>,
    /// No source fact backs this function.
    pub is_builtin: bool,
}

/// Where a method's effective doc comment came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocSource {
    pub producer: Producer,
    /// Class level that supplied the doc comment.
    pub class: String,
}

/// Resolved view of a method, as seen from one caller scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodReflection {
    pub name: String,
    /// Nearest visible class level declaring the method.
    pub declaring_class: String,
    pub doc_comment: Option<String>,
    pub doc_source: Option<DocSource>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub signature: Option<Signature>,
}

impl MethodReflection {
    /// Whether the doc comment was supplied by an ancestor level.
    pub fn is_doc_inherited(&self) -> bool {
        self.doc_source
            .as_ref()
            .is_some_and(|s| SymbolKey::new(&s.class) != SymbolKey::new(&self.declaring_class))
    }
}

/// Resolved view of a class, bound to the provider that produced it.
#[derive(Debug, Clone)]
pub struct ClassReflection<'p> {
    provider: &'p ReflectionProvider,
    name: String,
    parent_class_name: Option<String>,
    ancestor_names: Vec<String>,
    doc_comment: Option<String>,
    doc_producer: Option<Producer>,
    is_builtin: bool,
}

impl ClassReflection<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The effective parent edge, even when the parent has no facts.
    pub fn parent_class_name(&self) -> Option<&str> {
        self.parent_class_name.as_deref()
    }

    /// Registered ancestors, immediate parent first.
    pub fn ancestor_names(&self) -> &[String] {
        &self.ancestor_names
    }

    /// The class's own doc comment. Class docs are not inherited.
    pub fn doc_comment(&self) -> Option<&str> {
        self.doc_comment.as_deref()
    }

    pub fn doc_producer(&self) -> Option<Producer> {
        self.doc_producer
    }

    /// No source fact backs this class.
    pub fn is_builtin(&self) -> bool {
        self.is_builtin
    }

    /// Whether `other` is a proper ancestor of this class.
    pub fn is_subclass_of(&self, other: &str) -> bool {
        let other = SymbolKey::new(other);
        self.ancestor_names
            .iter()
            .any(|a| SymbolKey::new(a) == other)
    }

    /// Names of methods declared at this class or any ancestor, nearest
    /// declaration first, without duplicates.
    pub fn method_names(&self) -> Vec<String> {
        let registry = self.provider.registry();
        let mut seen = HashSet::new();
        std::iter::once(self.name.as_str())
            .chain(self.ancestor_names.iter().map(String::as_str))
            .flat_map(|level| registry.methods_of(level))
            .filter(|m| seen.insert(SymbolKey::new(m)))
            .map(str::to_string)
            .collect()
    }

    /// Look up a method as seen from `scope`.
    ///
    /// The declaring level is the nearest one, starting at this class, where
    /// the method exists and `scope` can see it. The doc comment is then
    /// resolved by the inheritance walk from that level.
    ///
    /// # Errors
    ///
    /// - `InaccessibleMethod` if the method exists only at invisible levels
    /// - `UnknownMethod` if it exists at no level
    /// - `HierarchyCycle` from the inheritance walk
    pub fn get_method(
        &self,
        method: &str,
        scope: &dyn AccessScope,
    ) -> ReflectionResult<MethodReflection> {
        let registry = self.provider.registry();
        let mut exists = false;

        let levels = std::iter::once(self.name.as_str())
            .chain(self.ancestor_names.iter().map(String::as_str));
        for level in levels {
            let facts = registry.facts_for(method, Some(level));
            if facts.is_empty() {
                continue;
            }
            exists = true;

            let visibility = registry.method_visibility(level, method);
            if !scope.can_access_method(registry, level, visibility) {
                trace!(class = level, method, %visibility, "method level not visible");
                continue;
            }

            let doc = self.provider.resolve_method_doc(method, level)?;
            let doc_source = match (doc.producer, &doc.supplying_class) {
                (Some(producer), Some(class)) => Some(DocSource {
                    producer,
                    class: class.clone(),
                }),
                _ => None,
            };
            return Ok(MethodReflection {
                name: registry
                    .method_name(level, method)
                    .unwrap_or_else(|| display_name(method))
                    .to_string(),
                declaring_class: level.to_string(),
                doc_comment: doc.doc.clone(),
                doc_source,
                visibility,
                is_static: precedence::resolve_static(facts),
                signature: precedence::resolve_signature(facts).cloned(),
            });
        }

        if exists {
            Err(ReflectionError::InaccessibleMethod {
                class: self.name.clone(),
                method: display_name(method).to_string(),
                scope: scope.describe(),
            })
        } else {
            Err(ReflectionError::UnknownMethod {
                class: self.name.clone(),
                method: display_name(method).to_string(),
            })
        }
    }

    /// Whether the method exists at any level, regardless of visibility.
    pub fn has_method(&self, method: &str) -> bool {
        let registry = self.provider.registry();
        std::iter::once(self.name.as_str())
            .chain(self.ancestor_names.iter().map(String::as_str))
            .any(|level| !registry.facts_for(method, Some(level)).is_empty())
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Provider construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Memoize resolved doc comments.
    pub cache: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        ProviderOptions { cache: true }
    }
}

/// Reflection facade over an immutable [`DeclarationRegistry`].
///
/// The provider is `Send + Sync`; share it across analysis workers behind an
/// `Arc` or by reference.
#[derive(Debug)]
pub struct ReflectionProvider {
    registry: Arc<DeclarationRegistry>,
    cache: Option<ResolutionCache>,
}

impl ReflectionProvider {
    /// Create a provider with default options.
    pub fn new(registry: Arc<DeclarationRegistry>) -> Self {
        Self::with_options(registry, ProviderOptions::default())
    }

    pub fn with_options(registry: Arc<DeclarationRegistry>, options: ProviderOptions) -> Self {
        ReflectionProvider {
            registry,
            cache: options.cache.then(ResolutionCache::new),
        }
    }

    pub fn registry(&self) -> &DeclarationRegistry {
        &self.registry
    }

    /// The resolution cache, when enabled.
    pub fn cache(&self) -> Option<&ResolutionCache> {
        self.cache.as_ref()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.registry.has_function(name)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.registry.has_class(name)
    }

    /// Whether `class` or an ancestor has facts for `method`.
    ///
    /// Unknown classes and cyclic hierarchies answer `false`.
    pub fn has_method(&self, class: &str, method: &str) -> bool {
        self.get_class(class)
            .map(|c| c.has_method(method))
            .unwrap_or(false)
    }

    /// Resolve a function.
    ///
    /// # Errors
    ///
    /// `UnknownFunction` if no producer supplied a fact for `name`.
    pub fn get_function(&self, name: &str) -> ReflectionResult<FunctionReflection> {
        let display = self
            .registry
            .function_name(name)
            .ok_or_else(|| ReflectionError::unknown_function(display_name(name)))?;
        let facts = self.registry.facts_for(name, None);

        let doc = self.cached(ResolutionCache::key(name, None), || {
            Ok(match precedence::resolve(facts) {
                Some(doc) => InheritedDoc {
                    doc: Some(doc.text.to_string()),
                    producer: Some(doc.producer),
                    supplying_class: None,
                },
                None => InheritedDoc::absent(),
            })
        })?;

        Ok(FunctionReflection {
            name: display.to_string(),
            doc_comment: doc.doc.clone(),
            doc_producer: doc.producer,
            signature: precedence::resolve_signature(facts).cloned(),
            is_builtin: !facts.has(Producer::Source),
        })
    }

    /// Resolve a class.
    ///
    /// # Errors
    ///
    /// - `UnknownClass` if no producer supplied a fact for `name`
    /// - `HierarchyCycle` if its chain revisits a class
    pub fn get_class(&self, name: &str) -> ReflectionResult<ClassReflection<'_>> {
        let display = self
            .registry
            .class_name(name)
            .ok_or_else(|| ReflectionError::unknown_class(display_name(name)))?;
        let facts = self.registry.class_facts(name);
        let ancestor_names = self.registry.class_hierarchy_of(name)?;
        let doc = precedence::resolve(facts);

        Ok(ClassReflection {
            provider: self,
            name: display.to_string(),
            parent_class_name: self.registry.declared_parent_of(name).map(str::to_string),
            ancestor_names,
            doc_comment: doc.map(|d| d.text.to_string()),
            doc_producer: doc.map(|d| d.producer),
            is_builtin: !facts.has(Producer::Source),
        })
    }

    /// Shorthand for `get_class(class)?.get_method(method, scope)`.
    pub fn get_method(
        &self,
        class: &str,
        method: &str,
        scope: &dyn AccessScope,
    ) -> ReflectionResult<MethodReflection> {
        self.get_class(class)?.get_method(method, scope)
    }

    fn resolve_method_doc(
        &self,
        method: &str,
        declaring_class: &str,
    ) -> ReflectionResult<Arc<InheritedDoc>> {
        self.cached(ResolutionCache::key(method, Some(declaring_class)), || {
            InheritanceWalker::new(&self.registry).resolve_with_inheritance(method, declaring_class)
        })
    }

    fn cached(
        &self,
        key: crate::cache::CacheKey,
        compute: impl FnOnce() -> ReflectionResult<InheritedDoc>,
    ) -> ReflectionResult<Arc<InheritedDoc>> {
        let Some(cache) = &self.cache else {
            return compute().map(Arc::new);
        };
        if let Some(hit) = cache.get(&key) {
            trace!(symbol = %key.0, "resolution cache hit");
            return Ok(hit);
        }
        let value = Arc::new(compute()?);
        cache.insert(key, Arc::clone(&value));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::DeclarationFact;
    use crate::scope::CallerScope;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn provider_is_send_and_sync() {
        assert_send_sync::<ReflectionProvider>();
    }

    fn provider(facts: Vec<DeclarationFact>) -> ReflectionProvider {
        ReflectionProvider::new(Arc::new(DeclarationRegistry::from_facts(facts).unwrap()))
    }

    mod function_tests {
        use super::*;

        #[test]
        fn unknown_function_is_an_error() {
            let provider = provider(vec![]);
            assert_eq!(
                provider.get_function("\\missing").unwrap_err(),
                ReflectionError::UnknownFunction {
                    name: "missing".to_string()
                }
            );
        }

        #[test]
        fn undocumented_function_is_absent_not_empty() {
            let provider = provider(vec![DeclarationFact::function(Producer::Source, "f")]);
            let f = provider.get_function("F").unwrap();
            assert_eq!(f.doc_comment, None);
            assert_eq!(f.doc_producer, None);
            assert!(!f.is_builtin);
        }

        #[test]
        fn native_function_is_builtin() {
            let provider = provider(vec![
                DeclarationFact::function(Producer::Native, "implode"),
                DeclarationFact::function(Producer::Stub, "implode")
                    .with_doc_comment("/** stub */"),
            ]);
            let f = provider.get_function("\\implode").unwrap();
            assert!(f.is_builtin);
            assert_eq!(f.doc_producer, Some(Producer::Stub));
            assert_eq!(provider.cache().map(|c| c.len()), Some(1));
        }
    }

    mod class_tests {
        use super::*;

        fn hierarchy() -> ReflectionProvider {
            provider(vec![
                DeclarationFact::class(Producer::Source, "Base")
                    .with_doc_comment("/** base */"),
                DeclarationFact::method(Producer::Source, "Base", "shared"),
                DeclarationFact::method(Producer::Source, "Base", "baseOnly"),
                DeclarationFact::class(Producer::Source, "Child")
                    .with_parent("Base"),
                DeclarationFact::method(Producer::Source, "Child", "SHARED"),
                DeclarationFact::method(Producer::Source, "Child", "childOnly"),
            ])
        }

        #[test]
        fn class_doc_is_not_inherited() {
            let provider = hierarchy();
            let child = provider.get_class("child").unwrap();
            assert_eq!(child.name(), "Child");
            assert_eq!(child.doc_comment(), None);
            assert_eq!(child.parent_class_name(), Some("Base"));
            assert_eq!(child.ancestor_names().to_vec(), vec!["Base".to_string()]);
            assert!(child.is_subclass_of("\\base"));
            assert!(!child.is_subclass_of("Child"));
            assert!(!child.is_builtin());
        }

        #[test]
        fn method_names_are_deduplicated_nearest_first() {
            let provider = hierarchy();
            let child = provider.get_class("Child").unwrap();
            assert_eq!(child.method_names(), vec!["SHARED", "childOnly", "baseOnly"]);
        }

        #[test]
        fn has_method_ignores_visibility() {
            let provider = hierarchy();
            assert!(provider.has_method("Child", "baseonly"));
            assert!(!provider.has_method("Child", "nope"));
            assert!(!provider.has_method("Ghost", "shared"));
        }

        #[test]
        fn unknown_method_vs_inaccessible() {
            let provider = provider(vec![
                DeclarationFact::class(Producer::Source, "A"),
                DeclarationFact::method(Producer::Source, "A", "secret")
                    .with_visibility(Visibility::Private),
            ]);
            let class = provider.get_class("A").unwrap();
            assert!(matches!(
                class.get_method("secret", &CallerScope::global()),
                Err(ReflectionError::InaccessibleMethod { .. })
            ));
            assert!(matches!(
                class.get_method("missing", &CallerScope::global()),
                Err(ReflectionError::UnknownMethod { .. })
            ));
            let method = class.get_method("secret", &CallerScope::in_class("a")).unwrap();
            assert_eq!(method.visibility, Visibility::Private);
        }

        #[test]
        fn uncached_provider_resolves_the_same() {
            let registry = Arc::new(
                DeclarationRegistry::from_facts([
                    DeclarationFact::class(Producer::Source, "A"),
                    DeclarationFact::method(Producer::Source, "A", "m")
                        .with_doc_comment("/** m */"),
                ])
                .unwrap(),
            );
            let cached = ReflectionProvider::new(Arc::clone(&registry));
            let uncached =
                ReflectionProvider::with_options(registry, ProviderOptions { cache: false });
            let scope = CallerScope::global();
            assert_eq!(
                cached.get_method("A", "m", &scope).unwrap(),
                uncached.get_method("A", "m", &scope).unwrap()
            );
            assert!(uncached.cache().is_none());
        }
    }
}
