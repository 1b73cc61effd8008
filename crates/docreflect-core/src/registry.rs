//! Declaration registry: the per-run index of facts.
//!
//! The registry answers three questions:
//! - which facts exist at one level (`facts_for`)
//! - what a class's ancestor chain is (`class_hierarchy_of`)
//! - which names are known at all (`has_function`, `has_class`, `methods_of`)
//!
//! A level is one `(symbol, owning class?)` key. It holds at most one fact
//! per [`Producer`]. Functions and classes live in separate namespaces, as
//! they do in the host language, so a class level is addressed through
//! [`DeclarationRegistry::class_facts`] while functions and methods go
//! through [`DeclarationRegistry::facts_for`].
//!
//! # Construction
//!
//! Facts are registered into a [`RegistryBuilder`]. `build()` validates every
//! class chain for cycles and hands back an immutable registry that can be
//! shared across threads behind an `Arc`.
//!
//! ```
//! use docreflect_core::{DeclarationFact, Producer, RegistryBuilder};
//!
//! let mut builder = RegistryBuilder::new();
//! builder.register(DeclarationFact::class(Producer::Source, "Base")).unwrap();
//! builder
//!     .register(DeclarationFact::class(Producer::Source, "Child").with_parent("Base"))
//!     .unwrap();
//! let registry = builder.build().unwrap();
//!
//! assert_eq!(registry.class_hierarchy_of("\\child").unwrap(), vec!["Base"]);
//! ```

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::error::{ReflectionError, ReflectionResult};
use crate::facts::{DeclarationFact, Producer, SymbolKind, Visibility};
use crate::name::{display_name, SymbolKey};
use crate::precedence;

static EMPTY_LEVEL: LevelFacts = LevelFacts::EMPTY;

// ============================================================================
// Level Facts
// ============================================================================

/// The facts known at one level, at most one per producer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelFacts {
    source: Option<DeclarationFact>,
    native: Option<DeclarationFact>,
    stub: Option<DeclarationFact>,
}

impl LevelFacts {
    /// A level with no facts.
    pub const EMPTY: LevelFacts = LevelFacts {
        source: None,
        native: None,
        stub: None,
    };

    /// The fact contributed by `producer`, if any.
    pub fn get(&self, producer: Producer) -> Option<&DeclarationFact> {
        match producer {
            Producer::Source => self.source.as_ref(),
            Producer::Native => self.native.as_ref(),
            Producer::Stub => self.stub.as_ref(),
        }
    }

    /// Iterate the present facts in storage order (source, native, stub).
    pub fn iter(&self) -> impl Iterator<Item = &DeclarationFact> {
        Producer::ALL.into_iter().filter_map(|p| self.get(p))
    }

    /// Whether no producer contributed a fact here.
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.native.is_none() && self.stub.is_none()
    }

    /// Number of facts at this level (0 to 3).
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether a producer contributed a fact here.
    pub fn has(&self, producer: Producer) -> bool {
        self.get(producer).is_some()
    }

    /// Insert a fact, handing it back if the slot is already taken.
    fn insert(&mut self, fact: DeclarationFact) -> Result<(), DeclarationFact> {
        let slot = match fact.producer {
            Producer::Source => &mut self.source,
            Producer::Native => &mut self.native,
            Producer::Stub => &mut self.stub,
        };
        if slot.is_some() {
            return Err(fact);
        }
        *slot = Some(fact);
        Ok(())
    }
}

/// A level together with the first spelling registered for it.
#[derive(Debug, Clone)]
struct Level {
    name: String,
    facts: LevelFacts,
}

impl Level {
    fn new(name: &str) -> Self {
        Level {
            name: name.to_string(),
            facts: LevelFacts::default(),
        }
    }
}

type MethodKey = (SymbolKey, SymbolKey);

// ============================================================================
// Builder
// ============================================================================

/// Options controlling registry construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Reject class hierarchies containing a cycle at `build()`.
    pub validate_hierarchy: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        RegistryOptions {
            validate_hierarchy: true,
        }
    }
}

/// Mutable construction phase of a [`DeclarationRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    functions: HashMap<SymbolKey, Level>,
    classes: HashMap<SymbolKey, Level>,
    methods: HashMap<MethodKey, Level>,
    /// Method keys per class, in first-registration order.
    methods_by_class: HashMap<SymbolKey, Vec<SymbolKey>>,
    fact_count: usize,
    options: RegistryOptions,
}

impl RegistryBuilder {
    /// Create an empty builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set construction options.
    pub fn with_options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    /// Register one fact.
    ///
    /// A `Method` fact is a method level keyed by `(owning_class, name)`; a
    /// `Class` fact goes to the class namespace and a `Function` fact to the
    /// function namespace.
    ///
    /// # Errors
    ///
    /// - `MalformedFact` if a method fact has no owning class, or a function
    ///   or class fact has one
    /// - `DuplicateFact` if the same producer already contributed a fact at
    ///   that level
    pub fn register(&mut self, fact: DeclarationFact) -> ReflectionResult<()> {
        let result = match (fact.kind, fact.owning_class_key()) {
            (SymbolKind::Method, Some(class_key)) => {
                let method_key = fact.key();
                let level = match self.methods.entry((class_key.clone(), method_key.clone())) {
                    Entry::Occupied(e) => e.into_mut(),
                    Entry::Vacant(e) => {
                        self.methods_by_class
                            .entry(class_key)
                            .or_default()
                            .push(method_key);
                        e.insert(Level::new(&fact.name))
                    }
                };
                level.facts.insert(fact)
            }
            (SymbolKind::Class, None) => self
                .classes
                .entry(fact.key())
                .or_insert_with(|| Level::new(&fact.name))
                .facts
                .insert(fact),
            (SymbolKind::Function, None) => self
                .functions
                .entry(fact.key())
                .or_insert_with(|| Level::new(&fact.name))
                .facts
                .insert(fact),
            (SymbolKind::Method, None) => {
                return Err(malformed(&fact, "method fact has no owning class"));
            }
            (_, Some(_)) => {
                return Err(malformed(&fact, "only method facts have an owning class"));
            }
        };

        match result {
            Ok(()) => {
                self.fact_count += 1;
                Ok(())
            }
            Err(rejected) => Err(ReflectionError::DuplicateFact {
                symbol: rejected.qualified_name(),
                producer: rejected.producer,
            }),
        }
    }

    /// Register every fact from an iterator, stopping at the first error.
    pub fn extend<I>(&mut self, facts: I) -> ReflectionResult<()>
    where
        I: IntoIterator<Item = DeclarationFact>,
    {
        for fact in facts {
            self.register(fact)?;
        }
        Ok(())
    }

    /// Finish construction.
    ///
    /// # Errors
    ///
    /// `HierarchyCycle` if hierarchy validation is enabled and any class
    /// chain revisits a class.
    pub fn build(self) -> ReflectionResult<DeclarationRegistry> {
        let registry = DeclarationRegistry {
            functions: self.functions,
            classes: self.classes,
            methods: self.methods,
            methods_by_class: self.methods_by_class,
            fact_count: self.fact_count,
        };

        for level in registry.classes.values() {
            if let Some(parent) = precedence::resolve_parent(&level.facts) {
                if !registry.has_class(parent) {
                    debug!(
                        class = %level.name,
                        parent,
                        "parent class has no facts; chain ends here"
                    );
                }
            }
        }

        if self.options.validate_hierarchy {
            let mut names: Vec<&str> = registry.classes.values().map(|l| l.name.as_str()).collect();
            names.sort_unstable();
            for name in names {
                registry.class_hierarchy_of(name)?;
            }
        }

        info!(
            facts = registry.fact_count(),
            functions = registry.function_count(),
            classes = registry.class_count(),
            methods = registry.method_count(),
            "declaration registry built"
        );
        Ok(registry)
    }
}

fn malformed(fact: &DeclarationFact, reason: &str) -> ReflectionError {
    ReflectionError::MalformedFact {
        symbol: fact.qualified_name(),
        producer: fact.producer,
        reason: reason.to_string(),
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable index of declaration facts for one analysis run.
#[derive(Debug, Clone)]
pub struct DeclarationRegistry {
    functions: HashMap<SymbolKey, Level>,
    classes: HashMap<SymbolKey, Level>,
    methods: HashMap<MethodKey, Level>,
    methods_by_class: HashMap<SymbolKey, Vec<SymbolKey>>,
    fact_count: usize,
}

impl DeclarationRegistry {
    /// Register every fact and build with default options.
    pub fn from_facts<I>(facts: I) -> ReflectionResult<Self>
    where
        I: IntoIterator<Item = DeclarationFact>,
    {
        let mut builder = RegistryBuilder::new();
        builder.extend(facts)?;
        builder.build()
    }

    // ========================================================================
    // Level Lookup
    // ========================================================================

    /// The facts at a function level (`owning_class = None`) or a method
    /// level (`owning_class = Some(class)`). Unknown levels yield an empty
    /// set.
    pub fn facts_for(&self, name: &str, owning_class: Option<&str>) -> &LevelFacts {
        let level = match owning_class {
            Some(class) => self
                .methods
                .get(&(SymbolKey::new(class), SymbolKey::new(name))),
            None => self.functions.get(&SymbolKey::new(name)),
        };
        level.map(|l| &l.facts).unwrap_or(&EMPTY_LEVEL)
    }

    /// The facts at a class level. Unknown classes yield an empty set.
    pub fn class_facts(&self, class: &str) -> &LevelFacts {
        self.classes
            .get(&SymbolKey::new(class))
            .map(|l| &l.facts)
            .unwrap_or(&EMPTY_LEVEL)
    }

    /// Whether any producer supplied a fact for this function.
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&SymbolKey::new(name))
    }

    /// Whether any producer supplied a fact for this class.
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(&SymbolKey::new(name))
    }

    /// Registered spelling of a function name.
    pub fn function_name(&self, name: &str) -> Option<&str> {
        self.functions
            .get(&SymbolKey::new(name))
            .map(|l| l.name.as_str())
    }

    /// Registered spelling of a class name.
    pub fn class_name(&self, name: &str) -> Option<&str> {
        self.classes
            .get(&SymbolKey::new(name))
            .map(|l| l.name.as_str())
    }

    /// Registered spelling of a method name at one class level.
    pub fn method_name(&self, class: &str, method: &str) -> Option<&str> {
        self.methods
            .get(&(SymbolKey::new(class), SymbolKey::new(method)))
            .map(|l| l.name.as_str())
    }

    /// Names of the methods with facts at exactly this class level, in
    /// registration order.
    pub fn methods_of(&self, class: &str) -> Vec<&str> {
        let class_key = SymbolKey::new(class);
        let Some(keys) = self.methods_by_class.get(&class_key) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|m| self.methods.get(&(class_key.clone(), m.clone())))
            .map(|l| l.name.as_str())
            .collect()
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// The effective parent of a class, if it names a registered class.
    ///
    /// A parent edge naming a class without facts ends the chain and yields
    /// `None`.
    pub fn parent_of(&self, class: &str) -> Option<&str> {
        let parent = precedence::resolve_parent(self.class_facts(class))?;
        self.class_name(parent)
    }

    /// The effective visibility of `method` at the `class` level.
    ///
    /// A level whose facts declare no visibility (a stub that only adds
    /// documentation, say) takes it from the nearest ancestor level that
    /// declares one. Public when no level does.
    pub fn method_visibility(&self, class: &str, method: &str) -> Visibility {
        let mut visited = HashSet::new();
        let mut current = Some(display_name(class));

        while let Some(level) = current {
            if !visited.insert(SymbolKey::new(level)) {
                break;
            }
            let facts = self.facts_for(method, Some(level));
            if let Some(visibility) = precedence::declared_visibility(facts) {
                return visibility;
            }
            current = self.parent_of(level);
        }

        Visibility::default()
    }

    /// The raw effective parent edge of a class, registered or not.
    pub fn declared_parent_of(&self, class: &str) -> Option<&str> {
        precedence::resolve_parent(self.class_facts(class))
    }

    /// Ordered ancestor chain of a class, immediate parent first.
    ///
    /// # Errors
    ///
    /// - `UnknownClass` if no producer supplied a fact for `class`
    /// - `HierarchyCycle` if the chain revisits a class
    pub fn class_hierarchy_of(&self, class: &str) -> ReflectionResult<Vec<String>> {
        let key = SymbolKey::new(class);
        let start = self
            .classes
            .get(&key)
            .ok_or_else(|| ReflectionError::unknown_class(class))?;

        let mut visited = HashSet::new();
        visited.insert(key);
        let mut chain = Vec::new();
        let mut current = start;

        while let Some(parent) = precedence::resolve_parent(&current.facts) {
            let parent_key = SymbolKey::new(parent);
            let Some(parent_level) = self.classes.get(&parent_key) else {
                break;
            };
            if !visited.insert(parent_key) {
                return Err(ReflectionError::HierarchyCycle {
                    class: start.name.clone(),
                    revisited: parent_level.name.clone(),
                });
            }
            chain.push(parent_level.name.clone());
            current = parent_level;
        }

        Ok(chain)
    }

    /// Whether `class` is `ancestor` or inherits from it.
    ///
    /// A cyclic chain answers `false` once the cycle is reached.
    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        let target = SymbolKey::new(ancestor);
        let mut visited = HashSet::new();
        let mut current = SymbolKey::new(class);

        loop {
            if current == target {
                return true;
            }
            if !visited.insert(current.clone()) {
                return false;
            }
            match self.parent_of(current.as_str()) {
                Some(parent) => current = SymbolKey::new(parent),
                None => return false,
            }
        }
    }

    // ========================================================================
    // Counts
    // ========================================================================

    /// Total number of registered facts.
    pub fn fact_count(&self) -> usize {
        self.fact_count
    }

    /// Number of function levels.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Number of class levels.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of method levels.
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(producer: Producer, name: &str) -> DeclarationFact {
        DeclarationFact::class(producer, name)
    }

    mod register_tests {
        use super::*;

        #[test]
        fn one_fact_per_producer_per_level() {
            let mut builder = RegistryBuilder::new();
            builder
                .register(DeclarationFact::method(Producer::Source, "A", "run"))
                .unwrap();
            builder
                .register(
                    DeclarationFact::method(Producer::Stub, "A", "run")
                        .with_doc_comment("/** s */"),
                )
                .unwrap();

            let err = builder
                .register(DeclarationFact::method(Producer::Source, "\\a", "RUN"))
                .unwrap_err();
            assert_eq!(
                err,
                ReflectionError::DuplicateFact {
                    symbol: "a::RUN".to_string(),
                    producer: Producer::Source,
                }
            );
        }

        #[test]
        fn method_fact_without_owner_is_rejected() {
            let mut fact = DeclarationFact::method(Producer::Source, "A", "run");
            fact.owning_class = None;

            let mut builder = RegistryBuilder::new();
            let err = builder.register(fact).unwrap_err();
            assert!(matches!(
                err,
                ReflectionError::MalformedFact { ref symbol, producer: Producer::Source, .. }
                    if symbol == "run"
            ));
            assert!(err.is_construction_defect());
            assert!(!builder.build().unwrap().has_function("run"));
        }

        #[test]
        fn function_fact_with_owner_is_rejected() {
            let mut fact = DeclarationFact::function(Producer::Native, "strlen");
            fact.owning_class = Some("A".to_string());

            let err = DeclarationRegistry::from_facts([fact]).unwrap_err();
            assert!(matches!(err, ReflectionError::MalformedFact { .. }));
        }

        #[test]
        fn counts_track_each_namespace() {
            let registry = DeclarationRegistry::from_facts([
                DeclarationFact::function(Producer::Source, "f"),
                DeclarationFact::function(Producer::Stub, "f").with_doc_comment("/** f */"),
                class(Producer::Source, "A"),
                DeclarationFact::method(Producer::Source, "A", "run"),
            ])
            .unwrap();
            assert_eq!(registry.fact_count(), 4);
            assert_eq!(registry.function_count(), 1);
            assert_eq!(registry.class_count(), 1);
            assert_eq!(registry.method_count(), 1);
        }

        #[test]
        fn functions_and_classes_are_separate_namespaces() {
            let registry = DeclarationRegistry::from_facts([
                DeclarationFact::function(Producer::Source, "Thing"),
                class(Producer::Source, "Thing"),
            ])
            .unwrap();
            assert!(registry.has_function("thing"));
            assert!(registry.has_class("thing"));
            assert_eq!(registry.fact_count(), 2);
        }

        #[test]
        fn first_spelling_is_kept_for_display() {
            let registry = DeclarationRegistry::from_facts([
                class(Producer::Native, "\\DateTime"),
                class(Producer::Stub, "datetime").with_doc_comment("/** d */"),
            ])
            .unwrap();
            assert_eq!(registry.class_name("DATETIME"), Some("DateTime"));
            assert_eq!(registry.class_facts("DateTime").len(), 2);
        }
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn undeclared_visibility_comes_from_nearest_declaring_ancestor() {
            let registry = DeclarationRegistry::from_facts([
                class(Producer::Source, "A"),
                class(Producer::Source, "B").with_parent("A"),
                class(Producer::Source, "C").with_parent("B"),
                DeclarationFact::method(Producer::Source, "A", "run")
                    .with_visibility(Visibility::Private),
                DeclarationFact::method(Producer::Source, "B", "run")
                    .with_visibility(Visibility::Protected),
                DeclarationFact::method(Producer::Stub, "C", "run").with_doc_comment("/** c */"),
                DeclarationFact::method(Producer::Stub, "C", "other").with_doc_comment("/** o */"),
            ])
            .unwrap();
            assert_eq!(registry.method_visibility("C", "run"), Visibility::Protected);
            assert_eq!(registry.method_visibility("\\a", "RUN"), Visibility::Private);
            assert_eq!(registry.method_visibility("C", "other"), Visibility::Public);
        }

        #[test]
        fn unknown_level_is_empty() {
            let registry = DeclarationRegistry::from_facts([class(Producer::Source, "A")]).unwrap();
            assert!(registry.facts_for("nope", None).is_empty());
            assert!(registry.facts_for("nope", Some("A")).is_empty());
            assert!(registry.class_facts("B").is_empty());
        }

        #[test]
        fn method_levels_are_keyed_by_owning_class() {
            let registry = DeclarationRegistry::from_facts([
                class(Producer::Source, "A"),
                class(Producer::Source, "B"),
                DeclarationFact::method(Producer::Source, "A", "run")
                    .with_visibility(Visibility::Private),
            ])
            .unwrap();
            assert_eq!(registry.facts_for("run", Some("a")).len(), 1);
            assert!(registry.facts_for("run", Some("B")).is_empty());
            assert!(registry.facts_for("run", None).is_empty());
        }

        #[test]
        fn methods_of_lists_exact_level_in_order() {
            let registry = DeclarationRegistry::from_facts([
                class(Producer::Source, "A"),
                DeclarationFact::method(Producer::Source, "A", "second"),
                DeclarationFact::method(Producer::Source, "A", "first"),
                DeclarationFact::method(Producer::Stub, "A", "second").with_doc_comment("/** */"),
            ])
            .unwrap();
            assert_eq!(registry.methods_of("a"), vec!["second", "first"]);
            assert!(registry.methods_of("Missing").is_empty());
            assert_eq!(registry.method_count(), 2);
        }
    }

    mod hierarchy_tests {
        use super::*;

        #[test]
        fn chain_lists_immediate_parent_first() {
            let registry = DeclarationRegistry::from_facts([
                class(Producer::Source, "A"),
                class(Producer::Source, "B").with_parent("A"),
                class(Producer::Source, "C").with_parent("\\B"),
            ])
            .unwrap();
            assert_eq!(registry.class_hierarchy_of("C").unwrap(), vec!["B", "A"]);
            assert!(registry.class_hierarchy_of("A").unwrap().is_empty());
        }

        #[test]
        fn unknown_class_is_an_error() {
            let registry = DeclarationRegistry::from_facts([]).unwrap();
            assert_eq!(
                registry.class_hierarchy_of("Ghost").unwrap_err(),
                ReflectionError::UnknownClass {
                    name: "Ghost".to_string()
                }
            );
        }

        #[test]
        fn dangling_parent_ends_the_chain() {
            let registry = DeclarationRegistry::from_facts([
                class(Producer::Source, "Child").with_parent("Vendor\\External"),
            ])
            .unwrap();
            assert!(registry.class_hierarchy_of("Child").unwrap().is_empty());
            assert_eq!(registry.parent_of("Child"), None);
            assert_eq!(registry.declared_parent_of("Child"), Some("Vendor\\External"));
        }

        #[test]
        fn stub_parent_edge_takes_precedence() {
            let registry = DeclarationRegistry::from_facts([
                class(Producer::Source, "A"),
                class(Producer::Source, "B"),
                class(Producer::Source, "C").with_parent("A"),
                class(Producer::Stub, "C").with_parent("B").with_doc_comment("/** c */"),
            ])
            .unwrap();
            assert_eq!(registry.class_hierarchy_of("C").unwrap(), vec!["B"]);
        }

        #[test]
        fn build_rejects_cycles() {
            let err = DeclarationRegistry::from_facts([
                class(Producer::Source, "A").with_parent("B"),
                class(Producer::Source, "B").with_parent("A"),
            ])
            .unwrap_err();
            assert!(matches!(err, ReflectionError::HierarchyCycle { .. }));
        }

        #[test]
        fn self_parent_is_a_cycle() {
            let err =
                DeclarationRegistry::from_facts([class(Producer::Source, "A").with_parent("a")])
                    .unwrap_err();
            assert_eq!(
                err,
                ReflectionError::HierarchyCycle {
                    class: "A".to_string(),
                    revisited: "A".to_string(),
                }
            );
        }

        #[test]
        fn unvalidated_build_defers_cycle_to_lookup() {
            let mut builder = RegistryBuilder::new().with_options(RegistryOptions {
                validate_hierarchy: false,
            });
            builder
                .extend([
                    class(Producer::Source, "A").with_parent("B"),
                    class(Producer::Source, "B").with_parent("A"),
                ])
                .unwrap();
            let registry = builder.build().unwrap();
            assert!(matches!(
                registry.class_hierarchy_of("A"),
                Err(ReflectionError::HierarchyCycle { .. })
            ));
            assert!(!registry.is_subclass_of("A", "Unrelated"));
            assert!(registry.is_subclass_of("A", "B"));
        }

        #[test]
        fn subclass_check_includes_self() {
            let registry = DeclarationRegistry::from_facts([
                class(Producer::Source, "A"),
                class(Producer::Source, "B").with_parent("A"),
            ])
            .unwrap();
            assert!(registry.is_subclass_of("B", "A"));
            assert!(registry.is_subclass_of("b", "B"));
            assert!(!registry.is_subclass_of("A", "B"));
        }
    }
}
