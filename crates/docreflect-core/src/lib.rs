//! Core of docreflect.
//!
//! This crate resolves the effective declaration of functions, classes and
//! methods from overlapping sources of truth:
//! - Names: normalized, case-insensitive symbol keys
//! - Facts: provenance-tagged declaration records (source, native, stub)
//! - Registry: the per-run index of facts and class hierarchy edges
//! - Precedence: the fixed stub > source > native selection at one level
//! - Inheritance: the ancestor walk that fills in undocumented methods
//! - Scope: caller access checks for method visibility
//! - Cache: memoized resolution results
//! - Provider: the reflection facade (`get_function`, `get_class`, `get_method`)
//!
//! The crate performs no I/O. Facts are handed in already materialized.

pub mod cache;
pub mod error;
pub mod facts;
pub mod inheritance;
pub mod name;
pub mod precedence;
pub mod provider;
pub mod registry;
pub mod scope;

pub use error::{ReflectionError, ReflectionResult};
pub use facts::{DeclarationFact, Parameter, Producer, Signature, SymbolKind, Visibility};
pub use inheritance::{InheritanceWalker, InheritedDoc};
pub use name::SymbolKey;
pub use precedence::ResolvedDoc;
pub use provider::{
    ClassReflection, DocSource, FunctionReflection, MethodReflection, ProviderOptions,
    ReflectionProvider,
};
pub use registry::{DeclarationRegistry, LevelFacts, RegistryBuilder, RegistryOptions};
pub use scope::{AccessScope, CallerScope};
