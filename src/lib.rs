//! docreflect: declaration and doc-comment resolution for a static
//! analyzer's reflection layer.
//!
//! The resolution core lives in `docreflect-core` and is re-exported here.
//! This crate adds the plumbing needed to drive it from files and a CLI.

// Core - re-exported from docreflect-core
pub use docreflect_core::{
    cache, facts, inheritance, name, precedence, provider, registry, scope,
};
pub use docreflect_core::{
    AccessScope, CallerScope, ClassReflection, DeclarationFact, DeclarationRegistry, DocSource,
    FunctionReflection, MethodReflection, Producer, ProviderOptions, ReflectionError,
    ReflectionProvider, RegistryBuilder, RegistryOptions, SymbolKey, Visibility,
};

// Front door
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
