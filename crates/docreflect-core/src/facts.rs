//! Declaration facts: provenance-tagged records of one symbol's shape.
//!
//! A [`DeclarationFact`] is what one producer knows about one symbol at one
//! level:
//! - a function (`kind = Function`, no owning class)
//! - a class (`kind = Class`, optional parent edge)
//! - a method (`kind = Method`, owning class required)
//!
//! Facts are flat records with a [`Producer`] tag. There is no per-producer
//! type hierarchy; the precedence resolver only looks at the tag.
//!
//! # Producers
//!
//! | Producer | Origin | Doc comment |
//! |----------|--------|-------------|
//! | `Source` | parsed user code | the comment preceding the declaration, if any |
//! | `Native` | host-runtime introspection | almost always absent |
//! | `Stub`   | curated overlay files | always present by construction |
//!
//! An absent doc comment (`None`) means "this producer contributed no
//! documentation". `Some("")` is a present, empty comment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::name::{display_name, SymbolKey};

// ============================================================================
// Producer
// ============================================================================

/// The origin of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Producer {
    /// Parsed user source code.
    Source,
    /// Built-in symbol provided by the host runtime.
    Native,
    /// Curated overlay (stub) file.
    Stub,
}

impl Producer {
    /// All producers, in storage order.
    pub const ALL: [Producer; 3] = [Producer::Source, Producer::Native, Producer::Stub];

    /// Stable lowercase name used in messages and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Producer::Source => "source",
            Producer::Native => "native",
            Producer::Stub => "stub",
        }
    }
}

impl fmt::Display for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Symbol Kind and Visibility
// ============================================================================

/// What kind of symbol a fact describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
}

/// Access level of a method.
///
/// A method level that no producer gives a visibility inherits it from the
/// nearest ancestor level that has one, and is public when none does,
/// matching the host language's default for members without a modifier.
///
/// ```
/// use docreflect_core::facts::Visibility;
///
/// assert_eq!(serde_json::to_string(&Visibility::Protected).unwrap(), "\"protected\"");
/// assert_eq!(Visibility::default(), Visibility::Public);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible from anywhere.
    #[default]
    Public,
    /// Visible from the declaring class and its subclasses.
    Protected,
    /// Visible only from the declaring class itself.
    Private,
}

impl Visibility {
    /// Stable lowercase name used in messages and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Signatures
// ============================================================================

/// A function or method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name including the `$` sigil (e.g., `$separator`).
    pub name: String,
    /// Declared type, as written (e.g., `?string`, `array|string`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    /// Whether the parameter has a default value.
    #[serde(default)]
    pub is_optional: bool,
    /// Whether the parameter collects remaining arguments (`...$rest`).
    #[serde(default)]
    pub is_variadic: bool,
    /// Whether the parameter is passed by reference (`&$out`).
    #[serde(default)]
    pub by_reference: bool,
}

impl Parameter {
    /// Create a required, untyped parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            type_hint: None,
            is_optional: false,
            is_variadic: false,
            by_reference: false,
        }
    }

    /// Set the type hint.
    pub fn with_type(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }
}

/// A function or method signature.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Declared return type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

impl Signature {
    /// Create an empty signature.
    pub fn new() -> Self {
        Signature::default()
    }

    /// Set the parameters.
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the return type.
    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    /// Number of parameters that must be passed.
    pub fn required_parameter_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| !p.is_optional && !p.is_variadic)
            .count()
    }
}

// ============================================================================
// Declaration Fact
// ============================================================================

/// One producer's record of one symbol at one level.
///
/// Construct with [`DeclarationFact::function`], [`DeclarationFact::class`]
/// or [`DeclarationFact::method`], then refine with the `with_*` builders.
/// Once handed to the registry a fact is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationFact {
    /// Kind of symbol.
    pub kind: SymbolKind,
    /// Symbol name as the producer spelled it (function, class or method
    /// name; a method name is unqualified).
    pub name: String,
    /// Declaring class level. `Some` for methods only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owning_class: Option<String>,
    /// Origin of the fact.
    pub producer: Producer,
    /// Documentation contributed by this producer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<String>,
    /// Access level (methods only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    /// Whether the method is static (methods only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
    /// Raw parent class edge (classes only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<String>,
    /// Callable shape (functions and methods).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl DeclarationFact {
    fn new(kind: SymbolKind, producer: Producer, name: &str, owning_class: Option<&str>) -> Self {
        DeclarationFact {
            kind,
            name: display_name(name).to_string(),
            owning_class: owning_class.map(|c| display_name(c).to_string()),
            producer,
            doc_comment: None,
            visibility: None,
            is_static: None,
            parent_class: None,
            signature: None,
        }
    }

    /// A standalone function fact.
    pub fn function(producer: Producer, name: &str) -> Self {
        Self::new(SymbolKind::Function, producer, name, None)
    }

    /// A class fact.
    pub fn class(producer: Producer, name: &str) -> Self {
        Self::new(SymbolKind::Class, producer, name, None)
    }

    /// A method fact declared at `owning_class`.
    pub fn method(producer: Producer, owning_class: &str, name: &str) -> Self {
        Self::new(SymbolKind::Method, producer, name, Some(owning_class))
    }

    /// Set the doc comment.
    pub fn with_doc_comment(mut self, doc: impl Into<String>) -> Self {
        self.doc_comment = Some(doc.into());
        self
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Set the static flag.
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = Some(is_static);
        self
    }

    /// Set the parent class edge.
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent_class = Some(display_name(parent).to_string());
        self
    }

    /// Set the signature.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Normalized key of the symbol name.
    pub fn key(&self) -> SymbolKey {
        SymbolKey::new(&self.name)
    }

    /// Normalized key of the owning class, for methods.
    pub fn owning_class_key(&self) -> Option<SymbolKey> {
        self.owning_class.as_deref().map(SymbolKey::new)
    }

    /// Human-readable qualified name (`Class::method` for methods).
    pub fn qualified_name(&self) -> String {
        match &self.owning_class {
            Some(class) => format!("{}::{}", class, self.name),
            None => self.name.clone(),
        }
    }

    /// Whether this producer contributed documentation.
    pub fn has_doc_comment(&self) -> bool {
        self.doc_comment.is_some()
    }
}
