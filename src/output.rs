//! JSON output types for the docreflect CLI.
//!
//! Every command writes exactly one JSON document to stdout, success or
//! error. All responses carry `status` and `schema_version`.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use docreflect_core::{
    ClassReflection, FunctionReflection, MethodReflection, Producer, ReflectionError,
};

use crate::error::{DocReflectError, OutputErrorCode};
use crate::loader::LoadError;

/// Schema version of the JSON output.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Class Info
// ============================================================================

/// Serializable summary of a resolved class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<String>,
    /// Registered ancestors, immediate parent first.
    pub ancestors: Vec<String>,
    pub doc_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_producer: Option<Producer>,
    pub is_builtin: bool,
    /// Methods declared at this class or an ancestor.
    pub methods: Vec<String>,
}

impl ClassInfo {
    pub fn from_reflection(class: &ClassReflection<'_>) -> Self {
        ClassInfo {
            name: class.name().to_string(),
            parent_class: class.parent_class_name().map(str::to_string),
            ancestors: class.ancestor_names().to_vec(),
            doc_comment: class.doc_comment().map(str::to_string),
            doc_producer: class.doc_producer(),
            is_builtin: class.is_builtin(),
            methods: class.method_names(),
        }
    }
}

// ============================================================================
// Response Structs
// ============================================================================

/// Response for the `function` command.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionResponse {
    pub status: String,
    pub schema_version: String,
    pub function: FunctionReflection,
    /// Arguments a call must pass, when a signature is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_parameters: Option<usize>,
}

impl FunctionResponse {
    pub fn new(function: FunctionReflection) -> Self {
        let required_parameters = function
            .signature
            .as_ref()
            .map(|sig| sig.required_parameter_count());
        FunctionResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            function,
            required_parameters,
        }
    }
}

/// Response for the `class` command.
#[derive(Debug, Clone, Serialize)]
pub struct ClassResponse {
    pub status: String,
    pub schema_version: String,
    pub class: ClassInfo,
}

impl ClassResponse {
    pub fn new(class: ClassInfo) -> Self {
        ClassResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            class,
        }
    }
}

/// Response for the `method` command.
#[derive(Debug, Clone, Serialize)]
pub struct MethodResponse {
    pub status: String,
    pub schema_version: String,
    /// The class the lookup started at.
    pub class: String,
    /// Caller scope description.
    pub scope: String,
    pub method: MethodReflection,
}

impl MethodResponse {
    pub fn new(
        class: impl Into<String>,
        scope: impl Into<String>,
        method: MethodReflection,
    ) -> Self {
        MethodResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            class: class.into(),
            scope: scope.into(),
            method,
        }
    }
}

/// Response for the `hierarchy` command.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyResponse {
    pub status: String,
    pub schema_version: String,
    pub class: String,
    /// Registered ancestors, immediate parent first.
    pub ancestors: Vec<String>,
}

impl HierarchyResponse {
    pub fn new(class: impl Into<String>, ancestors: Vec<String>) -> Self {
        HierarchyResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            class: class.into(),
            ancestors,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a DocReflectError.
    pub fn from_error(err: &DocReflectError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let details = match err {
            DocReflectError::Reflection(e) => reflection_details(e),
            DocReflectError::Load(
                LoadError::Io { path, .. }
                | LoadError::Json { path, .. }
                | LoadError::Walk { path, .. },
            ) => Some(serde_json::json!({ "path": path.display().to_string() })),
            _ => None,
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

fn reflection_details(err: &ReflectionError) -> Option<serde_json::Value> {
    let details = match err {
        ReflectionError::UnknownFunction { name } => serde_json::json!({ "function": name }),
        ReflectionError::UnknownClass { name } => serde_json::json!({ "class": name }),
        ReflectionError::UnknownMethod { class, method } => {
            serde_json::json!({ "class": class, "method": method })
        }
        ReflectionError::InaccessibleMethod {
            class,
            method,
            scope,
        } => serde_json::json!({ "class": class, "method": method, "scope": scope }),
        ReflectionError::HierarchyCycle { class, revisited } => {
            serde_json::json!({ "class": class, "revisited": revisited })
        }
        ReflectionError::DuplicateFact { symbol, producer } => {
            serde_json::json!({ "symbol": symbol, "producer": producer })
        }
        ReflectionError::MalformedFact {
            symbol,
            producer,
            reason,
        } => serde_json::json!({ "symbol": symbol, "producer": producer, "reason": reason }),
    };
    Some(details)
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a DocReflectError.
    pub fn from_error(err: &DocReflectError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emit
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// The output is deterministic: same input produces identical bytes.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
