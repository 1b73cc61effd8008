//! Error types and error codes for the docreflect CLI.
//!
//! `DocReflectError` is the single error type rendered as JSON output. It
//! bridges the core's `ReflectionError` and the loader's `LoadError`.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (unknown or inaccessible symbol)
//! - `4`: Registry errors (duplicate fact, hierarchy cycle, unreadable or
//!   malformed fact file)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

use docreflect_core::ReflectionError;

use crate::loader::LoadError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// The requested symbol is unknown or not visible.
    ResolutionError = 3,
    /// The facts could not be loaded into a consistent registry.
    RegistryError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum DocReflectError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// A lookup or registry construction failed in the core.
    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    /// Fact files or project config could not be loaded.
    #[error(transparent)]
    Load(LoadError),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

fn reflection_code(err: &ReflectionError) -> OutputErrorCode {
    if err.is_construction_defect() {
        OutputErrorCode::RegistryError
    } else {
        OutputErrorCode::ResolutionError
    }
}

impl From<&DocReflectError> for OutputErrorCode {
    fn from(err: &DocReflectError) -> Self {
        match err {
            DocReflectError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            DocReflectError::Reflection(e) => reflection_code(e),
            DocReflectError::Load(LoadError::Registry(e)) => reflection_code(e),
            DocReflectError::Load(_) => OutputErrorCode::RegistryError,
            DocReflectError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<DocReflectError> for OutputErrorCode {
    fn from(err: DocReflectError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridge: LoadError -> DocReflectError
// ============================================================================

impl From<LoadError> for DocReflectError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Registry(e) => DocReflectError::Reflection(e),
            other => DocReflectError::Load(other),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl DocReflectError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        DocReflectError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        DocReflectError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
