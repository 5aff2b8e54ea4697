//! Error types for descriptor resolution, extraction and document assembly.
//!
//! Every error here signals a defect in how a type was declared or how a
//! document was built. None of them is worth retrying.

use thiserror::Error;

use crate::types::Category;

/// Why a single accessor could not produce or accept a value.
#[derive(Debug, Error)]
pub enum AccessFailure {
    #[error("value could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("value could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invocation failed: {0}")]
    Invoke(String),

    #[error("no setter declared")]
    ReadOnly,
}

/// Errors while resolving descriptors or extracting a category.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{type_name}.{member}: {message}")]
    Configuration {
        type_name: &'static str,
        member: String,
        message: String,
    },

    #[error("{type_name}.{member}: {category} member must produce an object, got {actual}")]
    TypeMismatch {
        type_name: &'static str,
        member: String,
        category: Category,
        actual: &'static str,
    },

    #[error("{type_name}.{member}: unable to access value: {source}")]
    Access {
        type_name: &'static str,
        member: String,
        #[source]
        source: AccessFailure,
    },
}

impl ExtractError {
    /// Name of the Rust type the failing member belongs to.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Configuration { type_name, .. }
            | Self::TypeMismatch { type_name, .. }
            | Self::Access { type_name, .. } => type_name,
        }
    }

    /// Name of the failing member.
    pub fn member(&self) -> &str {
        match self {
            Self::Configuration { member, .. }
            | Self::TypeMismatch { member, .. }
            | Self::Access { member, .. } => member,
        }
    }
}

/// Errors while building or walking a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported primary data: {message}")]
    UnsupportedPayload { message: String },

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Errors during document validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid document schema: {message}")]
    InvalidSchema { message: String },

    #[error("document failed validation with {} error(s)", errors.len())]
    Invalid { errors: Vec<Violation> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Violation {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
