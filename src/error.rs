//! Error types for schema resolution, model loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the resolution engine.
///
/// Only registry misuse is fatal; unresolved types degrade to absent schemas
/// and are reported through logging instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("no schema registered for type '{type_name}'")]
    NotRegistered { type_name: String },

    #[error("type '{type_name}' cannot be introspected: not found in the type index")]
    UnresolvedReference { type_name: String },
}

/// Errors loading a model file.
#[derive(Debug, Error)]
pub enum ModelError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model at {path}: {message}")]
    InvalidModel { path: String, message: String },

    #[error("invalid type expression \"{expr}\": {message}")]
    InvalidTypeExpression { expr: String, message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ModelError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ModelError::FileNotFound { .. } | ModelError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during validation of an instance against a resolved schema.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("resolved schema rejected by validator: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<Violation> },
}

impl From<SchemaError> for ValidateError {
    fn from(err: SchemaError) -> Self {
        ValidateError::Model(ModelError::Schema(err))
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Model(e) => e.exit_code(),
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Violation {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
