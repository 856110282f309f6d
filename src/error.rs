//! Error types for the openapi-extension-gen crate.

use std::fmt;
use std::path::PathBuf;

/// A single problem found while validating extension definitions.
///
/// These are collected in bulk by the registry builder rather than returned
/// at the first failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The definition has no `id`, or an empty one.
    #[error(
        "schema {name} has no 'id' field, which must match the name of the \
         OpenAPI extension that the schema represents"
    )]
    MissingId { name: String },

    /// The definition claims an `id` already claimed by `first`.
    #[error("schema {name} and {first} have the same 'id' field value '{id}'")]
    DuplicateId {
        name: String,
        first: String,
        id: String,
    },

    /// The definition's `type` is neither `object` nor a supported scalar.
    #[error(
        "schema {name} has type '{type_tag}' which is not supported. \
         Supported primitive types are [{}]",
        .supported.join(", ")
    )]
    UnsupportedType {
        name: String,
        type_tag: String,
        supported: Vec<&'static str>,
    },

    /// The definition's message name is already generated for `first`.
    #[error("schema {name} and {first} both generate the message '{type_name}'")]
    DuplicateTypeName {
        name: String,
        first: String,
        type_name: String,
    },

    /// The definition's name has no letters or digits to build a message
    /// name from.
    #[error("schema {name} has no letters or digits to name its message after")]
    InvalidTypeName { name: String },
}

/// The complete, non-empty batch of validation problems for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wrap a batch. Returns `None` for an empty batch.
    pub fn new(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema validation failed with {} error(s):", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors that can occur while generating an extension.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write generated files.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parse error with context.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The schema document could not be resolved.
    #[error("schema error: {0}")]
    Schema(String),

    /// The schema file name lacks the `x-` extension marker.
    #[error("schema file name has to start with 'x-': {path}")]
    InvalidSchemaFileName { path: PathBuf },

    /// One or more extension definitions are invalid.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The external formatter failed on a generated file.
    #[error("failed to format {path}: {detail}")]
    Format { path: PathBuf, detail: String },
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
