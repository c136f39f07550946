//! Error types shared by the data model.

use thiserror::Error;

/// Errors raised while redefining or removing fields of a `SlimStream`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The referenced field is not part of the stream.
    #[error("field '{0}' not found in stream")]
    FieldNotFound(String),
    /// The target name is already taken by another field.
    #[error("field '{0}' already exists in stream")]
    FieldAlreadyExists(String),
}

/// Errors raised by [`Record`](crate::record::Record) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record has no field '{0}'")]
    FieldNotFound(String),
    #[error("record already has a field '{0}'")]
    FieldAlreadyExists(String),
    /// The record payload is not a JSON object.
    #[error("record data must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Errors raised when parsing closed enumerations from strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("unsupported hashing method: {0}")]
    UnsupportedHashingMethod(String),
    #[error("unknown mapper: {0}")]
    UnknownMapper(String),
}
