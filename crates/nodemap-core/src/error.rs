//! Error types for Nodemap Core

use crate::label::InstanceId;
use thiserror::Error;

/// Result type alias using Nodemap's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Nodemap error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Instance already exists: {0}")]
    DuplicateId(InstanceId),

    #[error("Instance not found: {0}")]
    UnknownInstance(InstanceId),

    #[error("Query path is empty")]
    EmptyQuery,

    #[error("Invalid query path: {0}")]
    InvalidQuery(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
