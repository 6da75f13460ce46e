//! Error types for courier lookups and the outstanding-query registry.

use crate::types::CourierId;
use thiserror::Error;

/// Main error type for registry, store and service operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid predicate key: {0}")]
    InvalidPredicateKey(String),

    #[error("Courier already exists: {0}")]
    CourierExists(CourierId),

    #[error("Courier not found: {0}")]
    CourierNotFound(CourierId),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lookup cancelled")]
    LookupCancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Config(e.to_string())
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
