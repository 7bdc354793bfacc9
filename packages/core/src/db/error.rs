//! Store Error Types
//!
//! Errors surfaced by `DocumentStore` implementations. The hierarchy services
//! wrap these in `HierarchyError::Store` and abort any remaining cascade work.

use thiserror::Error;

/// Document store operation errors
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Point update or lookup addressed a record that doesn't exist
    #[error("Record not found: {id}")]
    NodeNotFound { id: String },

    /// Insert collided with an existing record id
    #[error("Record already exists: {id}")]
    DuplicateId { id: String },

    /// Filter could not be translated into the backend's query language
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Backend call failed (I/O, connection, driver error)
    #[error("Store {operation} failed: {message}")]
    Backend { operation: String, message: String },
}

impl StoreError {
    /// Create a record not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a duplicate id error
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Create a backend failure error
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl From<regex::Error> for StoreError {
    fn from(err: regex::Error) -> Self {
        StoreError::InvalidFilter(err.to_string())
    }
}
