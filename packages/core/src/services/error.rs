//! Service Layer Error Types
//!
//! This module defines the error type returned by every `HierarchyService`
//! operation.
//!
//! # Partial failure
//!
//! A node's own write commits independently of its descendant cascade. When
//! an operation fails with [`HierarchyError::Store`] or
//! [`HierarchyError::CascadeTask`] after that write, the node is correct but
//! some descendants may still carry stale paths. No automatic repair happens;
//! re-driving with `HierarchyService::rebuild_paths` is safe and idempotent.

use crate::db::StoreError;
use crate::path::PathError;
use thiserror::Error;

/// Hierarchy operation errors
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// Parent id does not resolve to an existing record; nothing was written
    #[error("Broken reference: parent node '{parent_id}' does not exist")]
    BrokenReference { parent_id: String },

    /// Node addressed by the operation does not exist
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// A store adapter call failed
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// A stored path lacks the prefix its position in the tree implies
    ///
    /// Indicates pre-existing corruption; never masked.
    #[error(
        "Path invariant violated for node '{id}': path '{path}' does not start with '{expected_prefix}'"
    )]
    InvariantViolation {
        id: String,
        path: String,
        expected_prefix: String,
    },

    /// Move would place a node under itself or one of its descendants
    #[error("Circular reference detected: {context}")]
    CircularReference { context: String },

    /// Parent exists but has no materialized path to extend
    #[error("Parent node '{parent_id}' has no materialized path")]
    UnmaterializedParent { parent_id: String },

    /// Id cannot be encoded as a path segment
    #[error("Invalid node id '{id}': {reason}")]
    InvalidId {
        id: String,
        #[source]
        reason: PathError,
    },

    /// Create collided with an existing record
    #[error("Node already exists: {id}")]
    DuplicateId { id: String },

    /// Service configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A spawned cascade update panicked or was cancelled
    #[error("Cascade task failed: {0}")]
    CascadeTask(String),
}

impl HierarchyError {
    /// Create a broken reference error
    pub fn broken_reference(parent_id: impl Into<String>) -> Self {
        Self::BrokenReference {
            parent_id: parent_id.into(),
        }
    }

    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a circular reference error
    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }

    /// Convert a codec failure on a stored node's path
    ///
    /// A prefix mismatch becomes [`HierarchyError::InvariantViolation`]; id
    /// problems become [`HierarchyError::InvalidId`].
    pub fn from_path_error(id: impl Into<String>, err: PathError) -> Self {
        match err {
            PathError::PrefixMismatch { path, prefix } => Self::InvariantViolation {
                id: id.into(),
                path,
                expected_prefix: prefix,
            },
            other => Self::InvalidId {
                id: id.into(),
                reason: other,
            },
        }
    }

    /// Whether the error came from the store rather than from validation
    ///
    /// Store failures may leave a partially applied cascade behind.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_) | Self::CascadeTask(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_mismatch_becomes_invariant_violation() {
        let err = HierarchyError::from_path_error("C", PathError::prefix_mismatch("Q#C", "A#B"));
        match err {
            HierarchyError::InvariantViolation {
                id,
                path,
                expected_prefix,
            } => {
                assert_eq!(id, "C");
                assert_eq!(path, "Q#C");
                assert_eq!(expected_prefix, "A#B");
            }
            other => panic!("Expected InvariantViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            HierarchyError::broken_reference("p-1").to_string(),
            "Broken reference: parent node 'p-1' does not exist"
        );
        assert_eq!(
            HierarchyError::node_not_found("n-1").to_string(),
            "Node not found: n-1"
        );
    }

    #[test]
    fn test_store_failure_classification() {
        let store_err: HierarchyError = StoreError::backend("update", "disk full").into();
        assert!(store_err.is_store_failure());
        assert!(!HierarchyError::broken_reference("x").is_store_failure());
    }
}
