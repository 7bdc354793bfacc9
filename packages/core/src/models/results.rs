//! Operation result types returned by the hierarchy services

use serde::{Deserialize, Serialize};

/// Outcome of a single cascade sweep
///
/// `scanned` counts records the sweep's filter matched; `updated` counts
/// point updates actually written. On an already-consistent tree a sweep
/// reports `updated == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// Records matched by the sweep's filter
    pub scanned: usize,
    /// Point updates issued and acknowledged
    pub updated: usize,
}

impl CascadeReport {
    /// Combine two sweep reports
    pub fn merge(self, other: CascadeReport) -> Self {
        Self {
            scanned: self.scanned + other.scanned,
            updated: self.updated + other.updated,
        }
    }
}

/// Result of moving a node to a new parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    /// Path the node had before the move
    pub previous_path: String,
    /// Path the node has now
    pub new_path: String,
    /// Descendant rewrite outcome (empty report if no cascade was needed)
    pub cascade: CascadeReport,
}

/// Result of a delete operation
///
/// Deleting a missing node is idempotent: it succeeds with `existed = false`.
///
/// # Examples
///
/// ```rust
/// use matpath_core::models::DeleteResult;
///
/// let result = DeleteResult::not_found();
/// assert!(!result.existed);
/// assert_eq!(result.removed, 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// Whether the node existed before deletion
    pub existed: bool,
    /// Records removed, including the node itself
    pub removed: u64,
    /// Direct children promoted to the deleted node's parent
    pub reparented: usize,
    /// Descendant paths rewritten to drop the deleted segment
    pub paths_rewritten: usize,
}

impl DeleteResult {
    /// Create a DeleteResult indicating the node didn't exist
    pub fn not_found() -> Self {
        Self::default()
    }
}
