//! Node Data Structures
//!
//! This module defines the `Node` record stored once per document in the flat
//! collection, and the sparse `NodeUpdate` field-set used for point updates.
//!
//! # Architecture
//!
//! - **Parent pointer**: `parent` is the direct edge to the parent record
//! - **Materialized path**: `path` is the full ancestor chain, root first,
//!   redundant with `parent` so subtree queries become prefix queries
//! - **Opaque payload**: `properties` is carried through untouched
//!
//! # Examples
//!
//! ```rust
//! use matpath_core::models::Node;
//! use serde_json::json;
//!
//! let root = Node::new_with_id("A".to_string(), None, "A".to_string(), json!({}));
//! let child = Node::new_with_id(
//!     "B".to_string(),
//!     Some("A".to_string()),
//!     "A#B".to_string(),
//!     json!({ "title": "Chapter 1" }),
//! );
//!
//! assert!(root.is_root());
//! assert!(!child.is_root());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A record participating in the hierarchy
///
/// # Invariants (for every persisted node)
///
/// - `path` is non-empty
/// - the last segment of `path` equals `id`
/// - every ancestor id appears in `path`, in chain order, before `id`
///
/// Records written by older versions may carry an empty `path`; the services
/// treat those as having no descendants to cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier, immutable once created
    pub id: String,

    /// Parent node ID (`None` = root)
    #[serde(default)]
    pub parent: Option<String>,

    /// Materialized ancestor path, root first, ending with `id`
    #[serde(default)]
    pub path: String,

    /// Document payload, not interpreted by the hierarchy layer
    #[serde(default = "empty_properties")]
    pub properties: serde_json::Value,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

fn empty_properties() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Node {
    /// Create a node with an explicit id and path
    ///
    /// Does not check that `path` is consistent with `parent`; the
    /// `HierarchyService` is responsible for computing paths.
    pub fn new_with_id(
        id: String,
        parent: Option<String>,
        path: String,
        properties: serde_json::Value,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            parent,
            path,
            properties,
            created_at: now,
            modified_at: now,
        }
    }

    /// Check if this node is a root (has no parent)
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether the node carries a materialized path at all
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// Apply a sparse update in place and bump `modified_at`
    ///
    /// Returns `true` if any field was present in the update.
    pub fn apply_update(&mut self, update: NodeUpdate) -> bool {
        if update.is_empty() {
            return false;
        }

        if let Some(parent) = update.parent {
            self.parent = parent;
        }
        if let Some(path) = update.path {
            self.path = path;
        }
        if let Some(properties) = update.properties {
            self.properties = properties;
        }

        self.modified_at = Utc::now();
        true
    }
}

/// Custom deserializer for double-Option fields
///
/// Distinguishes "field absent" (outer `None`, via `#[serde(default)]`) from
/// "field explicitly null" (`Some(None)`).
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Sparse field-set for a single-document point update
///
/// Only fields that are `Some` are written.
///
/// # Double-Option Pattern for `parent`
///
/// - `None`: don't change parent
/// - `Some(None)`: make the node a root
/// - `Some(Some(id))`: set parent to `id`
///
/// # Examples
///
/// ```rust
/// use matpath_core::models::NodeUpdate;
///
/// let update = NodeUpdate::new()
///     .with_parent(Some("A".to_string()))
///     .with_path("A#C".to_string());
/// assert!(!update.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    /// Update parent reference
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent: Option<Option<String>>,

    /// Update materialized path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Replace properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

impl NodeUpdate {
    /// Create a new empty NodeUpdate
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parent update (`None` makes the node a root)
    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set path update
    pub fn with_path(mut self, path: String) -> Self {
        self.path = Some(path);
        self
    }

    /// Set properties update
    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Check if update contains any changes
    pub fn is_empty(&self) -> bool {
        self.parent.is_none() && self.path.is_none() && self.properties.is_none()
    }
}
