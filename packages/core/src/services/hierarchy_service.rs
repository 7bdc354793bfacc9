//! Hierarchy Service - Path-Maintaining Mutations and Tree Queries
//!
//! This module provides the business logic layer that keeps every node's
//! materialized `path` consistent with its `parent` pointer:
//!
//! - Mutations (`create_node`, `move_node`, `save_node`, `delete_node`)
//! - Tree queries (`get_children`, `get_parent`, `get_ancestors`, `level`,
//!   `get_children_tree`)
//! - Repair (`rebuild_paths`)
//!
//! # Consistency model
//!
//! The store has no multi-document transactions. Each mutation first writes
//! the node itself, then cascades to its descendants. A failure during the
//! cascade is reported as the operation's failure, but the node's own write
//! has already committed; see [`HierarchyError`] for how to recover.
//!
//! Concurrent mutations of overlapping subtrees are not detected. Callers
//! must treat a single node's save or remove as a critical section; two moves
//! racing on ancestors of the same subtree can interleave destructively.

use crate::config::{HierarchyConfig, OnDeletePolicy};
use crate::db::{DocumentStore, HierarchyEvent, NodeFilter, StoreError};
use crate::models::{CascadeReport, DeleteResult, MoveResult, Node, NodeTree, NodeUpdate};
use crate::path::PathCodec;
use crate::services::cascade::CascadeEngine;
use crate::services::error::HierarchyError;
use crate::services::query::HierarchyQuery;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel capacity for hierarchy events.
///
/// Observers that fall further behind than this lose the oldest events.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Parameters for creating a node
///
/// # Examples
///
/// ```rust
/// use matpath_core::services::CreateNodeParams;
/// use serde_json::json;
///
/// // Store-assigned id, root node
/// let root = CreateNodeParams::root(json!({ "title": "Inbox" }));
///
/// // Caller-provided id under an existing parent
/// let child = CreateNodeParams {
///     id: Some("chapter-1".to_string()),
///     parent: Some("book".to_string()),
///     properties: json!({}),
/// };
/// # let _ = (root, child);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CreateNodeParams {
    /// Optional id; if `None` the store generates one
    pub id: Option<String>,
    /// Optional parent id (`None` = root)
    pub parent: Option<String>,
    /// Document payload
    pub properties: serde_json::Value,
}

impl CreateNodeParams {
    /// Root node with a store-assigned id
    pub fn root(properties: serde_json::Value) -> Self {
        Self {
            id: None,
            parent: None,
            properties,
        }
    }

    /// Child of `parent` with a store-assigned id
    pub fn child_of(parent: impl Into<String>, properties: serde_json::Value) -> Self {
        Self {
            id: None,
            parent: Some(parent.into()),
            properties,
        }
    }

    /// Use a caller-provided id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Service maintaining materialized paths over a [`DocumentStore`]
///
/// # Examples
///
/// ```rust
/// use matpath_core::db::InMemoryStore;
/// use matpath_core::services::{CreateNodeParams, HierarchyService};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let service = HierarchyService::new(Arc::new(InMemoryStore::new())).unwrap();
///
/// let a = service.create_node(CreateNodeParams::root(json!({})).with_id("A")).await.unwrap();
/// let b = service.create_node(CreateNodeParams::child_of("A", json!({})).with_id("B")).await.unwrap();
/// assert_eq!(b.path, "A#B");
///
/// service.move_node("B", None).await.unwrap();
/// let b = service.get_node("B").await.unwrap().unwrap();
/// assert_eq!(b.path, "B");
/// # let _ = a;
/// # });
/// ```
pub struct HierarchyService {
    store: Arc<dyn DocumentStore>,
    config: HierarchyConfig,
    codec: PathCodec,
    query: HierarchyQuery,
    cascade: CascadeEngine,
    event_tx: broadcast::Sender<HierarchyEvent>,
}

impl HierarchyService {
    /// Create a service with the default configuration
    pub fn new(store: Arc<dyn DocumentStore>) -> Result<Self, HierarchyError> {
        Self::with_config(store, HierarchyConfig::default())
    }

    /// Create a service with an explicit configuration
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `config.validate()` fails.
    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        config: HierarchyConfig,
    ) -> Result<Self, HierarchyError> {
        config.validate().map_err(HierarchyError::InvalidConfig)?;

        let codec = config.codec();
        let cascade = CascadeEngine::new(Arc::clone(&store), codec, config.cascade_concurrency);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            store,
            config,
            codec,
            query: HierarchyQuery::new(codec),
            cascade,
            event_tx,
        })
    }

    /// The configuration this service runs with
    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Codec for the configured separator
    pub fn codec(&self) -> PathCodec {
        self.codec
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Subscribe to hierarchy events emitted after successful mutations
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<HierarchyEvent> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: HierarchyEvent) {
        // No subscribers is not an error
        let _ = self.event_tx.send(event);
    }

    //
    // MUTATIONS
    //

    /// Create a node, computing its path from its parent
    ///
    /// # Errors
    ///
    /// - `InvalidId` if the id is empty or contains the separator
    /// - `BrokenReference` if the parent does not exist (nothing is written)
    /// - `UnmaterializedParent` if the parent has no path
    /// - `DuplicateId` if a node with the id already exists
    pub async fn create_node(&self, params: CreateNodeParams) -> Result<Node, HierarchyError> {
        let id = match params.id {
            Some(id) => id,
            None => self.store.generate_id(),
        };

        let node = Node::new_with_id(id, params.parent, String::new(), params.properties);
        self.insert_with_path(node).await
    }

    async fn insert_with_path(&self, mut node: Node) -> Result<Node, HierarchyError> {
        self.codec
            .validate_id(&node.id)
            .map_err(|e| HierarchyError::from_path_error(node.id.clone(), e))?;

        node.path = self.compute_path(&node.id, node.parent.as_deref()).await?;

        let created = self.store.insert(node).await.map_err(|e| match e {
            StoreError::DuplicateId { id } => HierarchyError::DuplicateId { id },
            other => HierarchyError::Store(other),
        })?;

        tracing::debug!("Created node '{}' at '{}'", created.id, created.path);
        self.emit_event(HierarchyEvent::NodeCreated {
            id: created.id.clone(),
            parent: created.parent.clone(),
            path: created.path.clone(),
        });

        Ok(created)
    }

    /// Move a node under `new_parent` (`None` = make it a root)
    ///
    /// Writes the node's new `parent` and `path`, then rewrites the path of
    /// every descendant before returning.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the node does not exist
    /// - `BrokenReference` if the new parent does not exist (nothing is written)
    /// - `CircularReference` if the new parent is the node or one of its descendants
    /// - `Store` / `CascadeTask` / `InvariantViolation` from the cascade, after
    ///   the node's own write has committed
    pub async fn move_node(
        &self,
        id: &str,
        new_parent: Option<&str>,
    ) -> Result<MoveResult, HierarchyError> {
        let node = self.require_node(id).await?;

        // Snapshot before any write; the cascade works from this value only
        let previous_path = node.path.clone();
        let new_path = self.compute_path(id, new_parent).await?;
        let new_parent = new_parent.map(str::to_string);

        if node.parent == new_parent && previous_path == new_path {
            tracing::debug!("Move of '{}' is a no-op", id);
            return Ok(MoveResult {
                new_path,
                previous_path,
                cascade: CascadeReport::default(),
            });
        }

        self.store
            .update(
                id,
                NodeUpdate::new()
                    .with_parent(new_parent)
                    .with_path(new_path.clone()),
            )
            .await?;

        let cascade = if previous_path.is_empty() {
            tracing::warn!(
                "Node '{}' had no materialized path; descendants not rewritten",
                id
            );
            CascadeReport::default()
        } else if previous_path == new_path {
            CascadeReport::default()
        } else {
            self.cascade
                .rewrite_descendants(previous_path.clone(), new_path.clone())
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Node '{}' moved to '{}' but descendant cascade failed: {}",
                        id,
                        new_path,
                        e
                    );
                    e
                })?
        };

        tracing::info!(
            "Moved node '{}' from '{}' to '{}' ({} descendants rewritten)",
            id,
            previous_path,
            new_path,
            cascade.updated
        );
        self.emit_event(HierarchyEvent::NodeMoved {
            id: id.to_string(),
            previous_path: previous_path.clone(),
            new_path: new_path.clone(),
            descendants_updated: cascade.updated,
        });

        Ok(MoveResult {
            previous_path,
            new_path,
            cascade,
        })
    }

    /// Persist a node, creating or re-parenting it as needed
    ///
    /// - Unknown id: created with a computed path
    /// - Parent changed (or no stored path): moved, with descendant cascade
    /// - Properties changed: written with a point update
    ///
    /// The `path` field of the argument is ignored; paths are always computed.
    pub async fn save_node(&self, node: Node) -> Result<Node, HierarchyError> {
        let existing = match self.store.find_one(NodeFilter::id(node.id.clone())).await? {
            Some(existing) => existing,
            None => return self.insert_with_path(node).await,
        };

        if existing.parent != node.parent || !existing.has_path() {
            self.move_node(&node.id, node.parent.as_deref()).await?;
        }

        if existing.properties != node.properties {
            self.store
                .update(&node.id, NodeUpdate::new().with_properties(node.properties))
                .await?;
        }

        self.require_node(&node.id).await
    }

    /// Delete a node using the configured on-delete policy
    pub async fn delete_node(&self, id: &str) -> Result<DeleteResult, HierarchyError> {
        self.delete_node_with_policy(id, self.config.on_delete)
            .await
    }

    /// Delete a node, handling its descendants according to `policy`
    ///
    /// The descendant sweep runs before the node itself is removed. Deleting a
    /// missing node succeeds with `existed = false`.
    ///
    /// # Errors
    ///
    /// `Store` / `CascadeTask` if a sweep fails. In that case the node has
    /// not been removed, and some descendants may already be reparented.
    pub async fn delete_node_with_policy(
        &self,
        id: &str,
        policy: OnDeletePolicy,
    ) -> Result<DeleteResult, HierarchyError> {
        let node = match self.store.find_one(NodeFilter::id(id)).await? {
            Some(node) => node,
            None => return Ok(DeleteResult::not_found()),
        };

        let mut result = DeleteResult {
            existed: true,
            ..DeleteResult::default()
        };

        if node.has_path() {
            match policy {
                OnDeletePolicy::DeleteSubtree => {
                    result.removed += self.cascade.delete_subtree(&node.path).await?;
                }
                OnDeletePolicy::Reparent => {
                    let outcome = self.cascade.reparent_children(&node).await?;
                    let total = outcome.combined();
                    tracing::debug!(
                        "Reparent sweep under '{}': {} scanned, {} written",
                        id,
                        total.scanned,
                        total.updated
                    );
                    result.reparented = outcome.children.updated;
                    result.paths_rewritten = outcome.paths.updated;
                }
            }
        } else {
            tracing::warn!(
                "Node '{}' has no materialized path; deleting without cascade",
                id
            );
        }

        result.removed += self.store.bulk_delete(NodeFilter::id(id)).await?;

        tracing::info!(
            "Deleted node '{}' ({}): removed={}, reparented={}, paths_rewritten={}",
            id,
            policy,
            result.removed,
            result.reparented,
            result.paths_rewritten
        );
        self.emit_event(HierarchyEvent::NodeDeleted {
            id: id.to_string(),
            policy,
            removed: result.removed,
        });

        Ok(result)
    }

    /// Recompute the paths of a node and its whole subtree from parent pointers
    ///
    /// Repairs the stale descendants a failed cascade leaves behind. Safe to
    /// run any number of times: records that are already correct are not
    /// written.
    pub async fn rebuild_paths(&self, id: &str) -> Result<CascadeReport, HierarchyError> {
        let node = self.require_node(id).await?;
        let expected = self.compute_path(id, node.parent.as_deref()).await?;

        let report = self.cascade.rebuild_subtree(node, expected).await?;

        tracing::info!(
            "Rebuilt paths under '{}': {} scanned, {} rewritten",
            id,
            report.scanned,
            report.updated
        );
        if report.updated > 0 {
            self.emit_event(HierarchyEvent::PathsRewritten {
                root_id: id.to_string(),
                updated: report.updated,
            });
        }

        Ok(report)
    }

    //
    // QUERIES
    //

    /// Get a node by id
    pub async fn get_node(&self, id: &str) -> Result<Option<Node>, HierarchyError> {
        Ok(self.store.find_one(NodeFilter::id(id)).await?)
    }

    /// Children of the node with `id`
    ///
    /// With `recursive = false` returns direct children only; otherwise every
    /// descendant. Order is unspecified.
    pub async fn get_children(
        &self,
        id: &str,
        recursive: bool,
    ) -> Result<Vec<Node>, HierarchyError> {
        let node = self.require_node(id).await?;
        self.get_children_of(&node, recursive).await
    }

    /// Children of an already-loaded node
    pub async fn get_children_of(
        &self,
        node: &Node,
        recursive: bool,
    ) -> Result<Vec<Node>, HierarchyError> {
        if recursive && !node.has_path() {
            return self.collect_subtree_by_parent(&node.id).await;
        }

        Ok(self.store.find(self.query.children(node, recursive)).await?)
    }

    /// Every descendant of the node with `id`
    pub async fn get_descendants(&self, id: &str) -> Result<Vec<Node>, HierarchyError> {
        self.get_children(id, true).await
    }

    /// Parent of the node with `id`, `None` for a root
    pub async fn get_parent(&self, id: &str) -> Result<Option<Node>, HierarchyError> {
        let node = self.require_node(id).await?;
        self.get_parent_of(&node).await
    }

    /// Parent of an already-loaded node
    pub async fn get_parent_of(&self, node: &Node) -> Result<Option<Node>, HierarchyError> {
        match self.query.parent(node) {
            Some(filter) => Ok(self.store.find_one(filter).await?),
            None => Ok(None),
        }
    }

    /// Ancestors of the node with `id`, root first, excluding the node itself
    pub async fn get_ancestors(&self, id: &str) -> Result<Vec<Node>, HierarchyError> {
        let node = self.require_node(id).await?;
        self.get_ancestors_of(&node).await
    }

    /// Ancestors of an already-loaded node, root first
    ///
    /// Ancestors are fetched by id-set membership and then re-sorted into
    /// chain order, so the result never depends on store ordering.
    pub async fn get_ancestors_of(&self, node: &Node) -> Result<Vec<Node>, HierarchyError> {
        let filter = match self.query.ancestors(node) {
            Some(filter) => filter,
            None => return Ok(Vec::new()),
        };

        let chain = self.query.ancestor_ids(node);
        let found = self.store.find(filter).await?;
        let ordered = self.query.order_by_chain(&chain, found);

        if ordered.len() != chain.len() {
            tracing::warn!(
                "Node '{}' path '{}' names {} ancestors but only {} exist",
                node.id,
                node.path,
                chain.len(),
                ordered.len()
            );
        }

        Ok(ordered)
    }

    /// Depth of a node: the number of segments in its path (root = 1)
    pub fn level(&self, node: &Node) -> usize {
        self.codec.depth_of(&node.path)
    }

    /// The node with `id` and its whole subtree, nested
    pub async fn get_children_tree(&self, id: &str) -> Result<Option<NodeTree>, HierarchyError> {
        let root = match self.get_node(id).await? {
            Some(root) => root,
            None => return Ok(None),
        };

        let descendants = self.get_children_of(&root, true).await?;
        Ok(Some(NodeTree::build(root, descendants)))
    }

    //
    // HELPERS
    //

    async fn require_node(&self, id: &str) -> Result<Node, HierarchyError> {
        self.get_node(id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(id))
    }

    /// Path a node with `id` should have under `parent_id`
    async fn compute_path(
        &self,
        id: &str,
        parent_id: Option<&str>,
    ) -> Result<String, HierarchyError> {
        let parent_id = match parent_id {
            Some(parent_id) => parent_id,
            None => return Ok(self.codec.root_path(id)),
        };

        if parent_id == id {
            return Err(HierarchyError::circular_reference(format!(
                "Node '{}' cannot be its own parent",
                id
            )));
        }

        let parent = self
            .store
            .find_one(NodeFilter::id(parent_id))
            .await?
            .ok_or_else(|| HierarchyError::broken_reference(parent_id))?;

        if !parent.has_path() {
            return Err(HierarchyError::UnmaterializedParent {
                parent_id: parent_id.to_string(),
            });
        }

        if self.codec.contains_segment(&parent.path, id) {
            return Err(HierarchyError::circular_reference(format!(
                "Cannot move node '{}' under its descendant '{}'",
                id, parent_id
            )));
        }

        Ok(self.codec.child_path(&parent.path, id))
    }

    /// Breadth-first walk over parent pointers, for nodes without a path
    async fn collect_subtree_by_parent(&self, id: &str) -> Result<Vec<Node>, HierarchyError> {
        let mut visited: HashSet<String> = HashSet::from([id.to_string()]);
        let mut frontier = vec![id.to_string()];
        let mut collected = Vec::new();

        while let Some(current) = frontier.pop() {
            for child in self.store.find(NodeFilter::children_of(current)).await? {
                if visited.insert(child.id.clone()) {
                    frontier.push(child.id.clone());
                    collected.push(child);
                }
            }
        }

        Ok(collected)
    }
}

#[cfg(test)]
#[path = "hierarchy_service_test.rs"]
mod hierarchy_service_test;
