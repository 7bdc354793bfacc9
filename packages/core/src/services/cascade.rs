//! Cascade Engine
//!
//! Sweeps that bring descendant records back in line with a structural
//! change to one of their ancestors:
//!
//! - [`CascadeEngine::rewrite_descendants`] - prefix rewrite after a move
//! - [`CascadeEngine::reparent_children`] - promote children of a deleted node
//!   and splice its segment out of every descendant path
//! - [`CascadeEngine::delete_subtree`] - bulk removal of a deleted node's subtree
//! - [`CascadeEngine::rebuild_subtree`] - recompute paths from parent pointers
//!
//! # Fan-out discipline
//!
//! Every sweep plans independent point updates (one per record, keyed by id)
//! and dispatches each as its own tokio task, keeping at most
//! `cascade_concurrency` in flight. A sweep completes only when every
//! dispatched update is acknowledged. The first failure stops the wait and is
//! returned; tasks already dispatched are not recalled and finish in the
//! background. Nothing is rolled back.
//!
//! Because each planned update is computed from the record's current state,
//! re-running a sweep over already-correct records writes nothing.

use crate::db::{DocumentStore, NodeFilter};
use crate::models::{CascadeReport, Node, NodeUpdate};
use crate::path::PathCodec;
use crate::services::error::HierarchyError;
use crate::services::query::HierarchyQuery;
use futures::future::{self, Future};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// One scanned record's planned write, `None` if it is already correct
type Planned = Result<Option<PlannedUpdate>, HierarchyError>;

/// A single point update scheduled by a sweep
#[derive(Debug, Clone)]
struct PlannedUpdate {
    id: String,
    update: NodeUpdate,
}

impl PlannedUpdate {
    fn path(id: String, path: String) -> Self {
        Self {
            id,
            update: NodeUpdate::new().with_path(path),
        }
    }

    fn parent(id: String, parent: Option<String>) -> Self {
        Self {
            id,
            update: NodeUpdate::new().with_parent(parent),
        }
    }
}

/// Outcome of the two-phase reparenting sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReparentOutcome {
    /// Direct-children parent reassignment
    pub children: CascadeReport,
    /// Segment splice over all descendant paths
    pub paths: CascadeReport,
}

impl ReparentOutcome {
    /// Both phases as one report
    pub fn combined(&self) -> CascadeReport {
        self.children.merge(self.paths)
    }
}

/// Drives descendant sweeps against a [`DocumentStore`]
#[derive(Clone)]
pub struct CascadeEngine {
    store: Arc<dyn DocumentStore>,
    codec: PathCodec,
    query: HierarchyQuery,
    concurrency: usize,
}

impl CascadeEngine {
    pub fn new(store: Arc<dyn DocumentStore>, codec: PathCodec, concurrency: usize) -> Self {
        Self {
            store,
            codec,
            query: HierarchyQuery::new(codec),
            concurrency: concurrency.max(1),
        }
    }

    /// Rewrite every descendant path from `old_prefix` to `new_prefix`
    ///
    /// Descendants are the records whose path starts with `old_prefix`
    /// followed by the separator. Both prefixes are owned snapshots taken
    /// before the triggering write.
    ///
    /// # Errors
    ///
    /// - `InvariantViolation` if a scanned record doesn't carry `old_prefix`
    /// - `Store` / `CascadeTask` on the first failed update
    pub async fn rewrite_descendants(
        &self,
        old_prefix: String,
        new_prefix: String,
    ) -> Result<CascadeReport, HierarchyError> {
        let filter = self.query.descendants_of_path(&old_prefix);
        let codec = self.codec;

        tracing::debug!(
            "Rewriting descendant paths '{}' -> '{}' ({})",
            old_prefix,
            new_prefix,
            filter
        );

        let planned = self.store.stream_scan(filter).map(move |scanned| -> Planned {
            let node = scanned?;
            let new_path = codec
                .rewrite_prefix(&node.path, &old_prefix, &new_prefix)
                .map_err(|e| HierarchyError::from_path_error(node.id.clone(), e))?;

            if new_path == node.path {
                return Ok(None);
            }
            Ok(Some(PlannedUpdate::path(node.id, new_path)))
        });

        self.fan_out(planned).await
    }

    /// Promote the children of `deleted` and drop its segment from descendant paths
    ///
    /// Phase 1 points every direct child at `deleted.parent` (possibly root).
    /// Phase 2 starts only once phase 1 is fully acknowledged, and removes the
    /// `deleted.id` segment wherever it occurs in a descendant's chain.
    pub async fn reparent_children(
        &self,
        deleted: &Node,
    ) -> Result<ReparentOutcome, HierarchyError> {
        let new_parent = deleted.parent.clone();

        let reassign = self
            .store
            .stream_scan(NodeFilter::children_of(deleted.id.clone()))
            .map(move |scanned| -> Planned {
                let child = scanned?;
                if child.parent == new_parent {
                    return Ok(None);
                }
                Ok(Some(PlannedUpdate::parent(child.id, new_parent.clone())))
            });
        let children = self.fan_out(reassign).await?;

        tracing::debug!(
            "Reparented {} children of '{}' to {:?}",
            children.updated,
            deleted.id,
            deleted.parent
        );

        let codec = self.codec;
        let deleted_id = deleted.id.clone();
        let splice = self
            .store
            .stream_scan(self.query.segment_holders(&deleted.id))
            .map(move |scanned| -> Planned {
                let node = scanned?;
                Ok(codec
                    .remove_segment(&node.path, &deleted_id)
                    .map(|path| PlannedUpdate::path(node.id, path)))
            });
        let paths = self.fan_out(splice).await?;

        Ok(ReparentOutcome { children, paths })
    }

    /// Remove every record strictly below `path` with one bulk delete
    pub async fn delete_subtree(&self, path: &str) -> Result<u64, HierarchyError> {
        let removed = self
            .store
            .bulk_delete(self.query.descendants_of_path(path))
            .await?;

        tracing::debug!("Bulk-deleted {} descendants under '{}'", removed, path);
        Ok(removed)
    }

    /// Recompute paths under `root` by walking parent pointers
    ///
    /// `root_path` is the path `root` should have. Each level is fanned out
    /// before descending, so a failure leaves deeper levels untouched and a
    /// retry picks up where this one stopped. Cycles in the parent pointers
    /// are broken by visiting each id once.
    pub async fn rebuild_subtree(
        &self,
        root: Node,
        root_path: String,
    ) -> Result<CascadeReport, HierarchyError> {
        let mut report = CascadeReport::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut level = vec![(root, root_path)];

        while !level.is_empty() {
            let mut updates = Vec::new();
            let mut next = Vec::new();

            for (node, expected) in level {
                if !visited.insert(node.id.clone()) {
                    tracing::warn!("Parent cycle through '{}' skipped during rebuild", node.id);
                    continue;
                }
                report.scanned += 1;

                let children = self
                    .store
                    .find(NodeFilter::children_of(node.id.clone()))
                    .await?;
                for child in children {
                    let child_path = self.codec.child_path(&expected, &child.id);
                    next.push((child, child_path));
                }

                if node.path != expected {
                    updates.push(PlannedUpdate::path(node.id, expected));
                }
            }

            let written = self
                .fan_out(stream::iter(updates.into_iter().map(|u| Ok(Some(u)))))
                .await?;
            report.updated += written.updated;
            level = next;
        }

        Ok(report)
    }

    /// Dispatch planned updates with bounded concurrency and await them all
    ///
    /// `planned` yields one item per scanned record: `Ok(None)` for a record
    /// that needs no write, `Ok(Some(_))` for one that does.
    async fn fan_out<S>(&self, planned: S) -> Result<CascadeReport, HierarchyError>
    where
        S: Stream<Item = Planned> + Send,
    {
        let store = Arc::clone(&self.store);
        let mut scanned = 0usize;

        let acknowledged = planned
            .inspect_ok(|_| scanned += 1)
            .try_filter_map(|planned| future::ready(Ok(planned)))
            .map_ok(move |planned| dispatch(Arc::clone(&store), planned))
            .try_buffer_unordered(self.concurrency)
            .try_fold(0usize, |count, ()| future::ready(Ok(count + 1)))
            .await;

        let updated = acknowledged.map_err(|e| {
            tracing::error!("Cascade sweep aborted after {} records: {}", scanned, e);
            e
        })?;

        Ok(CascadeReport { scanned, updated })
    }
}

/// Spawn one point update and return a future for its acknowledgement
///
/// The update is started immediately; dropping the returned future detaches
/// the task instead of cancelling it.
fn dispatch(
    store: Arc<dyn DocumentStore>,
    planned: PlannedUpdate,
) -> impl Future<Output = Result<(), HierarchyError>> {
    let PlannedUpdate { id, update } = planned;
    let handle = tokio::spawn(async move { store.update(&id, update).await.map(|_| ()) });

    async move {
        match handle.await {
            Ok(result) => result.map_err(HierarchyError::from),
            Err(join_err) => Err(HierarchyError::CascadeTask(join_err.to_string())),
        }
    }
}
