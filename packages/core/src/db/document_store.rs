//! DocumentStore Trait - Storage Abstraction Layer
//!
//! This module defines the `DocumentStore` trait, the only boundary the
//! hierarchy services depend on. The storage engine itself is external; any
//! backend that can answer the filters in [`NodeFilter`] and apply
//! single-document updates can host a materialized-path tree.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All I/O methods are async so embedded and networked
//!    backends fit the same contract
//! 2. **No transactions**: Every call is independent. The services emulate
//!    the multi-document steps with ordered sweeps and accept partial failure
//! 3. **Read-your-writes**: Implementations must make a completed `update`
//!    visible to subsequent calls made by the same logical operation
//! 4. **Ownership Semantics**: Methods take ownership of nodes, filters and
//!    updates; callers clone if they need to retain them
//!
//! # Examples
//!
//! ```rust,no_run
//! use matpath_core::db::{DocumentStore, InMemoryStore, NodeFilter};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), matpath_core::db::StoreError> {
//! let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
//! let roots = store.find(NodeFilter::roots()).await?;
//! println!("{} roots", roots.len());
//! # Ok(())
//! # }
//! ```

use crate::db::{NodeFilter, StoreError};
use crate::models::{Node, NodeUpdate};
use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

/// Abstraction over the flat document collection holding the nodes
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the cascade engines share one store
/// across spawned update tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocate a fresh record id
    ///
    /// Ids must never contain the configured path separator. The default
    /// produces a UUID v4, which contains only hex digits and `-`.
    fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Return one record matching `filter`, if any
    async fn find_one(&self, filter: NodeFilter) -> Result<Option<Node>, StoreError>;

    /// Return every record matching `filter`, in no particular order
    async fn find(&self, filter: NodeFilter) -> Result<Vec<Node>, StoreError>;

    /// Lazily scan records matching `filter`
    ///
    /// The stream is finite and not restartable. Errors may surface as
    /// individual items.
    fn stream_scan(&self, filter: NodeFilter) -> BoxStream<'_, Result<Node, StoreError>>;

    /// Insert a new record
    ///
    /// # Errors
    ///
    /// `StoreError::DuplicateId` if a record with the same id exists.
    async fn insert(&self, node: Node) -> Result<Node, StoreError>;

    /// Apply a sparse point update to the record with `id`
    ///
    /// # Errors
    ///
    /// `StoreError::NodeNotFound` if no such record exists.
    async fn update(&self, id: &str, update: NodeUpdate) -> Result<Node, StoreError>;

    /// Delete every record matching `filter` in one store-level operation
    ///
    /// Returns the number of records removed.
    async fn bulk_delete(&self, filter: NodeFilter) -> Result<u64, StoreError>;
}
