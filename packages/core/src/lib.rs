//! Materialized-Path Hierarchy Maintenance
//!
//! This crate keeps a tree of documents navigable inside a flat document
//! store. Every node carries a `parent` pointer and a materialized `path`
//! (ancestor ids plus its own id joined by a separator), so descendant
//! lookups become a single prefix query.
//!
//! # Architecture
//!
//! - **Flat store**: The storage engine knows nothing about trees; it offers
//!   filtered reads, point updates and bulk deletes via [`db::DocumentStore`]
//! - **Paths as derived data**: Paths are always computed from parent pointers,
//!   never accepted from callers
//! - **Bounded cascades**: Descendant rewrites fan out with a configurable
//!   concurrency limit and abort on the first failure
//! - **Repairable**: A failed cascade leaves stale paths that
//!   `HierarchyService::rebuild_paths` recomputes idempotently
//!
//! # Modules
//!
//! - [`path`] - Path encoding and prefix arithmetic
//! - [`models`] - Data structures (Node, NodeUpdate, results, NodeTree)
//! - [`db`] - Store adapter contract, filters, in-memory store, events
//! - [`services`] - HierarchyService and its cascade engine
//! - [`config`] - Separator, on-delete policy, cascade concurrency
//! - [`logging`] - Optional tracing subscriber setup

pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod path;
pub mod services;

// Re-export commonly used types
pub use config::{HierarchyConfig, OnDeletePolicy};
pub use db::{DocumentStore, HierarchyEvent, InMemoryStore, NodeFilter, StoreError};
pub use models::*;
pub use path::{PathCodec, PathError, DEFAULT_SEPARATOR};
pub use services::*;
