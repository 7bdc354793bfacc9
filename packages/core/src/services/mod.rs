//! Business Services
//!
//! This module contains the hierarchy maintenance logic:
//!
//! - `HierarchyService` - Path-maintaining create/move/save/delete and tree queries
//! - `CascadeEngine` - Bounded-concurrency descendant rewrites and sweeps
//! - `HierarchyQuery` - Filter builders for tree questions
//!
//! Services coordinate between the store adapter and callers, keeping every
//! node's materialized path consistent with its parent pointer.

pub mod cascade;
pub mod error;
pub mod hierarchy_service;
pub mod query;

pub use cascade::{CascadeEngine, ReparentOutcome};
pub use error::HierarchyError;
pub use hierarchy_service::{CreateNodeParams, HierarchyService};
pub use query::HierarchyQuery;
