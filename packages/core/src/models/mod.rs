//! Data Models
//!
//! This module contains the data structures shared by the store adapter and
//! the hierarchy services:
//!
//! - `Node` - One record per stored document, carrying `parent` and `path`
//! - `NodeUpdate` - Sparse field-set for point updates
//! - `CascadeReport`, `MoveResult`, `DeleteResult` - Operation outcomes
//! - `NodeTree` - Nested subtree view

mod node;
mod results;
mod tree;

pub use node::{Node, NodeUpdate};
pub use results::{CascadeReport, DeleteResult, MoveResult};
pub use tree::NodeTree;
