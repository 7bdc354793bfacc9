//! Storage Layer
//!
//! This module defines the boundary between the hierarchy protocol and the
//! document storage engine:
//!
//! - `DocumentStore` - the async adapter contract (find, stream-scan, point
//!   update, bulk delete)
//! - `NodeFilter` - the filter shapes the protocol issues
//! - `InMemoryStore` - a reference adapter with failure injection
//! - `HierarchyEvent` - domain events emitted after successful mutations
//!
//! # Architecture
//!
//! The storage engine offers read-your-writes within a logical operation but
//! no multi-document transactions. Everything above this layer is written to
//! tolerate a failure between any two store calls.

mod document_store;
mod error;
pub mod events;
mod filter;
mod memory_store;

pub use document_store::DocumentStore;
pub use error::StoreError;
pub use events::HierarchyEvent;
pub use filter::NodeFilter;
pub use memory_store::InMemoryStore;
