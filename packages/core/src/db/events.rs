//! Domain Events for hierarchy changes
//!
//! `HierarchyService` emits these after each successful structural mutation,
//! allowing other parts of an application (caches, live views) to observe
//! changes without coupling to the service.
//!
//! # Architecture
//!
//! Events are sent over a tokio broadcast channel, so any number of
//! subscribers receive them asynchronously. An event is emitted only once the
//! operation (including its cascade) has completed; failed operations emit
//! nothing.

use crate::config::OnDeletePolicy;
use serde::{Deserialize, Serialize};

/// Domain events emitted by `HierarchyService`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HierarchyEvent {
    /// A node was inserted with its computed path
    #[serde(rename_all = "camelCase")]
    NodeCreated {
        id: String,
        parent: Option<String>,
        path: String,
    },

    /// A node changed parent; its descendants have been rewritten
    #[serde(rename_all = "camelCase")]
    NodeMoved {
        id: String,
        previous_path: String,
        new_path: String,
        descendants_updated: usize,
    },

    /// A node was removed under the given policy
    #[serde(rename_all = "camelCase")]
    NodeDeleted {
        id: String,
        policy: OnDeletePolicy,
        removed: u64,
    },

    /// Stale paths under a node were recomputed by a repair pass
    #[serde(rename_all = "camelCase")]
    PathsRewritten { root_id: String, updated: usize },
}

impl HierarchyEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            HierarchyEvent::NodeCreated { .. } => "node_created",
            HierarchyEvent::NodeMoved { .. } => "node_moved",
            HierarchyEvent::NodeDeleted { .. } => "node_deleted",
            HierarchyEvent::PathsRewritten { .. } => "paths_rewritten",
        }
    }

    /// Id of the node the event is about
    pub fn node_id(&self) -> &str {
        match self {
            HierarchyEvent::NodeCreated { id, .. }
            | HierarchyEvent::NodeMoved { id, .. }
            | HierarchyEvent::NodeDeleted { id, .. } => id,
            HierarchyEvent::PathsRewritten { root_id, .. } => root_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = HierarchyEvent::NodeMoved {
            id: "B".to_string(),
            previous_path: "A#B".to_string(),
            new_path: "B".to_string(),
            descendants_updated: 1,
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "nodeMoved",
                "id": "B",
                "previousPath": "A#B",
                "newPath": "B",
                "descendantsUpdated": 1
            })
        );
        assert_eq!(event.event_type(), "node_moved");
        assert_eq!(event.node_id(), "B");
    }
}
