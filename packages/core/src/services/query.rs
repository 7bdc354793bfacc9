//! Hierarchy query filters
//!
//! Stateless builders turning a node's `parent`/`path` fields into the
//! `NodeFilter`s that answer tree questions. Nothing here touches the store.

use crate::db::NodeFilter;
use crate::models::Node;
use crate::path::PathCodec;
use std::collections::HashMap;

/// Filter builders for tree queries over materialized paths
#[derive(Debug, Clone, Copy)]
pub struct HierarchyQuery {
    codec: PathCodec,
}

impl HierarchyQuery {
    pub fn new(codec: PathCodec) -> Self {
        Self { codec }
    }

    /// Direct children (`parent == id`) or every descendant (path prefix)
    ///
    /// The recursive form needs a materialized path; for a node without one
    /// only the direct-children filter is meaningful.
    pub fn children(&self, node: &Node, recursive: bool) -> NodeFilter {
        if recursive && node.has_path() {
            self.descendants_of_path(&node.path)
        } else {
            NodeFilter::children_of(node.id.clone())
        }
    }

    /// Every record strictly below `path`
    pub fn descendants_of_path(&self, path: &str) -> NodeFilter {
        NodeFilter::path_prefix(self.codec.descendant_prefix(path))
    }

    /// Lookup of the node's parent, `None` for a root
    pub fn parent(&self, node: &Node) -> Option<NodeFilter> {
        node.parent.as_ref().map(|parent| NodeFilter::id(parent.clone()))
    }

    /// Ancestor ids decoded from the node's path, root first
    pub fn ancestor_ids(&self, node: &Node) -> Vec<String> {
        self.codec
            .ancestor_ids_of(&node.path)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Set-membership lookup of the node's ancestors, `None` if it has none
    ///
    /// Stores return id-set matches in arbitrary order; pass the result
    /// through [`HierarchyQuery::order_by_chain`].
    pub fn ancestors(&self, node: &Node) -> Option<NodeFilter> {
        let ids = self.ancestor_ids(node);
        if ids.is_empty() {
            None
        } else {
            Some(NodeFilter::IdIn(ids))
        }
    }

    /// Records whose path may carry `id` as an ancestor segment
    ///
    /// This is a substring match and can over-select (`11#` contains `1#`);
    /// callers must confirm whole-segment membership before writing.
    pub fn segment_holders(&self, id: &str) -> NodeFilter {
        NodeFilter::path_contains(self.codec.descendant_prefix(id))
    }

    /// Re-sort `nodes` to follow `chain` order, dropping ids not in the chain
    pub fn order_by_chain(&self, chain: &[String], nodes: Vec<Node>) -> Vec<Node> {
        let mut by_id: HashMap<String, Node> =
            nodes.into_iter().map(|n| (n.id.clone(), n)).collect();

        chain.iter().filter_map(|id| by_id.remove(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> HierarchyQuery {
        HierarchyQuery::new(PathCodec::default())
    }

    fn node(id: &str, parent: Option<&str>, path: &str) -> Node {
        Node::new_with_id(
            id.to_string(),
            parent.map(str::to_string),
            path.to_string(),
            json!({}),
        )
    }

    #[test]
    fn test_children_filters() {
        let q = query();
        let a = node("A", None, "A");

        assert_eq!(q.children(&a, false), NodeFilter::children_of("A"));
        assert_eq!(q.children(&a, true), NodeFilter::path_prefix("A#"));
    }

    #[test]
    fn test_recursive_children_without_path_falls_back_to_parent_filter() {
        let q = query();
        let legacy = node("L", None, "");
        assert_eq!(q.children(&legacy, true), NodeFilter::children_of("L"));
    }

    #[test]
    fn test_parent_and_ancestor_filters() {
        let q = query();
        let root = node("A", None, "A");
        let d = node("D", Some("C"), "A#B#C#D");

        assert_eq!(q.parent(&root), None);
        assert_eq!(q.parent(&d), Some(NodeFilter::id("C")));
        assert_eq!(q.ancestors(&root), None);
        assert_eq!(q.ancestors(&d), Some(NodeFilter::ids(["A", "B", "C"])));
    }

    #[test]
    fn test_segment_holders() {
        assert_eq!(query().segment_holders("B"), NodeFilter::path_contains("B#"));
    }

    #[test]
    fn test_order_by_chain() {
        let q = query();
        let chain = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let shuffled = vec![
            node("C", Some("B"), "A#B#C"),
            node("A", None, "A"),
            node("B", Some("A"), "A#B"),
        ];

        let ordered: Vec<String> = q
            .order_by_chain(&chain, shuffled)
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ordered, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_order_by_chain_skips_missing() {
        let q = query();
        let chain = vec!["A".to_string(), "B".to_string()];
        let ordered = q.order_by_chain(&chain, vec![node("B", Some("A"), "A#B")]);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].id, "B");
    }
}
