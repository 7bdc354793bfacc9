//! Nested subtree representation

use crate::models::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node together with its nested children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTree {
    pub node: Node,
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    /// Assemble a tree from a root and an unordered list of its descendants
    ///
    /// Children are attached by their `parent` pointer and ordered by creation
    /// time, then id. Descendants whose parent isn't reachable from `root` are
    /// dropped.
    pub fn build(root: Node, descendants: Vec<Node>) -> Self {
        let mut by_parent: HashMap<String, Vec<Node>> = HashMap::new();
        for node in descendants {
            if let Some(parent) = node.parent.clone() {
                by_parent.entry(parent).or_default().push(node);
            }
        }

        for siblings in by_parent.values_mut() {
            siblings.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        Self::attach(root, &mut by_parent)
    }

    fn attach(node: Node, by_parent: &mut HashMap<String, Vec<Node>>) -> Self {
        let children = by_parent
            .remove(&node.id)
            .unwrap_or_default()
            .into_iter()
            .map(|child| Self::attach(child, by_parent))
            .collect();

        Self { node, children }
    }

    /// Number of nodes in the tree, including the root
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(NodeTree::size).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, parent: Option<&str>, path: &str) -> Node {
        Node::new_with_id(
            id.to_string(),
            parent.map(str::to_string),
            path.to_string(),
            json!({}),
        )
    }

    #[test]
    fn test_build_nested_tree() {
        let root = node("A", None, "A");
        let descendants = vec![
            node("D", Some("C"), "A#B#C#D"),
            node("B", Some("A"), "A#B"),
            node("C", Some("B"), "A#B#C"),
            node("E", Some("A"), "A#E"),
        ];

        let tree = NodeTree::build(root, descendants);

        assert_eq!(tree.size(), 5);
        assert_eq!(tree.children.len(), 2);

        let b = tree.children.iter().find(|t| t.node.id == "B").unwrap();
        assert_eq!(b.children.len(), 1);
        assert_eq!(b.children[0].node.id, "C");
        assert_eq!(b.children[0].children[0].node.id, "D");
    }

    #[test]
    fn test_build_drops_unreachable_nodes() {
        let root = node("A", None, "A");
        let tree = NodeTree::build(root, vec![node("X", Some("Z"), "Z#X")]);
        assert_eq!(tree.size(), 1);
    }
}
