//! Hierarchy Property Tests
//!
//! End-to-end checks of the path invariants through the public API:
//!
//! - Depth grows by one per level, roots have depth 1
//! - Ancestor ids decode consistently from child paths
//! - Moves and both delete policies on an A -> B -> C -> D chain
//! - Descendant lookups never match ids that merely share a prefix
//! - Re-running maintenance on a consistent tree writes nothing

#[cfg(test)]
mod hierarchy_property_tests {
    use anyhow::Result;
    use matpath_core::{
        CreateNodeParams, HierarchyService, InMemoryStore, Node, OnDeletePolicy, PathCodec,
    };
    use serde_json::json;
    use std::sync::Arc;

    /// Helper to create a service and keep a handle on its store
    fn create_test_service() -> Result<(HierarchyService, InMemoryStore)> {
        let store = InMemoryStore::new();
        let service = HierarchyService::new(Arc::new(store.clone()))?;
        Ok((service, store))
    }

    async fn create(service: &HierarchyService, id: &str, parent: Option<&str>) -> Result<Node> {
        let params = CreateNodeParams {
            id: Some(id.to_string()),
            parent: parent.map(str::to_string),
            properties: json!({}),
        };
        Ok(service.create_node(params).await?)
    }

    async fn create_chain(service: &HierarchyService) -> Result<()> {
        create(service, "A", None).await?;
        create(service, "B", Some("A")).await?;
        create(service, "C", Some("B")).await?;
        create(service, "D", Some("C")).await?;
        Ok(())
    }

    async fn path_of(service: &HierarchyService, id: &str) -> Result<String> {
        let node = service
            .get_node(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("node {} missing", id))?;
        Ok(node.path)
    }

    fn sorted_ids(nodes: Vec<Node>) -> Vec<String> {
        let mut ids: Vec<String> = nodes.into_iter().map(|n| n.id).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_depth_is_parent_depth_plus_one() -> Result<()> {
        let (service, _store) = create_test_service()?;
        create_chain(&service).await?;

        let a = service.get_node("A").await?.unwrap();
        assert_eq!(service.level(&a), 1);

        for (child, parent) in [("B", "A"), ("C", "B"), ("D", "C")] {
            let child = service.get_node(child).await?.unwrap();
            let parent = service.get_node(parent).await?.unwrap();
            assert_eq!(service.level(&child), service.level(&parent) + 1);
        }

        Ok(())
    }

    #[test]
    fn test_ancestor_ids_extend_by_last_segment() {
        let codec = PathCodec::default();

        for parent_path in ["A", "A#B", "A#B#C", "root#x-1#y_2"] {
            let child = codec.child_path(parent_path, "leaf");

            let mut expected = codec.ancestor_ids_of(parent_path);
            expected.push(codec.last_segment(parent_path).unwrap());

            assert_eq!(codec.ancestor_ids_of(&child), expected);
        }
    }

    #[tokio::test]
    async fn test_move_to_root_rewrites_descendants() -> Result<()> {
        let (service, _store) = create_test_service()?;
        create(&service, "A", None).await?;
        create(&service, "B", Some("A")).await?;
        create(&service, "C", Some("B")).await?;

        service.move_node("B", None).await?;

        assert_eq!(path_of(&service, "B").await?, "B");
        assert_eq!(path_of(&service, "C").await?, "B#C");
        assert_eq!(path_of(&service, "A").await?, "A");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_middle_node_reparents() -> Result<()> {
        let (service, _store) = create_test_service()?;
        create_chain(&service).await?;

        service
            .delete_node_with_policy("B", OnDeletePolicy::Reparent)
            .await?;

        let c = service.get_node("C").await?.unwrap();
        assert_eq!(c.parent.as_deref(), Some("A"));
        assert_eq!(c.path, "A#C");
        assert_eq!(path_of(&service, "D").await?, "A#C#D");
        assert!(service.get_node("B").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_middle_node_removes_subtree() -> Result<()> {
        let (service, store) = create_test_service()?;
        create_chain(&service).await?;

        service
            .delete_node_with_policy("B", OnDeletePolicy::DeleteSubtree)
            .await?;

        assert!(service.get_node("C").await?.is_none());
        assert!(service.get_node("D").await?.is_none());
        assert_eq!(path_of(&service, "A").await?, "A");
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_children_and_ancestors_on_chain() -> Result<()> {
        let (service, _store) = create_test_service()?;
        create_chain(&service).await?;

        assert_eq!(
            sorted_ids(service.get_children("A", true).await?),
            vec!["B", "C", "D"]
        );
        assert_eq!(sorted_ids(service.get_children("A", false).await?), vec!["B"]);

        let ancestors: Vec<String> = service
            .get_ancestors("D")
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ancestors, vec!["A", "B", "C"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_shared_id_prefix_is_not_descent() -> Result<()> {
        let (service, _store) = create_test_service()?;
        create(&service, "1", None).await?;
        create(&service, "12", None).await?;
        create(&service, "5", Some("12")).await?;
        create(&service, "6", Some("1")).await?;

        assert_eq!(sorted_ids(service.get_children("1", true).await?), vec!["6"]);

        // Moving "1" must leave "12" and its subtree alone
        create(&service, "R", None).await?;
        service.move_node("1", Some("R")).await?;
        assert_eq!(path_of(&service, "12").await?, "12");
        assert_eq!(path_of(&service, "5").await?, "12#5");
        assert_eq!(path_of(&service, "6").await?, "R#1#6");
        Ok(())
    }

    #[tokio::test]
    async fn test_rebuild_on_consistent_tree_is_idempotent() -> Result<()> {
        let (service, store) = create_test_service()?;
        create_chain(&service).await?;
        create(&service, "E", Some("B")).await?;

        let first = service.rebuild_paths("A").await?;
        let second = service.rebuild_paths("A").await?;

        assert_eq!(first.updated, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(first.scanned, second.scanned);
        assert_eq!(store.update_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_wide_subtree_move_rewrites_every_leaf() -> Result<()> {
        let store = InMemoryStore::new().with_latency(std::time::Duration::from_millis(1));
        let config = matpath_core::HierarchyConfig::default().with_cascade_concurrency(4);
        let service = HierarchyService::with_config(Arc::new(store.clone()), config)?;

        create(&service, "root", None).await?;
        create(&service, "hub", Some("root")).await?;
        for i in 0..40 {
            let id = format!("leaf{}", i);
            create(&service, &id, Some("hub")).await?;
        }

        let result = service.move_node("hub", None).await?;

        assert_eq!(result.cascade.updated, 40);
        for i in 0..40 {
            assert_eq!(
                path_of(&service, &format!("leaf{}", i)).await?,
                format!("hub#leaf{}", i)
            );
        }
        Ok(())
    }
}
