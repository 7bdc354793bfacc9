//! In-memory DocumentStore
//!
//! A reference adapter over a `HashMap` guarded by a tokio `RwLock`. Used by
//! the test suites and by embedders that don't need persistence.
//!
//! Path prefix filters are evaluated the way a regex-backed document store
//! would evaluate them: the literal prefix is escaped and anchored with `^`,
//! so a separator that happens to be a regex metacharacter still matches
//! literally.
//!
//! # Failure injection
//!
//! To exercise partial-failure behaviour without transactions, the store can
//! be told to fail point updates for specific ids, or to fail every update
//! after a number of successful ones. Optional latency makes concurrent
//! fan-out actually interleave.

use crate::db::{DocumentStore, NodeFilter, StoreError};
use crate::models::{Node, NodeUpdate};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

/// Filter translated into an in-memory predicate
enum Matcher {
    All,
    Id(String),
    IdIn(HashSet<String>),
    Parent(Option<String>),
    PathPattern(Regex),
    PathContains(String),
}

impl Matcher {
    fn compile(filter: NodeFilter) -> Result<Self, StoreError> {
        Ok(match filter {
            NodeFilter::All => Matcher::All,
            NodeFilter::IdEquals(id) => Matcher::Id(id),
            NodeFilter::IdIn(ids) => Matcher::IdIn(ids.into_iter().collect()),
            NodeFilter::ParentEquals(parent) => Matcher::Parent(parent),
            NodeFilter::PathPrefix(prefix) => {
                Matcher::PathPattern(Regex::new(&format!("^{}", regex::escape(&prefix)))?)
            }
            NodeFilter::PathContains(needle) => Matcher::PathContains(needle),
        })
    }

    fn matches(&self, node: &Node) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Id(id) => node.id == *id,
            Matcher::IdIn(ids) => ids.contains(&node.id),
            Matcher::Parent(parent) => node.parent == *parent,
            Matcher::PathPattern(pattern) => pattern.is_match(&node.path),
            Matcher::PathContains(needle) => node.path.contains(needle.as_str()),
        }
    }
}

/// Counters observed by tests
#[derive(Debug, Default)]
struct CallCounters {
    updates: AtomicUsize,
    bulk_deletes: AtomicUsize,
}

/// Injected failures for point updates
#[derive(Debug, Default)]
struct FailurePlan {
    /// Ids whose update always fails
    failing_ids: HashSet<String>,
    /// Fail every update once this many have succeeded
    fail_after: Option<usize>,
}

/// In-memory implementation of [`DocumentStore`]
///
/// # Examples
///
/// ```rust
/// use matpath_core::db::{DocumentStore, InMemoryStore, NodeFilter};
/// use matpath_core::models::Node;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryStore::new();
/// store
///     .insert(Node::new_with_id("A".into(), None, "A".into(), json!({})))
///     .await
///     .unwrap();
///
/// let found = store.find_one(NodeFilter::id("A")).await.unwrap();
/// assert!(found.is_some());
/// # });
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    nodes: Arc<RwLock<HashMap<String, Node>>>,
    counters: Arc<CallCounters>,
    failures: Arc<Mutex<FailurePlan>>,
    latency: Option<Duration>,
}

impl InMemoryStore {
    /// Create an empty store with no simulated latency
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `nodes`
    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        let map = nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        Self {
            nodes: Arc::new(RwLock::new(map)),
            ..Self::default()
        }
    }

    /// Delay every I/O call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every future update of `id` fail with a backend error
    pub fn fail_updates_for(&self, id: impl Into<String>) {
        if let Ok(mut plan) = self.failures.lock() {
            plan.failing_ids.insert(id.into());
        }
    }

    /// Let `successes` more updates through, then fail every update after
    pub fn fail_updates_after(&self, successes: usize) {
        let already = self.counters.updates.load(Ordering::SeqCst);
        if let Ok(mut plan) = self.failures.lock() {
            plan.fail_after = Some(already + successes);
        }
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        if let Ok(mut plan) = self.failures.lock() {
            *plan = FailurePlan::default();
        }
    }

    /// Number of successful point updates applied so far
    pub fn update_count(&self) -> usize {
        self.counters.updates.load(Ordering::SeqCst)
    }

    /// Number of bulk deletes issued so far
    pub fn bulk_delete_count(&self) -> usize {
        self.counters.bulk_deletes.load(Ordering::SeqCst)
    }

    /// Number of records currently stored
    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }

    /// Fetch a record by id, bypassing failure injection
    pub async fn get(&self, id: &str) -> Option<Node> {
        self.nodes.read().await.get(id).cloned()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            sleep(latency).await;
        }
    }

    fn check_injected_failure(&self, id: &str) -> Result<(), StoreError> {
        let plan = self
            .failures
            .lock()
            .map_err(|_| StoreError::backend("update", "failure plan lock poisoned"))?;

        if plan.failing_ids.contains(id) {
            return Err(StoreError::backend(
                "update",
                format!("injected failure for '{}'", id),
            ));
        }

        if let Some(limit) = plan.fail_after {
            if self.counters.updates.load(Ordering::SeqCst) >= limit {
                return Err(StoreError::backend(
                    "update",
                    format!("injected failure after {} updates", limit),
                ));
            }
        }

        Ok(())
    }

    async fn collect_matching(&self, filter: NodeFilter) -> Result<Vec<Node>, StoreError> {
        let matcher = Matcher::compile(filter)?;
        self.simulate_latency().await;

        let nodes = self.nodes.read().await;
        Ok(nodes
            .values()
            .filter(|node| matcher.matches(node))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_one(&self, filter: NodeFilter) -> Result<Option<Node>, StoreError> {
        if let NodeFilter::IdEquals(id) = &filter {
            self.simulate_latency().await;
            return Ok(self.nodes.read().await.get(id).cloned());
        }

        Ok(self.collect_matching(filter).await?.into_iter().next())
    }

    async fn find(&self, filter: NodeFilter) -> Result<Vec<Node>, StoreError> {
        self.collect_matching(filter).await
    }

    fn stream_scan(&self, filter: NodeFilter) -> BoxStream<'_, Result<Node, StoreError>> {
        stream::once(self.collect_matching(filter))
            .flat_map(|result| {
                let items: Vec<Result<Node, StoreError>> = match result {
                    Ok(nodes) => nodes.into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
                stream::iter(items)
            })
            .boxed()
    }

    async fn insert(&self, node: Node) -> Result<Node, StoreError> {
        self.simulate_latency().await;

        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(&node.id) {
            return Err(StoreError::duplicate_id(node.id));
        }

        nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn update(&self, id: &str, update: NodeUpdate) -> Result<Node, StoreError> {
        self.simulate_latency().await;
        self.check_injected_failure(id)?;

        let mut nodes = self.nodes.write().await;
        let node = nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::node_not_found(id))?;

        node.apply_update(update);
        self.counters.updates.fetch_add(1, Ordering::SeqCst);
        Ok(node.clone())
    }

    async fn bulk_delete(&self, filter: NodeFilter) -> Result<u64, StoreError> {
        let matcher = Matcher::compile(filter)?;
        self.simulate_latency().await;

        let mut nodes = self.nodes.write().await;
        let before = nodes.len();
        nodes.retain(|_, node| !matcher.matches(node));
        self.counters.bulk_deletes.fetch_add(1, Ordering::SeqCst);

        Ok((before - nodes.len()) as u64)
    }
}
