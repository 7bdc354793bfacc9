//! Store filters issued by the hierarchy protocol
//!
//! These are the only query shapes the services need from a store. Adapters
//! translate them into their own query language; a regex-based backend must
//! escape the literal in `PathPrefix` before anchoring it.

use std::fmt;

/// A filter over node records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeFilter {
    /// Every record
    All,

    /// Exact match on `id`
    IdEquals(String),

    /// Set membership on `id`
    IdIn(Vec<String>),

    /// Exact match on `parent` (`None` matches roots)
    ParentEquals(Option<String>),

    /// `path` begins with the literal prefix
    PathPrefix(String),

    /// `path` contains the literal substring anywhere
    PathContains(String),
}

impl NodeFilter {
    /// Filter on a single id
    pub fn id(id: impl Into<String>) -> Self {
        Self::IdEquals(id.into())
    }

    /// Filter on a set of ids
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::IdIn(ids.into_iter().map(Into::into).collect())
    }

    /// Filter on direct children of `parent_id`
    pub fn children_of(parent_id: impl Into<String>) -> Self {
        Self::ParentEquals(Some(parent_id.into()))
    }

    /// Filter on records with no parent
    pub fn roots() -> Self {
        Self::ParentEquals(None)
    }

    /// Filter on `path` starting with `prefix`
    pub fn path_prefix(prefix: impl Into<String>) -> Self {
        Self::PathPrefix(prefix.into())
    }

    /// Filter on `path` containing `needle`
    pub fn path_contains(needle: impl Into<String>) -> Self {
        Self::PathContains(needle.into())
    }
}

impl fmt::Display for NodeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeFilter::All => write!(f, "*"),
            NodeFilter::IdEquals(id) => write!(f, "id = '{}'", id),
            NodeFilter::IdIn(ids) => write!(f, "id in [{}]", ids.join(", ")),
            NodeFilter::ParentEquals(Some(parent)) => write!(f, "parent = '{}'", parent),
            NodeFilter::ParentEquals(None) => write!(f, "parent is null"),
            NodeFilter::PathPrefix(prefix) => write!(f, "path ^= '{}'", prefix),
            NodeFilter::PathContains(needle) => write!(f, "path contains '{}'", needle),
        }
    }
}
