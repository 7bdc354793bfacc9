//! Configuration for the hierarchy services

use crate::path::{PathCodec, DEFAULT_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable overriding the path separator
pub const ENV_PATH_SEPARATOR: &str = "MATPATH_PATH_SEPARATOR";

/// Environment variable overriding the on-delete policy
pub const ENV_ON_DELETE: &str = "MATPATH_ON_DELETE";

/// Environment variable overriding the cascade fan-out bound
pub const ENV_CASCADE_CONCURRENCY: &str = "MATPATH_CASCADE_CONCURRENCY";

/// Default number of in-flight point updates per cascade sweep
const DEFAULT_CASCADE_CONCURRENCY: usize = 16;

/// What happens to a deleted node's descendants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnDeletePolicy {
    /// Promote direct children to the deleted node's parent and splice the
    /// deleted segment out of every descendant path
    #[default]
    #[serde(rename = "REPARENT")]
    Reparent,

    /// Remove the whole subtree with one bulk delete
    #[serde(rename = "DELETE-SUBTREE")]
    DeleteSubtree,
}

impl fmt::Display for OnDeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnDeletePolicy::Reparent => write!(f, "REPARENT"),
            OnDeletePolicy::DeleteSubtree => write!(f, "DELETE-SUBTREE"),
        }
    }
}

impl FromStr for OnDeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "REPARENT" => Ok(OnDeletePolicy::Reparent),
            "DELETE-SUBTREE" => Ok(OnDeletePolicy::DeleteSubtree),
            other => Err(format!(
                "unknown on-delete policy '{}' (expected REPARENT or DELETE-SUBTREE)",
                other
            )),
        }
    }
}

/// Configuration for materialized-path maintenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HierarchyConfig {
    /// Character joining path segments; must never occur inside an id
    pub path_separator: char,

    /// Policy applied by `delete_node`
    pub on_delete: OnDeletePolicy,

    /// Maximum point updates in flight during one cascade sweep
    pub cascade_concurrency: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            path_separator: DEFAULT_SEPARATOR,
            on_delete: OnDeletePolicy::default(),
            cascade_concurrency: DEFAULT_CASCADE_CONCURRENCY,
        }
    }
}

impl HierarchyConfig {
    /// Defaults overlaid with `MATPATH_*` environment variables
    ///
    /// Unset variables keep their defaults; malformed values are errors so a
    /// typo can't silently change the tree encoding.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_PATH_SEPARATOR) {
            let mut chars = raw.chars();
            config.path_separator = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(format!(
                        "{} must be a single character, got '{}'",
                        ENV_PATH_SEPARATOR, raw
                    ))
                }
            };
        }

        if let Some(raw) = lookup(ENV_ON_DELETE) {
            config.on_delete = raw.parse()?;
        }

        if let Some(raw) = lookup(ENV_CASCADE_CONCURRENCY) {
            config.cascade_concurrency = raw.trim().parse().map_err(|e| {
                format!("{} must be a positive integer: {}", ENV_CASCADE_CONCURRENCY, e)
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Use `separator` between path segments
    pub fn with_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    /// Use `policy` when deleting nodes
    pub fn with_on_delete(mut self, policy: OnDeletePolicy) -> Self {
        self.on_delete = policy;
        self
    }

    /// Allow at most `limit` concurrent point updates per sweep
    pub fn with_cascade_concurrency(mut self, limit: usize) -> Self {
        self.cascade_concurrency = limit;
        self
    }

    /// Codec for the configured separator
    pub fn codec(&self) -> PathCodec {
        PathCodec::new(self.path_separator)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.path_separator.is_alphanumeric() {
            return Err(format!(
                "path_separator '{}' must not be alphanumeric (ids are built from alphanumerics)",
                self.path_separator
            ));
        }

        if self.path_separator.is_whitespace() || self.path_separator.is_control() {
            return Err("path_separator must be a visible character".to_string());
        }

        if self.path_separator == '-' {
            return Err("path_separator '-' collides with generated UUID ids".to_string());
        }

        if self.cascade_concurrency == 0 {
            return Err("cascade_concurrency must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = HierarchyConfig::default();
        assert_eq!(config.path_separator, '#');
        assert_eq!(config.on_delete, OnDeletePolicy::Reparent);
        assert_eq!(config.cascade_concurrency, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = HierarchyConfig::default();

        config.path_separator = 'a';
        assert!(config.validate().is_err());

        config.path_separator = ' ';
        assert!(config.validate().is_err());

        config.path_separator = '-';
        assert!(config.validate().is_err());

        config.path_separator = '/';
        config.cascade_concurrency = 0;
        assert!(config.validate().is_err());

        config.cascade_concurrency = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: HierarchyConfig =
            serde_json::from_str(r#"{"onDelete": "DELETE-SUBTREE"}"#).unwrap();
        assert_eq!(config.on_delete, OnDeletePolicy::DeleteSubtree);
        assert_eq!(config.path_separator, '#');

        let config: HierarchyConfig = serde_json::from_str(r#"{"pathSeparator": "/"}"#).unwrap();
        assert_eq!(config.path_separator, '/');
        assert_eq!(config.on_delete, OnDeletePolicy::Reparent);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("reparent".parse::<OnDeletePolicy>(), Ok(OnDeletePolicy::Reparent));
        assert_eq!("DELETE-SUBTREE".parse::<OnDeletePolicy>(), Ok(OnDeletePolicy::DeleteSubtree));
        assert_eq!("delete_subtree".parse::<OnDeletePolicy>(), Ok(OnDeletePolicy::DeleteSubtree));
        assert!("cascade".parse::<OnDeletePolicy>().is_err());
        assert_eq!(OnDeletePolicy::DeleteSubtree.to_string(), "DELETE-SUBTREE");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = HierarchyConfig::from_lookup(lookup_from(&[
            (ENV_PATH_SEPARATOR, "/"),
            (ENV_ON_DELETE, "DELETE-SUBTREE"),
            (ENV_CASCADE_CONCURRENCY, "4"),
        ]))
        .unwrap();

        assert_eq!(config.path_separator, '/');
        assert_eq!(config.on_delete, OnDeletePolicy::DeleteSubtree);
        assert_eq!(config.cascade_concurrency, 4);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(HierarchyConfig::from_lookup(lookup_from(&[(ENV_PATH_SEPARATOR, "##")])).is_err());
        assert!(HierarchyConfig::from_lookup(lookup_from(&[(ENV_ON_DELETE, "nope")])).is_err());
        assert!(
            HierarchyConfig::from_lookup(lookup_from(&[(ENV_CASCADE_CONCURRENCY, "0")])).is_err()
        );
        assert!(
            HierarchyConfig::from_lookup(lookup_from(&[(ENV_CASCADE_CONCURRENCY, "x")])).is_err()
        );
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = HierarchyConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, HierarchyConfig::default());
    }
}
