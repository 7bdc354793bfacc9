//! Path Codec Error Types

use thiserror::Error;

/// Errors raised by [`PathCodec`](super::PathCodec) operations
///
/// These indicate caller bugs or pre-existing corruption of stored paths,
/// never transient conditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A prefix rewrite was requested on a path that doesn't carry the prefix
    #[error("Path '{path}' does not start with expected prefix '{prefix}'")]
    PrefixMismatch { path: String, prefix: String },

    /// Node id is empty
    #[error("Node id must not be empty")]
    EmptyId,

    /// Node id contains the path separator and would corrupt the encoding
    #[error("Node id '{id}' contains the path separator '{separator}'")]
    IdContainsSeparator { id: String, separator: char },
}

impl PathError {
    /// Create a prefix mismatch error
    pub fn prefix_mismatch(path: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::PrefixMismatch {
            path: path.into(),
            prefix: prefix.into(),
        }
    }
}
