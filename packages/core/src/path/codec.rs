//! Materialized path encoding and decoding

use super::PathError;

/// Separator used when none is configured
pub const DEFAULT_SEPARATOR: char = '#';

/// Pure conversions between parent chains and path strings
///
/// A codec is a cheap `Copy` value holding the separator; every method is a
/// pure function of its inputs.
///
/// # Examples
///
/// ```rust
/// use matpath_core::path::PathCodec;
///
/// let codec = PathCodec::new('#');
/// let root = codec.root_path("A");
/// let child = codec.child_path(&root, "B");
///
/// assert_eq!(child, "A#B");
/// assert_eq!(codec.depth_of(&child), 2);
/// assert_eq!(codec.ancestor_ids_of(&child), vec!["A"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCodec {
    separator: char,
}

impl Default for PathCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl PathCodec {
    /// Create a codec for the given separator
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    /// The separator this codec joins segments with
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Path of a root node: its own id
    pub fn root_path(&self, id: &str) -> String {
        id.to_string()
    }

    /// Path of a node whose parent has `parent_path`
    pub fn child_path(&self, parent_path: &str, id: &str) -> String {
        let mut path = String::with_capacity(parent_path.len() + id.len() + 1);
        path.push_str(parent_path);
        path.push(self.separator);
        path.push_str(id);
        path
    }

    /// The prefix every descendant's path starts with: `path + separator`
    ///
    /// Matching on this (rather than on `path` alone) keeps `12` from being
    /// treated as a descendant of `1`.
    pub fn descendant_prefix(&self, path: &str) -> String {
        let mut prefix = String::with_capacity(path.len() + 1);
        prefix.push_str(path);
        prefix.push(self.separator);
        prefix
    }

    /// Replace `old_prefix` at the start of `old_path` with `new_prefix`
    ///
    /// The suffix is preserved verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::PrefixMismatch`] if `old_path` does not start with
    /// `old_prefix`. This never falls back to a partial match.
    pub fn rewrite_prefix(
        &self,
        old_path: &str,
        old_prefix: &str,
        new_prefix: &str,
    ) -> Result<String, PathError> {
        let suffix = old_path
            .strip_prefix(old_prefix)
            .ok_or_else(|| PathError::prefix_mismatch(old_path, old_prefix))?;

        let mut path = String::with_capacity(new_prefix.len() + suffix.len());
        path.push_str(new_prefix);
        path.push_str(suffix);
        Ok(path)
    }

    /// Iterate over the segments of a path, root first
    ///
    /// An empty path has no segments.
    pub fn segments<'a>(&self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let separator = self.separator;
        let source = if path.is_empty() { None } else { Some(path) };
        source
            .into_iter()
            .flat_map(move |p| p.split(separator))
    }

    /// Number of segments in a path; 0 for an empty path
    pub fn depth_of(&self, path: &str) -> usize {
        self.segments(path).count()
    }

    /// Ids of every ancestor encoded in `path`, root first, excluding the node itself
    pub fn ancestor_ids_of<'a>(&self, path: &'a str) -> Vec<&'a str> {
        let mut ids: Vec<&str> = self.segments(path).collect();
        ids.pop();
        ids
    }

    /// The final segment of a path, i.e. the id of the node it belongs to
    pub fn last_segment<'a>(&self, path: &'a str) -> Option<&'a str> {
        self.segments(path).last()
    }

    /// Whether `id` appears as a whole segment anywhere in `path`
    pub fn contains_segment(&self, path: &str, id: &str) -> bool {
        self.segments(path).any(|segment| segment == id)
    }

    /// Splice the ancestor segment `id` out of `path`
    ///
    /// Only whole ancestor segments are removed; the node's own (last)
    /// segment is never touched. Returns `None` when `id` is not an ancestor
    /// segment of `path`, so substring look-alikes such as `11` for `1` are
    /// left alone.
    pub fn remove_segment(&self, path: &str, id: &str) -> Option<String> {
        let segments: Vec<&str> = self.segments(path).collect();
        let (own, ancestors) = segments.split_last()?;

        if !ancestors.contains(&id) {
            return None;
        }

        let mut kept: Vec<&str> = ancestors.iter().copied().filter(|s| *s != id).collect();
        kept.push(*own);

        Some(kept.join(self.separator.to_string().as_str()))
    }

    /// Check that an id can be encoded as a path segment
    ///
    /// # Errors
    ///
    /// - [`PathError::EmptyId`] for an empty id
    /// - [`PathError::IdContainsSeparator`] if the separator occurs in the id
    pub fn validate_id(&self, id: &str) -> Result<(), PathError> {
        if id.is_empty() {
            return Err(PathError::EmptyId);
        }

        if id.contains(self.separator) {
            return Err(PathError::IdContainsSeparator {
                id: id.to_string(),
                separator: self.separator,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> PathCodec {
        PathCodec::default()
    }

    #[test]
    fn test_root_and_child_paths() {
        let codec = codec();
        assert_eq!(codec.root_path("A"), "A");
        assert_eq!(codec.child_path("A", "B"), "A#B");
        assert_eq!(codec.child_path("A#B", "C"), "A#B#C");
    }

    #[test]
    fn test_custom_separator() {
        let codec = PathCodec::new('/');
        assert_eq!(codec.child_path("a/b", "c"), "a/b/c");
        assert_eq!(codec.depth_of("a/b/c"), 3);
        assert_eq!(codec.ancestor_ids_of("a/b/c"), vec!["a", "b"]);
    }

    #[test]
    fn test_depth_of() {
        let codec = codec();
        assert_eq!(codec.depth_of(""), 0);
        assert_eq!(codec.depth_of("A"), 1);
        assert_eq!(codec.depth_of("A#B#C#D"), 4);
    }

    #[test]
    fn test_depth_grows_by_one_per_level() {
        let codec = codec();
        let mut path = codec.root_path("n0");
        for level in 1..10 {
            let child = codec.child_path(&path, &format!("n{}", level));
            assert_eq!(codec.depth_of(&child), 1 + codec.depth_of(&path));
            path = child;
        }
    }

    #[test]
    fn test_ancestor_ids_of() {
        let codec = codec();
        assert!(codec.ancestor_ids_of("").is_empty());
        assert!(codec.ancestor_ids_of("A").is_empty());
        assert_eq!(codec.ancestor_ids_of("A#B#C#D"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ancestor_ids_after_child_path() {
        let codec = codec();
        for parent_path in ["A", "A#B", "root#mid#leaf"] {
            let child = codec.child_path(parent_path, "X");

            let mut expected = codec.ancestor_ids_of(parent_path);
            expected.push(codec.last_segment(parent_path).unwrap());

            assert_eq!(codec.ancestor_ids_of(&child), expected);
        }
    }

    #[test]
    fn test_rewrite_prefix() {
        let codec = codec();
        assert_eq!(
            codec.rewrite_prefix("A#B#C", "A#B", "B").unwrap(),
            "B#C"
        );
        assert_eq!(
            codec.rewrite_prefix("A#B#C#D", "A#B", "X#Y#B").unwrap(),
            "X#Y#B#C#D"
        );
    }

    #[test]
    fn test_rewrite_prefix_mismatch_fails() {
        let codec = codec();
        let err = codec.rewrite_prefix("Q#B#C", "A#B", "B").unwrap_err();
        assert_eq!(err, PathError::prefix_mismatch("Q#B#C", "A#B"));
    }

    #[test]
    fn test_descendant_prefix_is_separator_delimited() {
        let codec = codec();
        let prefix = codec.descendant_prefix("1");
        assert_eq!(prefix, "1#");
        assert!("1#5".starts_with(&prefix));
        assert!(!"12".starts_with(&prefix));
        assert!(!"12#5".starts_with(&prefix));
    }

    #[test]
    fn test_contains_segment() {
        let codec = codec();
        assert!(codec.contains_segment("A#B#C", "B"));
        assert!(!codec.contains_segment("A#BB#C", "B"));
        assert!(!codec.contains_segment("", "B"));
    }

    #[test]
    fn test_remove_segment_mid_chain() {
        let codec = codec();
        assert_eq!(codec.remove_segment("A#B#C", "B").as_deref(), Some("A#C"));
        assert_eq!(
            codec.remove_segment("A#B#C#D", "B").as_deref(),
            Some("A#C#D")
        );
        assert_eq!(codec.remove_segment("B#C#D", "B").as_deref(), Some("C#D"));
    }

    #[test]
    fn test_remove_segment_ignores_lookalikes_and_self() {
        let codec = codec();
        assert_eq!(codec.remove_segment("21#5", "1"), None);
        assert_eq!(codec.remove_segment("A#11#C", "1"), None);
        // Own segment is not an ancestor segment
        assert_eq!(codec.remove_segment("A#B", "B"), None);
        assert_eq!(codec.remove_segment("", "B"), None);
    }

    #[test]
    fn test_validate_id() {
        let codec = codec();
        assert!(codec.validate_id("abc-123").is_ok());
        assert_eq!(codec.validate_id(""), Err(PathError::EmptyId));
        assert!(matches!(
            codec.validate_id("a#b"),
            Err(PathError::IdContainsSeparator { separator: '#', .. })
        ));
    }
}
