//! Dot-path addressing over nested string trees.
//!
//! A translation bundle such as `{"home": {"title": "Welcome"}}` is held as a
//! [`Node`] tree and addressed by keys like `home.title`.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Segment separator in translation keys.
pub const SEPARATOR: char = '.';

/// Nested key tree: a string leaf or an ordered map of child segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Leaf(String),
    Branch(BTreeMap<String, Node>),
}

impl Default for Node {
    fn default() -> Self {
        Self::branch()
    }
}

impl Node {
    /// An empty branch.
    pub fn branch() -> Self {
        Self::Branch(BTreeMap::new())
    }

    /// Resolve `key` to a leaf. Any non-branch intermediate segment, a missing
    /// segment, or a key that ends on a branch is a miss.
    pub fn read(&self, key: &str) -> Option<&str> {
        let mut node = self;
        for segment in key.split(SEPARATOR) {
            match node {
                Self::Branch(children) => node = children.get(segment)?,
                Self::Leaf(_) => return None,
            }
        }
        match node {
            Self::Leaf(value) => Some(value),
            Self::Branch(_) => None,
        }
    }

    /// Store `value` at `key`, creating branches on the way. A leaf sitting
    /// where the path needs a branch is replaced by one.
    pub fn write(&mut self, key: &str, value: impl Into<String>) {
        let segments: Vec<&str> = key.split(SEPARATOR).collect();
        self.write_segments(&segments, value.into());
    }

    fn write_segments(&mut self, segments: &[&str], value: String) {
        match segments.split_first() {
            None => *self = Self::Leaf(value),
            Some((head, rest)) => {
                if let Self::Leaf(_) = self {
                    *self = Self::branch();
                }
                if let Self::Branch(children) = self {
                    children
                        .entry((*head).to_string())
                        .or_insert_with(Self::branch)
                        .write_segments(rest, value);
                }
            }
        }
    }

    /// Remove the leaf at `key`, pruning branches left empty. Returns whether
    /// a leaf was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let segments: Vec<&str> = key.split(SEPARATOR).collect();
        self.remove_segments(&segments)
    }

    fn remove_segments(&mut self, segments: &[&str]) -> bool {
        let Self::Branch(children) = self else {
            return false;
        };
        let Some((head, rest)) = segments.split_first() else {
            return false;
        };
        match children.get(*head) {
            None => return false,
            Some(Self::Leaf(_)) if rest.is_empty() => {
                children.remove(*head);
                return true;
            }
            Some(Self::Leaf(_)) => return false,
            Some(Self::Branch(_)) => {}
        }
        let removed = children
            .get_mut(*head)
            .is_some_and(|child| child.remove_segments(rest));
        if removed && matches!(children.get(*head), Some(Self::Branch(c)) if c.is_empty()) {
            children.remove(*head);
        }
        removed
    }

    /// Depth-first `(full key, value)` pairs for every leaf. A root leaf has
    /// no key and yields nothing.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Self::Branch(children) = self {
            for (segment, child) in children {
                child.flatten_into(segment.clone(), &mut out);
            }
        }
        out
    }

    fn flatten_into(&self, prefix: String, out: &mut Vec<(String, String)>) {
        match self {
            Self::Leaf(value) => out.push((prefix, value.clone())),
            Self::Branch(children) => {
                for (segment, child) in children {
                    child.flatten_into(format!("{}{}{}", prefix, SEPARATOR, segment), out);
                }
            }
        }
    }

    /// Build a tree from flat `(key, value)` pairs. Later pairs win on
    /// collisions, following [`Node::write`].
    pub fn unflatten<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut root = Self::branch();
        for (key, value) in pairs {
            root.write(key.as_ref(), value);
        }
        root
    }

    /// Number of leaves under this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(children) => children.values().map(Self::leaf_count).sum(),
        }
    }

    /// Convert a JSON document into a key tree. Strings become leaves,
    /// numbers and booleans are stringified, `null` and arrays are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::Leaf(s.clone())),
            Value::Number(n) => Ok(Self::Leaf(n.to_string())),
            Value::Bool(b) => Ok(Self::Leaf(b.to_string())),
            Value::Object(map) => {
                let mut children = BTreeMap::new();
                for (segment, child) in map {
                    if segment.is_empty() || segment.contains(SEPARATOR) {
                        return Err(StoreError::invalid(format!(
                            "key segment '{}' must be non-empty and contain no '{}'",
                            segment, SEPARATOR
                        )));
                    }
                    children.insert(segment.clone(), Self::from_json(child)?);
                }
                Ok(Self::Branch(children))
            }
            Value::Null | Value::Array(_) => Err(StoreError::invalid(
                "translation trees may only contain objects and scalar values",
            )),
        }
    }

    /// Parse a JSON bundle from text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| StoreError::invalid(format!("malformed JSON bundle: {}", e)))?;
        Self::from_json(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample() -> Node {
        Node::from_json(&json!({
            "home": {"title": "Welcome", "subtitle": "Hi"},
            "footer": "Bye"
        }))
        .unwrap()
    }

    // ==================== read Tests ====================

    #[test]
    fn test_read_leaf() {
        let tree = sample();
        assert_eq!(tree.read("home.title"), Some("Welcome"));
        assert_eq!(tree.read("footer"), Some("Bye"));
    }

    #[test]
    fn test_read_missing_segment() {
        assert_eq!(sample().read("home.missing"), None);
        assert_eq!(sample().read("nope"), None);
    }

    #[test]
    fn test_read_through_leaf_short_circuits() {
        assert_eq!(sample().read("footer.deeper"), None);
    }

    #[test]
    fn test_read_branch_is_not_a_leaf() {
        assert_eq!(sample().read("home"), None);
    }

    // ==================== write Tests ====================

    #[test]
    fn test_write_creates_branches() {
        let mut tree = Node::branch();
        tree.write("a.b.c", "deep");
        assert_eq!(tree.read("a.b.c"), Some("deep"));
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_write_overwrites_leaf() {
        let mut tree = sample();
        tree.write("home.title", "Hello");
        assert_eq!(tree.read("home.title"), Some("Hello"));
    }

    #[test]
    fn test_write_replaces_intermediate_leaf_with_branch() {
        let mut tree = sample();
        tree.write("footer.note", "small print");
        assert_eq!(tree.read("footer.note"), Some("small print"));
        assert_eq!(tree.read("footer"), None);
    }

    #[test]
    fn test_write_on_root_leaf() {
        let mut tree = Node::Leaf("x".to_string());
        tree.write("a", "1");
        assert_eq!(tree.read("a"), Some("1"));
    }

    // ==================== remove Tests ====================

    #[test]
    fn test_remove_prunes_empty_branches() {
        let mut tree = Node::branch();
        tree.write("a.b.c", "x");
        tree.write("z", "y");
        assert!(tree.remove("a.b.c"));
        assert_eq!(tree, Node::unflatten([("z", "y")]));
    }

    #[test]
    fn test_remove_keeps_siblings() {
        let mut tree = sample();
        assert!(tree.remove("home.title"));
        assert_eq!(tree.read("home.subtitle"), Some("Hi"));
        assert_eq!(tree.read("home.title"), None);
    }

    #[test]
    fn test_remove_missing() {
        let mut tree = sample();
        assert!(!tree.remove("home.nope"));
        assert!(!tree.remove("footer.deeper"));
        assert!(!tree.remove("home"));
        assert_eq!(tree, sample());
    }

    // ==================== flatten Tests ====================

    #[test]
    fn test_flatten_depth_first() {
        let pairs = sample().flatten();
        assert_eq!(
            pairs,
            vec![
                ("footer".to_string(), "Bye".to_string()),
                ("home.subtitle".to_string(), "Hi".to_string()),
                ("home.title".to_string(), "Welcome".to_string()),
            ]
        );
    }

    #[test]
    fn test_flatten_root_leaf_yields_nothing() {
        assert!(Node::Leaf("x".to_string()).flatten().is_empty());
    }

    #[test]
    fn test_unflatten_roundtrip() {
        let tree = sample();
        assert_eq!(Node::unflatten(tree.flatten()), tree);
    }

    // ==================== JSON Tests ====================

    #[test]
    fn test_from_json_stringifies_scalars() {
        let tree = Node::from_json(&json!({"n": 3, "b": true})).unwrap();
        assert_eq!(tree.read("n"), Some("3"));
        assert_eq!(tree.read("b"), Some("true"));
    }

    #[test]
    fn test_from_json_rejects_arrays_and_null() {
        assert!(Node::from_json(&json!({"a": [1, 2]})).is_err());
        assert!(Node::from_json(&json!({"a": null})).is_err());
    }

    #[test]
    fn test_from_json_rejects_dotted_segment() {
        assert!(Node::from_json(&json!({"a.b": "x"})).is_err());
    }

    #[test]
    fn test_from_json_str_malformed() {
        let err = Node::from_json_str("{not json").unwrap_err();
        assert!(err.to_string().contains("malformed JSON"));
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["home"]["title"], "Welcome");
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_write_then_read(
            segments in prop::collection::vec("[a-z]{1,4}", 1..4),
            value in ".*",
        ) {
            let key = segments.join(".");
            let mut tree = sample();
            tree.write(&key, value.clone());
            prop_assert_eq!(tree.read(&key), Some(value.as_str()));
        }
    }
}
