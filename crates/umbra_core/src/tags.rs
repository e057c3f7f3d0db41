//! Hierarchical gameplay tags
//!
//! Tags are dot-separated paths like `Execution.Position.Ground.Rear`.
//! A tag matches a query tag when it equals the query or the query is a
//! parent of it at a dot boundary, so `Execution.Position.Ground.Rear`
//! matches the query `Execution.Position.Ground` but not
//! `Execution.Position.Gro`.
//!
//! Each tag carries a precomputed FNV-1a hash of its path; equality tests
//! the hash first and only falls back to the path on a hash match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

fn fnv1a(path: &str) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for byte in path.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// An interned hierarchical tag.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Tag {
    path: Arc<str>,
    hash: u64,
}

impl Tag {
    /// Create a tag from a dot-separated path.
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        Self {
            hash: fnv1a(path),
            path: Arc::from(path),
        }
    }

    /// The full dot-separated path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Interned path hash.
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// The parent tag, if any (`A.B.C` -> `A.B`).
    pub fn parent(&self) -> Option<Tag> {
        self.path.rfind('.').map(|i| Tag::new(&self.path[..i]))
    }

    /// Leaf segment of the path (`A.B.C` -> `C`).
    pub fn leaf(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Hierarchical match: `self` equals `query`, or `query` is a parent
    /// of `self` at a dot boundary.
    pub fn matches(&self, query: &Tag) -> bool {
        if self == query {
            return true;
        }
        self.path.len() > query.path.len()
            && self.path.starts_with(query.path())
            && self.path.as_bytes()[query.path.len()] == b'.'
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.path == other.path
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.path)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<String> for Tag {
    fn from(path: String) -> Self {
        Tag::new(path)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.path.to_string()
    }
}

impl From<&str> for Tag {
    fn from(path: &str) -> Self {
        Tag::new(path)
    }
}

/// An ordered, duplicate-free collection of tags.
///
/// Insertion order is preserved so debug output and evaluation records
/// stay stable across runs.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { tags: Vec::new() }
    }

    /// Insert a tag; duplicates are ignored. Returns whether it was added.
    pub fn insert(&mut self, tag: Tag) -> bool {
        if self.contains_exact(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Builder-style insert.
    pub fn with(mut self, tag: impl Into<Tag>) -> Self {
        self.insert(tag.into());
        self
    }

    /// Exact membership (no hierarchy).
    pub fn contains_exact(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Hierarchical membership: any member matches `query`.
    pub fn contains(&self, query: &Tag) -> bool {
        self.tags.iter().any(|t| t.matches(query))
    }

    /// Every tag in `other` is matched by some member of `self`.
    pub fn has_all(&self, other: &TagSet) -> bool {
        other.tags.iter().all(|q| self.contains(q))
    }

    /// At least one tag in `other` is matched by some member of `self`.
    pub fn has_any(&self, other: &TagSet) -> bool {
        other.tags.iter().any(|q| self.contains(q))
    }

    /// Exact set equality, ignoring order.
    pub fn same_set(&self, other: &TagSet) -> bool {
        self.tags.len() == other.tags.len()
            && self.tags.iter().all(|t| other.contains_exact(t))
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tags.iter()).finish()
    }
}

impl<T: Into<Tag>> FromIterator<T> for TagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag.into());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_equality() {
        let a = Tag::new("Execution.Position.Ground.Rear");
        let b = Tag::new("Execution.Position.Ground.Rear");
        let c = Tag::new("Execution.Position.Ground.Front");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hierarchical_match() {
        let tag = Tag::new("Execution.Position.Ground.Rear");
        assert!(tag.matches(&Tag::new("Execution.Position.Ground")));
        assert!(tag.matches(&Tag::new("Execution")));
        assert!(tag.matches(&tag.clone()));
        // Prefix must end at a dot boundary.
        assert!(!tag.matches(&Tag::new("Execution.Position.Gro")));
        // A parent does not match a child query.
        assert!(!Tag::new("Execution.Position").matches(&tag));
    }

    #[test]
    fn parent_and_leaf() {
        let tag = Tag::new("A.B.C");
        assert_eq!(tag.parent().unwrap().path(), "A.B");
        assert_eq!(tag.leaf(), "C");
        assert!(Tag::new("A").parent().is_none());
    }

    #[test]
    fn set_operations() {
        let context: TagSet = ["Mission.Stealth", "Target.Humanoid"].into_iter().collect();
        let required: TagSet = ["Mission.Stealth"].into_iter().collect();
        let blocked: TagSet = ["Mission.Alerted"].into_iter().collect();

        assert!(context.has_all(&required));
        assert!(!context.has_any(&blocked));
        assert!(!context.same_set(&required));
        assert!(context.same_set(
            &["Target.Humanoid", "Mission.Stealth"].into_iter().collect()
        ));
    }

    #[test]
    fn insert_dedupes() {
        let mut set = TagSet::new();
        assert!(set.insert(Tag::new("A.B")));
        assert!(!set.insert(Tag::new("A.B")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serde_round_trip() {
        let set: TagSet = ["A.B", "C"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["A.B","C"]"#);
    }
}
