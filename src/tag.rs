//! Tag identifiers and tag-set normalization.
//!
//! Tags are opaque classification identifiers assigned elsewhere; this crate
//! only needs stable identity and set semantics.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable tag identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(u64);

impl TagId {
    /// Creates a tag ID from its numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TagId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Canonical cache key for a tag set.
///
/// The key is the tag ids sorted ascending and comma-joined, so the order in
/// which callers assemble the set never affects the key.
#[must_use]
pub fn canonical_key(tags: &HashSet<TagId>) -> String {
    let mut ids: Vec<TagId> = tags.iter().copied().collect();
    ids.sort_unstable();

    let mut key = String::with_capacity(ids.len() * 4);
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            key.push(',');
        }
        key.push_str(&id.to_string());
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_order_independent() {
        let a: HashSet<TagId> = [5, 1, 9].into_iter().map(TagId::new).collect();
        let b: HashSet<TagId> = [9, 5, 1].into_iter().map(TagId::new).collect();
        assert_eq!(canonical_key(&a), canonical_key(&b));
        assert_eq!(canonical_key(&a), "1,5,9");
    }

    #[test]
    fn empty_set_has_empty_key() {
        assert_eq!(canonical_key(&HashSet::new()), "");
    }

    #[test]
    fn tag_id_serializes_transparently() {
        let json = serde_json::to_string(&TagId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
