//! User-defined font collections

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named set of font ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub font_ids: BTreeSet<String>,
}

impl Collection {
    /// Create an empty collection with a fresh random id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: format!("{:032x}", rand::random::<u128>()),
            name: name.into(),
            font_ids: BTreeSet::new(),
        }
    }

    /// Returns false if the font was already a member
    pub fn insert(&mut self, font_id: &str) -> bool {
        self.font_ids.insert(font_id.to_string())
    }

    pub fn contains(&self, font_id: &str) -> bool {
        self.font_ids.contains(font_id)
    }

    pub fn len(&self) -> usize {
        self.font_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.font_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_collections_get_distinct_ids() {
        let a = Collection::new("Display");
        let b = Collection::new("Display");
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
        assert!(a.is_empty());
    }

    #[test]
    fn test_membership_is_a_set() {
        let mut collection = Collection::new("Body");
        assert!(collection.insert("font-1"));
        assert!(!collection.insert("font-1"));
        assert_eq!(collection.len(), 1);
        assert!(collection.contains("font-1"));
    }
}
