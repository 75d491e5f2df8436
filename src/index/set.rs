//! Unordered membership structure used to filter query results.

use std::sync::{Arc, OnceLock};

use hashbrown::HashSet;

use crate::types::Id;

pub struct Set {
    ids: Vec<Id>,
    members: HashSet<Id>,
}

impl Set {
    pub fn new(ids: Vec<Id>) -> Self {
        let mut members = HashSet::with_capacity(ids.len());
        for &id in &ids {
            members.insert(id);
        }
        Self { ids, members }
    }

    /// The shared empty singleton, returned whenever a named lookup misses.
    /// Guarantees an empty result for queries filtered on unknown names.
    pub fn empty() -> Arc<Set> {
        static EMPTY: OnceLock<Arc<Set>> = OnceLock::new();
        Arc::clone(EMPTY.get_or_init(|| Arc::new(Set::new(Vec::new()))))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn exists(&self, id: Id) -> bool {
        self.members.contains(&id)
    }

    /// Visits every member in insertion order.
    pub fn each<F>(&self, mut visit: F)
    where
        F: FnMut(Id),
    {
        for &id in &self.ids {
            visit(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_and_length() {
        let set = Set::new(vec![3, 1, 2]);
        assert_eq!(set.len(), 3);
        assert!(set.exists(1));
        assert!(set.exists(3));
        assert!(!set.exists(4));
    }

    #[test]
    fn each_preserves_insertion_order() {
        let set = Set::new(vec![5, 3, 9, 1]);
        let mut seen = Vec::new();
        set.each(|id| seen.push(id));
        assert_eq!(seen, vec![5, 3, 9, 1]);
    }

    #[test]
    fn empty_singleton_is_shared() {
        let a = Set::empty();
        let b = Set::empty();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_empty());
        assert!(!a.exists(0));
    }
}
