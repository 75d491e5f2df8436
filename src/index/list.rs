//! Ordered id sequence serving as a query's sort axis.
//!
//! Two views over the same ids: a position array for iteration in either
//! direction, and a rank map for constant-time position lookup. Both are
//! built in one pass and never mutated afterwards.

use hashbrown::HashMap;

use crate::types::Id;

pub struct List {
    ids: Vec<Id>,
    ranks: HashMap<Id, u32>,
}

impl List {
    pub fn new(ids: Vec<Id>) -> Self {
        let mut ranks = HashMap::with_capacity(ids.len());
        for (position, &id) in ids.iter().enumerate() {
            ranks.insert(id, position as u32);
        }
        Self { ids, ranks }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Visits ids in the requested direction until `visit` returns false.
    pub fn each<F>(&self, descending: bool, mut visit: F)
    where
        F: FnMut(Id) -> bool,
    {
        if descending {
            for &id in self.ids.iter().rev() {
                if !visit(id) {
                    return;
                }
            }
        } else {
            for &id in &self.ids {
                if !visit(id) {
                    return;
                }
            }
        }
    }

    /// Position of `id` within the list, or `None` when the list does not
    /// contain it.
    pub fn rank(&self, id: Id) -> Option<u32> {
        self.ranks.get(&id).copied()
    }
}
