//! Collaborator contracts for the durable side of the engine, plus an
//! in-memory implementation for tests and benchmarks.
//!
//! The engine never persists anything itself. At open time it streams the
//! id dictionary, sets, and lists out of a [`Storage`]; afterwards the only
//! durable traffic is payload fetching through
//! [`Fetcher`](crate::cache::Fetcher). Any backing store honoring these
//! contracts is admissible; how it lays the data out on disk (and in what
//! byte order it encodes ids) is its own business.

use eyre::Result;
use hashbrown::HashMap;

use crate::cache::{Fetcher, Miss};
use crate::types::{Id, Payload};

/// Load-time source of the id dictionary and the named indexes. The count
/// methods are size hints for pre-sizing the engine's maps.
pub trait Storage {
    fn id_count(&self) -> u32;
    fn list_count(&self) -> u32;
    fn set_count(&self) -> u32;

    /// Streams every (external name, internal id) pair.
    fn each_id(&self, visit: &mut dyn FnMut(&str, Id)) -> Result<()>;

    /// Streams every named set with its member ids.
    fn each_set(&self, visit: &mut dyn FnMut(&str, &[Id])) -> Result<()>;

    /// Streams every named list with its ids in order.
    fn each_list(&self, visit: &mut dyn FnMut(&str, &[Id])) -> Result<()>;
}

/// A resource as the host sees it: an external name and opaque bytes.
pub trait Resource {
    fn id(&self) -> &str;
    fn bytes(&self) -> &[u8];
}

/// In-memory `Storage + Fetcher`, the backing store used by the test and
/// bench suites. Registration order is preserved when streaming.
#[derive(Default, Clone)]
pub struct MemoryStorage {
    ids: Vec<(String, Id)>,
    sets: Vec<(String, Vec<Id>)>,
    lists: Vec<(String, Vec<Id>)>,
    payloads: HashMap<Id, Payload>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, external: &str, internal: Id) -> Self {
        self.ids.push((external.to_owned(), internal));
        self
    }

    pub fn with_set(mut self, name: &str, ids: Vec<Id>) -> Self {
        self.sets.push((name.to_owned(), ids));
        self
    }

    pub fn with_list(mut self, name: &str, ids: Vec<Id>) -> Self {
        self.lists.push((name.to_owned(), ids));
        self
    }

    /// Registers payload bytes for an internal id.
    pub fn with_payload(mut self, id: Id, bytes: &[u8]) -> Self {
        self.payloads.insert(id, Payload::from(bytes));
        self
    }

    /// Registers a resource's bytes under its already-registered external
    /// name. Unknown names are ignored.
    pub fn with_resource(self, resource: &dyn Resource) -> Self {
        let internal = self
            .ids
            .iter()
            .find(|(external, _)| external == resource.id())
            .map(|&(_, id)| id);
        match internal {
            Some(id) => self.with_payload(id, resource.bytes()),
            None => self,
        }
    }
}

impl Storage for MemoryStorage {
    fn id_count(&self) -> u32 {
        self.ids.len() as u32
    }

    fn list_count(&self) -> u32 {
        self.lists.len() as u32
    }

    fn set_count(&self) -> u32 {
        self.sets.len() as u32
    }

    fn each_id(&self, visit: &mut dyn FnMut(&str, Id)) -> Result<()> {
        for (external, internal) in &self.ids {
            visit(external, *internal);
        }
        Ok(())
    }

    fn each_set(&self, visit: &mut dyn FnMut(&str, &[Id])) -> Result<()> {
        for (name, ids) in &self.sets {
            visit(name, ids);
        }
        Ok(())
    }

    fn each_list(&self, visit: &mut dyn FnMut(&str, &[Id])) -> Result<()> {
        for (name, ids) in &self.lists {
            visit(name, ids);
        }
        Ok(())
    }
}

impl Fetcher for MemoryStorage {
    fn fill(&self, misses: &[Miss], payloads: &mut [Payload]) -> Result<()> {
        for miss in misses {
            if let Some(payload) = self.payloads.get(&miss.id) {
                payloads[miss.slot] = payload.clone();
            }
        }
        Ok(())
    }

    fn get(&self, id: Id) -> Option<Payload> {
        self.payloads.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doc {
        name: &'static str,
        body: &'static [u8],
    }

    impl Resource for Doc {
        fn id(&self) -> &str {
            self.name
        }

        fn bytes(&self) -> &[u8] {
            self.body
        }
    }

    #[test]
    fn streams_in_registration_order() {
        let storage = MemoryStorage::new()
            .with_id("b", 2)
            .with_id("a", 1)
            .with_list("recent", vec![2, 1]);

        assert_eq!(storage.id_count(), 2);
        assert_eq!(storage.list_count(), 1);
        assert_eq!(storage.set_count(), 0);

        let mut seen = Vec::new();
        storage
            .each_id(&mut |external, internal| seen.push((external.to_owned(), internal)))
            .unwrap();
        assert_eq!(seen, vec![("b".to_owned(), 2), ("a".to_owned(), 1)]);
    }

    #[test]
    fn resources_resolve_through_registered_ids() {
        let storage = MemoryStorage::new()
            .with_id("doc:1", 1)
            .with_resource(&Doc {
                name: "doc:1",
                body: b"hello",
            })
            .with_resource(&Doc {
                name: "doc:unknown",
                body: b"dropped",
            });

        assert_eq!(&storage.get(1).unwrap()[..], b"hello");
        assert!(storage.get(2).is_none());
    }

    #[test]
    fn batch_fill_writes_only_known_slots() {
        let storage = MemoryStorage::new().with_payload(7, b"seven");
        let misses = [Miss { slot: 0, id: 7 }, Miss { slot: 1, id: 8 }];
        let mut payloads = vec![Payload::from(&b""[..]); 2];

        storage.fill(&misses, &mut payloads).unwrap();
        assert_eq!(&payloads[0][..], b"seven");
        assert!(payloads[1].is_empty());
    }
}
