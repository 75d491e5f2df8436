//! Core id and payload types shared across the engine.
//!
//! Internally every resource is a 32-bit id; the external, caller-facing
//! name is an opaque string. The mapping between the two is built once at
//! load time and never mutated afterwards, so the [`IdTable`] needs no
//! locking.

use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;

/// Internal resource identifier. External consumers address resources by an
/// opaque string; the engine only ever sees this.
pub type Id = u32;

/// Opaque, immutable resource bytes, cheaply shared between cache items and
/// result slots.
pub type Payload = Arc<[u8]>;

/// The shared zero-length payload. Indistinguishable from an absent
/// resource on the fetch path.
pub(crate) fn empty_payload() -> Payload {
    static EMPTY: OnceLock<Payload> = OnceLock::new();
    EMPTY.get_or_init(|| Arc::from(&[][..])).clone()
}

/// Bidirectional id dictionary, immutable after load. Both directions share
/// one string allocation per entry.
pub(crate) struct IdTable {
    external: HashMap<Id, Arc<str>>,
    internal: HashMap<Arc<str>, Id>,
}

impl IdTable {
    pub(crate) fn with_capacity(count: usize) -> Self {
        Self {
            external: HashMap::with_capacity(count),
            internal: HashMap::with_capacity(count),
        }
    }

    pub(crate) fn insert(&mut self, external: &str, internal: Id) {
        let name: Arc<str> = Arc::from(external);
        self.external.insert(internal, Arc::clone(&name));
        self.internal.insert(name, internal);
    }

    pub(crate) fn external(&self, id: Id) -> Option<&str> {
        self.external.get(&id).map(|name| name.as_ref())
    }

    pub(crate) fn internal(&self, external: &str) -> Option<Id> {
        self.internal.get(external).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.external.len()
    }
}
