//! # Sharded Payload Cache
//!
//! Size- and TTL-bounded id→payload map sitting in front of the durable
//! [`Fetcher`]. The map is split across 16 buckets selected by
//! `id & BUCKET_MASK`, each with its own reader-writer lock, so concurrent
//! queries rarely contend.
//!
//! ## Accounting
//!
//! Total cached bytes are tracked in a single atomic counter. The counter is
//! approximate: concurrent inserts and evictions may interleave, but every
//! mutation commits its exact byte delta, so the counter never drifts
//! systematically. Replacing an existing payload does not adjust it; the
//! next eviction of that id corrects the balance.
//!
//! ## Eviction
//!
//! When an insert pushes the counter to the soft maximum, a single
//! background pass starts (gated by a compare-and-swap flag, so at most one
//! runs at a time). The pass visits every bucket once: it samples up to
//! [`GC_SAMPLE_SIZE`] entries under the read lock, remembers the one
//! expiring soonest, then takes the write lock just long enough to delete
//! it. Freed bytes are subtracted in one atomic op at the end.
//!
//! Sampling instead of ordering keeps the pass O(buckets × sample) with no
//! per-entry list nodes, and foreground readers are never blocked for more
//! than one bucket's sampling window.
//!
//! ## Failure
//!
//! The cache itself never fails and never panics. The only error source is
//! the fetcher's batch fill, which propagates unchanged; payload slots
//! populated before the failure are retained.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use eyre::Result;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::config::constants::{BUCKET_COUNT, BUCKET_MASK, GC_SAMPLE_SIZE};
use crate::query::ResultBuf;
use crate::types::{Id, Payload};

/// A single miss recorded during a batch fill: the payload slot that needs
/// bytes and the id to fetch them for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Miss {
    pub slot: usize,
    pub id: Id,
}

/// Durable source of payload bytes, consulted singly on a cache miss and in
/// batch when filling a result.
pub trait Fetcher: Send + Sync {
    /// Resolves a batch of misses, writing `payloads[miss.slot]` for every
    /// miss it can serve. Slots for unknown ids are left untouched. On
    /// error the cache remains unchanged and the error reaches the caller
    /// of the fill.
    fn fill(&self, misses: &[Miss], payloads: &mut [Payload]) -> Result<()>;

    /// Single-id lookup. `None` is a normal outcome meaning "no such
    /// resource", not an error.
    fn get(&self, id: Id) -> Option<Payload>;
}

struct Item {
    expires: Instant,
    payload: Payload,
}

#[derive(Default)]
struct Bucket {
    lookup: RwLock<HashMap<Id, Item>>,
}

impl Bucket {
    fn get(&self, id: Id) -> Option<(Instant, Payload)> {
        let lookup = self.lookup.read();
        lookup
            .get(&id)
            .map(|item| (item.expires, item.payload.clone()))
    }

    /// Returns the removed payload when a key was actually deleted, so the
    /// caller can commit the exact byte delta.
    fn remove(&self, id: Id) -> Option<Payload> {
        self.lookup.write().remove(&id).map(|item| item.payload)
    }

    /// Returns true when the insert was a new key rather than a
    /// replacement.
    fn set(&self, id: Id, item: Item) -> bool {
        self.lookup.write().insert(id, item).is_none()
    }

    /// One eviction step: sample under the read lock, delete the sampled
    /// entry expiring soonest under the write lock. Returns the bytes
    /// actually freed.
    fn evict_one(&self) -> i64 {
        let mut victim: Option<(Id, Instant)> = None;
        {
            let lookup = self.lookup.read();
            for (sampled, (&id, item)) in lookup.iter().enumerate() {
                if sampled == GC_SAMPLE_SIZE {
                    break;
                }
                match victim {
                    Some((_, soonest)) if soonest <= item.expires => {}
                    _ => victim = Some((id, item.expires)),
                }
            }
        }
        let Some((id, _)) = victim else { return 0 };
        match self.remove(id) {
            Some(payload) => payload.len() as i64,
            None => 0,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lookup.read().len()
    }
}

pub struct Cache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    buckets: [Bucket; BUCKET_COUNT],
    size: AtomicI64,
    max: i64,
    ttl: Duration,
    gcing: AtomicBool,
    fetcher: Box<dyn Fetcher>,
}

impl Cache {
    pub(crate) fn new(fetcher: Box<dyn Fetcher>, max: i64, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                buckets: std::array::from_fn(|_| Bucket::default()),
                size: AtomicI64::new(0),
                max,
                ttl,
                gcing: AtomicBool::new(false),
                fetcher,
            }),
        }
    }

    /// Returns a live payload for `id`, consulting the fetcher on a miss
    /// and caching whatever it returns. `None` means the resource does not
    /// exist anywhere.
    pub fn fetch(&self, id: Id) -> Option<Payload> {
        if let Some(payload) = self.get(id) {
            return Some(payload);
        }
        let payload = self.inner.fetcher.get(id)?;
        self.set(id, payload.clone());
        Some(payload)
    }

    /// Populates every payload slot of `buf`. Hits are written directly;
    /// misses are collected and dispatched to the fetcher as one batch,
    /// then inserted into the cache.
    pub(crate) fn fill(&self, buf: &mut ResultBuf) -> Result<()> {
        buf.clear_misses();
        for slot in 0..buf.len() {
            let id = buf.id_at(slot);
            match self.get(id) {
                Some(payload) => buf.set_payload(slot, payload),
                None => buf.record_miss(slot, id),
            }
        }
        if buf.miss_count() == 0 {
            return Ok(());
        }
        {
            let (misses, payloads) = buf.fill_request();
            self.inner.fetcher.fill(misses, payloads)?;
        }
        for index in 0..buf.miss_count() {
            let Miss { slot, id } = buf.miss_at(index);
            self.set(id, buf.payload_at(slot).clone());
        }
        Ok(())
    }

    /// Read-locked lookup. An expired entry is removed on the spot, its
    /// bytes subtracted, and reported as absent.
    pub(crate) fn get(&self, id: Id) -> Option<Payload> {
        let bucket = self.inner.bucket(id);
        let (expires, payload) = bucket.get(id)?;
        if expires > Instant::now() {
            return Some(payload);
        }
        if let Some(removed) = bucket.remove(id) {
            self.inner.size.fetch_sub(removed.len() as i64, Ordering::Relaxed);
        }
        None
    }

    /// Upserts `id`. A net insertion (not a replacement) grows the byte
    /// counter; crossing the soft maximum starts the background eviction
    /// pass unless one is already running.
    pub(crate) fn set(&self, id: Id, payload: Payload) {
        let delta = payload.len() as i64;
        let item = Item {
            expires: Instant::now() + self.inner.ttl,
            payload,
        };
        if !self.inner.bucket(id).set(id, item) {
            return;
        }
        let size = self.inner.size.fetch_add(delta, Ordering::Relaxed) + delta;
        if size >= self.inner.max
            && self
                .inner
                .gcing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            let inner = Arc::clone(&self.inner);
            thread::spawn(move || inner.gc());
        }
    }

    /// Approximate total bytes of live payloads.
    pub fn size(&self) -> i64 {
        self.inner.size.load(Ordering::Relaxed)
    }
}

impl CacheInner {
    fn bucket(&self, id: Id) -> &Bucket {
        &self.buckets[id as usize & BUCKET_MASK]
    }

    fn gc(&self) {
        let mut freed = 0;
        for bucket in &self.buckets {
            freed += bucket.evict_one();
        }
        self.size.fetch_sub(freed, Ordering::Relaxed);
        self.gcing.store(false, Ordering::Release);
    }
}
