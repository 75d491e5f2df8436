//! Pooled result buffers and the result handle queries hand back.
//!
//! A [`ResultBuf`] owns parallel fixed-capacity arrays: the result ids,
//! their payload slots, a miss scratch used during payload resolution, and
//! a ranked scratch used by set-driven execution. The id and ranked arrays
//! share one length counter; execution uses them strictly one after the
//! other, never concurrently.

use std::sync::Arc;

use eyre::Result;

use crate::cache::Miss;
use crate::database::Shared;
use crate::query::QueryState;
use crate::types::{empty_payload, Id, Payload};

#[derive(Clone, Copy, Default)]
struct Ranked {
    id: Id,
    rank: u32,
}

pub(crate) struct ResultBuf {
    ids: Vec<Id>,
    payloads: Vec<Payload>,
    misses: Vec<Miss>,
    ranked: Vec<Ranked>,
    len: usize,
}

impl ResultBuf {
    pub(crate) fn new(max_results: usize, ranked_capacity: usize) -> Self {
        Self {
            ids: vec![0; max_results],
            payloads: vec![empty_payload(); max_results],
            misses: Vec::with_capacity(max_results),
            ranked: vec![Ranked::default(); ranked_capacity],
            len: 0,
        }
    }

    pub(crate) fn add(&mut self, id: Id) {
        debug_assert!(self.len < self.ids.len(), "result buffer overflow");
        self.ids[self.len] = id;
        self.len += 1;
    }

    pub(crate) fn add_ranked(&mut self, id: Id, rank: u32) {
        debug_assert!(self.len < self.ranked.len(), "ranked scratch overflow");
        self.ranked[self.len] = Ranked { id, rank };
        self.len += 1;
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn ids(&self) -> &[Id] {
        &self.ids[..self.len]
    }

    pub(crate) fn payloads(&self) -> &[Payload] {
        &self.payloads[..self.len]
    }

    pub(crate) fn id_at(&self, slot: usize) -> Id {
        self.ids[slot]
    }

    pub(crate) fn set_payload(&mut self, slot: usize, payload: Payload) {
        self.payloads[slot] = payload;
    }

    pub(crate) fn payload_at(&self, slot: usize) -> &Payload {
        &self.payloads[slot]
    }

    pub(crate) fn clear_misses(&mut self) {
        self.misses.clear();
    }

    pub(crate) fn record_miss(&mut self, slot: usize, id: Id) {
        self.misses.push(Miss { slot, id });
    }

    pub(crate) fn miss_count(&self) -> usize {
        self.misses.len()
    }

    pub(crate) fn miss_at(&self, index: usize) -> Miss {
        self.misses[index]
    }

    /// The recorded misses and the full payload slot array, together, for
    /// one batched fetcher call.
    pub(crate) fn fill_request(&mut self) -> (&[Miss], &mut [Payload]) {
        let Self {
            ref misses,
            ref mut payloads,
            ..
        } = *self;
        (misses.as_slice(), payloads.as_mut_slice())
    }

    /// Orders the ranked scratch ascending by rank. Ranks are unique per
    /// sort list, so the unstable sort is total.
    pub(crate) fn sort_ranked(&mut self) {
        self.ranked[..self.len].sort_unstable_by_key(|entry| entry.rank);
    }

    /// Hands the counter over from the ranked scratch to the id array:
    /// returns how many ranked entries were accumulated and zeroes the
    /// shared length so ids can be appended.
    pub(crate) fn take_ranked_len(&mut self) -> usize {
        let len = self.len;
        self.len = 0;
        len
    }

    pub(crate) fn ranked_id(&self, index: usize) -> Id {
        self.ranked[index].id
    }

    /// Back to canonical empty state: written payload slots are emptied so
    /// a later fill can never observe a previous query's bytes.
    pub(crate) fn reset(&mut self) {
        for payload in &mut self.payloads[..self.len] {
            *payload = empty_payload();
        }
        self.misses.clear();
        self.len = 0;
    }
}

struct Executed {
    shared: Arc<Shared>,
    state: QueryState,
    buf: ResultBuf,
    more: bool,
}

/// An executed query's page of ids, with payload resolution deferred until
/// [`fill`](QueryResult::fill). Holds the pooled query and buffer until
/// [`release`](QueryResult::release) returns them.
pub struct QueryResult {
    inner: Option<Executed>,
}

impl QueryResult {
    pub(crate) fn new(shared: Arc<Shared>, state: QueryState, buf: ResultBuf, more: bool) -> Self {
        Self {
            inner: Some(Executed {
                shared,
                state,
                buf,
                more,
            }),
        }
    }

    /// The canonical empty result. Owns no pooled objects, so releasing it
    /// is a no-op.
    pub(crate) fn empty() -> Self {
        Self { inner: None }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |r| r.buf.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when at least one additional id passed the filter beyond the
    /// returned page.
    pub fn more(&self) -> bool {
        self.inner.as_ref().map_or(false, |r| r.more)
    }

    pub fn ids(&self) -> &[Id] {
        self.inner.as_ref().map_or(&[], |r| r.buf.ids())
    }

    /// Payload slots parallel to [`ids`](QueryResult::ids). Empty until
    /// [`fill`](QueryResult::fill) runs; a slot stays empty when the
    /// backing store has no such resource.
    pub fn payloads(&self) -> &[Payload] {
        self.inner.as_ref().map_or(&[], |r| r.buf.payloads())
    }

    /// Resolves payloads for every result id through the cache. Fetcher
    /// errors surface unchanged; slots populated before the failure are
    /// retained.
    pub fn fill(&mut self) -> Result<()> {
        match &mut self.inner {
            Some(r) => r.shared.cache.fill(&mut r.buf),
            None => Ok(()),
        }
    }

    /// Returns the query and its buffer to their pools, in canonical empty
    /// state. The result must not be used afterwards; consuming `self`
    /// enforces that statically.
    pub fn release(self) {
        if let Some(mut r) = self.inner {
            r.buf.reset();
            r.state.reset();
            r.shared.results.release(r.buf);
            r.shared.queries.release(r.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_tracks_length() {
        let mut buf = ResultBuf::new(4, 4);
        assert_eq!(buf.len(), 0);
        buf.add(9);
        buf.add(7);
        assert_eq!(buf.ids(), &[9, 7]);
        assert_eq!(buf.payloads().len(), 2);
    }

    #[test]
    fn ranked_sorts_by_rank_and_hands_over_the_counter() {
        let mut buf = ResultBuf::new(4, 4);
        buf.add_ranked(100, 3);
        buf.add_ranked(200, 1);
        buf.add_ranked(300, 2);
        buf.sort_ranked();

        let ranked = buf.take_ranked_len();
        assert_eq!(ranked, 3);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.ranked_id(0), 200);
        assert_eq!(buf.ranked_id(1), 300);
        assert_eq!(buf.ranked_id(2), 100);

        // The id array fills while the ranked scratch is still being read.
        buf.add(buf.ranked_id(2));
        assert_eq!(buf.ids(), &[100]);
    }

    #[test]
    fn reset_clears_written_payload_slots() {
        let mut buf = ResultBuf::new(4, 4);
        buf.add(1);
        buf.set_payload(0, Arc::from(&b"stale"[..]));
        buf.record_miss(0, 1);
        buf.reset();

        assert_eq!(buf.len(), 0);
        assert_eq!(buf.miss_count(), 0);
        buf.add(2);
        assert!(buf.payloads()[0].is_empty());
    }
}
