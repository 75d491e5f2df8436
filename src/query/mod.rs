//! # Query Planning and Execution
//!
//! A query binds one list as its sort axis, intersects it against zero or
//! more sets, applies offset/limit and direction, and yields a page of ids.
//! Two strategies produce identical pages:
//!
//! - **Sort-scan** walks the sort list in the requested direction, applying
//!   the set-membership filter and stopping as soon as the page fills. Cost
//!   is proportional to the portion of the list walked, with good locality.
//! - **Set-driven** walks the smallest attached set, resolves each
//!   surviving id's rank in the sort list, sorts the survivors by rank, and
//!   paginates the sorted scratch. Cost is proportional to the smallest
//!   set, independent of list length.
//!
//! The planner routes the skewed case (a tiny intersection against a huge
//! ordering) to set-driven: smallest set under `small_set_threshold` with a
//! list over `large_list_threshold`. Everything else takes the scan.
//!
//! Queries and their result buffers come from bounded pools; execution
//! itself allocates nothing. `execute` fills only the id page, with payload
//! resolution deferred to [`QueryResult::fill`], keeping execution free of
//! payload-storage locks.

mod result;

pub use result::QueryResult;
pub(crate) use result::ResultBuf;

use std::sync::Arc;

use smallvec::SmallVec;

use crate::config::constants::DEFAULT_LIMIT;
use crate::database::Shared;
use crate::index::{List, Set};
use crate::types::Id;

/// The pooled portion of a query: the attached-set array plus pagination
/// settings. Reset to canonical state before returning to the pool, so a
/// fresh checkout always starts from defaults.
pub(crate) struct QueryState {
    sets: SmallVec<[Arc<Set>; 4]>,
    offset: usize,
    limit: usize,
    desc: bool,
}

impl QueryState {
    pub(crate) fn new(max_sets: usize) -> Self {
        Self {
            sets: SmallVec::with_capacity(max_sets),
            offset: 0,
            limit: DEFAULT_LIMIT,
            desc: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.sets.clear();
        self.offset = 0;
        self.limit = DEFAULT_LIMIT;
        self.desc = false;
    }
}

/// True when `id` belongs to every set in the slice. An empty slice accepts
/// everything, which is exactly the unfiltered case.
fn exists_all(sets: &[Arc<Set>], id: Id) -> bool {
    sets.iter().all(|set| set.exists(id))
}

/// A checked-out query, bound to a sort list. Configure with the fluent
/// setters, then [`execute`](Query::execute).
pub struct Query {
    shared: Arc<Shared>,
    state: QueryState,
    buf: ResultBuf,
    sort: Option<Arc<List>>,
}

impl Query {
    pub(crate) fn new(
        shared: Arc<Shared>,
        state: QueryState,
        buf: ResultBuf,
        sort: Option<Arc<List>>,
    ) -> Self {
        Self {
            shared,
            state,
            buf,
            sort,
        }
    }

    /// Intersects the result with the named set. An unknown name binds the
    /// empty singleton, guaranteeing an empty result.
    pub fn and(mut self, set: &str) -> Self {
        debug_assert!(
            self.state.sets.len() < self.shared.max_sets,
            "query exceeds the configured max_sets"
        );
        self.state.sets.push(self.shared.get_set(set));
        self
    }

    /// Number of filtered ids to skip before the page starts.
    pub fn offset(mut self, offset: usize) -> Self {
        self.state.offset = offset;
        self
    }

    /// Page size. Defaults to 50; values beyond the configured
    /// `max_results` overflow the result buffer.
    pub fn limit(mut self, limit: usize) -> Self {
        self.state.limit = limit;
        self
    }

    /// Walk the sort list backwards.
    pub fn desc(mut self) -> Self {
        self.state.desc = true;
        self
    }

    /// Runs the query. The returned result owns the buffer (and the pooled
    /// query) until released.
    pub fn execute(mut self) -> QueryResult {
        let Some(sort) = self.sort.take() else {
            return self.release_empty();
        };
        if self.state.limit == 0 {
            return self.release_empty();
        }
        if self.state.sets.is_empty() {
            return self.sort_scan(&sort);
        }

        // Smallest set first: it drives set-driven execution and fails the
        // conjunction fastest during a scan.
        self.state.sets.sort_unstable_by_key(|set| set.len());
        if self.state.sets[0].is_empty() {
            return self.release_empty();
        }

        if self.state.sets[0].len() < self.shared.small_set_threshold
            && sort.len() > self.shared.large_list_threshold
        {
            self.set_driven(&sort)
        } else {
            self.sort_scan(&sort)
        }
    }

    fn sort_scan(mut self, sort: &List) -> QueryResult {
        let mut offset = self.state.offset;
        let mut remaining = self.state.limit;
        let mut more = false;
        {
            let sets = self.state.sets.as_slice();
            let buf = &mut self.buf;
            sort.each(self.state.desc, |id| {
                if !exists_all(sets, id) {
                    return true;
                }
                if offset > 0 {
                    offset -= 1;
                    return true;
                }
                if remaining == 0 {
                    more = true;
                    return false;
                }
                buf.add(id);
                remaining -= 1;
                true
            });
        }
        self.finish(more)
    }

    fn set_driven(mut self, sort: &List) -> QueryResult {
        {
            let (first, rest) = self
                .state
                .sets
                .split_first()
                .expect("set-driven execution requires an attached set");
            let buf = &mut self.buf;
            first.each(|id| {
                if !exists_all(rest, id) {
                    return;
                }
                if let Some(rank) = sort.rank(id) {
                    buf.add_ranked(id, rank);
                }
            });
        }
        self.buf.sort_ranked();
        let ranked = self.buf.take_ranked_len();

        let mut remaining = self.state.limit;
        let mut more = false;
        if self.state.desc {
            let mut index = ranked as i64 - self.state.offset as i64 - 1;
            while index >= 0 {
                if remaining == 0 {
                    more = true;
                    break;
                }
                let id = self.buf.ranked_id(index as usize);
                self.buf.add(id);
                remaining -= 1;
                index -= 1;
            }
        } else {
            let mut index = self.state.offset;
            while index < ranked {
                if remaining == 0 {
                    more = true;
                    break;
                }
                let id = self.buf.ranked_id(index);
                self.buf.add(id);
                remaining -= 1;
                index += 1;
            }
        }
        self.finish(more)
    }

    fn finish(self, more: bool) -> QueryResult {
        QueryResult::new(self.shared, self.state, self.buf, more)
    }

    /// Short-circuit: hand the pooled objects straight back and return the
    /// canonical empty result.
    fn release_empty(self) -> QueryResult {
        let Query {
            shared,
            mut state,
            mut buf,
            ..
        } = self;
        buf.reset();
        state.reset();
        shared.results.release(buf);
        shared.queries.release(state);
        QueryResult::empty()
    }
}
