//! # Database Facade
//!
//! The facade owns everything with engine lifetime: the id dictionary, the
//! list and set registries, the payload cache, and the query and result
//! pools. It is built in one pass over the storage collaborator and is
//! `Send + Sync`; concurrency comes from many queries in flight, each
//! single-threaded.
//!
//! ## Query flow
//!
//! ```text
//! db.query("recent")          checkout (blocks while the pool is drained)
//!   .and("active")            attach filters, pagination, direction
//!   .limit(25)
//!   .execute()                fill the id page
//! result.fill()?              resolve payloads through the cache
//! result.ids() / payloads()   read the page
//! result.release()            return query + buffer to their pools
//! ```
//!
//! Lists and sets handed out here are `Arc` clones of load-time immutable
//! structures: valid for as long as the caller keeps them, never torn,
//! never locked.

use std::sync::Arc;

use eyre::{Result, WrapErr};
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::cache::{Cache, Fetcher};
use crate::config::constants::{QUERY_POOL_SIZE, RESULT_POOL_SIZE};
use crate::config::Config;
use crate::index::{List, Set};
use crate::pool::Pool;
use crate::query::{Query, QueryState, ResultBuf};
use crate::storage::Storage;
use crate::types::{Id, IdTable, Payload};

pub(crate) struct Shared {
    pub(crate) cache: Cache,
    pub(crate) queries: Pool<QueryState>,
    pub(crate) results: Pool<ResultBuf>,
    pub(crate) max_sets: usize,
    pub(crate) small_set_threshold: usize,
    pub(crate) large_list_threshold: usize,
    ids: IdTable,
    lists: RwLock<HashMap<String, Arc<List>>>,
    sets: RwLock<HashMap<String, Arc<Set>>>,
    path: String,
}

impl Shared {
    pub(crate) fn get_list(&self, name: &str) -> Option<Arc<List>> {
        self.lists.read().get(name).cloned()
    }

    pub(crate) fn get_set(&self, name: &str) -> Arc<Set> {
        self.sets
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(Set::empty)
    }
}

pub struct Database {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Builds the facade: validates the configuration, streams the id
    /// dictionary and every index out of `storage`, and wires the cache to
    /// `fetcher`. Storage and configuration errors surface here and the
    /// facade is not created.
    pub fn open<S, F>(config: Config, storage: &S, fetcher: F) -> Result<Self>
    where
        S: Storage + ?Sized,
        F: Fetcher + 'static,
    {
        config.validate().wrap_err("invalid configuration")?;

        let mut ids = IdTable::with_capacity(storage.id_count() as usize);
        storage
            .each_id(&mut |external, internal| ids.insert(external, internal))
            .wrap_err("streaming id dictionary")?;

        let mut sets: HashMap<String, Arc<Set>> =
            HashMap::with_capacity(storage.set_count() as usize);
        storage
            .each_set(&mut |name, members| {
                sets.insert(name.to_owned(), Arc::new(Set::new(members.to_vec())));
            })
            .wrap_err("streaming sets")?;

        let mut lists: HashMap<String, Arc<List>> =
            HashMap::with_capacity(storage.list_count() as usize);
        storage
            .each_list(&mut |name, ordered| {
                lists.insert(name.to_owned(), Arc::new(List::new(ordered.to_vec())));
            })
            .wrap_err("streaming lists")?;

        let max_sets = config.max_sets;
        let max_results = config.max_results;
        let ranked_capacity = config.small_set_threshold;

        Ok(Self {
            shared: Arc::new(Shared {
                cache: Cache::new(Box::new(fetcher), config.cache_size, config.cache_ttl),
                queries: Pool::new(QUERY_POOL_SIZE, || QueryState::new(max_sets)),
                results: Pool::new(RESULT_POOL_SIZE, || {
                    ResultBuf::new(max_results, ranked_capacity)
                }),
                max_sets,
                small_set_threshold: config.small_set_threshold,
                large_list_threshold: config.large_list_threshold,
                ids,
                lists: RwLock::new(lists),
                sets: RwLock::new(sets),
                path: config.path,
            }),
        })
    }

    /// Checks a query out of the pool, bound to the named sort list.
    /// Blocks while the pool is drained. An unknown list name yields a
    /// query that executes to the empty result.
    pub fn query(&self, sort: &str) -> Query {
        let state = self.shared.queries.checkout();
        let buf = self.shared.results.checkout();
        let sort = self.shared.get_list(sort);
        Query::new(Arc::clone(&self.shared), state, buf, sort)
    }

    pub fn list(&self, name: &str) -> Option<Arc<List>> {
        self.shared.get_list(name)
    }

    /// The named set, or the shared empty singleton when the name is
    /// unknown.
    pub fn set(&self, name: &str) -> Arc<Set> {
        self.shared.get_set(name)
    }

    /// Internal id for an external resource name.
    pub fn id(&self, external: &str) -> Option<Id> {
        self.shared.ids.internal(external)
    }

    /// External resource name for an internal id.
    pub fn external_id(&self, id: Id) -> Option<&str> {
        self.shared.ids.external(id)
    }

    /// Number of ids in the dictionary.
    pub fn id_count(&self) -> usize {
        self.shared.ids.len()
    }

    /// Live payload for a single id, through the cache.
    pub fn fetch(&self, id: Id) -> Option<Payload> {
        self.shared.cache.fetch(id)
    }

    /// The opaque storage identifier this facade was configured with.
    pub fn path(&self) -> &str {
        &self.shared.path
    }
}
