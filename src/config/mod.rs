//! # Engine Configuration
//!
//! `Config` uses consuming setters to provide a fluent API for configuring
//! the engine before opening a [`Database`](crate::Database). Settings are
//! validated once, at open time; an invalid configuration fails the open and
//! no facade is created.
//!
//! ## Options
//!
//! | Option                 | Default | Description                                |
//! |------------------------|---------|--------------------------------------------|
//! | cache_size             | 32MB    | Soft maximum for cached payload bytes      |
//! | cache_ttl              | 300s    | Item time-to-live, applied at insert       |
//! | max_sets               | 8       | Per-query capacity for attached sets       |
//! | max_results            | 100     | Result buffer capacity, per pooled buffer  |
//! | path                   | ""      | Opaque identifier for the storage layer    |
//! | small_set_threshold    | 100     | Planner routing: small-set ceiling         |
//! | large_list_threshold   | 1000    | Planner routing: long-list floor           |
//!
//! ## Usage
//!
//! ```ignore
//! let config = Config::new()
//!     .path("/data/resources.db")
//!     .cache_size(64 * 1024 * 1024)
//!     .cache_ttl(Duration::from_secs(600));
//! let db = Database::open(config, &storage, fetcher)?;
//! ```

pub mod constants;

use std::time::Duration;

use eyre::{ensure, Result};

use self::constants::{
    DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL_SECS, DEFAULT_LARGE_LIST_THRESHOLD, DEFAULT_MAX_RESULTS,
    DEFAULT_MAX_SETS, DEFAULT_SMALL_SET_THRESHOLD,
};

/// Engine configuration. Build with [`Config::new`], chain setters, hand to
/// [`Database::open`](crate::Database::open).
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) cache_size: i64,
    pub(crate) cache_ttl: Duration,
    pub(crate) max_sets: usize,
    pub(crate) max_results: usize,
    pub(crate) path: String,
    pub(crate) small_set_threshold: usize,
    pub(crate) large_list_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_sets: DEFAULT_MAX_SETS,
            max_results: DEFAULT_MAX_RESULTS,
            path: String::new(),
            small_set_threshold: DEFAULT_SMALL_SET_THRESHOLD,
            large_list_threshold: DEFAULT_LARGE_LIST_THRESHOLD,
        }
    }

    /// Soft maximum for total cached payload bytes. Reaching it triggers a
    /// background eviction pass.
    pub fn cache_size(mut self, bytes: i64) -> Self {
        self.cache_size = bytes;
        self
    }

    /// Time-to-live applied to every cache item at insert time.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Maximum number of sets a single query may attach.
    pub fn max_sets(mut self, count: usize) -> Self {
        self.max_sets = count;
        self
    }

    /// Capacity of each pooled result buffer, in ids. A query limit beyond
    /// this overflows the buffer.
    pub fn max_results(mut self, count: usize) -> Self {
        self.max_results = count;
        self
    }

    /// Opaque identifier handed to the storage collaborator by the host.
    /// The engine itself only records it.
    pub fn path<P: Into<String>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    /// Smallest-attached-set ceiling for routing a query to the set-driven
    /// strategy. Also sizes the ranked scratch of each result buffer.
    pub fn small_set_threshold(mut self, count: usize) -> Self {
        self.small_set_threshold = count;
        self
    }

    /// Sort-list length floor for routing a query to the set-driven
    /// strategy.
    pub fn large_list_threshold(mut self, count: usize) -> Self {
        self.large_list_threshold = count;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.cache_size > 0, "cache_size must be positive");
        ensure!(self.max_results > 0, "max_results must be at least 1");
        ensure!(self.max_sets > 0, "max_sets must be at least 1");
        Ok(())
    }
}
