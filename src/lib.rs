//! # rankdb - Embedded Indexed-Resource Query Engine
//!
//! rankdb serves paged, filtered, ordered slices of an id universe loaded
//! from a pluggable backing store. Callers register an ordered universe of
//! resource ids plus named **sets** (unordered membership) and named
//! **lists** (ordered sequences serving as sort axes); a query picks one
//! list, intersects it against any number of sets, applies offset/limit and
//! direction, and returns a small page of ids with their opaque payloads.
//!
//! Payloads are served through a sharded, size-bounded, TTL-expiring cache
//! in front of a batch-capable durable fetcher. Queries and result buffers
//! are pooled, so steady-state execution does not allocate.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rankdb::{Config, Database, MemoryStorage};
//!
//! let storage = MemoryStorage::new()
//!     .with_id("article:9", 9)
//!     .with_list("recent", vec![9, 4, 7])
//!     .with_set("published", vec![9, 7]);
//!
//! let db = Database::open(Config::new(), &storage, storage.clone())?;
//!
//! let mut result = db.query("recent").and("published").limit(10).execute();
//! result.fill()?;
//! for (id, payload) in result.ids().iter().zip(result.payloads()) {
//!     println!("{id}: {} bytes", payload.len());
//! }
//! result.release();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │            Database (facade)               │
//! │  id dictionary │ list/set registries       │
//! ├────────────────────────────────────────────┤
//! │   Query planner & executor (pooled)        │
//! │   sort-scan ◄── strategy ──► set-driven    │
//! ├────────────────────────────────────────────┤
//! │   Result buffers (pooled ids/payloads)     │
//! ├────────────────────────────────────────────┤
//! │   Sharded TTL cache (16 buckets)           │
//! ├────────────────────────────────────────────┤
//! │   Fetcher / Storage collaborators          │
//! └────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`database`]: the facade owning indexes, cache, and pools
//! - [`query`]: dual-strategy planner, executor, result handles
//! - [`cache`]: sharded TTL+capacity payload cache with sampled eviction
//! - [`index`]: immutable load-time lists and sets
//! - [`storage`]: collaborator traits and the in-memory implementation
//! - [`config`]: fluent configuration and engine constants

pub mod cache;
pub mod config;
pub mod database;
pub mod index;
mod pool;
pub mod query;
pub mod storage;
pub mod types;

pub use cache::{Fetcher, Miss};
pub use config::Config;
pub use database::Database;
pub use index::{List, Set};
pub use query::{Query, QueryResult};
pub use storage::{MemoryStorage, Resource, Storage};
pub use types::{Id, Payload};
