//! # Engine Configuration Constants
//!
//! This module centralizes the engine's tuning constants, grouping
//! interdependent values together. Constants that depend on each other are
//! co-located to prevent mismatch bugs.
//!
//! ## Relationships
//!
//! ```text
//! QUERY_POOL_SIZE (64)
//!       │
//!       └─> RESULT_POOL_SIZE (must be >=)
//!             Every checked-out query claims one result buffer. If the
//!             result pool were smaller, a full query pool could block on
//!             buffers that are never released.
//!
//! BUCKET_COUNT (16, power of two)
//!       │
//!       └─> BUCKET_MASK (derived: BUCKET_COUNT - 1)
//!             Bucket selection is `id & BUCKET_MASK`.
//! ```

// ============================================================================
// CACHE SHARDING
// ============================================================================

/// Number of cache buckets. Must be a power of two so that bucket selection
/// can mask instead of divide.
pub const BUCKET_COUNT: usize = 16;

/// Mask applied to an id to select its bucket.
pub const BUCKET_MASK: usize = BUCKET_COUNT - 1;

/// Maximum number of entries the eviction task examines per bucket before
/// committing to a victim.
pub const GC_SAMPLE_SIZE: usize = 10;

const _: () = assert!(
    BUCKET_COUNT.is_power_of_two(),
    "BUCKET_COUNT must be a power of two for mask-based bucket selection"
);

const _: () = assert!(
    BUCKET_MASK == BUCKET_COUNT - 1,
    "BUCKET_MASK derivation mismatch"
);

// ============================================================================
// POOLS
// ============================================================================

/// Number of pooled queries, bounding the queries in flight at once.
/// Checkout blocks when the pool is drained.
pub const QUERY_POOL_SIZE: usize = 64;

/// Number of pooled result buffers.
/// MUST be >= QUERY_POOL_SIZE: every query claims exactly one buffer, in a
/// fixed order (query first, buffer second), so a matching pool can never
/// leave a checked-out query waiting forever.
pub const RESULT_POOL_SIZE: usize = QUERY_POOL_SIZE;

const _: () = assert!(
    RESULT_POOL_SIZE >= QUERY_POOL_SIZE,
    "RESULT_POOL_SIZE must be >= QUERY_POOL_SIZE so every checked-out query can obtain a buffer"
);

// ============================================================================
// QUERY DEFAULTS
// ============================================================================

/// Page size applied when a query does not specify a limit.
pub const DEFAULT_LIMIT: usize = 50;

/// Default capacity of each pooled result buffer, in ids.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Default per-query capacity for attached sets.
pub const DEFAULT_MAX_SETS: usize = 8;

/// Below this smallest-attached-set length the planner considers the
/// set-driven strategy. Also sizes the ranked scratch of each result buffer.
pub const DEFAULT_SMALL_SET_THRESHOLD: usize = 100;

/// Above this sort-list length the planner considers the set-driven
/// strategy.
pub const DEFAULT_LARGE_LIST_THRESHOLD: usize = 1000;

// ============================================================================
// CACHE DEFAULTS
// ============================================================================

/// Default soft maximum for total cached payload bytes (32MB).
pub const DEFAULT_CACHE_SIZE: i64 = 32 * 1024 * 1024;

/// Default time-to-live applied to cache items at insert, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
