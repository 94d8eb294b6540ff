//! # lrumem Core
//!
//! Core engine of the lrumem caching library: an in-process key-value cache
//! bounded by item count and estimated memory, evicting least recently used
//! entries under pressure.
//!
//! ## Features
//!
//! - **O(1) LRU engine**: hash index over an arena-backed recency list with stable handles
//! - **Count and memory limits**: `maxsize` and `maxmem`, both adjustable at runtime
//! - **Memory accounting**: fixed per-entry overhead plus optional key/value cost hints
//! - **Binary dump/load**: length-prefixed chunks that reload in the exact recency order
//! - **Thread safety**: `SafeCache` behind a reentrant lock, with lock-holding result guards
//! - **Statistics**: hits, misses, limits and current usage
//!
//! ## Module Organization
//!
//! - [`cache`] - Single-threaded cache engine
//! - [`safe_cache`] - Thread-safe wrapper
//! - [`guard`] - Lock-holding result handle
//! - [`codec`] - Dump format and pluggable per-type serializers
//! - [`memory_estimator`] - Per-entry cost estimation
//! - [`config`] - Builder and environment-driven limits
//! - [`text`] - Debug text rendering
//!
//! ## Example
//!
//! ```
//! use lrumem_core::{Cache, SafeCache};
//!
//! let mut cache: Cache<u32, String> = Cache::with_limits(2, lrumem_core::UNBOUNDED);
//! cache.set(1, "one".to_string());
//! cache.set(2, "two".to_string());
//! cache.set(3, "three".to_string()); // evicts 1
//! assert!(!cache.contains_key(&1));
//!
//! let shared = SafeCache::from(cache);
//! assert_eq!(shared.get(&3), Some("three".to_string()));
//! ```

pub mod cache;
mod cache_entry;
pub mod codec;
pub mod config;
mod error;
pub mod guard;
pub mod memory_estimator;
mod recency_list;
pub mod safe_cache;
mod stats;
pub mod text;

pub use cache::Cache;
pub use codec::{ByteCodec, Decoder, Integral};
pub use config::{parse_memory_size, CacheBuilder, Limits};
pub use error::{CodecError, ConfigError, Result};
pub use guard::Guarded;
pub use memory_estimator::{item_mem, CostHint, MemoryAccountant, MemoryEstimator};
pub use safe_cache::SafeCache;
pub use stats::CacheStats;
pub use text::ItemText;

/// Sentinel for an unset `maxsize` or `maxmem` limit.
///
/// # Examples
///
/// ```
/// use lrumem_core::{Cache, UNBOUNDED};
///
/// let cache: Cache<u8, u8> = Cache::new();
/// assert_eq!(cache.maxsize(), UNBOUNDED);
/// assert_eq!(cache.maxmem(), UNBOUNDED);
/// ```
pub const UNBOUNDED: usize = usize::MAX;
