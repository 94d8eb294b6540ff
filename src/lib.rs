//! # lrumem
//!
//! An in-process least-recently-used cache bounded by item count and by an
//! estimated memory footprint, with a byte-exact binary dump format and a
//! thread-safe variant behind a reentrant lock.
//!
//! ## Features
//!
//! - **LRU eviction**: O(1) set/get/delete, least recently used entries go first
//! - **Two limits**: `maxsize` (entries) and `maxmem` (estimated bytes), adjustable at any time
//! - **Cost hints**: account for heap payloads such as `String` contents
//! - **Dump and reload**: length-prefixed binary chunks, reloaded in the same recency order
//! - **Thread-safe**: [`SafeCache`] returns [`Guarded`] results that keep the lock held
//! - **Statistics**: hits, misses and current usage through [`CacheStats`]
//!
//! ## Quick Start
//!
//! ```rust
//! use lrumem::Cache;
//!
//! let mut cache = Cache::with_limits(3, lrumem::UNBOUNDED);
//! cache.set(0, "A");
//! cache.set(1, "B");
//! cache.set(2, "C");
//! cache.set(3, "D"); // 0 is evicted
//!
//! assert_eq!(cache.get(&0), None);
//! assert_eq!(cache.get(&2), Some(&"C"));
//!
//! let stats = cache.stats();
//! assert_eq!((stats.hits, stats.misses), (1, 1));
//! ```
//!
//! ## Memory Limits
//!
//! Every entry costs [`Cache::ITEM_MEM`] bytes of bookkeeping. Cost hints add
//! the payload, with the key counted twice (the index and the list each hold
//! a copy):
//!
//! ```rust
//! use lrumem::{Cache, CacheBuilder};
//!
//! let item = Cache::<String, String>::ITEM_MEM;
//! let mut cache = CacheBuilder::new()
//!     .maxmem(2 * item + 100)
//!     .key_cost(|k: &String| k.len())
//!     .value_cost(|v: &String| v.len())
//!     .build();
//!
//! cache.set("a".to_string(), "x".repeat(40));
//! cache.set("b".to_string(), "y".repeat(40));
//! assert_eq!(cache.memory(), 2 * item + 2 * (2 + 40));
//!
//! // Over the byte ceiling: "a" is the least recently used and goes.
//! cache.set("c".to_string(), "z".repeat(40));
//! assert_eq!(cache.len(), 2);
//! assert!(!cache.contains_key("a"));
//! ```
//!
//! ## Dump and Load
//!
//! ```rust
//! use lrumem::Cache;
//!
//! let mut cache: Cache<u32, String> = Cache::new();
//! cache.set(1, "one".to_string());
//! cache.set(2, "two".to_string());
//!
//! let bytes = cache.dump();
//! let mut restored = Cache::new();
//! restored.load(&bytes).unwrap();
//! assert_eq!(restored, cache);
//!
//! // Truncated input is an error, not a panic.
//! assert!(restored.load(&bytes[..bytes.len() - 3]).is_err());
//! ```
//!
//! Custom key and value types implement [`ByteCodec`], usually by composing
//! the built-in integral and sequence codecs.
//!
//! ## Thread Safety
//!
//! ```rust
//! use lrumem::SafeCache;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache = Arc::new(SafeCache::<u64, u64>::new());
//! let writer = {
//!     let cache = Arc::clone(&cache);
//!     thread::spawn(move || cache.set(7, 49))
//! };
//! writer.join().unwrap();
//!
//! // The guard holds the lock until it goes out of scope.
//! let value = cache.get(&7);
//! assert_eq!(*value, Some(49));
//! ```
//!
//! ## Configuration
//!
//! [`Limits::from_env`] reads `<PREFIX>_MAXSIZE` and `<PREFIX>_MAXMEM`
//! (`64KB`, `16MB`, ...) so deployments can size caches without recompiling.
//!
//! ## Logging
//!
//! The cache emits [`tracing`](https://docs.rs/tracing) events: `trace` for
//! evictions, `debug` for flushes, limit changes and loads, `warn` for
//! malformed dumps and configuration. Install any subscriber to see them.

pub use lrumem_core::*;
