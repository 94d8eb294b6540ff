use std::fmt;

use crate::UNBOUNDED;

/// Cache statistics snapshot.
///
/// A plain aggregate filled in by [`Cache`](crate::Cache): the hit/miss
/// counters plus the configured limits and current usage. It is `Copy`, so
/// reading it never has to hold a lock.
///
/// `hits` and `misses` change only on `get`. `currsize` and `currmem` always
/// describe the live entry set. `flush` zeroes the usage but keeps the counters.
///
/// # Examples
///
/// ```
/// use lrumem_core::{Cache, UNBOUNDED};
///
/// let mut cache: Cache<u32, u32> = Cache::new();
/// cache.set(1, 10);
/// cache.get(&1);
/// cache.get(&2);
///
/// let stats = cache.stats();
/// assert_eq!(stats.hits, 1);
/// assert_eq!(stats.misses, 1);
/// assert_eq!(stats.currsize, 1);
/// assert_eq!(stats.maxsize, UNBOUNDED);
/// assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheStats {
    /// Successful lookups.
    pub hits: u64,
    /// Failed lookups.
    pub misses: u64,
    /// Item-count ceiling, [`UNBOUNDED`] when unset.
    pub maxsize: usize,
    /// Number of live entries.
    pub currsize: usize,
    /// Byte ceiling, [`UNBOUNDED`] when unset.
    pub maxmem: usize,
    /// Sum of the live entries' estimated costs.
    pub currmem: usize,
}

impl CacheStats {
    /// Creates a snapshot with zero counters and usage and the given limits.
    pub fn new(maxsize: usize, maxmem: usize) -> Self {
        Self {
            hits: 0,
            misses: 0,
            maxsize,
            currsize: 0,
            maxmem,
            currmem: 0,
        }
    }

    /// Returns the total number of lookups (hits + misses).
    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Returns the hit rate as a fraction (0.0 to 1.0).
    ///
    /// Returns 0.0 if there have been no lookups.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Returns the miss rate as a fraction (0.0 to 1.0).
    ///
    /// Returns 0.0 if there have been no lookups.
    #[inline]
    pub fn miss_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64
        }
    }

    /// Returns `true` when neither limit is set.
    pub fn is_unbounded(&self) -> bool {
        self.maxsize == UNBOUNDED && self.maxmem == UNBOUNDED
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new(UNBOUNDED, UNBOUNDED)
    }
}

struct Limit(usize);

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == UNBOUNDED {
            f.write_str("inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Renders `hits H | misses M | maxsize N | currsize C | maxmem B | currmem U`,
/// with `inf` standing in for an unbounded limit.
impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits {} | misses {} | maxsize {} | currsize {} | maxmem {} | currmem {}",
            self.hits,
            self.misses,
            Limit(self.maxsize),
            self.currsize,
            Limit(self.maxmem),
            self.currmem
        )
    }
}
