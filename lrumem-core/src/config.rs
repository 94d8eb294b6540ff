//! Construction-time configuration.
//!
//! [`CacheBuilder`] gathers limits, cost hints and a hasher before building a
//! [`Cache`] or [`SafeCache`]. [`Limits`] can be read from environment
//! variables so deployments can size caches without recompiling.

use std::collections::hash_map::RandomState;
use std::env;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use tracing::warn;

use crate::error::ConfigError;
use crate::memory_estimator::{MemoryAccountant, MemoryEstimator};
use crate::{Cache, SafeCache, UNBOUNDED};

/// Optional item-count and byte ceilings. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub maxsize: Option<usize>,
    pub maxmem: Option<usize>,
}

impl Limits {
    /// Reads `<PREFIX>_MAXSIZE` and `<PREFIX>_MAXMEM` from the environment.
    ///
    /// # Environment Variables
    /// - `<PREFIX>_MAXSIZE` - item count, e.g. `1000` (default: unbounded)
    /// - `<PREFIX>_MAXMEM` - byte size, e.g. `65536`, `64KB`, `16MB`, `1GB` (default: unbounded)
    ///
    /// Either may be `inf` to state the default explicitly. A variable that is
    /// set but malformed is an error rather than silently ignored.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use lrumem_core::Limits;
    ///
    /// let limits = Limits::from_lookup("USERS", |name| match name {
    ///     "USERS_MAXSIZE" => Some("500".to_string()),
    ///     "USERS_MAXMEM" => Some("2MB".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(limits.maxsize, Some(500));
    /// assert_eq!(limits.maxmem, Some(2 * 1024 * 1024));
    /// ```
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let size_var = format!("{prefix}_MAXSIZE");
        let mem_var = format!("{prefix}_MAXMEM");

        let maxsize = match lookup(&size_var) {
            Some(raw) => Some(parse_count(&raw).ok_or_else(|| {
                warn!(variable = %size_var, value = %raw, "malformed cache limit");
                ConfigError::InvalidCount {
                    name: size_var.clone(),
                    value: raw.clone(),
                }
            })?),
            None => None,
        };
        let maxmem = match lookup(&mem_var) {
            Some(raw) => Some(parse_memory_size(&raw).ok_or_else(|| {
                warn!(variable = %mem_var, value = %raw, "malformed cache limit");
                ConfigError::InvalidSize {
                    name: mem_var.clone(),
                    value: raw.clone(),
                }
            })?),
            None => None,
        };
        Ok(Self { maxsize, maxmem })
    }

    pub fn maxsize_or_unbounded(&self) -> usize {
        self.maxsize.unwrap_or(UNBOUNDED)
    }

    pub fn maxmem_or_unbounded(&self) -> usize {
        self.maxmem.unwrap_or(UNBOUNDED)
    }
}

fn parse_count(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("inf") {
        return Some(UNBOUNDED);
    }
    trimmed.parse().ok()
}

/// Parses a human-readable byte size.
///
/// Accepts a plain number of bytes or a number followed by `B`, `KB`, `MB`
/// or `GB` (1024-based, case-insensitive, optional whitespace before the
/// unit). `inf` maps to [`UNBOUNDED`]. Returns `None` on malformed input or
/// overflow.
///
/// # Examples
///
/// ```
/// use lrumem_core::parse_memory_size;
///
/// assert_eq!(parse_memory_size("512"), Some(512));
/// assert_eq!(parse_memory_size("64KB"), Some(64 * 1024));
/// assert_eq!(parse_memory_size("16 mb"), Some(16 * 1024 * 1024));
/// assert_eq!(parse_memory_size("1GB"), Some(1024 * 1024 * 1024));
/// assert_eq!(parse_memory_size("12XB"), None);
/// ```
pub fn parse_memory_size(input: &str) -> Option<usize> {
    let upper = input.trim().to_ascii_uppercase();
    if upper == "INF" {
        return Some(UNBOUNDED);
    }
    let (number, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };
    let number = number.trim_end();
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse::<usize>().ok()?.checked_mul(multiplier)
}

/// Builder for [`Cache`] and [`SafeCache`].
///
/// # Examples
///
/// ```
/// use lrumem_core::{Cache, CacheBuilder};
///
/// let mut cache = CacheBuilder::new()
///     .maxsize(2)
///     .key_cost(|k: &String| k.len())
///     .value_cost(|v: &String| v.len())
///     .build();
///
/// cache.set("k".to_string(), "value".to_string());
/// assert_eq!(
///     cache.memory(),
///     Cache::<String, String>::ITEM_MEM + 2 * "k".len() + "value".len()
/// );
/// ```
pub struct CacheBuilder<K, V, S = RandomState> {
    maxsize: usize,
    maxmem: usize,
    accountant: MemoryAccountant<K, V>,
    hasher: S,
}

impl<K, V> CacheBuilder<K, V, RandomState> {
    pub fn new() -> Self {
        Self {
            maxsize: UNBOUNDED,
            maxmem: UNBOUNDED,
            accountant: MemoryAccountant::new(),
            hasher: RandomState::new(),
        }
    }
}

impl<K, V> Default for CacheBuilder<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> CacheBuilder<K, V, S> {
    /// Item-count ceiling.
    pub fn maxsize(mut self, maxsize: usize) -> Self {
        self.maxsize = maxsize;
        self
    }

    /// Byte ceiling.
    pub fn maxmem(mut self, maxmem: usize) -> Self {
        self.maxmem = maxmem;
        self
    }

    /// Applies whichever limits are set, leaving the others untouched.
    pub fn limits(mut self, limits: Limits) -> Self {
        if let Some(maxsize) = limits.maxsize {
            self.maxsize = maxsize;
        }
        if let Some(maxmem) = limits.maxmem {
            self.maxmem = maxmem;
        }
        self
    }

    /// Dynamic size of a key. Counted twice per entry.
    pub fn key_cost<F>(mut self, hint: F) -> Self
    where
        F: Fn(&K) -> usize + Send + Sync + 'static,
    {
        self.accountant = self.accountant.with_key_hint(Arc::new(hint));
        self
    }

    /// Dynamic size of a value.
    pub fn value_cost<F>(mut self, hint: F) -> Self
    where
        F: Fn(&V) -> usize + Send + Sync + 'static,
    {
        self.accountant = self.accountant.with_value_hint(Arc::new(hint));
        self
    }

    /// Derives both cost hints from [`MemoryEstimator`].
    pub fn estimated(mut self) -> Self
    where
        K: MemoryEstimator + 'static,
        V: MemoryEstimator + 'static,
    {
        self.accountant = MemoryAccountant::estimated();
        self
    }

    /// Hasher for the key index.
    pub fn hasher<S2>(self, hasher: S2) -> CacheBuilder<K, V, S2> {
        CacheBuilder {
            maxsize: self.maxsize,
            maxmem: self.maxmem,
            accountant: self.accountant,
            hasher,
        }
    }
}

impl<K, V, S> CacheBuilder<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    pub fn build(self) -> Cache<K, V, S> {
        Cache::from_parts(self.maxsize, self.maxmem, self.accountant, self.hasher)
    }

    pub fn build_safe(self) -> SafeCache<K, V, S> {
        SafeCache::from(self.build())
    }
}

impl<K, V, S> fmt::Debug for CacheBuilder<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("maxsize", &self.maxsize)
            .field("maxmem", &self.maxmem)
            .field("accountant", &self.accountant)
            .finish_non_exhaustive()
    }
}
