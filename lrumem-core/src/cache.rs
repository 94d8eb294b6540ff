use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::io::{self, Read, Write};
use std::iter::FusedIterator;

use tracing::{debug, trace, warn};

use crate::cache_entry::CacheEntry;
use crate::codec::{self, ByteCodec, ChunkSource, Decoder};
use crate::error::Result;
use crate::memory_estimator::MemoryAccountant;
use crate::recency_list::{self, RecencyList};
use crate::text::{self, ItemText};
use crate::{CacheStats, UNBOUNDED};

/// A single-threaded LRU cache bounded by item count and estimated memory.
///
/// Entries are kept in a hash index (key to arena handle) plus an
/// arena-backed recency list, head = most recently used. Every operation is
/// O(1) on average. Whenever `len() > maxsize()` or `memory() > maxmem()`,
/// entries are evicted from the tail until both limits hold again, even if
/// that empties the cache.
///
/// # Memory accounting
///
/// Each entry is charged [`Cache::ITEM_MEM`] bytes of structural overhead.
/// Without cost hints that is the whole charge, so `memory()` approximates
/// bookkeeping and ignores what `String`s or `Vec`s own on the heap. Supply
/// hints through [`CacheBuilder`](crate::CacheBuilder) to account for payloads:
/// an entry then costs `ITEM_MEM + 2 * key_hint(key) + value_hint(value)`.
///
/// # Thread Safety
///
/// `Cache` has no internal synchronization. Use
/// [`SafeCache`](crate::SafeCache) to share one between threads.
///
/// # Examples
///
/// ```
/// use lrumem_core::Cache;
///
/// let mut cache = Cache::with_limits(3, lrumem_core::UNBOUNDED);
/// cache.set(0, "A");
/// cache.set(1, "B");
/// cache.set(2, "C");
/// cache.set(3, "D");
///
/// let items: Vec<_> = cache.iter().map(|(k, v)| (*k, *v)).collect();
/// assert_eq!(items, vec![(3, "D"), (2, "C"), (1, "B")]);
///
/// assert_eq!(cache.get(&2), Some(&"C"));
/// assert_eq!(cache.iter().next(), Some((&2, &"C")));
/// assert_eq!(cache.stats().hits, 1);
/// ```
pub struct Cache<K, V, S = RandomState> {
    index: HashMap<K, usize, S>,
    order: RecencyList<K, V>,
    accountant: MemoryAccountant<K, V>,
    maxsize: usize,
    maxmem: usize,
    currmem: usize,
    hits: u64,
    misses: u64,
}

impl<K, V> Cache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
{
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self::with_limits(UNBOUNDED, UNBOUNDED)
    }

    /// Creates a cache with the given item-count and byte ceilings.
    ///
    /// Pass [`UNBOUNDED`] to leave either limit unset.
    pub fn with_limits(maxsize: usize, maxmem: usize) -> Self {
        Self::from_parts(maxsize, maxmem, MemoryAccountant::new(), RandomState::new())
    }
}

impl<K, V, S> Cache<K, V, S> {
    /// Structural overhead charged per entry.
    pub const ITEM_MEM: usize = MemoryAccountant::<K, V>::ITEM_MEM;

    /// Number of live entries.
    pub fn size(&self) -> usize {
        self.order.len()
    }

    /// Same as [`size`](Self::size).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of the live entries' estimated costs in bytes.
    pub fn memory(&self) -> usize {
        self.currmem
    }

    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    pub fn maxmem(&self) -> usize {
        self.maxmem
    }

    pub fn accountant(&self) -> &MemoryAccountant<K, V> {
        &self.accountant
    }

    /// Returns a snapshot of the counters, limits and usage.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            maxsize: self.maxsize,
            currsize: self.order.len(),
            maxmem: self.maxmem,
            currmem: self.currmem,
        }
    }

    /// Iterates entries from most to least recently used.
    ///
    /// Iteration never changes recency. Use `.rev()` for least to most
    /// recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.order.iter(),
        }
    }

    /// Writes the cache in dump format, least recently used entry first.
    ///
    /// A pure read: neither the order nor the stats change.
    pub fn dump(&self) -> Vec<u8>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        let mut out = Vec::new();
        self.dump_to(&mut out);
        out
    }

    /// Appends the dump to an existing buffer.
    pub fn dump_to(&self, out: &mut Vec<u8>)
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        for (key, value) in self.iter().rev() {
            codec::write_entry(out, key, value);
        }
    }

    /// Streams the dump into a writer, one entry at a time.
    pub fn dump_into<W: Write>(&self, mut writer: W) -> io::Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        let mut scratch = Vec::new();
        for (key, value) in self.iter().rev() {
            scratch.clear();
            codec::write_entry(&mut scratch, key, value);
            writer.write_all(&scratch)?;
        }
        writer.flush()
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates an unbounded cache using `hasher` for the key index.
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(UNBOUNDED, UNBOUNDED, MemoryAccountant::new(), hasher)
    }

    pub(crate) fn from_parts(
        maxsize: usize,
        maxmem: usize,
        accountant: MemoryAccountant<K, V>,
        hasher: S,
    ) -> Self {
        Self {
            index: HashMap::with_hasher(hasher),
            order: RecencyList::new(),
            accountant,
            maxsize,
            maxmem,
            currmem: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Inserts or updates `key`, making it the most recently used entry.
    ///
    /// An update replaces the value, recomputes its cost and re-enforces
    /// the limits.
    pub fn set(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&handle) => self.update(handle, value),
            None => self.insert(key, value),
        }
    }

    /// Inserts `key` only if it is absent.
    ///
    /// Returns `false` for an existing key, which is promoted to the head
    /// with its value unchanged.
    pub fn add(&mut self, key: K, value: V) -> bool {
        match self.index.get(&key) {
            Some(&handle) => {
                self.order.move_to_front(handle);
                false
            }
            None => {
                self.insert(key, value);
                true
            }
        }
    }

    /// Updates `key` only if it is present. Returns whether it was.
    pub fn replace(&mut self, key: K, value: V) -> bool {
        match self.index.get(&key) {
            Some(&handle) => {
                self.update(handle, value);
                true
            }
            None => false,
        }
    }

    /// Looks up `key`, promoting it to the head on a hit.
    ///
    /// Counts a hit or a miss. The returned reference borrows the cache, so
    /// it cannot outlive the next mutation.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&handle) => {
                self.hits += 1;
                self.order.move_to_front(handle);
                self.order.get(handle).map(|entry| &entry.value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Reports whether `key` is present without touching recency or stats.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Removes `key`. Returns whether it was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.remove(key) {
            Some(handle) => {
                if let Some(entry) = self.order.remove(handle) {
                    self.currmem = self.currmem.saturating_sub(entry.cost);
                }
                true
            }
            None => false,
        }
    }

    /// Removes every entry. Hit and miss counters are kept.
    pub fn flush(&mut self) {
        let flushed = self.order.len();
        self.index.clear();
        self.order.clear();
        self.currmem = 0;
        debug!(flushed, "flushed cache");
    }

    /// Sets the item-count ceiling, evicting from the tail if it is exceeded.
    pub fn set_maxsize(&mut self, maxsize: usize) {
        self.maxsize = maxsize;
        debug!(maxsize, currsize = self.order.len(), "changed maxsize");
        self.enforce_limits();
    }

    /// Sets the byte ceiling, evicting from the tail if it is exceeded.
    ///
    /// A ceiling below the cost of a single entry empties the cache.
    pub fn set_maxmem(&mut self, maxmem: usize) {
        self.maxmem = maxmem;
        debug!(maxmem, currmem = self.currmem, "changed maxmem");
        self.enforce_limits();
    }

    /// Clears the cache and replays a dump from a buffer through [`set`](Self::set).
    ///
    /// Payloads are decoded straight from `bytes`. The destination's own
    /// limits apply during replay, so loading into a smaller cache keeps the
    /// most recently used entries.
    ///
    /// On a decode fault the entries replayed so far stay in the cache. Load
    /// into a scratch cache and swap it in on success when that matters.
    pub fn load(&mut self, bytes: &[u8]) -> Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        self.replay(Decoder::from_slice(bytes))
    }

    /// Like [`load`](Self::load), reading a stream one byte at a time.
    pub fn load_from<R: Read>(&mut self, reader: R) -> Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        self.replay(Decoder::from_reader(reader))
    }

    /// Like [`load`](Self::load), consuming any iterator of bytes.
    pub fn load_bytes<I>(&mut self, bytes: I) -> Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
        I: IntoIterator<Item = u8>,
    {
        self.replay(Decoder::from_bytes(bytes))
    }

    fn replay<Src: ChunkSource>(&mut self, decoder: Decoder<K, V, Src>) -> Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        self.flush();
        let mut loaded = 0usize;
        for item in decoder {
            match item {
                Ok((key, value)) => {
                    self.set(key, value);
                    loaded += 1;
                }
                Err(err) => {
                    warn!(loaded, error = %err, "cache load aborted on malformed input");
                    return Err(err);
                }
            }
        }
        debug!(loaded, currsize = self.order.len(), "loaded cache");
        Ok(())
    }

    fn insert(&mut self, key: K, value: V) {
        let cost = self.accountant.cost(&key, &value);
        let handle = self
            .order
            .push_front(CacheEntry::new(key.clone(), value, cost));
        self.index.insert(key, handle);
        self.currmem = self.currmem.saturating_add(cost);
        self.enforce_limits();
    }

    fn update(&mut self, handle: usize, value: V) {
        if let Some(entry) = self.order.get_mut(handle) {
            let cost = self.accountant.cost(&entry.key, &value);
            let previous = entry.update(value, cost);
            self.currmem = self.currmem.saturating_sub(previous).saturating_add(cost);
            self.order.move_to_front(handle);
            self.enforce_limits();
        }
    }

    fn enforce_limits(&mut self) {
        let mut evicted = 0usize;
        while self.order.len() > self.maxsize || self.currmem > self.maxmem {
            let Some(entry) = self.order.pop_back() else {
                break;
            };
            self.index.remove(&entry.key);
            self.currmem = self.currmem.saturating_sub(entry.cost);
            evicted += 1;
        }
        if evicted > 0 {
            trace!(
                evicted,
                currsize = self.order.len(),
                currmem = self.currmem,
                "evicted least recently used entries"
            );
        }
    }
}

impl<K, V> Default for Cache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Clone for Cache<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            order: self.order.clone(),
            accountant: self.accountant.clone(),
            maxsize: self.maxsize,
            maxmem: self.maxmem,
            currmem: self.currmem,
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Caches are equal when they hold equal entries in the same recency order.
///
/// Limits and stats are not compared. This walks both caches and is meant
/// for tests and debugging.
impl<K, V, S1, S2> PartialEq<Cache<K, V, S2>> for Cache<K, V, S1>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Cache<K, V, S2>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, S> Eq for Cache<K, V, S> {}

impl<K, V, S> Extend<(K, V)> for Cache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

/// Collects pairs through [`Cache::set`] into an unbounded cache.
impl<K, V, S> FromIterator<(K, V)> for Cache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut cache = Self::with_hasher(S::default());
        cache.extend(iter);
        cache
    }
}

impl<'a, K, V, S> IntoIterator for &'a Cache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> fmt::Display for Cache<K, V, S>
where
    K: ItemText,
    V: ItemText,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        text::render_cache(
            f,
            "Cache",
            self as *const Self as *const (),
            self.stats(),
            self.iter(),
        )
    }
}

struct Entries<'a, K, V>(Iter<'a, K, V>);

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entries<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.clone()).finish()
    }
}

impl<K, V, S> fmt::Debug for Cache<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("stats", &self.stats())
            .field("entries", &Entries(self.iter()))
            .finish()
    }
}

/// Iterator over `(&key, &value)` from most to least recently used.
///
/// Double-ended: `.rev()` walks least to most recently used.
pub struct Iter<'a, K, V> {
    inner: recency_list::Iter<'a, K, V>,
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|entry| (&entry.key, &entry.value))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheBuilder;

    fn items<S>(cache: &Cache<i32, char, S>) -> Vec<(i32, char)> {
        cache.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// {(3, 'c'), (2, 'b'), (1, 'a')}
    fn sample() -> Cache<i32, char> {
        let mut cache = Cache::new();
        cache.set(1, 'a');
        cache.set(2, 'b');
        cache.set(3, 'c');
        cache
    }

    #[test]
    fn test_set_inserts_at_head() {
        let cache = sample();
        assert_eq!(items(&cache), vec![(3, 'c'), (2, 'b'), (1, 'a')]);
        assert_eq!(cache.size(), 3);
        assert_eq!(cache.memory(), 3 * Cache::<i32, char>::ITEM_MEM);
    }

    #[test]
    fn test_set_updates_and_promotes() {
        let mut cache = sample();
        cache.set(1, 'x');
        assert_eq!(items(&cache), vec![(1, 'x'), (3, 'c'), (2, 'b')]);
        assert_eq!(cache.size(), 3);
    }

    #[test]
    fn test_add_existing_promotes_without_change() {
        let mut cache = sample();
        assert!(!cache.add(1, 'z'));
        assert_eq!(items(&cache), vec![(1, 'a'), (3, 'c'), (2, 'b')]);
        assert!(cache.add(4, 'd'));
        assert_eq!(cache.iter().next(), Some((&4, &'d')));
    }

    #[test]
    fn test_replace() {
        let mut cache = sample();
        assert!(cache.replace(2, 'y'));
        assert_eq!(items(&cache), vec![(2, 'y'), (3, 'c'), (1, 'a')]);
        assert!(!cache.replace(9, 'q'));
        assert_eq!(cache.size(), 3);
    }

    #[test]
    fn test_get_hit_and_miss() {
        let mut cache = sample();
        assert_eq!(cache.get(&1), Some(&'a'));
        assert_eq!(items(&cache), vec![(1, 'a'), (3, 'c'), (2, 'b')]);
        assert_eq!(cache.get(&7), None);
        assert_eq!(items(&cache), vec![(1, 'a'), (3, 'c'), (2, 'b')]);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_get_with_borrowed_key() {
        let mut cache: Cache<String, u32> = Cache::new();
        cache.set("alpha".to_string(), 1);
        assert_eq!(cache.get("alpha"), Some(&1));
        assert!(cache.contains_key("alpha"));
        assert!(cache.delete("alpha"));
        assert!(!cache.contains_key("alpha"));
    }

    #[test]
    fn test_delete() {
        let mut cache = sample();
        assert!(cache.delete(&2));
        assert!(!cache.delete(&2));
        assert_eq!(items(&cache), vec![(3, 'c'), (1, 'a')]);
        assert_eq!(cache.memory(), 2 * Cache::<i32, char>::ITEM_MEM);
    }

    #[test]
    fn test_flush_keeps_counters() {
        let mut cache = sample();
        cache.get(&1);
        cache.get(&9);
        cache.flush();
        let stats = cache.stats();
        assert_eq!(stats.currsize, 0);
        assert_eq!(stats.currmem, 0);
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_maxsize_evicts_tail() {
        let mut cache = Cache::with_limits(3, UNBOUNDED);
        for (k, v) in [(0, 'A'), (1, 'B'), (2, 'C'), (3, 'D')] {
            cache.set(k, v);
        }
        assert_eq!(items(&cache), vec![(3, 'D'), (2, 'C'), (1, 'B')]);
        assert!(!cache.contains_key(&0));
    }

    #[test]
    fn test_shrinking_maxsize() {
        let mut cache = sample();
        cache.set_maxsize(1);
        assert_eq!(items(&cache), vec![(3, 'c')]);
        cache.set_maxsize(0);
        assert!(cache.is_empty());
        cache.set(5, 'e');
        assert!(cache.is_empty());
    }

    #[test]
    fn test_maxmem_of_one_entry() {
        let mut cache = sample();
        cache.set_maxmem(Cache::<i32, char>::ITEM_MEM);
        assert_eq!(items(&cache), vec![(3, 'c')]);
        cache.set_maxmem(Cache::<i32, char>::ITEM_MEM - 1);
        assert!(cache.is_empty());
        assert_eq!(cache.memory(), 0);
    }

    #[test]
    fn test_unbounded_limits_do_not_evict() {
        let mut cache = sample();
        cache.set_maxsize(UNBOUNDED);
        cache.set_maxmem(UNBOUNDED);
        assert_eq!(cache.size(), 3);
    }

    #[test]
    fn test_memory_saturates_instead_of_overflowing() {
        let mut cache = CacheBuilder::<i32, u64>::new()
            .value_cost(|v: &u64| *v as usize)
            .build();
        let half = (usize::MAX / 2) as u64;
        cache.set(1, half);
        cache.set(2, half);
        assert_eq!(cache.size(), 2);
        assert_eq!(cache.memory(), usize::MAX);

        // Growing a saturated total stays pinned at the ceiling.
        cache.set(1, half + 1);
        assert_eq!(cache.memory(), usize::MAX);

        cache.delete(&1);
        cache.delete(&2);
        assert!(cache.is_empty());
        assert_eq!(cache.memory(), 0);
    }

    #[test]
    fn test_update_growth_reenforces_maxmem() {
        let mut cache = CacheBuilder::<i32, String>::new()
            .value_cost(|v: &String| v.len())
            .build();
        let base = Cache::<i32, String>::ITEM_MEM;
        cache.set(1, "a".to_string());
        cache.set(2, "b".to_string());
        cache.set_maxmem(2 * base + 10);
        assert_eq!(cache.size(), 2);

        // Growing entry 2 pushes usage over the ceiling; the tail (1) goes.
        cache.set(2, "bbbbbbbbbb".to_string());
        assert_eq!(cache.size(), 1);
        assert!(cache.contains_key(&2));
        assert_eq!(cache.memory(), base + 10);

        // Growing it past the ceiling on its own empties the cache.
        assert!(cache.replace(2, "x".repeat(2 * base + 11)));
        assert!(cache.is_empty());
        assert_eq!(cache.memory(), 0);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = sample();
        let mut b = Cache::new();
        b.set(3, 'c');
        b.set(2, 'b');
        b.set(1, 'a');
        assert_ne!(a, b);
        b.get(&2);
        b.get(&3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_iteration_does_not_touch_recency() {
        let cache = sample();
        let forward: Vec<_> = cache.iter().collect();
        let again: Vec<_> = cache.iter().collect();
        assert_eq!(forward, again);
        let backward: Vec<i32> = cache.iter().rev().map(|(k, _)| *k).collect();
        assert_eq!(backward, vec![1, 2, 3]);
        assert_eq!(cache.iter().len(), 3);
        assert_eq!(cache.stats().total_accesses(), 0);
    }

    #[test]
    fn test_into_iterator_for_ref() {
        let cache = sample();
        let mut keys = Vec::new();
        for (k, _) in &cache {
            keys.push(*k);
        }
        assert_eq!(keys, vec![3, 2, 1]);
    }

    #[test]
    fn test_from_iterator_and_extend() {
        let mut cache: Cache<i32, char> = vec![(1, 'a'), (2, 'b')].into_iter().collect();
        cache.extend([(3, 'c')]);
        assert_eq!(cache, sample());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        copy.set(4, 'd');
        copy.delete(&1);
        assert_eq!(items(&original), vec![(3, 'c'), (2, 'b'), (1, 'a')]);
        assert_eq!(items(&copy), vec![(4, 'd'), (3, 'c'), (2, 'b')]);
        assert_eq!(copy.get(&2), Some(&'b'));
    }

    #[test]
    fn test_dump_writes_tail_first() {
        let cache = sample();
        let bytes = cache.dump();
        let mut expected = Vec::new();
        for (k, v) in [(1, 'a'), (2, 'b'), (3, 'c')] {
            codec::write_entry(&mut expected, &k, &v);
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_dump_is_a_pure_read() {
        let cache = sample();
        let before = cache.stats();
        let _ = cache.dump();
        assert_eq!(cache.stats(), before);
        assert_eq!(items(&cache), vec![(3, 'c'), (2, 'b'), (1, 'a')]);
    }

    #[test]
    fn test_dump_into_matches_dump() {
        let cache = sample();
        let mut written = Vec::new();
        cache.dump_into(&mut written).unwrap();
        assert_eq!(written, cache.dump());
    }

    #[test]
    fn test_load_round_trip() {
        let cache = sample();
        let mut restored = Cache::new();
        restored.set(42, 'q');
        restored.load(&cache.dump()).unwrap();
        assert_eq!(restored, cache);
        assert_eq!(restored.stats().hits, 0);
    }

    #[test]
    fn test_load_honours_destination_limits() {
        let cache = sample();
        let mut small = Cache::with_limits(2, UNBOUNDED);
        small.load(&cache.dump()).unwrap();
        assert_eq!(items(&small), vec![(3, 'c'), (2, 'b')]);
    }

    #[test]
    fn test_load_truncated_keeps_prefix() {
        let cache = sample();
        let bytes = cache.dump();
        let mut restored: Cache<i32, char> = Cache::new();
        let err = restored.load(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, crate::CodecError::TruncatedChunk { .. }));
        assert_eq!(items(&restored), vec![(2, 'b'), (1, 'a')]);
    }

    #[test]
    fn test_display_lists_entries() {
        let cache = sample();
        let text = cache.to_string();
        let mut lines = text.lines();
        assert!(lines
            .next()
            .is_some_and(|l| l.starts_with("lrumem::Cache<Key=i32, Value=char> at 0x")));
        assert_eq!(
            lines.next(),
            Some(format!(
                "hits 0 | misses 0 | maxsize inf | currsize 3 | maxmem inf | currmem {}",
                3 * Cache::<i32, char>::ITEM_MEM
            ))
            .as_deref()
        );
        assert_eq!(lines.next(), Some("0: [3] = 'c'"));
        assert_eq!(lines.next(), Some("1: [2] = 'b'"));
        assert_eq!(lines.next(), Some("2: [1] = 'a'"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_debug_lists_entries() {
        let cache = sample();
        let text = format!("{:?}", cache);
        assert!(text.starts_with("Cache { stats: CacheStats"));
        assert!(text.contains("entries: [(3, 'c'), (2, 'b'), (1, 'a')]"));
    }
}
