/// A stored key/value pair together with its accounted cost.
///
/// The cost is computed by the cache's
/// [`MemoryAccountant`](crate::MemoryAccountant) when the entry is written and
/// recomputed whenever its value is replaced, so eviction and `delete` can
/// subtract exactly what was added.
///
/// # Examples
///
/// ```
/// use lrumem_core::CacheEntry;
///
/// let entry = CacheEntry::new(1u32, "one", 64);
/// assert_eq!(entry.key, 1);
/// assert_eq!(entry.value, "one");
/// assert_eq!(entry.cost, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: V,
    pub cost: usize,
}

impl<K, V> CacheEntry<K, V> {
    pub fn new(key: K, value: V, cost: usize) -> Self {
        Self { key, value, cost }
    }

    /// Swaps in a new value and cost, returning the previous cost.
    pub fn update(&mut self, value: V, cost: usize) -> usize {
        self.value = value;
        std::mem::replace(&mut self.cost, cost)
    }
}

/// One arena cell of the recency list.
///
/// An occupied slot holds an entry and its neighbours' handles. A vacant slot
/// has no entry and chains to the next vacant slot through `next`.
#[derive(Debug, Clone)]
pub(crate) struct Slot<K, V> {
    pub(crate) entry: Option<CacheEntry<K, V>>,
    pub(crate) prev: usize,
    pub(crate) next: usize,
}

impl<K, V> Slot<K, V> {
    pub(crate) fn occupied(entry: CacheEntry<K, V>, prev: usize, next: usize) -> Self {
        Self {
            entry: Some(entry),
            prev,
            next,
        }
    }
}
