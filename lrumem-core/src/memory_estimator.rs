use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::Arc;

use crate::cache_entry::Slot;

/// Trait for estimating the dynamic (heap) memory owned by a cached key or value.
///
/// The cache always charges every entry a fixed structural overhead (see
/// [`item_mem`]). Types implementing this trait can additionally report the
/// bytes they own *outside* their inline footprint, such as the buffer of a
/// `String` or the elements of a `Vec`. Plug it into a cache with
/// [`CacheBuilder::estimated`](crate::CacheBuilder::estimated).
///
/// # Default Implementation
///
/// The default implementation returns `0`, which is exact for types that own
/// no heap memory (integers, `bool`, `char`, plain `Copy` structs).
///
/// # Examples
///
/// ```
/// use lrumem_core::MemoryEstimator;
///
/// struct Profile {
///     name: String,
///     tags: Vec<u32>,
/// }
///
/// impl MemoryEstimator for Profile {
///     fn dynamic_size(&self) -> usize {
///         self.name.dynamic_size() + self.tags.dynamic_size()
///     }
/// }
///
/// let profile = Profile {
///     name: String::with_capacity(16),
///     tags: Vec::with_capacity(4),
/// };
/// assert_eq!(profile.dynamic_size(), 16 + 4 * std::mem::size_of::<u32>());
/// ```
pub trait MemoryEstimator {
    /// Estimates the heap bytes owned by this value, excluding `size_of::<Self>()`.
    fn dynamic_size(&self) -> usize {
        0
    }
}

impl MemoryEstimator for i8 {}
impl MemoryEstimator for i16 {}
impl MemoryEstimator for i32 {}
impl MemoryEstimator for i64 {}
impl MemoryEstimator for i128 {}
impl MemoryEstimator for isize {}

impl MemoryEstimator for u8 {}
impl MemoryEstimator for u16 {}
impl MemoryEstimator for u32 {}
impl MemoryEstimator for u64 {}
impl MemoryEstimator for u128 {}
impl MemoryEstimator for usize {}

impl MemoryEstimator for f32 {}
impl MemoryEstimator for f64 {}

impl MemoryEstimator for bool {}
impl MemoryEstimator for char {}

impl MemoryEstimator for () {}

impl MemoryEstimator for String {
    fn dynamic_size(&self) -> usize {
        self.capacity()
    }
}

impl<T: MemoryEstimator> MemoryEstimator for Vec<T> {
    fn dynamic_size(&self) -> usize {
        self.capacity() * size_of::<T>() + self.iter().map(T::dynamic_size).sum::<usize>()
    }
}

impl<T: MemoryEstimator> MemoryEstimator for VecDeque<T> {
    fn dynamic_size(&self) -> usize {
        self.capacity() * size_of::<T>() + self.iter().map(T::dynamic_size).sum::<usize>()
    }
}

impl<T: MemoryEstimator> MemoryEstimator for Box<T> {
    fn dynamic_size(&self) -> usize {
        size_of::<T>() + (**self).dynamic_size()
    }
}

impl<T: MemoryEstimator> MemoryEstimator for Box<[T]> {
    fn dynamic_size(&self) -> usize {
        self.len() * size_of::<T>() + self.iter().map(T::dynamic_size).sum::<usize>()
    }
}

// Shared payloads are charged in full to every holder.
impl<T: MemoryEstimator> MemoryEstimator for Arc<T> {
    fn dynamic_size(&self) -> usize {
        size_of::<T>() + (**self).dynamic_size()
    }
}

impl<T: MemoryEstimator> MemoryEstimator for Option<T> {
    fn dynamic_size(&self) -> usize {
        self.as_ref().map_or(0, T::dynamic_size)
    }
}

impl<T: MemoryEstimator, const N: usize> MemoryEstimator for [T; N] {
    fn dynamic_size(&self) -> usize {
        self.iter().map(T::dynamic_size).sum()
    }
}

/// A caller-supplied function estimating the dynamic size of a key or value.
pub type CostHint<T> = Arc<dyn Fn(&T) -> usize + Send + Sync>;

/// Fixed bookkeeping cost of one entry: its arena slot in the recency list
/// plus its slot in the key index.
///
/// This is the whole per-entry charge when no cost hints are configured, so
/// by default `memory()` tracks structure, not payload. Variable-length keys
/// and values are only accounted for through hints.
pub const fn item_mem<K, V>() -> usize {
    size_of::<Slot<K, V>>() + size_of::<(K, usize)>()
}

/// Per-entry cost function.
///
/// `cost(key, value) = item_mem + 2 * key_hint(key) + value_hint(value)`.
/// The key is counted twice because it is held both by the index and by the
/// recency list. Absent hints contribute nothing.
pub struct MemoryAccountant<K, V> {
    key_hint: Option<CostHint<K>>,
    value_hint: Option<CostHint<V>>,
    _marker: PhantomData<fn(&K, &V)>,
}

impl<K, V> MemoryAccountant<K, V> {
    /// Fixed per-entry overhead for this key/value pair of types.
    pub const ITEM_MEM: usize = item_mem::<K, V>();

    /// Creates an accountant that charges structural overhead only.
    pub fn new() -> Self {
        Self {
            key_hint: None,
            value_hint: None,
            _marker: PhantomData,
        }
    }

    /// Creates an accountant that sizes keys and values with [`MemoryEstimator`].
    pub fn estimated() -> Self
    where
        K: MemoryEstimator + 'static,
        V: MemoryEstimator + 'static,
    {
        Self::new()
            .with_key_hint(Arc::new(|key: &K| key.dynamic_size()))
            .with_value_hint(Arc::new(|value: &V| value.dynamic_size()))
    }

    pub fn with_key_hint(mut self, hint: CostHint<K>) -> Self {
        self.key_hint = Some(hint);
        self
    }

    pub fn with_value_hint(mut self, hint: CostHint<V>) -> Self {
        self.value_hint = Some(hint);
        self
    }

    pub fn has_key_hint(&self) -> bool {
        self.key_hint.is_some()
    }

    pub fn has_value_hint(&self) -> bool {
        self.value_hint.is_some()
    }

    /// Returns the estimated cost in bytes of storing `key` and `value`.
    pub fn cost(&self, key: &K, value: &V) -> usize {
        let key_bytes = self.key_hint.as_ref().map_or(0, |hint| hint(key));
        let value_bytes = self.value_hint.as_ref().map_or(0, |hint| hint(value));
        Self::ITEM_MEM
            .saturating_add(key_bytes.saturating_mul(2))
            .saturating_add(value_bytes)
    }
}

impl<K, V> Default for MemoryAccountant<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for MemoryAccountant<K, V> {
    fn clone(&self) -> Self {
        Self {
            key_hint: self.key_hint.clone(),
            value_hint: self.value_hint.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for MemoryAccountant<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAccountant")
            .field("item_mem", &Self::ITEM_MEM)
            .field("key_hint", &self.has_key_hint())
            .field("value_hint", &self.has_value_hint())
            .finish()
    }
}
