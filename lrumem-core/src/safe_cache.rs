use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::io::{self, Read, Write};
use std::vec;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::codec::ByteCodec;
use crate::error::Result;
use crate::guard::Guarded;
use crate::text::{self, ItemText};
use crate::{Cache, CacheStats};

/// A thread-safe [`Cache`] shared behind one reentrant lock.
///
/// Every call locks the cache for its whole duration, so calls from
/// different threads are totally ordered. The lock is a
/// `parking_lot::ReentrantMutex`: the thread that holds it may call back into
/// the same `SafeCache` without deadlocking.
///
/// Calls that hand back cache data return a [`Guarded`] handle which keeps
/// the lock held until it is dropped. Values are cloned out of the cache
/// under the lock, and the handle keeps other threads from mutating the
/// cache while the caller is still looking at that result. Plain snapshots
/// (`size`, `memory`, `stats`, ...) are copied out and need no guard.
///
/// # Thread Safety
///
/// `SafeCache` is `Send + Sync` whenever the underlying cache is `Send`, so it
/// can live in a `static` (through `once_cell::sync::Lazy`) or an `Arc`.
/// A thread holding a guard blocks every other thread's call on the same
/// cache, including ones that only read.
///
/// # Examples
///
/// ```
/// use lrumem_core::SafeCache;
/// use std::sync::Arc;
/// use std::thread;
///
/// let cache = Arc::new(SafeCache::with_limits(100, lrumem_core::UNBOUNDED));
///
/// let handles: Vec<_> = (0..4u32)
///     .map(|t| {
///         let cache = Arc::clone(&cache);
///         thread::spawn(move || {
///             for n in 0..10 {
///                 cache.set(t * 10 + n, n);
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(cache.size(), 40);
/// assert_eq!(cache.get(&21), Some(1));
/// ```
pub struct SafeCache<K, V, S = RandomState> {
    inner: ReentrantMutex<RefCell<Cache<K, V, S>>>,
}

impl<K, V> SafeCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
{
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self::from(Cache::new())
    }

    /// Creates a cache with the given item-count and byte ceilings.
    pub fn with_limits(maxsize: usize, maxmem: usize) -> Self {
        Self::from(Cache::with_limits(maxsize, maxmem))
    }
}

impl<K, V, S> SafeCache<K, V, S> {
    /// Runs `op` on the cache under the lock.
    fn run<R>(&self, op: impl FnOnce(&mut Cache<K, V, S>) -> R) -> R {
        let lock = self.inner.lock();
        let mut cache = lock.borrow_mut();
        op(&mut *cache)
    }

    /// Runs `op` under the lock and keeps the lock held in the returned guard.
    fn guarded<R>(&self, op: impl FnOnce(&mut Cache<K, V, S>) -> R) -> Guarded<'_, R> {
        let lock = self.inner.lock();
        let value = {
            let mut cache = lock.borrow_mut();
            op(&mut *cache)
        };
        Guarded::new(ReentrantMutexGuard::map(lock, |_| &()), value)
    }

    /// Acquires the lock for an explicit critical section.
    ///
    /// Because the lock is reentrant, the holding thread keeps full access to
    /// this cache while every other thread waits. This is how several calls
    /// are composed into one atomic step:
    ///
    /// ```
    /// use lrumem_core::SafeCache;
    ///
    /// let cache: SafeCache<&str, u64> = SafeCache::new();
    ///
    /// let _section = cache.lock();
    /// if cache.get("answer").is_none() {
    ///     cache.set("answer", 42);
    /// }
    /// assert_eq!(cache.get("answer"), Some(42));
    /// ```
    pub fn lock(&self) -> Guarded<'_, ()> {
        Guarded::new(ReentrantMutexGuard::map(self.inner.lock(), |_| &()), ())
    }

    /// Runs `f` with direct access to the inner cache under the lock.
    ///
    /// References into the cache cannot escape `f`.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls back into this same `SafeCache`, because the inner
    /// cache is already mutably borrowed. That includes cloning it and comparing
    /// it with `==`. Formatting it with `{}` or `{:?}` is allowed and prints
    /// only the header.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut Cache<K, V, S>) -> R) -> R {
        self.run(f)
    }

    pub fn size(&self) -> usize {
        self.run(|cache| cache.size())
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.run(|cache| cache.is_empty())
    }

    pub fn memory(&self) -> usize {
        self.run(|cache| cache.memory())
    }

    pub fn maxsize(&self) -> usize {
        self.run(|cache| cache.maxsize())
    }

    pub fn maxmem(&self) -> usize {
        self.run(|cache| cache.maxmem())
    }

    /// Copies out a stats snapshot.
    pub fn stats(&self) -> CacheStats {
        self.run(|cache| cache.stats())
    }

    /// Snapshot of the entries, most recently used first, with the lock held.
    ///
    /// Every call clones all entries into a new buffer, so it costs O(n) time
    /// and memory. To walk a large cache without copying, use
    /// `with_lock(|cache| cache.iter()...)`.
    ///
    /// `.rev()` walks least to most recently used.
    pub fn iter(&self) -> Guarded<'_, vec::IntoIter<(K, V)>>
    where
        K: Clone,
        V: Clone,
    {
        self.guarded(|cache| {
            cache
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Vec<_>>()
                .into_iter()
        })
    }

    pub fn dump(&self) -> Vec<u8>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        self.run(|cache| cache.dump())
    }

    pub fn dump_to(&self, out: &mut Vec<u8>)
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        self.run(|cache| cache.dump_to(out))
    }

    pub fn dump_into<W: Write>(&self, writer: W) -> io::Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        self.run(|cache| cache.dump_into(writer))
    }

    /// Swaps in another cache and returns the previous one.
    ///
    /// Pairs with loading into a scratch [`Cache`] to replace the contents
    /// only once a dump decoded cleanly.
    pub fn swap(&self, cache: Cache<K, V, S>) -> Cache<K, V, S> {
        self.run(|current| std::mem::replace(current, cache))
    }

    /// Consumes the wrapper and returns the cache.
    pub fn into_inner(self) -> Cache<K, V, S> {
        self.inner.into_inner().into_inner()
    }
}

impl<K, V, S> SafeCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates an unbounded cache using `hasher` for the key index.
    pub fn with_hasher(hasher: S) -> Self {
        Self::from(Cache::with_hasher(hasher))
    }

    pub fn set(&self, key: K, value: V) {
        self.run(|cache| cache.set(key, value))
    }

    /// See [`Cache::add`].
    pub fn add(&self, key: K, value: V) -> Guarded<'_, bool> {
        self.guarded(|cache| cache.add(key, value))
    }

    /// See [`Cache::replace`].
    pub fn replace(&self, key: K, value: V) -> Guarded<'_, bool> {
        self.guarded(|cache| cache.replace(key, value))
    }

    /// Looks up `key` and clones its value out under the lock.
    ///
    /// Counts a hit or a miss and promotes a hit to the head, like
    /// [`Cache::get`]. The lock stays held while the returned guard lives.
    pub fn get<Q>(&self, key: &Q) -> Guarded<'_, Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.guarded(|cache| cache.get(key).cloned())
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.run(|cache| cache.contains_key(key))
    }

    /// See [`Cache::delete`].
    pub fn delete<Q>(&self, key: &Q) -> Guarded<'_, bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.guarded(|cache| cache.delete(key))
    }

    pub fn flush(&self) {
        self.run(|cache| cache.flush())
    }

    pub fn set_maxsize(&self, maxsize: usize) {
        self.run(|cache| cache.set_maxsize(maxsize))
    }

    pub fn set_maxmem(&self, maxmem: usize) {
        self.run(|cache| cache.set_maxmem(maxmem))
    }

    /// See [`Cache::load`]. The whole replay runs under one lock acquisition.
    pub fn load(&self, bytes: &[u8]) -> Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        self.run(|cache| cache.load(bytes))
    }

    pub fn load_from<R: Read>(&self, reader: R) -> Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
    {
        self.run(|cache| cache.load_from(reader))
    }

    pub fn load_bytes<I>(&self, bytes: I) -> Result<()>
    where
        K: ByteCodec,
        V: ByteCodec,
        I: IntoIterator<Item = u8>,
    {
        self.run(|cache| cache.load_bytes(bytes))
    }
}

impl<K, V, S> From<Cache<K, V, S>> for SafeCache<K, V, S> {
    fn from(cache: Cache<K, V, S>) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(cache)),
        }
    }
}

impl<K, V> Default for SafeCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Clone for SafeCache<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self::from(self.run(|cache| cache.clone()))
    }
}

/// Compares a consistent snapshot of both caches.
///
/// Both locks are taken in address order so two threads comparing the same
/// pair in opposite directions cannot deadlock.
impl<K, V, S> PartialEq for SafeCache<K, V, S>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let (first, second) = if (self as *const Self) < (other as *const Self) {
            (self, other)
        } else {
            (other, self)
        };
        let first = first.inner.lock();
        let second = second.inner.lock();
        let equal = *RefCell::borrow(&first) == *RefCell::borrow(&second);
        equal
    }
}

impl<K: Eq, V: Eq, S> Eq for SafeCache<K, V, S> {}

impl<K, V, S1, S2> PartialEq<Cache<K, V, S2>> for SafeCache<K, V, S1>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Cache<K, V, S2>) -> bool {
        self.run(|cache| *cache == *other)
    }
}

/// Renders the whole cache under one lock acquisition, so concurrent writers
/// never interleave with the output.
impl<K, V, S> fmt::Display for SafeCache<K, V, S>
where
    K: ItemText,
    V: ItemText,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lock = self.inner.lock();
        let address = self as *const Self as *const ();
        let result = match lock.try_borrow() {
            Ok(cache) => {
                text::render_cache(f, "SafeCache", address, cache.stats(), cache.iter())
            }
            // Called from inside `with_lock`.
            Err(_) => text::render_header::<K, V>(f, "SafeCache", address),
        };
        result
    }
}

impl<K, V, S> fmt::Debug for SafeCache<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lock = self.inner.lock();
        let borrowed = lock.try_borrow();
        let mut out = f.debug_struct("SafeCache");
        match &borrowed {
            Ok(cache) => out.field("cache", &**cache).finish(),
            // Called from inside `with_lock`.
            Err(_) => out.finish_non_exhaustive(),
        }
    }
}
