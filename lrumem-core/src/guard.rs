use std::fmt;
use std::iter::FusedIterator;
use std::ops::Deref;

use parking_lot::MappedReentrantMutexGuard;

/// The result of a [`SafeCache`](crate::SafeCache) call bundled with the
/// cache lock that produced it.
///
/// While a `Guarded` is alive, the lock stays held. Other threads block on
/// any call to the same cache, so the result cannot go stale underneath the
/// caller. The owning thread may keep calling into the cache because the
/// lock is reentrant. Dropping the handle (or calling
/// [`into_inner`](Self::into_inner)) releases the lock.
///
/// The protection is opt-in by binding: a result used only as a temporary
/// releases the lock at the end of the statement. Bind it to a name to
/// extend the critical section:
///
/// ```
/// use lrumem_core::SafeCache;
///
/// let cache: SafeCache<u32, &str> = SafeCache::new();
/// cache.set(1, "one");
///
/// {
///     let one = cache.get(&1); // lock held from here...
///     assert_eq!(*one, Some("one"));
///     assert_eq!(cache.size(), 1); // same thread may re-enter
/// } // ...to here
/// ```
///
/// A `Guarded` is neither `Clone` nor `Send`: there is exactly one owner of
/// the held lock, and it is the thread that acquired it.
#[must_use = "dropping a Guarded releases the cache lock immediately"]
pub struct Guarded<'a, T> {
    value: T,
    _lock: MappedReentrantMutexGuard<'a, ()>,
}

impl<'a, T> Guarded<'a, T> {
    pub(crate) fn new(lock: MappedReentrantMutexGuard<'a, ()>, value: T) -> Self {
        Self { value, _lock: lock }
    }

    /// Releases the lock and returns the bare value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Guarded<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: PartialEq<U>, U> PartialEq<U> for Guarded<'_, T> {
    fn eq(&self, other: &U) -> bool {
        self.value == *other
    }
}

impl<T: fmt::Debug> fmt::Debug for Guarded<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: fmt::Display> fmt::Display for Guarded<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: Iterator> Iterator for Guarded<'_, T> {
    type Item = T::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.value.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.value.size_hint()
    }
}

impl<T: DoubleEndedIterator> DoubleEndedIterator for Guarded<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.value.next_back()
    }
}

impl<T: ExactSizeIterator> ExactSizeIterator for Guarded<'_, T> {}

impl<T: FusedIterator> FusedIterator for Guarded<'_, T> {}
