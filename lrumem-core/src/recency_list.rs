//! Arena-backed doubly-linked list ordering entries by recency.
//!
//! Nodes live in a `Vec<Slot>` and link to each other by index. A node's
//! index (its handle) never changes while it is live: unlinking or moving one
//! node only rewrites its neighbours' links, so the key index can store
//! handles safely. Freed slots are chained into a free list and reused.
//!
//! Head is the most recently used entry, tail the least recently used.

use std::iter::FusedIterator;

use crate::cache_entry::{CacheEntry, Slot};

/// Null link.
pub(crate) const NIL: usize = usize::MAX;

#[derive(Debug, Clone)]
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Slot<K, V>>,
    head: usize,
    tail: usize,
    free: usize,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: NIL,
            tail: NIL,
            free: NIL,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn tail(&self) -> Option<usize> {
        (self.tail != NIL).then_some(self.tail)
    }

    pub(crate) fn get(&self, handle: usize) -> Option<&CacheEntry<K, V>> {
        self.slots.get(handle).and_then(|slot| slot.entry.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: usize) -> Option<&mut CacheEntry<K, V>> {
        self.slots.get_mut(handle).and_then(|slot| slot.entry.as_mut())
    }

    /// Inserts `entry` at the head and returns its handle.
    pub(crate) fn push_front(&mut self, entry: CacheEntry<K, V>) -> usize {
        let handle = self.alloc(entry);
        self.link_front(handle);
        self.len += 1;
        handle
    }

    /// Moves a live node to the head. Unknown or vacant handles are ignored.
    pub(crate) fn move_to_front(&mut self, handle: usize) {
        if handle == self.head || self.get(handle).is_none() {
            return;
        }
        self.unlink(handle);
        self.link_front(handle);
    }

    /// Unlinks the node at `handle` and returns its entry.
    pub(crate) fn remove(&mut self, handle: usize) -> Option<CacheEntry<K, V>> {
        self.get(handle)?;
        self.unlink(handle);
        let slot = &mut self.slots[handle];
        let entry = slot.entry.take();
        slot.next = self.free;
        self.free = handle;
        self.len -= 1;
        entry
    }

    /// Removes and returns the least recently used entry.
    pub(crate) fn pop_back(&mut self) -> Option<CacheEntry<K, V>> {
        let tail = self.tail()?;
        self.remove(tail)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
        self.len = 0;
    }

    /// Iterates head to tail; `.rev()` iterates tail to head.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    fn alloc(&mut self, entry: CacheEntry<K, V>) -> usize {
        if self.free != NIL {
            let handle = self.free;
            self.free = self.slots[handle].next;
            self.slots[handle] = Slot::occupied(entry, NIL, NIL);
            handle
        } else {
            self.slots.push(Slot::occupied(entry, NIL, NIL));
            self.slots.len() - 1
        }
    }

    fn link_front(&mut self, handle: usize) {
        self.slots[handle].prev = NIL;
        self.slots[handle].next = self.head;
        if self.head != NIL {
            self.slots[self.head].prev = handle;
        }
        self.head = handle;
        if self.tail == NIL {
            self.tail = handle;
        }
    }

    fn unlink(&mut self, handle: usize) {
        let (prev, next) = (self.slots[handle].prev, self.slots[handle].next);
        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.slots[handle].prev = NIL;
        self.slots[handle].next = NIL;
    }
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Double-ended iterator over live entries, head to tail.
pub(crate) struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a CacheEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.slots.get(self.front)?;
        self.front = slot.next;
        self.remaining -= 1;
        slot.entry.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.slots.get(self.back)?;
        self.back = slot.prev;
        self.remaining -= 1;
        slot.entry.as_ref()
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}
