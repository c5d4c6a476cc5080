//! Hot tier: strict LRU over a fixed number of strongly held entries.
//!
//! Entries are stored in an arena of slots linked into a doubly-linked
//! recency list (head = most recently used, tail = least recently used).
//! A `HashMap<K, usize>` maps keys to slot indices, so lookup, touch,
//! insert and removal are all O(1). Freed slots are recycled.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Null link.
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Slot<K, V> {
    /// `None` while the slot sits on the free list.
    entry: Option<(K, Arc<V>)>,
    prev: usize,
    next: usize,
}

/// The capacity-bounded, recency-ordered tier.
#[derive(Debug)]
pub struct HotTier<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    head: usize,
    tail: usize,
    free: Vec<usize>,
}

impl<K: Hash + Eq + Clone, V> HotTier<K, V> {
    /// Create an empty hot tier. `capacity` is validated by the caller.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            index: HashMap::with_capacity(capacity + 1),
            slots: Vec::with_capacity(capacity + 1),
            head: NIL,
            tail: NIL,
            free: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Look up `key` and make it the most recently used entry.
    pub fn get<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;
        self.move_to_head(idx);
        self.slots[idx].entry.as_ref().map(|(_, v)| Arc::clone(v))
    }

    /// Replace the value of a resident key and move it to the head.
    ///
    /// Returns `Ok(previous)` on a hit. On a miss the value is handed back
    /// untouched as `Err(value)`.
    pub fn update(&mut self, key: &K, value: Arc<V>) -> Result<Arc<V>, Arc<V>> {
        let Some(&idx) = self.index.get(key) else {
            return Err(value);
        };
        let previous = match self.slots[idx].entry.as_mut() {
            Some((_, v)) => std::mem::replace(v, value),
            None => unreachable!("indexed slot {idx} is on the free list"),
        };
        self.move_to_head(idx);
        Ok(previous)
    }

    /// Insert a key that is not resident at the head of the recency list.
    ///
    /// If this pushes the tier over capacity the least recently used entry
    /// is unlinked and returned so the caller can demote it.
    pub fn push(&mut self, key: K, value: Arc<V>) -> Option<(K, Arc<V>)> {
        debug_assert!(!self.index.contains_key(&key));

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx].entry = Some((key.clone(), value));
                idx
            }
            None => {
                self.slots.push(Slot {
                    entry: Some((key.clone(), value)),
                    prev: NIL,
                    next: NIL,
                });
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.link_head(idx);

        if self.index.len() > self.capacity {
            self.pop_tail()
        } else {
            None
        }
    }

    /// Remove `key` from the tier, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.index.remove(key)?;
        self.release(idx).map(|(_, v)| v)
    }

    /// Unlink and return the least recently used entry.
    pub fn pop_tail(&mut self) -> Option<(K, Arc<V>)> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        let entry = self.release(idx)?;
        self.index.remove(&entry.0);
        Some(entry)
    }

    /// Keys in most-recently-used to least-recently-used order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            tier: self,
            cursor: self.head,
        }
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn release(&mut self, idx: usize) -> Option<(K, Arc<V>)> {
        self.unlink(idx);
        self.free.push(idx);
        self.slots[idx].entry.take()
    }

    fn move_to_head(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.link_head(idx);
    }

    fn link_head(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;
        if self.head != NIL {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;

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

        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }
}

/// Iterator over hot keys, most recently used first.
pub struct Keys<'a, K, V> {
    tier: &'a HotTier<K, V>,
    cursor: usize,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let slot = &self.tier.slots[self.cursor];
        self.cursor = slot.next;
        slot.entry.as_ref().map(|(k, _)| k)
    }
}
