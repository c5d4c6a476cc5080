//! Overflow tier: entries pushed out of the hot tier, held weakly.
//!
//! A freshly demoted value is *retained* (the tier still owns a strong
//! `Arc`) until the next reclamation sweep downgrades it to a `Weak`. After
//! that the value stays reachable only while someone outside the cache holds
//! a clone of the `Arc`. Registrations whose value is gone are *stale*; they
//! are pruned when their key is next touched or by an explicit purge.
//!
//! Every value is counted as reclaimed exactly once: by the sweep that
//! finds it unreachable, or, if it died after its last sweep, by whichever
//! of `take`/`purge_stale` discovers the stale registration first.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};

#[derive(Debug)]
enum Slot<V> {
    Retained(Arc<V>),
    Weak {
        value: Weak<V>,
        /// Already included in the reclaimed total.
        counted: bool,
    },
}

impl<V> Slot<V> {
    /// Liveness check and dereference in one step.
    fn upgrade(&self) -> Option<Arc<V>> {
        match self {
            Slot::Retained(v) => Some(Arc::clone(v)),
            Slot::Weak { value, .. } => value.upgrade(),
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            Slot::Retained(_) => true,
            Slot::Weak { value, .. } => value.strong_count() > 0,
        }
    }

    /// Dead, and not yet included in the reclaimed total.
    fn is_uncounted_dead(&self) -> bool {
        matches!(self, Slot::Weak { value, counted: false } if value.strong_count() == 0)
    }
}

/// Outcome of taking a key out of the overflow tier.
#[derive(Debug)]
pub enum Probe<K, V> {
    /// The registration existed and its value was still alive.
    Live(K, Arc<V>),
    /// The registration existed but its value had been reclaimed.
    Stale,
    /// No registration for the key.
    Absent,
}

/// The unbounded, weakly-held tier.
#[derive(Debug)]
pub struct OverflowTier<K, V> {
    slots: HashMap<K, Slot<V>>,
    retained: usize,
    reclaimed: u64,
}

impl<K: Hash + Eq, V> Default for OverflowTier<K, V> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            retained: 0,
            reclaimed: 0,
        }
    }
}

impl<K: Hash + Eq, V> OverflowTier<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a demoted value. It stays retained until the next sweep.
    pub fn insert(&mut self, key: K, value: Arc<V>) {
        if let Some(Slot::Retained(_)) = self.slots.insert(key, Slot::Retained(value)) {
            return;
        }
        self.retained += 1;
    }

    /// Remove the registration for `key`, reporting whether its value was
    /// still alive. A stale registration is dropped either way.
    pub fn take<Q>(&mut self, key: &Q) -> Probe<K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some((key, slot)) = self.slots.remove_entry(key) else {
            return Probe::Absent;
        };
        if let Slot::Retained(_) = slot {
            self.retained -= 1;
        }
        match slot.upgrade() {
            Some(value) => Probe::Live(key, value),
            None => {
                if !matches!(slot, Slot::Weak { counted: true, .. }) {
                    self.reclaimed += 1;
                }
                Probe::Stale
            }
        }
    }

    /// Whether `key` is registered with a value that is alive right now.
    pub fn contains_live<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.get(key).is_some_and(Slot::is_alive)
    }

    /// Number of registrations whose value is alive at the moment of the call.
    pub fn live_len(&self) -> usize {
        self.slots.values().filter(|slot| slot.is_alive()).count()
    }

    /// Keys whose value is alive at the moment of the call.
    pub fn live_keys(&self) -> impl Iterator<Item = &K> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_alive())
            .map(|(key, _)| key)
    }

    /// Registrations still strongly held, pending the next sweep.
    pub fn retained(&self) -> usize {
        self.retained
    }

    /// All registrations, live or stale.
    pub fn registrations(&self) -> usize {
        self.slots.len()
    }

    /// Total values reclaimed over the tier's lifetime.
    pub fn reclaimed(&self) -> u64 {
        self.reclaimed
    }

    /// Downgrade every retained value to a weak reference.
    ///
    /// Returns how many values were found unreachable that had not been
    /// counted before: values just downgraded with no outside holder, plus
    /// weak values whose last outside holder went away since the previous
    /// sweep.
    pub fn sweep(&mut self) -> usize {
        let mut reclaimed = 0;
        for slot in self.slots.values_mut() {
            match slot {
                Slot::Retained(value) => {
                    let weak = Arc::downgrade(value);
                    *slot = Slot::Weak {
                        value: Weak::clone(&weak),
                        counted: false,
                    };
                    // The tier held the last strong reference.
                    let dead = weak.strong_count() == 0;
                    if dead {
                        reclaimed += 1;
                    }
                    if let Slot::Weak { counted, .. } = slot {
                        *counted = dead;
                    }
                }
                Slot::Weak { value, counted } => {
                    if !*counted && value.strong_count() == 0 {
                        *counted = true;
                        reclaimed += 1;
                    }
                }
            }
        }
        self.retained = 0;
        self.reclaimed += reclaimed as u64;
        reclaimed
    }

    /// Drop every stale registration, returning how many were removed.
    pub fn purge_stale(&mut self) -> usize {
        let before = self.slots.len();
        let mut late = 0u64;
        self.slots.retain(|_, slot| {
            if slot.is_uncounted_dead() {
                late += 1;
            }
            slot.is_alive()
        });
        self.reclaimed += late;
        before - self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.retained = 0;
    }
}
