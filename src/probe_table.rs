//! ProbeTable: open-addressing map with linear probing and tombstone deletion.

use crate::guard::ProbeGuard;
use crate::strategy::{KeyStrategy, StdStrategy};
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::mem;
use log::debug;
use thiserror::Error;

/// Capacity of the first allocation made by a table created with `new()`.
pub const INITIAL_CAPACITY: usize = 256;

// Smallest non-zero capacity; keeps `max_load` at least 3.
const MIN_CAPACITY: usize = 4;

// Load factor 3/4. Counts tombstones as well as live entries, so every
// allocated table keeps at least one `Empty` slot to terminate probes.
#[inline]
fn max_load(capacity: usize) -> usize {
    capacity - capacity / 4
}

// Smallest power-of-two capacity that holds `n` entries under the load factor.
fn capacity_for(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut cap = MIN_CAPACITY;
    while max_load(cap) < n {
        cap = cap.checked_mul(2).expect("capacity overflow");
    }
    cap
}

#[derive(Clone)]
enum Slot<K, V> {
    Empty,
    Tombstone,
    Occupied { hash: u64, key: K, value: V },
}

impl<K, V> Slot<K, V> {
    #[inline]
    fn entry(&self) -> Option<(&K, &V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            _ => None,
        }
    }

    #[inline]
    fn entry_mut(&mut self) -> Option<(&K, &mut V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((&*key, value)),
            _ => None,
        }
    }

    #[inline]
    fn into_entry(self) -> Option<(K, V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            _ => None,
        }
    }
}

// Outcome of an insert-oriented probe.
enum Probe {
    Found(usize),
    Vacant(usize),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    #[error("key is already present in the table")]
    DuplicateKey,
}

/// Open-addressing hash map with linear probing.
///
/// Hashing and equality come from the strategy `S`, fixed at construction.
/// Each occupied slot caches its key's hash, so growth recomputes slot
/// positions without calling back into the strategy.
///
/// References returned by `entry`, `insert` and `get_mut` borrow the table
/// mutably; the borrow checker therefore rejects any use of them across a
/// later call that could grow (and move) the backing storage.
#[derive(Clone)]
pub struct ProbeTable<K, V, S = StdStrategy> {
    slots: Vec<Slot<K, V>>,
    len: usize,
    tombstones: usize,
    strategy: S,
    guard: ProbeGuard,
}

impl<K, V> ProbeTable<K, V> {
    /// Creates an empty table. Nothing is allocated until the first insert.
    pub fn new() -> Self {
        Self::with_strategy(StdStrategy::default())
    }

    /// Creates a table that can hold `n` entries without growing.
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_and_strategy(n, StdStrategy::default())
    }
}

impl<K, V, S: Default> Default for ProbeTable<K, V, S> {
    fn default() -> Self {
        Self::with_strategy(S::default())
    }
}

impl<K, V, S> ProbeTable<K, V, S> {
    pub fn with_strategy(strategy: S) -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            tombstones: 0,
            strategy,
            guard: ProbeGuard::new(),
        }
    }

    pub fn with_capacity_and_strategy(n: usize, strategy: S) -> Self {
        let mut table = Self::with_strategy(strategy);
        table.slots = empty_slots(capacity_for(n));
        table
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slot count of the backing array.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// `len / capacity`, or 0 for an unallocated table.
    pub fn load_factor(&self) -> f64 {
        if self.slots.is_empty() {
            0.0
        } else {
            self.len as f64 / self.slots.len() as f64
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Removes every entry, keeping the allocated capacity.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.len = 0;
        self.tombstones = 0;
    }

    /// Iterates over `(key, value)` pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Bounded lookup probe. Skips tombstones, stops at the first empty
    /// slot, and gives up after visiting every slot once.
    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyStrategy<Q>,
    {
        if self.len == 0 {
            return None;
        }
        let _g = self.guard.enter();
        let hash = self.strategy.hash(key);
        let mask = self.slots.len() - 1;
        let mut i = hash as usize & mask;
        for _ in 0..self.slots.len() {
            match &self.slots[i] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied { hash: h, key: k, .. } => {
                    if *h == hash && self.strategy.eq(k.borrow(), key) {
                        return Some(i);
                    }
                }
            }
            i = (i + 1) & mask;
        }
        None
    }

    #[inline]
    fn value_at(&mut self, i: usize) -> &mut V {
        match &mut self.slots[i] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("probe returned an unoccupied slot"),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyStrategy<Q>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyStrategy<Q>,
    {
        let i = self.find_index(key)?;
        self.slots[i].entry()
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyStrategy<Q>,
    {
        let i = self.find_index(key)?;
        Some(self.value_at(i))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyStrategy<Q>,
    {
        self.find_index(key).is_some()
    }

    /// Overwrites the value of an existing key and returns the old value.
    /// Absent keys leave the table untouched; this never inserts or grows.
    pub fn update<Q>(&mut self, key: &Q, value: V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyStrategy<Q>,
    {
        let i = self.find_index(key)?;
        Some(mem::replace(self.value_at(i), value))
    }

    /// Removes a key and returns the owned pair.
    ///
    /// The slot becomes a tombstone so probe chains running through it stay
    /// intact. When the next slot is empty no chain can pass through, and
    /// the slot is emptied outright.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyStrategy<Q>,
    {
        let i = self.find_index(key)?;
        let next = (i + 1) & (self.slots.len() - 1);
        let vacated = if matches!(self.slots[next], Slot::Empty) {
            Slot::Empty
        } else {
            self.tombstones += 1;
            Slot::Tombstone
        };
        self.len -= 1;
        mem::replace(&mut self.slots[i], vacated).into_entry()
    }

    // Moves every live entry into a fresh array of `new_cap` slots using the
    // cached hashes. The new array is complete before it replaces the old.
    fn rehash(&mut self, new_cap: usize) {
        let old_cap = self.slots.len();
        let purged = self.tombstones;
        let mut slots = empty_slots(new_cap);
        let mask = new_cap - 1;
        for slot in mem::take(&mut self.slots) {
            if let Slot::Occupied { hash, key, value } = slot {
                let mut i = hash as usize & mask;
                while !matches!(slots[i], Slot::Empty) {
                    i = (i + 1) & mask;
                }
                slots[i] = Slot::Occupied { hash, key, value };
            }
        }
        self.slots = slots;
        self.tombstones = 0;
        debug!(
            "rehashed {} entries: capacity {} -> {}, {} tombstones purged",
            self.len, old_cap, new_cap, purged
        );
    }

    // Makes room for `additional` more entries under the load factor.
    // Tombstone pressure alone rehashes in place while the live entries fit
    // in half the budget; anything else doubles.
    fn ensure_capacity(&mut self, additional: usize) {
        let cap = self.slots.len();
        let needed = self.len.checked_add(additional).expect("capacity overflow");
        if needed + self.tombstones <= max_load(cap) {
            return;
        }
        let new_cap = if cap != 0 && needed <= max_load(cap) / 2 {
            cap
        } else {
            let mut new_cap = if cap == 0 {
                INITIAL_CAPACITY
            } else {
                cap.checked_mul(2).expect("capacity overflow")
            };
            while max_load(new_cap) < needed {
                new_cap = new_cap.checked_mul(2).expect("capacity overflow");
            }
            new_cap
        };
        self.rehash(new_cap);
    }

    /// Grows ahead of time so `additional` more keys fit without growing.
    pub fn reserve(&mut self, additional: usize) {
        self.ensure_capacity(additional);
    }

    // Grows if needed, then probes for `key`: either its slot or the first
    // reusable slot (tombstone or empty) on its chain.
    fn probe_for_insert(&mut self, key: &K) -> (Probe, u64)
    where
        S: KeyStrategy<K>,
    {
        self.ensure_capacity(1);
        let _g = self.guard.enter();
        let hash = self.strategy.hash(key);
        let mask = self.slots.len() - 1;
        let mut i = hash as usize & mask;
        let mut reusable = None;
        for _ in 0..self.slots.len() {
            match &self.slots[i] {
                Slot::Empty => return (Probe::Vacant(reusable.unwrap_or(i)), hash),
                Slot::Tombstone => {
                    reusable.get_or_insert(i);
                }
                Slot::Occupied { hash: h, key: k, .. } => {
                    if *h == hash && self.strategy.eq(k, key) {
                        return (Probe::Found(i), hash);
                    }
                }
            }
            i = (i + 1) & mask;
        }
        match reusable {
            Some(i) => (Probe::Vacant(i), hash),
            None => unreachable!("load factor keeps an empty slot in every table"),
        }
    }

    fn occupy(&mut self, i: usize, hash: u64, key: K, value: V) -> &mut V {
        if matches!(self.slots[i], Slot::Tombstone) {
            self.tombstones -= 1;
        }
        self.slots[i] = Slot::Occupied { hash, key, value };
        self.len += 1;
        self.value_at(i)
    }

    /// Returns the value for `key`, inserting `V::default()` first if the
    /// key is absent.
    pub fn entry(&mut self, key: K) -> &mut V
    where
        S: KeyStrategy<K>,
        V: Default,
    {
        self.entry_with(key, V::default)
    }

    /// Like `entry`, with a lazily built initial value. `default` runs only
    /// when the key is absent.
    pub fn entry_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        S: KeyStrategy<K>,
        F: FnOnce() -> V,
    {
        match self.probe_for_insert(&key) {
            (Probe::Found(i), _) => self.value_at(i),
            (Probe::Vacant(i), hash) => self.occupy(i, hash, key, default()),
        }
    }

    /// Inserts a new key. An existing key is left untouched, keeping its
    /// current value, and the call fails with `DuplicateKey`.
    pub fn insert(&mut self, key: K, value: V) -> Result<&mut V, InsertError>
    where
        S: KeyStrategy<K>,
    {
        match self.probe_for_insert(&key) {
            (Probe::Found(_), _) => Err(InsertError::DuplicateKey),
            (Probe::Vacant(i), hash) => Ok(self.occupy(i, hash, key, value)),
        }
    }

    #[cfg(test)]
    pub(crate) fn tombstones(&self) -> usize {
        self.tombstones
    }

    // Structural invariants, checked by the in-crate tests.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self)
    where
        S: KeyStrategy<K>,
    {
        let cap = self.slots.len();
        let live = self.slots.iter().filter(|s| matches!(s, Slot::Occupied { .. })).count();
        let dead = self.slots.iter().filter(|s| matches!(s, Slot::Tombstone)).count();
        assert_eq!(live, self.len, "len must match occupied slots");
        assert_eq!(dead, self.tombstones, "tombstone count must match slots");
        if cap == 0 {
            return;
        }
        assert!(cap.is_power_of_two());
        assert!(live + dead <= max_load(cap), "load factor exceeded");
        let mask = cap - 1;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied { hash, key, .. } = slot {
                assert_eq!(*hash, self.strategy.hash(key), "cached hash is stale");
                // Every slot from home to i must be non-empty.
                let mut j = *hash as usize & mask;
                while j != i {
                    assert!(!matches!(self.slots[j], Slot::Empty), "probe chain broken");
                    j = (j + 1) & mask;
                }
            }
        }
    }
}

fn empty_slots<K, V>(n: usize) -> Vec<Slot<K, V>> {
    let mut slots = Vec::with_capacity(n);
    slots.resize_with(n, || Slot::Empty);
    slots
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ProbeTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Inserts with `insert` semantics: for repeated keys the first value wins.
impl<K, V, S> Extend<(K, V)> for ProbeTable<K, V, S>
where
    S: KeyStrategy<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ProbeTable<K, V, S>
where
    S: KeyStrategy<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

/// Iterator over entries of a `ProbeTable`, in slot order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.it.by_ref().find_map(Slot::entry)?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            it: self.it.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over entries with mutable values.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.it.by_ref().find_map(Slot::entry_mut)?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator, in slot order.
pub struct IntoIter<K, V> {
    it: std::vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.it.by_ref().find_map(Slot::into_entry)?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for ProbeTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            it: self.slots.into_iter(),
            remaining: self.len,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ProbeTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ProbeTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
