//! ChainedHashMap: separate chaining over a bucket array and a parallel entry
//! array, with removed entries threaded into an in-array free list.
//!
//! Layout
//! - `buckets[b]` holds the index of the most recently inserted entry whose
//!   hash falls into bucket `b`; chains continue through `Entry::next`.
//! - `entries` only ever grows (or is cleared). A removed entry becomes
//!   `Slot::Free` and joins the free list, which is drained before the arrays
//!   grow again. Positions are therefore stable for an entry's whole life.
//! - Both arrays are sized by a prime taken from [`crate::primes`].
//!
//! Every mutation bumps `version`; [`MapCursor`] compares it on each step.

use core::fmt;
use core::hash::Hash;
use core::mem;

use snafu::{ensure, OptionExt};

use crate::array::{copy_to_untyped, UntypedArray};
use crate::collection::{copy_into, Collection};
use crate::comparer::{DefaultComparer, EqualityComparer};
use crate::error::{CollectionModified, DuplicateKey, KeyNotFound, MissingArgument, Result};
use crate::primes;
use crate::reentrancy::DebugReentrancy;
use crate::version::{CollectionId, Version};
use crate::views::{Keys, Values};

/// Stored hashes keep 31 bits; the top bit is always clear.
const HASH_MASK: u32 = 0x7FFF_FFFF;

#[inline]
fn fold_hash(h: u64) -> u32 {
    ((h ^ (h >> 32)) as u32) & HASH_MASK
}

#[cold]
#[inline(never)]
fn free_slot_in_chain() -> ! {
    panic!("bucket chain reached a free entry slot");
}

/// Construction-time settings for [`ChainedHashMap`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MapConfig {
    /// Entries to make room for up front. `0` defers allocation to the first
    /// insertion.
    pub capacity: usize,
    /// Chain length walked during one insertion above which the map asks its
    /// comparer to [`reseed`](EqualityComparer::reseed) and recomputes every
    /// stored hash. This happens at most once per map; after a successful
    /// reseed the check is off. `None` disables the check.
    pub collision_threshold: Option<usize>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            collision_threshold: Some(100),
        }
    }
}

#[derive(Debug)]
struct Entry<K, V> {
    hash: u32,
    next: Option<usize>,
    key: K,
    value: V,
}

#[derive(Debug)]
enum Slot<K, V> {
    Occupied(Entry<K, V>),
    Free { next: Option<usize> },
}

pub struct ChainedHashMap<K, V, C = DefaultComparer> {
    comparer: C,
    collision_threshold: Option<usize>,
    buckets: Vec<Option<usize>>,
    entries: Vec<Slot<K, V>>,
    free_list: Option<usize>,
    free_count: usize,
    version: Version,
    id: CollectionId,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_comparer(DefaultComparer::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparer(capacity, DefaultComparer::default())
    }

    /// Builds a map from `(key, value)` pairs; a repeated key fails with
    /// [`Error::DuplicateKey`](crate::Error::DuplicateKey).
    pub fn try_from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::try_from_iter_with(iter, DefaultComparer::default())
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> ChainedHashMap<K, V, C>
where
    C: EqualityComparer<K>,
{
    pub fn with_comparer(comparer: C) -> Self {
        Self::with_config(MapConfig::default(), comparer)
    }

    pub fn with_capacity_and_comparer(capacity: usize, comparer: C) -> Self {
        let config = MapConfig {
            capacity,
            ..MapConfig::default()
        };
        Self::with_config(config, comparer)
    }

    pub fn with_config(config: MapConfig, comparer: C) -> Self {
        let mut map = Self {
            comparer,
            collision_threshold: config.collision_threshold,
            buckets: Vec::new(),
            entries: Vec::new(),
            free_list: None,
            free_count: 0,
            version: Version::new(),
            id: CollectionId::fresh(),
            reentrancy: DebugReentrancy::new(),
        };
        if config.capacity > 0 {
            map.initialize(config.capacity);
        }
        map
    }

    pub fn try_from_iter_with<I>(iter: I, comparer: C) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity_and_comparer(iter.size_hint().0, comparer);
        for (k, v) in iter {
            map.insert(k, v)?;
        }
        Ok(map)
    }

    pub fn comparer(&self) -> &C {
        &self.comparer
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries the map can hold before its arrays grow.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Current mutation epoch.
    pub fn version(&self) -> Version {
        self.version
    }

    fn initialize(&mut self, capacity: usize) {
        let size = primes::get_prime(capacity);
        self.buckets = vec![None; size];
        self.entries = Vec::with_capacity(size);
        self.free_list = None;
        self.free_count = 0;
    }

    #[inline]
    fn bucket_of(&self, hash: u32) -> usize {
        hash as usize % self.buckets.len()
    }

    #[inline]
    fn entry(&self, index: usize) -> &Entry<K, V> {
        match &self.entries[index] {
            Slot::Occupied(e) => e,
            Slot::Free { .. } => free_slot_in_chain(),
        }
    }

    #[inline]
    fn entry_mut(&mut self, index: usize) -> &mut Entry<K, V> {
        match &mut self.entries[index] {
            Slot::Occupied(e) => e,
            Slot::Free { .. } => free_slot_in_chain(),
        }
    }

    fn check_key(&self, key: &K) -> Result<()> {
        ensure!(!self.comparer.is_absent(key), MissingArgument { name: "key" });
        Ok(())
    }

    /// Walks the chain for `key`. On a hit, `previous` is the entry linking to
    /// the match (`None` when the match is the chain head).
    fn probe(&self, key: &K, op: &'static str) -> Probe {
        let _g = self.reentrancy.enter(op);
        let hash = fold_hash(self.comparer.hash(key));
        let bucket = self.bucket_of(hash);
        let mut previous = None;
        let mut steps = 0;
        let mut cursor = self.buckets[bucket];
        while let Some(i) = cursor {
            let e = self.entry(i);
            // Stored hash first; equality may be expensive.
            if e.hash == hash && self.comparer.equals(&e.key, key) {
                return Probe {
                    hash,
                    bucket,
                    found: Some(i),
                    previous,
                    steps,
                };
            }
            previous = Some(i);
            steps += 1;
            cursor = e.next;
        }
        Probe {
            hash,
            bucket,
            found: None,
            previous,
            steps,
        }
    }

    /// Index of the entry slot holding `key`, if any.
    pub fn find(&self, key: &K) -> Result<Option<usize>> {
        self.check_key(key)?;
        if self.buckets.is_empty() {
            return Ok(None);
        }
        Ok(self.probe(key, "find").found)
    }

    /// Key and value stored in slot `index`, as returned by [`find`](Self::find).
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        match self.entries.get(index)? {
            Slot::Occupied(e) => Some((&e.key, &e.value)),
            Slot::Free { .. } => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.find(key)?.is_some())
    }

    /// Linear scan over all live values.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().iter().any(|v| v == value)
    }

    /// Value stored for `key`; a miss is [`Error::KeyNotFound`](crate::Error::KeyNotFound).
    pub fn get(&self, key: &K) -> Result<&V> {
        let i = self.find(key)?.context(KeyNotFound)?;
        Ok(&self.entry(i).value)
    }

    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let i = self.find(key)?.context(KeyNotFound)?;
        Ok(&mut self.entry_mut(i).value)
    }

    /// Like [`get`](Self::get), but a miss is `Ok(None)`.
    pub fn try_get(&self, key: &K) -> Result<Option<&V>> {
        Ok(self.find(key)?.map(|i| &self.entry(i).value))
    }

    /// Adds a new entry; fails with [`Error::DuplicateKey`](crate::Error::DuplicateKey)
    /// if `key` is already present, leaving the map unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.insert_entry(key, value, true).map(|_| ())
    }

    /// Adds or overwrites the entry for `key`, returning the previous value.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.insert_entry(key, value, false)
    }

    fn insert_entry(&mut self, key: K, value: V, strict: bool) -> Result<Option<V>> {
        self.check_key(&key)?;
        if self.buckets.is_empty() {
            self.initialize(0);
        }

        let probe = self.probe(&key, "insert");
        if let Some(i) = probe.found {
            ensure!(!strict, DuplicateKey);
            let old = mem::replace(&mut self.entry_mut(i).value, value);
            self.version.bump();
            return Ok(Some(old));
        }

        let mut bucket = probe.bucket;
        let index = match self.free_list {
            Some(free) => {
                self.free_list = match self.entries[free] {
                    Slot::Free { next } => next,
                    Slot::Occupied(_) => unreachable!("free list reached an occupied entry"),
                };
                self.free_count -= 1;
                free
            }
            None => {
                if self.entries.len() == self.buckets.len() {
                    self.resize(primes::expand_prime(self.entries.len()), false);
                    bucket = self.bucket_of(probe.hash);
                }
                self.entries.push(Slot::Free { next: None });
                self.entries.len() - 1
            }
        };

        self.entries[index] = Slot::Occupied(Entry {
            hash: probe.hash,
            next: self.buckets[bucket],
            key,
            value,
        });
        self.buckets[bucket] = Some(index);
        self.version.bump();

        if let Some(threshold) = self.collision_threshold {
            if probe.steps > threshold && self.comparer.reseed() {
                // One switch per map: a reseed that leaves chains long must
                // not rehash again on every later insert.
                self.collision_threshold = None;
                self.resize(self.buckets.len(), true);
            }
        }
        Ok(None)
    }

    /// Rebuilds the bucket array with `new_size` buckets. With
    /// `force_new_hash_codes`, every stored hash is recomputed from the
    /// comparer first. Free slots keep their free-list links.
    fn resize(&mut self, new_size: usize, force_new_hash_codes: bool) {
        debug_assert!(new_size >= self.entries.len());

        if force_new_hash_codes {
            let _g = self.reentrancy.enter("rehash");
            for slot in self.entries.iter_mut() {
                if let Slot::Occupied(e) = slot {
                    e.hash = fold_hash(self.comparer.hash(&e.key));
                }
            }
        }

        let mut buckets = vec![None; new_size];
        for (i, slot) in self.entries.iter_mut().enumerate() {
            if let Slot::Occupied(e) = slot {
                let b = e.hash as usize % new_size;
                e.next = buckets[b];
                buckets[b] = Some(i);
            }
        }
        self.entries.reserve_exact(new_size - self.entries.len());
        self.buckets = buckets;
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        Ok(self.remove_entry(key)?.map(|(_, v)| v))
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Result<Option<(K, V)>> {
        self.check_key(key)?;
        if self.buckets.is_empty() {
            return Ok(None);
        }
        let probe = self.probe(key, "remove");
        let index = match probe.found {
            Some(i) => i,
            None => return Ok(None),
        };

        let slot = mem::replace(
            &mut self.entries[index],
            Slot::Free {
                next: self.free_list,
            },
        );
        let entry = match slot {
            Slot::Occupied(e) => e,
            Slot::Free { .. } => free_slot_in_chain(),
        };
        match probe.previous {
            None => self.buckets[probe.bucket] = entry.next,
            Some(p) => self.entry_mut(p).next = entry.next,
        }
        self.free_list = Some(index);
        self.free_count += 1;
        self.version.bump();
        Ok(Some((entry.key, entry.value)))
    }

    /// Drops every entry but keeps the allocated capacity.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            for b in self.buckets.iter_mut() {
                *b = None;
            }
            self.entries.clear();
            self.free_list = None;
            self.free_count = 0;
            self.version.bump();
        }
    }

    /// Clones every entry into `buffer[offset..]` in slot order.
    pub fn copy_to(&self, buffer: &mut [(K, V)], offset: usize) -> Result<()>
    where
        K: Clone,
        V: Clone,
    {
        let items = self.iter().map(|(k, v)| (k.clone(), v.clone()));
        copy_into(buffer, offset, self.len(), items)
    }

    /// Clones every entry, as a `(K, V)` tuple, into an untyped array.
    pub fn copy_to_array(&self, array: &mut dyn UntypedArray, offset: usize) -> Result<()>
    where
        K: Clone + 'static,
        V: Clone + 'static,
    {
        let items = self.iter().map(|(k, v)| (k.clone(), v.clone()));
        copy_to_untyped(array, offset, self.len(), items)
    }
}

impl<K, V, C> ChainedHashMap<K, V, C> {
    /// Borrowing iterator in slot order. The borrow rules out mutation for
    /// its lifetime; see [`cursor`](Self::cursor) for a detached traversal.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.entries.iter(),
            remaining: self.entries.len() - self.free_count,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            remaining: self.entries.len() - self.free_count,
            it: self.entries.iter_mut(),
        }
    }

    /// Fail-fast traversal that does not borrow the map. Any mutation between
    /// two [`MapCursor::next`] calls makes the later call fail.
    pub fn cursor(&self) -> MapCursor {
        MapCursor {
            owner: self.id,
            version: self.version,
            index: 0,
        }
    }

    /// Read-only view of the keys.
    pub fn keys(&self) -> Keys<'_, K, V, C> {
        Keys::new(self)
    }

    /// Read-only view of the values.
    pub fn values(&self) -> Values<'_, K, V, C> {
        Values::new(self)
    }

    /// Number of entries reachable from each bucket.
    #[cfg(test)]
    pub(crate) fn chain_lengths(&self) -> Vec<usize> {
        self.buckets
            .iter()
            .map(|&head| {
                let mut len = 0;
                let mut cursor = head;
                while let Some(i) = cursor {
                    cursor = match &self.entries[i] {
                        Slot::Occupied(e) => e.next,
                        Slot::Free { .. } => free_slot_in_chain(),
                    };
                    len += 1;
                }
                len
            })
            .collect()
    }
}

struct Probe {
    hash: u32,
    bucket: usize,
    found: Option<usize>,
    previous: Option<usize>,
    steps: usize,
}

/// Detached, fail-fast position in a [`ChainedHashMap`].
///
/// The cursor records the map's identity and version when created. Each call
/// to [`next`](Self::next), including the one that reports the end, fails with
/// [`Error::CollectionModified`](crate::Error::CollectionModified) if either no
/// longer matches.
#[derive(Copy, Clone, Debug)]
pub struct MapCursor {
    owner: CollectionId,
    version: Version,
    index: usize,
}

impl MapCursor {
    pub fn next<'a, K, V, C>(
        &mut self,
        map: &'a ChainedHashMap<K, V, C>,
    ) -> Result<Option<(&'a K, &'a V)>> {
        ensure!(
            map.id == self.owner && map.version == self.version,
            CollectionModified
        );
        while let Some(slot) = map.entries.get(self.index) {
            self.index += 1;
            if let Slot::Occupied(e) = slot {
                return Ok(Some((&e.key, &e.value)));
            }
        }
        Ok(None)
    }
}

/// Iterator over `(&K, &V)` in slot order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.it.by_ref() {
            if let Slot::Occupied(e) = slot {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over `(&K, &mut V)` in slot order.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.it.by_ref() {
            if let Slot::Occupied(e) = slot {
                self.remaining -= 1;
                return Some((&e.key, &mut e.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<'a, K, V, C> IntoIterator for &'a ChainedHashMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut ChainedHashMap<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for ChainedHashMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> Collection<(K, V)> for ChainedHashMap<K, V, C>
where
    K: Clone,
    V: Clone + PartialEq,
    C: EqualityComparer<K>,
{
    fn len(&self) -> usize {
        ChainedHashMap::len(self)
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn add(&mut self, (key, value): (K, V)) -> Result<()> {
        self.insert(key, value)
    }

    /// True when `key` is present and its value equals `value`.
    fn contains(&self, (key, value): &(K, V)) -> Result<bool> {
        Ok(self.try_get(key)?.map_or(false, |v| v == value))
    }

    /// Removes `key` only if its value equals `value`.
    fn remove(&mut self, (key, value): &(K, V)) -> Result<bool> {
        match self.try_get(key)? {
            Some(v) if v == value => {
                self.remove_entry(key)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn clear(&mut self) -> Result<()> {
        ChainedHashMap::clear(self);
        Ok(())
    }

    fn copy_to(&self, buffer: &mut [(K, V)], offset: usize) -> Result<()>
    where
        (K, V): Clone,
    {
        ChainedHashMap::copy_to(self, buffer, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparer::OptionKeyComparer;
    use crate::Error;
    use std::rc::Rc;

    /// Every key lands in the same bucket.
    #[derive(Clone, Default)]
    struct ConstComparer {
        seed: u64,
    }

    impl EqualityComparer<String> for ConstComparer {
        fn equals(&self, a: &String, b: &String) -> bool {
            a == b
        }
        fn hash(&self, v: &String) -> u64 {
            if self.seed == 0 {
                0
            } else {
                v.len() as u64 * 31 + v.bytes().map(u64::from).sum::<u64>() + self.seed
            }
        }
        fn reseed(&mut self) -> bool {
            self.seed += 1;
            true
        }
    }

    fn occupied<K, V, C>(m: &ChainedHashMap<K, V, C>) -> usize {
        m.entries
            .iter()
            .filter(|s| matches!(s, Slot::Occupied(_)))
            .count()
    }

    /// Invariant: duplicate strict inserts fail and leave map and version untouched.
    #[test]
    fn duplicate_insert_rejected() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
        m.insert("dup".to_string(), 1).unwrap();
        let v = m.version();
        assert_eq!(m.insert("dup".to_string(), 2), Err(Error::DuplicateKey));
        assert_eq!(m.get(&"dup".to_string()), Ok(&1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.version(), v);
    }

    /// Invariant: `set` overwrites in place, returns the old value and bumps the version.
    #[test]
    fn set_overwrites_in_place() {
        let mut m: ChainedHashMap<&str, i32> = ChainedHashMap::new();
        assert_eq!(m.set("k", 1), Ok(None));
        let slot = m.find(&"k").unwrap();
        let v = m.version();
        assert_eq!(m.set("k", 2), Ok(Some(1)));
        assert_ne!(m.version(), v);
        assert_eq!(m.find(&"k").unwrap(), slot);
        assert_eq!(m.get(&"k"), Ok(&2));
    }

    /// Invariant: lookups walk the chain when every key shares one bucket.
    #[test]
    fn chain_walk_under_constant_hash() {
        let mut m = ChainedHashMap::with_comparer(ConstComparer::default());
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            m.insert(k.to_string(), v).unwrap();
        }
        let i = m.find(&"b".to_string()).unwrap().expect("b present");
        assert_eq!(m.get_index(i), Some((&"b".to_string(), &2)));
        assert_eq!(m.get(&"a".to_string()), Ok(&1));
        assert_eq!(m.get(&"c".to_string()), Ok(&3));

        // Unlink from the middle of the chain.
        assert_eq!(m.remove(&"b".to_string()), Ok(Some(2)));
        assert_eq!(m.get(&"a".to_string()), Ok(&1));
        assert_eq!(m.get(&"c".to_string()), Ok(&3));
        assert_eq!(m.try_get(&"b".to_string()), Ok(None));
    }

    /// Invariant: growth picks the next prime and keeps every entry reachable.
    #[test]
    fn growth_moves_to_next_prime() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::with_capacity(3);
        assert_eq!(m.capacity(), 3);
        for k in 0..3 {
            m.insert(k, k * 10).unwrap();
        }
        assert_eq!(m.capacity(), 3);
        m.insert(3, 30).unwrap();
        assert_eq!(m.capacity(), 7);
        for k in 0..4 {
            assert_eq!(m.get(&k), Ok(&(k * 10)));
        }
    }

    /// Invariant: a freed slot is reused before the arrays grow.
    #[test]
    fn free_list_reuse_does_not_grow() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::with_capacity(3);
        for k in 0..3 {
            m.insert(k, k).unwrap();
        }
        let slot = m.find(&1).unwrap().unwrap();
        m.remove(&1).unwrap();
        m.insert(99, 99).unwrap();
        assert_eq!(m.capacity(), 3);
        assert_eq!(m.entries.len(), 3);
        assert_eq!(m.find(&99).unwrap(), Some(slot));
    }

    /// Invariant: `len()` equals the number of occupied slots after every operation.
    #[test]
    fn len_tracks_occupied_slots() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        for k in 0..20 {
            m.insert(k, k).unwrap();
            assert_eq!(m.len(), occupied(&m));
        }
        for k in (0..20).step_by(3) {
            m.remove(&k).unwrap();
            assert_eq!(m.len(), occupied(&m));
        }
        for k in 100..105 {
            m.insert(k, k).unwrap();
            assert_eq!(m.len(), occupied(&m));
        }
        m.clear();
        assert_eq!(m.len(), 0);
        assert_eq!(occupied(&m), 0);
    }

    /// Invariant: a removed entry no longer holds its key or value.
    #[test]
    fn removal_releases_key_and_value() {
        let key = Rc::new(5);
        let value = Rc::new("v");
        let mut m = ChainedHashMap::new();
        m.insert(Rc::clone(&key), Rc::clone(&value)).unwrap();
        assert_eq!(Rc::strong_count(&value), 2);
        let removed = m.remove(&key).unwrap();
        drop(removed);
        assert_eq!(Rc::strong_count(&key), 1);
        assert_eq!(Rc::strong_count(&value), 1);
    }

    /// Invariant: the cursor fails on the step after any mutation, including
    /// the step that would report the end.
    #[test]
    fn cursor_fails_fast() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        for k in 0..3 {
            m.insert(k, k).unwrap();
        }

        let mut c = m.cursor();
        assert!(c.next(&m).unwrap().is_some());
        m.insert(10, 10).unwrap();
        assert_eq!(c.next(&m), Err(Error::CollectionModified));

        let mut c = m.cursor();
        while c.next(&m).unwrap().is_some() {}
        m.remove(&0).unwrap();
        assert_eq!(c.next(&m), Err(Error::CollectionModified));

        let mut c = m.cursor();
        m.set(1, 11).unwrap();
        assert_eq!(c.next(&m), Err(Error::CollectionModified));

        let mut c = m.cursor();
        m.clear();
        assert_eq!(c.next(&m), Err(Error::CollectionModified));
    }

    /// Invariant: a cursor is tied to the map it was created from.
    #[test]
    fn cursor_rejects_other_map() {
        let a: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        let b: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        let mut c = a.cursor();
        assert_eq!(c.next(&b), Err(Error::CollectionModified));
    }

    /// Invariant: enumeration follows slot order, not insertion order.
    #[test]
    fn enumeration_is_slot_order() {
        let mut m: ChainedHashMap<&str, i32> = ChainedHashMap::with_capacity(5);
        m.insert("a", 1).unwrap();
        m.insert("b", 2).unwrap();
        m.insert("c", 3).unwrap();
        m.remove(&"b").unwrap();
        m.insert("d", 4).unwrap();

        let seen: Vec<_> = m.iter().map(|(k, _)| *k).collect();
        assert_eq!(seen, vec!["a", "d", "c"]);

        let mut c = m.cursor();
        let mut via_cursor = Vec::new();
        while let Some((k, _)) = c.next(&m).unwrap() {
            via_cursor.push(*k);
        }
        assert_eq!(via_cursor, seen);
    }

    /// Invariant: absent keys are refused by every keyed operation.
    #[test]
    fn absent_key_rejected() {
        let mut m: ChainedHashMap<Option<u8>, i32, OptionKeyComparer> =
            ChainedHashMap::with_comparer(OptionKeyComparer::default());
        let missing = Error::MissingArgument { name: "key" };
        assert_eq!(m.insert(None, 1), Err(missing.clone()));
        assert_eq!(m.set(None, 1), Err(missing.clone()));
        assert_eq!(m.find(&None), Err(missing.clone()));
        assert_eq!(m.remove(&None), Err(missing.clone()));
        assert_eq!(m.contains_key(&None), Err(missing));
        assert!(m.is_empty());

        m.insert(Some(1), 1).unwrap();
        assert_eq!(m.get(&Some(1)), Ok(&1));
    }

    /// Invariant: the raising accessor reports a miss; the try-variant does not.
    #[test]
    fn get_miss_is_key_not_found() {
        let mut m: ChainedHashMap<&str, i32> = ChainedHashMap::new();
        assert_eq!(m.get(&"x"), Err(Error::KeyNotFound));
        assert_eq!(m.get_mut(&"x"), Err(Error::KeyNotFound));
        assert_eq!(m.try_get(&"x"), Ok(None));
        m.insert("x", 1).unwrap();
        *m.get_mut(&"x").unwrap() += 1;
        assert_eq!(m.try_get(&"x"), Ok(Some(&2)));
    }

    /// Invariant: a chain longer than the threshold reseeds the comparer and
    /// recomputes stored hashes without losing entries.
    #[test]
    fn collision_threshold_forces_new_hash_codes() {
        let config = MapConfig {
            capacity: 0,
            collision_threshold: Some(2),
        };
        let mut m = ChainedHashMap::with_config(config, ConstComparer::default());
        for k in ["w", "x", "y"] {
            m.insert(k.to_string(), 0).unwrap();
        }
        assert_eq!(m.comparer().seed, 0);
        m.insert("z".to_string(), 0).unwrap();
        assert_eq!(m.comparer().seed, 1);
        for k in ["w", "x", "y", "z"] {
            assert_eq!(m.contains_key(&k.to_string()), Ok(true));
        }
        assert_eq!(m.len(), 4);
    }

    /// Invariant: without a threshold the comparer is never reseeded.
    #[test]
    fn disabled_threshold_never_reseeds() {
        let config = MapConfig {
            capacity: 0,
            collision_threshold: None,
        };
        let mut m = ChainedHashMap::with_config(config, ConstComparer::default());
        for i in 0..50 {
            m.insert(format!("k{}", i), i).unwrap();
        }
        assert_eq!(m.comparer().seed, 0);
        assert_eq!(m.get(&"k49".to_string()), Ok(&49));
    }

    /// Comparer whose `reseed` claims success without changing the hash, the
    /// way a deterministic hasher behaves after `S::default()`.
    #[derive(Default)]
    struct StuckComparer {
        hashes: std::cell::Cell<usize>,
        reseeds: usize,
    }

    impl EqualityComparer<u32> for StuckComparer {
        fn equals(&self, a: &u32, b: &u32) -> bool {
            a == b
        }
        fn hash(&self, _value: &u32) -> u64 {
            self.hashes.set(self.hashes.get() + 1);
            7
        }
        fn reseed(&mut self) -> bool {
            self.reseeds += 1;
            true
        }
    }

    /// Invariant: a reseed that leaves chains long does not trigger another
    /// forced rehash on every later insertion.
    #[test]
    fn reseed_happens_once_per_map() {
        let config = MapConfig {
            capacity: 0,
            collision_threshold: Some(10),
        };
        let n = 400;
        let mut m = ChainedHashMap::with_config(config, StuckComparer::default());
        for k in 0..n {
            m.insert(k, k).unwrap();
        }
        assert_eq!(m.len(), n as usize);
        assert_eq!(m.comparer().reseeds, 1);
        // One hash per insertion plus a single full rehash.
        assert!(m.comparer().hashes.get() <= 2 * n as usize);
        assert_eq!(m.get(&(n - 1)), Ok(&(n - 1)));
    }

    /// Invariant: value search is a linear scan over live entries only.
    #[test]
    fn contains_value_scans_live_entries() {
        let mut m: ChainedHashMap<u8, Option<&str>> = ChainedHashMap::new();
        m.insert(1, Some("a")).unwrap();
        m.insert(2, None).unwrap();
        assert!(m.contains_value(&None));
        assert!(m.contains_value(&Some("a")));
        m.remove(&2).unwrap();
        assert!(!m.contains_value(&None));
    }

    /// Invariant: copy validates offset and room before writing anything.
    #[test]
    fn copy_to_validates_target() {
        let m = ChainedHashMap::try_from_iter(vec![(1, 'a'), (2, 'b')]).unwrap();
        let mut buf = vec![(0, '-'); 3];
        assert_eq!(m.copy_to(&mut buf, 2), Err(Error::InsufficientSpace));
        assert_eq!(
            m.copy_to(&mut buf, 4),
            Err(Error::IndexOutOfRange { index: 4 })
        );
        assert_eq!(buf, vec![(0, '-'); 3]);
        m.copy_to(&mut buf, 1).unwrap();
        assert_eq!(buf[0], (0, '-'));
        let mut copied = buf[1..].to_vec();
        copied.sort();
        assert_eq!(copied, vec![(1, 'a'), (2, 'b')]);
    }

    /// Invariant: building from pairs fails on a repeated key.
    #[test]
    fn try_from_iter_rejects_duplicates() {
        let r = ChainedHashMap::try_from_iter(vec![("a", 1), ("a", 2)]);
        assert!(matches!(r, Err(Error::DuplicateKey)));
    }

    /// Invariant: clearing keeps capacity and only bumps the version when
    /// something was removed.
    #[test]
    fn clear_keeps_capacity() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::with_capacity(10);
        let v = m.version();
        m.clear();
        assert_eq!(m.version(), v);
        m.insert(1, 1).unwrap();
        m.clear();
        assert_ne!(m.version(), v);
        assert_eq!(m.capacity(), 11);
        assert_eq!(m.try_get(&1), Ok(None));
        m.insert(1, 2).unwrap();
        assert_eq!(m.get(&1), Ok(&2));
    }

    /// Invariant: pair-level membership and removal compare the value too.
    #[test]
    fn pair_collection_semantics() {
        let mut m: ChainedHashMap<&str, i32> = ChainedHashMap::new();
        Collection::add(&mut m, ("a", 1)).unwrap();
        assert_eq!(Collection::contains(&m, &("a", 1)), Ok(true));
        assert_eq!(Collection::contains(&m, &("a", 2)), Ok(false));
        assert_eq!(Collection::remove(&mut m, &("a", 2)), Ok(false));
        assert_eq!(m.len(), 1);
        assert_eq!(Collection::remove(&mut m, &("a", 1)), Ok(true));
        assert!(m.is_empty());
    }
}
