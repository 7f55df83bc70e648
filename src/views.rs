//! Read-only key and value projections of a [`ChainedHashMap`].

use core::fmt;

use crate::collection::{copy_into, Collection};
use crate::comparer::EqualityComparer;
use crate::error::{Error, Result};
use crate::hash_map::{ChainedHashMap, Iter};

fn immutable<T>(view: &'static str) -> Result<T> {
    Err(Error::ImmutableView { view })
}

/// Keys of a map, in slot order.
pub struct Keys<'a, K, V, C> {
    map: &'a ChainedHashMap<K, V, C>,
}

impl<'a, K, V, C> Keys<'a, K, V, C> {
    pub(crate) fn new(map: &'a ChainedHashMap<K, V, C>) -> Self {
        Self { map }
    }

    pub fn iter(&self) -> KeyIter<'a, K, V> {
        KeyIter {
            inner: self.map.iter(),
        }
    }
}

/// Values of a map, in slot order.
pub struct Values<'a, K, V, C> {
    map: &'a ChainedHashMap<K, V, C>,
}

impl<'a, K, V, C> Values<'a, K, V, C> {
    pub(crate) fn new(map: &'a ChainedHashMap<K, V, C>) -> Self {
        Self { map }
    }

    pub fn iter(&self) -> ValueIter<'a, K, V> {
        ValueIter {
            inner: self.map.iter(),
        }
    }
}

impl<K, V, C> Clone for Keys<'_, K, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, C> Copy for Keys<'_, K, V, C> {}

impl<K, V, C> Clone for Values<'_, K, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, C> Copy for Values<'_, K, V, C> {}

impl<K, V, C> Collection<K> for Keys<'_, K, V, C>
where
    K: Clone,
    C: EqualityComparer<K>,
{
    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn add(&mut self, _item: K) -> Result<()> {
        immutable("key")
    }

    fn contains(&self, item: &K) -> Result<bool> {
        self.map.contains_key(item)
    }

    fn remove(&mut self, _item: &K) -> Result<bool> {
        immutable("key")
    }

    fn clear(&mut self) -> Result<()> {
        immutable("key")
    }

    fn copy_to(&self, buffer: &mut [K], offset: usize) -> Result<()>
    where
        K: Clone,
    {
        copy_into(buffer, offset, self.map.len(), self.iter().cloned())
    }
}

impl<K, V, C> Collection<V> for Values<'_, K, V, C>
where
    V: Clone + PartialEq,
    C: EqualityComparer<K>,
{
    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn add(&mut self, _item: V) -> Result<()> {
        immutable("value")
    }

    fn contains(&self, item: &V) -> Result<bool> {
        Ok(self.map.contains_value(item))
    }

    fn remove(&mut self, _item: &V) -> Result<bool> {
        immutable("value")
    }

    fn clear(&mut self) -> Result<()> {
        immutable("value")
    }

    fn copy_to(&self, buffer: &mut [V], offset: usize) -> Result<()>
    where
        V: Clone,
    {
        copy_into(buffer, offset, self.map.len(), self.iter().cloned())
    }
}

pub struct KeyIter<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for KeyIter<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for KeyIter<'_, K, V> {}

pub struct ValueIter<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for ValueIter<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValueIter<'_, K, V> {}

impl<'a, K, V, C> IntoIterator for Keys<'a, K, V, C> {
    type Item = &'a K;
    type IntoIter = KeyIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for Values<'a, K, V, C> {
    type Item = &'a V;
    type IntoIter = ValueIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V, C> fmt::Debug for Keys<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K, V: fmt::Debug, C> fmt::Debug for Values<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChainedHashMap<&'static str, i32> {
        ChainedHashMap::try_from_iter(vec![("a", 1), ("b", 2), ("c", 3)]).unwrap()
    }

    #[test]
    fn views_follow_slot_order() {
        let m = sample();
        let keys: Vec<_> = m.keys().into_iter().copied().collect();
        let values: Vec<_> = m.values().iter().copied().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(m.keys().iter().len(), 3);
    }

    #[test]
    fn views_reject_mutation() {
        let m = sample();
        let mut keys = m.keys();
        assert!(keys.is_read_only());
        assert_eq!(keys.add("z"), Err(Error::ImmutableView { view: "key" }));
        assert_eq!(keys.remove(&"a"), Err(Error::ImmutableView { view: "key" }));
        assert_eq!(keys.clear(), Err(Error::ImmutableView { view: "key" }));

        let mut values = m.values();
        assert_eq!(values.add(9), Err(Error::ImmutableView { view: "value" }));
        assert_eq!(values.clear(), Err(Error::ImmutableView { view: "value" }));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn membership_delegates_to_map() {
        let m = sample();
        assert_eq!(m.keys().contains(&"b"), Ok(true));
        assert_eq!(m.keys().contains(&"z"), Ok(false));
        assert_eq!(m.values().contains(&3), Ok(true));
        assert_eq!(m.values().contains(&4), Ok(false));
    }

    #[test]
    fn views_copy_out() {
        let m = sample();
        let mut keys = [""; 4];
        m.keys().copy_to(&mut keys, 1).unwrap();
        assert_eq!(keys, ["", "a", "b", "c"]);
        let mut values = [0; 2];
        assert_eq!(m.values().copy_to(&mut values, 0), Err(Error::InsufficientSpace));
    }
}
