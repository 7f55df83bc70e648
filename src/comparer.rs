//! Pluggable equality and ordering.
//!
//! Both engines take their notion of key equality from an [`EqualityComparer`]
//! value instead of relying on `K: Eq + Hash` alone. That lets callers plug in
//! case-insensitive matching, constant-hash test comparers, or comparers that
//! treat some values as absent.

use core::cmp::Ordering;
use core::hash::{BuildHasher, Hash};
use hashbrown::DefaultHashBuilder;

use crate::nullable_key::NULL_KEY_HASH;

/// Equality plus a hash that agrees with it: `equals(a, b)` implies
/// `hash(a) == hash(b)`.
pub trait EqualityComparer<T: ?Sized> {
    fn equals(&self, a: &T, b: &T) -> bool;

    fn hash(&self, value: &T) -> u64;

    /// Whether `value` stands for "no value". Keyed operations of
    /// [`ChainedHashMap`](crate::ChainedHashMap) reject such keys.
    fn is_absent(&self, _value: &T) -> bool {
        false
    }

    /// Switch to a different hash function, returning `true` if the comparer
    /// may have done so. Called by the map, at most once, when a single chain
    /// grows past its collision threshold; every stored hash is recomputed
    /// afterwards.
    fn reseed(&mut self) -> bool {
        false
    }
}

/// Total order over `T`.
pub trait Comparer<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Uses `T: Eq` and hashes `T: Hash` with a [`BuildHasher`].
#[derive(Clone, Debug, Default)]
pub struct DefaultComparer<S = DefaultHashBuilder> {
    hasher: S,
}

impl<S> DefaultComparer<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<T, S> EqualityComparer<T> for DefaultComparer<S>
where
    T: ?Sized + Eq + Hash,
    S: BuildHasher + Default,
{
    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }

    #[inline]
    fn hash(&self, value: &T) -> u64 {
        self.hasher.hash_one(value)
    }

    /// Replaces the hasher with a fresh `S::default()`. Only randomly seeded
    /// builders actually change; deterministic ones hash as before.
    fn reseed(&mut self) -> bool {
        self.hasher = S::default();
        true
    }
}

/// Orders by `T: Ord`.
#[derive(Copy, Clone, Debug, Default)]
pub struct NaturalOrder;

impl<T: ?Sized + Ord> Comparer<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Compares `Option<T>` keys by their contents and reports `None` as absent,
/// so a map using it refuses `None` keys outright. Wrap such keys in
/// [`NullableKey`](crate::NullableKey) to store them.
#[derive(Clone, Debug, Default)]
pub struct OptionKeyComparer<C = DefaultComparer> {
    inner: C,
}

impl<C> OptionKeyComparer<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<T, C> EqualityComparer<Option<T>> for OptionKeyComparer<C>
where
    C: EqualityComparer<T>,
{
    fn equals(&self, a: &Option<T>, b: &Option<T>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.inner.equals(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn hash(&self, value: &Option<T>) -> u64 {
        value
            .as_ref()
            .map_or(NULL_KEY_HASH, |v| self.inner.hash(v))
    }

    fn is_absent(&self, value: &Option<T>) -> bool {
        value.is_none()
    }

    fn reseed(&mut self) -> bool {
        self.inner.reseed()
    }
}
