//! NullableKey: lets a possibly-absent value act as a key or list element.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

use crate::comparer::{Comparer, DefaultComparer, EqualityComparer, NaturalOrder};

/// Hash of an absent [`NullableKey`]. A present value hashing to the same
/// number is an ordinary collision, resolved by equality.
pub const NULL_KEY_HASH: u64 = 0x6e75_6c6c_6b65_7921;

/// Immutable wrapper over an `Option<T>` with value semantics.
///
/// Two wrappers are equal when both are absent or both hold equal values.
/// Hashing a present wrapper is the same as hashing the value itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NullableKey<T> {
    value: Option<T>,
}

impl<T> NullableKey<T> {
    pub const fn new(value: Option<T>) -> Self {
        Self { value }
    }

    pub const fn some(value: T) -> Self {
        Self { value: Some(value) }
    }

    pub const fn none() -> Self {
        Self { value: None }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for NullableKey<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> From<Option<T>> for NullableKey<T> {
    fn from(value: Option<T>) -> Self {
        Self::new(value)
    }
}

impl<T> From<T> for NullableKey<T> {
    fn from(value: T) -> Self {
        Self::some(value)
    }
}

impl<T: Hash> Hash for NullableKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.value {
            Some(v) => v.hash(state),
            None => state.write_u64(NULL_KEY_HASH),
        }
    }
}

// Absent sorts before every present value.
impl<T: Ord> PartialOrd for NullableKey<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for NullableKey<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        NullableKeyComparer::new(NaturalOrder).compare(self, other)
    }
}

/// Orders wrapped keys with a comparer over the unwrapped values.
///
/// With the default `C = NaturalOrder` this is the wrapper's own ordering.
#[derive(Clone, Debug, Default)]
pub struct NullableKeyComparer<C = NaturalOrder> {
    value_comparer: C,
}

impl<C> NullableKeyComparer<C> {
    pub fn new(value_comparer: C) -> Self {
        Self { value_comparer }
    }
}

impl<T, C: Comparer<T>> Comparer<NullableKey<T>> for NullableKeyComparer<C> {
    fn compare(&self, x: &NullableKey<T>, y: &NullableKey<T>) -> Ordering {
        match (&x.value, &y.value) {
            (Some(a), Some(b)) => self.value_comparer.compare(a, b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        }
    }
}

/// Equality over wrapped keys using a comparer over the unwrapped values.
///
/// Absent keys equal each other and hash to [`NULL_KEY_HASH`]; present keys are
/// handed to `C`. The default `C = DefaultComparer` reproduces the wrapper's
/// own `Eq`/`Hash`. Keys are never reported absent: the wrapper is how an
/// absent value becomes a legal key.
#[derive(Clone, Debug, Default)]
pub struct NullableKeyEqualityComparer<C = DefaultComparer> {
    value_comparer: C,
}

impl<C> NullableKeyEqualityComparer<C> {
    pub fn new(value_comparer: C) -> Self {
        Self { value_comparer }
    }

    pub fn value_comparer(&self) -> &C {
        &self.value_comparer
    }
}

impl<T, C: EqualityComparer<T>> EqualityComparer<NullableKey<T>>
    for NullableKeyEqualityComparer<C>
{
    fn equals(&self, x: &NullableKey<T>, y: &NullableKey<T>) -> bool {
        match (&x.value, &y.value) {
            (Some(a), Some(b)) => self.value_comparer.equals(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn hash(&self, key: &NullableKey<T>) -> u64 {
        key.value
            .as_ref()
            .map_or(NULL_KEY_HASH, |v| self.value_comparer.hash(v))
    }

    fn reseed(&mut self) -> bool {
        self.value_comparer.reseed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn std_hash<T: Hash>(t: &T) -> u64 {
        let mut h = DefaultHasher::new();
        t.hash(&mut h);
        h.finish()
    }

    #[test]
    fn absent_keys_are_equal_and_share_hash() {
        let a: NullableKey<String> = NullableKey::none();
        let b = NullableKey::<String>::from(None::<String>);
        assert_eq!(a, b);
        assert_eq!(std_hash(&a), std_hash(&b));
    }

    #[test]
    fn present_keys_compare_by_value() {
        let x = NullableKey::some("x".to_string());
        let y: NullableKey<String> = "x".to_string().into();
        assert_eq!(x, y);
        assert_eq!(y, x);
        assert_eq!(std_hash(&x), std_hash(&"x".to_string()));
        assert_ne!(x, NullableKey::none());
    }

    #[test]
    fn explicit_wrap_unwrap() {
        let k = NullableKey::new(Some(5));
        assert_eq!(k.value(), Some(&5));
        assert_eq!(k.into_inner(), Some(5));
        assert!(NullableKey::<i32>::none().is_none());
    }

    #[test]
    fn absent_orders_first() {
        let mut keys = vec![
            NullableKey::some(3),
            NullableKey::none(),
            NullableKey::some(1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![NullableKey::none(), NullableKey::some(1), NullableKey::some(3)]
        );
    }

    #[test]
    fn comparer_delegates_to_value_comparer() {
        struct Reverse;
        impl Comparer<i32> for Reverse {
            fn compare(&self, a: &i32, b: &i32) -> Ordering {
                b.cmp(a)
            }
        }
        let c = NullableKeyComparer::new(Reverse);
        assert_eq!(
            c.compare(&NullableKey::some(1), &NullableKey::some(2)),
            Ordering::Greater
        );
        assert_eq!(
            c.compare(&NullableKey::none(), &NullableKey::some(2)),
            Ordering::Less
        );
    }

    #[test]
    fn equality_comparer_delegates_to_value_comparer() {
        struct CaseInsensitive;
        impl EqualityComparer<String> for CaseInsensitive {
            fn equals(&self, a: &String, b: &String) -> bool {
                a.eq_ignore_ascii_case(b)
            }
            fn hash(&self, v: &String) -> u64 {
                v.len() as u64
            }
        }
        let c = NullableKeyEqualityComparer::new(CaseInsensitive);
        let a = NullableKey::some("Key".to_string());
        let b = NullableKey::some("kEY".to_string());
        assert!(c.equals(&a, &b));
        assert_eq!(c.hash(&a), c.hash(&b));
        let absent = NullableKey::<String>::none();
        assert!(c.equals(&absent, &absent.clone()));
        assert_eq!(c.hash(&absent), NULL_KEY_HASH);
        assert!(!c.is_absent(&absent));
    }
}
