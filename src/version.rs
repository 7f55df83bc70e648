//! Mutation epochs and collection identities.
//!
//! Cursors and node handles never borrow the collection they came from, so they
//! carry plain values instead: the [`CollectionId`] of their owner and the
//! [`Version`] observed when they were created. Both are compared by value.

use core::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter bumped on every structural mutation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Version(u64);

impl Version {
    pub(crate) const fn new() -> Self {
        Version(0)
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Process-unique identity of one collection instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CollectionId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl CollectionId {
    pub(crate) fn fresh() -> Self {
        CollectionId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_changes_version() {
        let mut v = Version::new();
        let before = v;
        v.bump();
        assert_ne!(before, v);
    }

    #[test]
    fn ids_are_unique() {
        let a = CollectionId::fresh();
        let b = CollectionId::fresh();
        assert_ne!(a, b);
    }
}
