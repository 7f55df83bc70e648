//! The capability set shared by every container in the crate.

use snafu::ensure;

use crate::error::{IndexOutOfRange, InsufficientSpace, Result};

/// A sized, enumerable, mutable collection of `T`.
///
/// Read-only views implement the mutating methods by returning
/// [`Error::ImmutableView`](crate::Error::ImmutableView).
pub trait Collection<T> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_read_only(&self) -> bool;

    fn add(&mut self, item: T) -> Result<()>;

    fn contains(&self, item: &T) -> Result<bool>;

    /// Removes one matching item; `Ok(false)` if nothing matched.
    fn remove(&mut self, item: &T) -> Result<bool>;

    fn clear(&mut self) -> Result<()>;

    /// Clones every item into `buffer[offset..]` in iteration order.
    fn copy_to(&self, buffer: &mut [T], offset: usize) -> Result<()>
    where
        T: Clone;
}

/// Checks that `count` items fit into a buffer of `len` slots starting at
/// `offset`.
pub(crate) fn check_copy_target(len: usize, offset: usize, count: usize) -> Result<()> {
    ensure!(offset <= len, IndexOutOfRange { index: offset });
    ensure!(len - offset >= count, InsufficientSpace);
    Ok(())
}

/// Writes `count` items into `buffer[offset..]` after validating the target.
pub(crate) fn copy_into<T, I>(buffer: &mut [T], offset: usize, count: usize, items: I) -> Result<()>
where
    I: Iterator<Item = T>,
{
    check_copy_target(buffer.len(), offset, count)?;
    for (slot, item) in buffer[offset..].iter_mut().zip(items) {
        *slot = item;
    }
    Ok(())
}
