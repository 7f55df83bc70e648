//! Untyped array targets for bulk copies.
//!
//! Callers that do not know a collection's element type statically hand over
//! an [`UntypedArray`]: something with a rank, per-dimension lower bounds and
//! an element type that may or may not accept the collection's items.
//! [`AnyArray`] is the in-crate implementation.

use core::any::{Any, TypeId};

use snafu::ensure;

use crate::collection::check_copy_target;
use crate::error::{Error, InvalidArrayType, MultiRank, NonZeroLowerBound, Result};

pub trait UntypedArray {
    /// Number of dimensions.
    fn rank(&self) -> usize;

    /// Lowest valid index of `dimension`.
    fn lower_bound(&self, dimension: usize) -> isize;

    /// Total number of element slots.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether values of type `element` can be stored in this array.
    fn accepts(&self, element: TypeId) -> bool;

    /// Stores `value` at the zero-based flat `index`, handing it back if its
    /// type does not fit.
    fn set_boxed(&mut self, index: usize, value: Box<dyn Any>) -> Result<(), Box<dyn Any>>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Dimension {
    len: usize,
    lower_bound: isize,
}

/// Heap array of boxed values with an optional fixed element type.
///
/// `AnyArray::typed::<T>` only takes `T`; `AnyArray::untyped` takes anything.
#[derive(Debug)]
pub struct AnyArray {
    element: Option<TypeId>,
    dims: Vec<Dimension>,
    items: Vec<Option<Box<dyn Any>>>,
}

impl AnyArray {
    pub fn typed<T: 'static>(len: usize) -> Self {
        Self::with_element(Some(TypeId::of::<T>()), len)
    }

    pub fn untyped(len: usize) -> Self {
        Self::with_element(None, len)
    }

    fn with_element(element: Option<TypeId>, len: usize) -> Self {
        Self {
            element,
            dims: vec![Dimension { len, lower_bound: 0 }],
            items: std::iter::repeat_with(|| None).take(len).collect(),
        }
    }

    /// Reshape into the given dimension lengths; the total size is their
    /// product and every slot is emptied.
    pub fn with_shape(mut self, lens: &[usize]) -> Self {
        self.dims = lens
            .iter()
            .map(|&len| Dimension { len, lower_bound: 0 })
            .collect();
        let total = lens.iter().product();
        self.items = std::iter::repeat_with(|| None).take(total).collect();
        self
    }

    /// Set the lower bound of the first dimension.
    pub fn with_lower_bound(mut self, lower_bound: isize) -> Self {
        if let Some(d) = self.dims.first_mut() {
            d.lower_bound = lower_bound;
        }
        self
    }

    pub fn get<T: 'static>(&self, index: usize) -> Option<&T> {
        self.items.get(index)?.as_ref()?.downcast_ref()
    }
}

impl UntypedArray for AnyArray {
    fn rank(&self) -> usize {
        self.dims.len()
    }

    fn lower_bound(&self, dimension: usize) -> isize {
        self.dims.get(dimension).map_or(0, |d| d.lower_bound)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn accepts(&self, element: TypeId) -> bool {
        self.element.map_or(true, |e| e == element)
    }

    fn set_boxed(&mut self, index: usize, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        if !self.accepts((*value).type_id()) {
            return Err(value);
        }
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(value),
        }
    }
}

/// Copies `count` items into `array[offset..]`. Shape, bounds, capacity and
/// element type are all checked before the first write.
pub(crate) fn copy_to_untyped<T, I>(
    array: &mut dyn UntypedArray,
    offset: usize,
    count: usize,
    items: I,
) -> Result<()>
where
    T: 'static,
    I: Iterator<Item = T>,
{
    ensure!(array.rank() == 1, MultiRank);
    ensure!(array.lower_bound(0) == 0, NonZeroLowerBound);
    check_copy_target(array.len(), offset, count)?;
    ensure!(array.accepts(TypeId::of::<T>()), InvalidArrayType);

    for (i, item) in items.enumerate() {
        if array.set_boxed(offset + i, Box::new(item)).is_err() {
            return Err(Error::InvalidArrayType);
        }
    }
    Ok(())
}
