//! Error type shared by both engines.

use snafu::Snafu;

/// Broad category of an [`Error`], for callers that only need to know what kind
/// of mistake was made.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// A required argument was absent or an index/offset was out of range.
    InvalidArgument,
    /// The operation is not valid for the current state of the collection.
    InvalidOperation,
    /// A keyed lookup found no entry.
    NotFound,
    /// A strict insertion found the key already present.
    Duplicate,
    /// A destination buffer is too small or has the wrong shape or element type.
    CapacityShape,
}

/// Every failure reported by the collections in this crate.
///
/// Failures are always detected before the collection is mutated, so an `Err`
/// leaves the collection exactly as it was.
#[derive(Debug, Clone, Eq, PartialEq, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Value cannot be absent. Parameter name: {}", name))]
    MissingArgument { name: &'static str },

    #[snafu(display("Index {} is out of range.", index))]
    IndexOutOfRange { index: usize },

    #[snafu(display("The HashedLinkedList node does not belong to current HashedLinkedList."))]
    ForeignNode,

    #[snafu(display("The HashedLinkedList node is no longer attached to any HashedLinkedList."))]
    DetachedNode,

    #[snafu(display("The HashedLinkedList is empty."))]
    EmptyList,

    #[snafu(display("Collection was modified after the enumerator was instantiated."))]
    CollectionModified,

    #[snafu(display(
        "Mutating a {} collection derived from a dictionary is not allowed.",
        view
    ))]
    ImmutableView { view: &'static str },

    #[snafu(display("The given key was not present in the dictionary."))]
    KeyNotFound,

    #[snafu(display("An entry with the same key already exists."))]
    DuplicateKey,

    #[snafu(display(
        "Destination array is not long enough to copy all the items in the collection. Check array index and length."
    ))]
    InsufficientSpace,

    #[snafu(display("Multi dimension array is not supported on this operation."))]
    MultiRank,

    #[snafu(display("The lower bound of target array must be zero."))]
    NonZeroLowerBound,

    #[snafu(display(
        "Target array type is not compatible with the type of items in the collection."
    ))]
    InvalidArrayType,
}

impl Error {
    /// The category this failure belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingArgument { .. } | Error::IndexOutOfRange { .. } => {
                ErrorKind::InvalidArgument
            }
            Error::ForeignNode
            | Error::DetachedNode
            | Error::EmptyList
            | Error::CollectionModified
            | Error::ImmutableView { .. } => ErrorKind::InvalidOperation,
            Error::KeyNotFound => ErrorKind::NotFound,
            Error::DuplicateKey => ErrorKind::Duplicate,
            Error::InsufficientSpace
            | Error::MultiRank
            | Error::NonZeroLowerBound
            | Error::InvalidArrayType => ErrorKind::CapacityShape,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            Error::MissingArgument { name: "key" }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(Error::ForeignNode.kind(), ErrorKind::InvalidOperation);
        assert_eq!(Error::CollectionModified.kind(), ErrorKind::InvalidOperation);
        assert_eq!(Error::KeyNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(Error::DuplicateKey.kind(), ErrorKind::Duplicate);
        assert_eq!(Error::NonZeroLowerBound.kind(), ErrorKind::CapacityShape);
    }

    #[test]
    fn messages_carry_context() {
        let e = Error::IndexOutOfRange { index: 7 };
        assert_eq!(e.to_string(), "Index 7 is out of range.");
        let e = Error::ImmutableView { view: "key" };
        assert!(e.to_string().contains("key collection"));
    }
}
