//! hashed-collections: a separately chained hash map and a node-addressable
//! circular linked list, both driven by pluggable equality comparers and
//! both failing fast when modified under an active traversal.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: two single-threaded containers whose structure stays inspectable
//!   and whose invariants can be checked from their own public surface.
//! - Engines:
//!   - ChainedHashMap<K, V, C>: bucket array of chain heads over a parallel
//!     entry array. Removed entries stay in place as free slots linked into
//!     an in-array free list; insertion drains the free list before growing.
//!     Both arrays are sized by primes and grow to the next prime at least
//!     twice the current size.
//!   - HashedLinkedList<T, C>: circular doubly-linked list over a `SlotMap`
//!     arena. Callers address attached nodes through `NodeRef` handles and
//!     receive detached `Node<T>` values back on removal.
//! - Support: `NullableKey<T>` (a key that may be absent, with a stable hash
//!   for the absent case), comparer adapters, read-only key/value views, and
//!   the `Collection` trait every container and view implements.
//!
//! Constraints
//! - Single-threaded: neither engine locks; `sync_root` only hands out an
//!   identity callers may coordinate on.
//! - Unique keys in the map: strict `insert` fails on duplicates and leaves
//!   the map untouched; `set` overwrites.
//! - Keys a comparer reports as absent are rejected by every keyed map
//!   operation.
//! - Traversal is fail-fast. Borrowing iterators are protected by the borrow
//!   checker; detached cursors (`MapCursor`, `ListCursor`) compare the
//!   collection's `Version` on every step, including the final one.
//!
//! Hashing
//! - The map stores a 31-bit fold of each key's comparer hash and compares
//!   stored hashes before calling `equals`. Growth reuses stored hashes; only
//!   a forced rehash after the first collision-threshold trip calls back into the
//!   comparer, and only if `reseed` switched the hash function.
//!
//! Reentrancy
//! - Methods that call into user comparers open a debug-only reentrancy
//!   guard, so a comparer that reaches back into the same collection panics
//!   in debug builds instead of observing a half-walked chain.
//!
//! Errors
//! - Every fallible operation returns `Result<_, Error>`. `Error::kind`
//!   groups variants into argument, operation, lookup, duplicate and
//!   array-shape failures.

pub mod array;
pub mod collection;
pub mod comparer;
mod error;
pub mod hash_map;
mod hash_map_proptest;
pub mod linked_list;
mod linked_list_proptest;
pub mod nullable_key;
mod primes;
mod reentrancy;
mod version;
pub mod views;

// Public surface
pub use array::{AnyArray, UntypedArray};
pub use collection::Collection;
pub use comparer::{Comparer, DefaultComparer, EqualityComparer, NaturalOrder, OptionKeyComparer};
pub use error::{Error, ErrorKind, Result};
pub use hash_map::{ChainedHashMap, MapConfig, MapCursor};
pub use linked_list::{HashedLinkedList, ListCursor, Node, NodeRef, SyncRoot};
pub use nullable_key::{NullableKey, NullableKeyComparer, NullableKeyEqualityComparer, NULL_KEY_HASH};
pub use version::{CollectionId, Version};
pub use views::{Keys, Values};
