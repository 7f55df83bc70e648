//! HashedLinkedList: circular doubly-linked list with caller-visible nodes.
//!
//! Nodes live in a per-list `SlotMap` arena and link to each other by
//! generational key, so the circular chain needs no shared ownership. Callers
//! hold [`NodeRef`] handles: the owning list's [`CollectionId`] plus the arena
//! key. A handle is checked against the list on every call:
//! - a handle minted by another list fails with `ForeignNode`;
//! - a handle whose node was removed fails with `DetachedNode` (removal bumps
//!   the slot generation, so a reused slot never aliases an old handle).
//!
//! Removing a node hands its value back as a detached [`Node`], which can be
//! attached to this or any other list again. Attaching consumes the `Node`, so
//! a node can never sit in two lists at once.
//!
//! Lookups by value (`find`, `find_last`, `remove`) are linear scans with the
//! list's comparer; duplicates are allowed.

use core::fmt;
use std::cell::OnceCell;
use std::rc::Rc;

use slotmap::{DefaultKey, SlotMap};
use snafu::{ensure, OptionExt};

use crate::array::{copy_to_untyped, UntypedArray};
use crate::collection::{copy_into, Collection};
use crate::comparer::{DefaultComparer, EqualityComparer};
use crate::error::{CollectionModified, DetachedNode, EmptyList, ForeignNode, Result};
use crate::reentrancy::DebugReentrancy;
use crate::version::{CollectionId, Version};

#[derive(Debug)]
struct Link<T> {
    value: T,
    next: DefaultKey,
    prev: DefaultKey,
}

/// A value outside of any list, ready to be attached.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node<T> {
    value: T,
}

impl<T> Node<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Handle to a node attached to a [`HashedLinkedList`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeRef {
    list: CollectionId,
    key: DefaultKey,
}

impl NodeRef {
    /// Identity of the list that created this handle.
    pub fn list_id(&self) -> CollectionId {
        self.list
    }

    fn link<'a, T, C>(&self, list: &'a HashedLinkedList<T, C>) -> Option<&'a Link<T>> {
        if self.list != list.id {
            return None;
        }
        list.arena.get(self.key)
    }

    /// Whether the node is still attached to `list`.
    pub fn is_attached<T, C>(&self, list: &HashedLinkedList<T, C>) -> bool {
        self.link(list).is_some()
    }

    pub fn value<'a, T, C>(&self, list: &'a HashedLinkedList<T, C>) -> Option<&'a T> {
        self.link(list).map(|l| &l.value)
    }

    /// The following node, or `None` at the tail.
    pub fn next<T, C>(&self, list: &HashedLinkedList<T, C>) -> Option<NodeRef> {
        let link = self.link(list)?;
        if Some(link.next) == list.head {
            return None;
        }
        Some(list.node_ref(link.next))
    }

    /// The preceding node, or `None` at the head.
    pub fn prev<T, C>(&self, list: &HashedLinkedList<T, C>) -> Option<NodeRef> {
        let link = self.link(list)?;
        if Some(self.key) == list.head {
            return None;
        }
        Some(list.node_ref(link.prev))
    }
}

/// Opaque coordination handle; see [`HashedLinkedList::sync_root`].
#[derive(Debug)]
pub struct SyncRoot {
    _private: (),
}

pub struct HashedLinkedList<T, C = DefaultComparer> {
    comparer: C,
    arena: SlotMap<DefaultKey, Link<T>>,
    head: Option<DefaultKey>,
    version: Version,
    id: CollectionId,
    sync_root: OnceCell<Rc<SyncRoot>>,
    reentrancy: DebugReentrancy,
}

impl<T> HashedLinkedList<T> {
    pub fn new() -> Self {
        Self::with_comparer(DefaultComparer::default())
    }
}

impl<T> Default for HashedLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> HashedLinkedList<T, C> {
    pub fn with_comparer(comparer: C) -> Self {
        Self {
            comparer,
            arena: SlotMap::with_key(),
            head: None,
            version: Version::new(),
            id: CollectionId::fresh(),
            sync_root: OnceCell::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Builds a list holding `iter`'s items in order.
    pub fn from_iter_with<I>(iter: I, comparer: C) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = Self::with_comparer(comparer);
        list.extend(iter);
        list
    }

    pub fn comparer(&self) -> &C {
        &self.comparer
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Current mutation epoch.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Handle used by callers that coordinate access to the whole list
    /// themselves. Created on first use; the list never locks on it.
    pub fn sync_root(&self) -> Rc<SyncRoot> {
        Rc::clone(
            self.sync_root
                .get_or_init(|| Rc::new(SyncRoot { _private: () })),
        )
    }

    /// Always `false`: no operation synchronizes internally.
    pub fn is_synchronized(&self) -> bool {
        false
    }

    pub fn first(&self) -> Option<NodeRef> {
        self.head.map(|k| self.node_ref(k))
    }

    pub fn last(&self) -> Option<NodeRef> {
        self.head.map(|k| self.node_ref(self.arena[k].prev))
    }

    fn node_ref(&self, key: DefaultKey) -> NodeRef {
        NodeRef { list: self.id, key }
    }

    /// Resolves `node` to an arena key, checking it belongs to this list and
    /// is still attached.
    fn validate(&self, node: NodeRef) -> Result<DefaultKey> {
        ensure!(node.list == self.id, ForeignNode);
        ensure!(self.arena.contains_key(node.key), DetachedNode);
        Ok(node.key)
    }

    fn insert_into_empty(&mut self, value: T) -> DefaultKey {
        debug_assert!(self.head.is_none() && self.arena.is_empty());
        let key = self.arena.insert_with_key(|k| Link {
            value,
            next: k,
            prev: k,
        });
        self.head = Some(key);
        self.version.bump();
        key
    }

    fn insert_before(&mut self, anchor: DefaultKey, value: T) -> DefaultKey {
        let prev = self.arena[anchor].prev;
        let key = self.arena.insert(Link {
            value,
            next: anchor,
            prev,
        });
        self.arena[prev].next = key;
        self.arena[anchor].prev = key;
        self.version.bump();
        key
    }

    fn push_front(&mut self, value: T) -> NodeRef {
        let key = match self.head {
            None => self.insert_into_empty(value),
            Some(head) => {
                let key = self.insert_before(head, value);
                self.head = Some(key);
                key
            }
        };
        self.node_ref(key)
    }

    fn push_back(&mut self, value: T) -> NodeRef {
        let key = match self.head {
            None => self.insert_into_empty(value),
            Some(head) => self.insert_before(head, value),
        };
        self.node_ref(key)
    }

    fn push_before(&mut self, anchor: NodeRef, value: T) -> Result<NodeRef> {
        let anchor = self.validate(anchor)?;
        let key = self.insert_before(anchor, value);
        if self.head == Some(anchor) {
            self.head = Some(key);
        }
        Ok(self.node_ref(key))
    }

    fn push_after(&mut self, anchor: NodeRef, value: T) -> Result<NodeRef> {
        let anchor = self.validate(anchor)?;
        let next = self.arena[anchor].next;
        let key = self.insert_before(next, value);
        Ok(self.node_ref(key))
    }

    pub fn add_first(&mut self, value: T) -> NodeRef {
        self.push_front(value)
    }

    pub fn add_last(&mut self, value: T) -> NodeRef {
        self.push_back(value)
    }

    /// Inserts `value` right before `anchor`; inserting before the head makes
    /// the new node the head.
    pub fn add_before(&mut self, anchor: NodeRef, value: T) -> Result<NodeRef> {
        self.push_before(anchor, value)
    }

    pub fn add_after(&mut self, anchor: NodeRef, value: T) -> Result<NodeRef> {
        self.push_after(anchor, value)
    }

    pub fn add_first_node(&mut self, node: Node<T>) -> NodeRef {
        self.push_front(node.value)
    }

    pub fn add_last_node(&mut self, node: Node<T>) -> NodeRef {
        self.push_back(node.value)
    }

    pub fn add_before_node(&mut self, anchor: NodeRef, node: Node<T>) -> Result<NodeRef> {
        self.push_before(anchor, node.value)
    }

    pub fn add_after_node(&mut self, anchor: NodeRef, node: Node<T>) -> Result<NodeRef> {
        self.push_after(anchor, node.value)
    }

    /// Unlinks `key` and returns its value. The arena slot is released, so
    /// every handle to it stops resolving.
    fn unlink(&mut self, key: DefaultKey) -> Option<Node<T>> {
        let (next, prev) = {
            let link = self.arena.get(key)?;
            (link.next, link.prev)
        };
        if next == key {
            debug_assert!(self.arena.len() == 1 && self.head == Some(key));
            self.head = None;
        } else {
            self.arena[next].prev = prev;
            self.arena[prev].next = next;
            if self.head == Some(key) {
                self.head = Some(next);
            }
        }
        let link = self.arena.remove(key)?;
        self.version.bump();
        Some(Node::new(link.value))
    }

    /// Detaches `node` from this list and returns its value.
    pub fn remove_node(&mut self, node: NodeRef) -> Result<Node<T>> {
        let key = self.validate(node)?;
        self.unlink(key).context(DetachedNode)
    }

    pub fn remove_first(&mut self) -> Result<Node<T>> {
        let head = self.head.context(EmptyList)?;
        self.unlink(head).context(EmptyList)
    }

    pub fn remove_last(&mut self) -> Result<Node<T>> {
        let head = self.head.context(EmptyList)?;
        let tail = self.arena[head].prev;
        self.unlink(tail).context(EmptyList)
    }

    /// Detaches every node at once.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.version.bump();
    }

    /// Borrowing iterator from head to tail.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter {
            list: self,
            front: self.head,
            back: self.head.map(|h| self.arena[h].prev),
            remaining: self.arena.len(),
        }
    }

    /// Fail-fast traversal that does not borrow the list. Any structural
    /// mutation between two [`ListCursor::next`] calls makes the later call
    /// fail.
    pub fn cursor(&self) -> ListCursor {
        ListCursor {
            owner: self.id,
            version: self.version,
            next: self.head,
            remaining: self.arena.len(),
        }
    }

    /// Clones every value into `buffer[offset..]`, head to tail.
    pub fn copy_to(&self, buffer: &mut [T], offset: usize) -> Result<()>
    where
        T: Clone,
    {
        copy_into(buffer, offset, self.len(), self.iter().cloned())
    }

    /// Clones every value into an untyped array. Rank, lower bound, room and
    /// element type are checked before anything is written.
    pub fn copy_to_array(&self, array: &mut dyn UntypedArray, offset: usize) -> Result<()>
    where
        T: Clone + 'static,
    {
        copy_to_untyped(array, offset, self.len(), self.iter().cloned())
    }
}

impl<T, C> HashedLinkedList<T, C>
where
    C: EqualityComparer<T>,
{
    /// First node, from the head, whose value matches.
    pub fn find(&self, value: &T) -> Option<NodeRef> {
        let _g = self.reentrancy.enter("find");
        let head = self.head?;
        let mut key = head;
        loop {
            let link = &self.arena[key];
            if self.comparer.equals(&link.value, value) {
                return Some(self.node_ref(key));
            }
            key = link.next;
            if key == head {
                return None;
            }
        }
    }

    /// Last node, from the tail, whose value matches.
    pub fn find_last(&self, value: &T) -> Option<NodeRef> {
        let _g = self.reentrancy.enter("find_last");
        let tail = self.arena[self.head?].prev;
        let mut key = tail;
        loop {
            let link = &self.arena[key];
            if self.comparer.equals(&link.value, value) {
                return Some(self.node_ref(key));
            }
            key = link.prev;
            if key == tail {
                return None;
            }
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Removes the first node matching `value`; `false` if none did.
    pub fn remove(&mut self, value: &T) -> bool {
        match self.find(value) {
            Some(node) => self.unlink(node.key).is_some(),
            None => false,
        }
    }
}

impl<T> FromIterator<T> for HashedLinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_with(iter, DefaultComparer::default())
    }
}

impl<T, C> Extend<T> for HashedLinkedList<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push_back(v);
        }
    }
}

impl<T, C> Collection<T> for HashedLinkedList<T, C>
where
    C: EqualityComparer<T>,
{
    fn len(&self) -> usize {
        HashedLinkedList::len(self)
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn add(&mut self, item: T) -> Result<()> {
        self.push_back(item);
        Ok(())
    }

    fn contains(&self, item: &T) -> Result<bool> {
        Ok(HashedLinkedList::contains(self, item))
    }

    fn remove(&mut self, item: &T) -> Result<bool> {
        Ok(HashedLinkedList::remove(self, item))
    }

    fn clear(&mut self) -> Result<()> {
        HashedLinkedList::clear(self);
        Ok(())
    }

    fn copy_to(&self, buffer: &mut [T], offset: usize) -> Result<()>
    where
        T: Clone,
    {
        HashedLinkedList::copy_to(self, buffer, offset)
    }
}

/// Detached, fail-fast position in a [`HashedLinkedList`].
///
/// Records the list's identity and version at creation. Every call to
/// [`next`](Self::next), including the one reporting the end, fails with
/// [`Error::CollectionModified`](crate::Error::CollectionModified) once either
/// no longer matches.
#[derive(Copy, Clone, Debug)]
pub struct ListCursor {
    owner: CollectionId,
    version: Version,
    next: Option<DefaultKey>,
    remaining: usize,
}

impl ListCursor {
    pub fn next<'a, T, C>(&mut self, list: &'a HashedLinkedList<T, C>) -> Result<Option<&'a T>> {
        ensure!(
            list.id == self.owner && list.version == self.version,
            CollectionModified
        );
        if self.remaining == 0 {
            return Ok(None);
        }
        let key = self.next.context(CollectionModified)?;
        let link = list.arena.get(key).context(CollectionModified)?;
        self.next = Some(link.next);
        self.remaining -= 1;
        Ok(Some(&link.value))
    }
}

/// Iterator over a list's values, head to tail.
pub struct Iter<'a, T, C> {
    list: &'a HashedLinkedList<T, C>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, T, C> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let link = &self.list.arena[self.front?];
        self.front = Some(link.next);
        self.remaining -= 1;
        Some(&link.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, C> DoubleEndedIterator for Iter<'a, T, C> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let link = &self.list.arena[self.back?];
        self.back = Some(link.prev);
        self.remaining -= 1;
        Some(&link.value)
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> {}

impl<'a, T, C> IntoIterator for &'a HashedLinkedList<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug, C> fmt::Debug for HashedLinkedList<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
