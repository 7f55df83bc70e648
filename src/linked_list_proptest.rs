#![cfg(test)]

// State-machine property tests for HashedLinkedList against a VecDeque model.
// Alongside the model the test keeps the node handle of every position, so
// handle stability and detachment are checked after every step.

use crate::linked_list::{HashedLinkedList, Node, NodeRef};
use crate::Error;
use proptest::prelude::*;
use std::collections::VecDeque;

// Positions are taken modulo the current length, so they stay meaningful as
// the list shrinks.
#[derive(Clone, Debug)]
enum Op {
    AddFirst(u8),
    AddLast(u8),
    AddBefore(usize, u8),
    AddAfter(usize, u8),
    RemoveAt(usize),
    RemoveFirst,
    RemoveLast,
    RemoveValue(u8),
    Find(u8),
    Walk,
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // Small value range so duplicates are common.
    let v = 0u8..6;
    let op = prop_oneof![
        3 => v.clone().prop_map(Op::AddFirst),
        3 => v.clone().prop_map(Op::AddLast),
        2 => (any::<usize>(), v.clone()).prop_map(|(p, x)| Op::AddBefore(p, x)),
        2 => (any::<usize>(), v.clone()).prop_map(|(p, x)| Op::AddAfter(p, x)),
        2 => any::<usize>().prop_map(Op::RemoveAt),
        1 => Just(Op::RemoveFirst),
        1 => Just(Op::RemoveLast),
        2 => v.clone().prop_map(Op::RemoveValue),
        2 => v.prop_map(Op::Find),
        1 => Just(Op::Walk),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..100)
}

// Invariants exercised across random operation sequences:
// - values and handles follow the model order head to tail, and back again;
// - `first`/`last` and `next`/`prev` agree with handle positions;
// - `find`/`find_last` return the first/last matching position;
// - removed handles never resolve and are rejected as detached;
// - every structural change moves the version.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let mut sut: HashedLinkedList<u8> = HashedLinkedList::new();
        let mut model: VecDeque<u8> = VecDeque::new();
        let mut handles: VecDeque<NodeRef> = VecDeque::new();
        let mut stale: Vec<NodeRef> = Vec::new();

        for op in ops {
            let before = sut.version();
            let mut mutated = true;
            match op {
                Op::AddFirst(x) => {
                    handles.push_front(sut.add_first(x));
                    model.push_front(x);
                }
                Op::AddLast(x) => {
                    handles.push_back(sut.add_last_node(Node::new(x)));
                    model.push_back(x);
                }
                Op::AddBefore(p, x) => {
                    if model.is_empty() {
                        mutated = false;
                    } else {
                        let p = p % model.len();
                        let h = sut.add_before(handles[p], x).unwrap();
                        handles.insert(p, h);
                        model.insert(p, x);
                    }
                }
                Op::AddAfter(p, x) => {
                    if model.is_empty() {
                        mutated = false;
                    } else {
                        let p = p % model.len();
                        let h = sut.add_after(handles[p], x).unwrap();
                        handles.insert(p + 1, h);
                        model.insert(p + 1, x);
                    }
                }
                Op::RemoveAt(p) => {
                    if model.is_empty() {
                        mutated = false;
                    } else {
                        let p = p % model.len();
                        let h = handles.remove(p).unwrap();
                        let node = sut.remove_node(h).unwrap();
                        prop_assert_eq!(Some(node.into_value()), model.remove(p));
                        stale.push(h);
                    }
                }
                Op::RemoveFirst => match model.pop_front() {
                    Some(x) => {
                        prop_assert_eq!(sut.remove_first().map(Node::into_value), Ok(x));
                        stale.extend(handles.pop_front());
                    }
                    None => {
                        prop_assert_eq!(sut.remove_first(), Err(Error::EmptyList));
                        mutated = false;
                    }
                },
                Op::RemoveLast => match model.pop_back() {
                    Some(x) => {
                        prop_assert_eq!(sut.remove_last().map(Node::into_value), Ok(x));
                        stale.extend(handles.pop_back());
                    }
                    None => {
                        prop_assert_eq!(sut.remove_last(), Err(Error::EmptyList));
                        mutated = false;
                    }
                },
                Op::RemoveValue(x) => {
                    let pos = model.iter().position(|&m| m == x);
                    prop_assert_eq!(sut.remove(&x), pos.is_some());
                    match pos {
                        Some(p) => {
                            model.remove(p);
                            stale.extend(handles.remove(p));
                        }
                        None => mutated = false,
                    }
                }
                Op::Find(x) => {
                    mutated = false;
                    let first = model.iter().position(|&m| m == x).map(|p| handles[p]);
                    let last = model.iter().rposition(|&m| m == x).map(|p| handles[p]);
                    prop_assert_eq!(sut.find(&x), first);
                    prop_assert_eq!(sut.find_last(&x), last);
                    prop_assert_eq!(sut.contains(&x), first.is_some());
                }
                Op::Walk => {
                    mutated = false;
                    let mut cursor = sut.cursor();
                    let mut seen = Vec::new();
                    while let Some(x) = cursor.next(&sut).unwrap() {
                        seen.push(*x);
                    }
                    prop_assert_eq!(seen, model.iter().copied().collect::<Vec<_>>());
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    stale.extend(handles.drain(..));
                }
            }

            if mutated {
                prop_assert_ne!(sut.version(), before);
            } else {
                prop_assert_eq!(sut.version(), before);
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            let forward: Vec<u8> = sut.iter().copied().collect();
            let backward: Vec<u8> = sut.iter().rev().copied().collect();
            prop_assert_eq!(&forward, &model.iter().copied().collect::<Vec<_>>());
            prop_assert_eq!(backward, model.iter().rev().copied().collect::<Vec<_>>());

            prop_assert_eq!(sut.first(), handles.front().copied());
            prop_assert_eq!(sut.last(), handles.back().copied());
            for (i, h) in handles.iter().enumerate() {
                prop_assert_eq!(h.value(&sut), Some(&model[i]));
                prop_assert_eq!(h.next(&sut), handles.get(i + 1).copied());
                let prev = if i == 0 { None } else { Some(handles[i - 1]) };
                prop_assert_eq!(h.prev(&sut), prev);
            }
            for &h in &stale {
                prop_assert!(!h.is_attached(&sut));
                prop_assert!(h.value(&sut).is_none());
            }
        }
    }
}
