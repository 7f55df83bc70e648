#![cfg(test)]

// State-machine property tests for ChainedHashMap, kept inside the crate so
// they can inspect the entry array directly.

use crate::comparer::{DefaultComparer, EqualityComparer};
use crate::hash_map::{ChainedHashMap, MapConfig};
use crate::Error;
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::BTreeSet;

// Pool-indexed operations: indices shrink to earlier keys, the pool shrinks,
// and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Set(usize, i32),
    Remove(usize),
    Get(usize),
    Mutate(usize, i32),
    Iterate,
    Walk,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Walk),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Every key hashes to the same value, so every entry shares one chain.
#[derive(Clone, Default)]
struct OneBucket;

impl EqualityComparer<String> for OneBucket {
    fn equals(&self, a: &String, b: &String) -> bool {
        a == b
    }
    fn hash(&self, _: &String) -> u64 {
        7
    }
}

// Invariants exercised against a hashbrown::HashMap model:
// - strict insert fails exactly when the key exists, leaving the version alone;
// - `set` returns the replaced value; `remove` returns the owned value;
// - live slots equal `len`, and every bucket chain holds only live entries;
// - iteration and cursor walks yield each live entry exactly once.
fn run<C>(
    mut sut: ChainedHashMap<String, i32, C>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    C: EqualityComparer<String>,
{
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                let before = sut.version();
                match sut.insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(e) => {
                        prop_assert_eq!(e, Error::DuplicateKey);
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.version(), before);
                    }
                }
            }
            OpI::Set(i, v) => {
                let k = pool[i].clone();
                let old = sut.set(k.clone(), v).unwrap();
                prop_assert_eq!(old, model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k).unwrap(), model.remove(k));
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.try_get(k).unwrap(), model.get(k));
                match model.get(k) {
                    Some(v) => prop_assert_eq!(sut.get(k), Ok(v)),
                    None => prop_assert_eq!(sut.get(k), Err(Error::KeyNotFound)),
                }
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(mv) = model.get_mut(k) {
                    let v = sut.get_mut(k).unwrap();
                    *v = v.wrapping_add(d);
                    *mv = mv.wrapping_add(d);
                } else {
                    prop_assert_eq!(sut.get_mut(k).err(), Some(Error::KeyNotFound));
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().iter().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys.len(), sut.len());
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::Walk => {
                let mut cursor = sut.cursor();
                let mut seen = 0;
                while let Some((k, v)) = cursor.next(&sut).unwrap() {
                    prop_assert_eq!(model.get(k), Some(v));
                    seen += 1;
                }
                prop_assert_eq!(seen, model.len());
            }
            OpI::Clear => {
                let capacity = sut.capacity();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), capacity);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let chained: usize = sut.chain_lengths().iter().sum();
        prop_assert_eq!(chained, sut.len());
        for (k, v) in &model {
            prop_assert_eq!(sut.try_get(k).unwrap(), Some(v));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(ChainedHashMap::<String, i32>::new(), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_presized((pool, ops) in arb_scenario()) {
        run(ChainedHashMap::<String, i32>::with_capacity(3), &pool, ops)?;
    }

    // Worst-case collisions: one chain holds everything.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(ChainedHashMap::with_comparer(OneBucket), &pool, ops)?;
    }

    // A threshold low enough to trip on the first short chain, so the map
    // reseeds and recomputes every stored hash mid-scenario.
    #[test]
    fn prop_state_machine_low_threshold((pool, ops) in arb_scenario()) {
        let config = MapConfig { capacity: 0, collision_threshold: Some(1) };
        let comparer: DefaultComparer = DefaultComparer::default();
        run(ChainedHashMap::with_config(config, comparer), &pool, ops)?;
    }

    // OneBucket cannot reseed: the threshold trips without a rehash.
    #[test]
    fn prop_state_machine_low_threshold_no_reseed((pool, ops) in arb_scenario()) {
        let config = MapConfig { capacity: 0, collision_threshold: Some(1) };
        run(ChainedHashMap::with_config(config, OneBucket), &pool, ops)?;
    }
}
