#![cfg(test)]

// Property tests for ProbeTable kept inside the crate so they can check
// slot-level invariants (tombstone count, probe-chain contiguity).

use crate::probe_table::{InsertError, ProbeTable};
use crate::strategy::{FnStrategy, KeyStrategy, StdStrategy};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Entry(usize, i32),
    Update(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Entry(i, d)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Update(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            "[a-z]{0,5}".prop_map(OpI::Contains),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives `sut` and a std `HashMap` model through the same operations and
// checks they agree after each one.
fn run_against_model<S>(
    mut sut: ProbeTable<String, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: KeyStrategy<String> + KeyStrategy<str>,
{
    let mut model: HashMap<String, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(stored) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert_eq!(*stored, v);
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                }
            }
            OpI::Entry(i, d) => {
                let k = pool[i].clone();
                let slot = sut.entry(k.clone());
                *slot = slot.wrapping_add(d);
                let m = model.entry(k).or_default();
                *m = m.wrapping_add(d);
            }
            OpI::Update(i, v) => {
                let k = pool[i].as_str();
                let old = sut.update(k, v);
                let expected = model.get_mut(k).map(|m| std::mem::replace(m, v));
                prop_assert_eq!(old, expected);
            }
            OpI::Remove(i) => {
                let k = pool[i].as_str();
                let removed = sut.remove(k);
                let expected = model.remove_entry(k);
                prop_assert_eq!(removed, expected);
                prop_assert!(sut.get(k).is_none());
            }
            OpI::Get(i) => {
                let k = pool[i].as_str();
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            OpI::Iterate => {
                let seen: BTreeMap<_, _> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen.len(), sut.len(), "iteration yields each entry once");
                let expected: BTreeMap<_, _> = model.clone().into_iter().collect();
                prop_assert_eq!(seen, expected);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        sut.check_invariants();
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `insert` rejects duplicates and never overwrites.
// - `entry` creates-or-fetches; `update` overwrites only present keys.
// - `remove` returns the owned pair and leaves the rest of its cluster
//   reachable.
// - `iter` yields each live entry exactly once.
// - Slot bookkeeping (len, tombstones, chains, load factor) stays exact.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        // Small start so growth happens inside most scenarios.
        let sut: ProbeTable<String, i32> = ProbeTable::with_capacity(2);
        run_against_model(sut, &pool, ops)?;
    }
}

// Property: Same invariants under worst-case collisions (every key hashes
// to 0), which turns the table into a single linear-probe cluster and
// stresses tombstone handling.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = ProbeTable::with_capacity_and_strategy(2, StdStrategy::new(ZeroBuildHasher));
        run_against_model(sut, &pool, ops)?;
    }
}

// Property: A few distinct hash values over many keys: short clusters
// that overlap and wrap, rather than one long one.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_coarse_hash((pool, ops) in arb_scenario()) {
        let sut = ProbeTable::with_capacity_and_strategy(2, StdStrategy::new(LenBuildHasher));
        run_against_model(sut, &pool, ops)?;
    }
}

#[derive(Clone, Default)]
struct ZeroBuildHasher;
struct ZeroHasher;
impl std::hash::BuildHasher for ZeroBuildHasher {
    type Hasher = ZeroHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ZeroHasher
    }
}
impl std::hash::Hasher for ZeroHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Hash = number of bytes written, so keys of equal length collide.
#[derive(Clone, Default)]
struct LenBuildHasher;
struct LenHasher(u64);
impl std::hash::BuildHasher for LenBuildHasher {
    type Hasher = LenHasher;
    fn build_hasher(&self) -> Self::Hasher {
        LenHasher(0)
    }
}
impl std::hash::Hasher for LenHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.0 += bytes.len() as u64;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

// Property: Counting words through `entry` with the djb2 function-pointer
// strategy agrees with a std model, for any word sequence.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_fn_strategy_counts(words in proptest::collection::vec("[a-c]{1,3}", 0..300)) {
        let mut sut: ProbeTable<&str, u32, FnStrategy<str>> =
            ProbeTable::with_strategy(FnStrategy::djb2());
        let mut model: HashMap<&str, u32> = HashMap::new();
        for w in &words {
            *sut.entry(w.as_str()) += 1;
            *model.entry(w.as_str()).or_default() += 1;
        }
        prop_assert_eq!(sut.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(sut.get(*k), Some(v));
        }
    }
}
