// ProbeTable property tests against the public API.
//
// Property 1: get-after-insert for unique keys, across growth.
//  - Model: the list of keys inserted so far.
//  - Invariant: every inserted key maps to its value after each insert,
//    whether or not the insert grew the table.
//
// Property 2: removal never hides other keys.
//  - Model: BTreeMap of live keys.
//  - Operations: insert a batch, remove a random subset, reinsert some.
//  - Invariant: live keys resolve, removed keys do not, len matches.
use proptest::prelude::*;
use probe_table::{ProbeTable, StdStrategy};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{BuildHasher, Hasher};

// Hash that keeps only the low bits of the key: many collisions, and
// clusters that run into each other.
#[derive(Clone, Default)]
struct LowBits;
struct LowBitsHasher(u64);
impl BuildHasher for LowBits {
    type Hasher = LowBitsHasher;
    fn build_hasher(&self) -> LowBitsHasher {
        LowBitsHasher(0)
    }
}
impl Hasher for LowBitsHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | u64::from(b);
        }
    }
    fn write_u64(&mut self, n: u64) {
        self.0 = n & 0x7;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

// Property 1: get-after-insert holds across growth.
proptest! {
    #[test]
    fn prop_get_after_insert(keys in proptest::collection::btree_set(any::<u64>(), 1..600), start in 0usize..16) {
        let keys: Vec<u64> = keys.into_iter().collect();
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_capacity(start);
        for (i, &k) in keys.iter().enumerate() {
            prop_assert!(t.insert(k, !k).is_ok());
            prop_assert_eq!(t.get(&k), Some(&!k));
            prop_assert_eq!(t.len(), i + 1);
        }
        for &k in &keys {
            prop_assert_eq!(t.get(&k), Some(&!k));
        }
        prop_assert!(t.load_factor() <= 0.75);
    }
}

// Property 2: removing any subset leaves exactly the rest reachable.
proptest! {
    #[test]
    fn prop_remove_subset(
        keys in proptest::collection::btree_set(0u64..256, 1..120),
        remove_mask in proptest::collection::vec(any::<bool>(), 120),
        reinsert_mask in proptest::collection::vec(any::<bool>(), 120),
    ) {
        let mut t = ProbeTable::with_capacity_and_strategy(4, StdStrategy::new(LowBits));
        let mut model: BTreeMap<u64, u64> = BTreeMap::new();
        for &k in &keys {
            t.insert(k, k + 1).unwrap();
            model.insert(k, k + 1);
        }

        let mut removed = BTreeSet::new();
        for (i, &k) in keys.iter().enumerate() {
            if remove_mask[i] {
                prop_assert_eq!(t.remove(&k), Some((k, k + 1)));
                model.remove(&k);
                removed.insert(k);
            }
        }
        for (k, v) in &model {
            prop_assert_eq!(t.get(k), Some(v));
        }
        for k in &removed {
            prop_assert!(!t.contains_key(k));
        }
        prop_assert_eq!(t.len(), model.len());

        for (i, &k) in removed.iter().enumerate() {
            if reinsert_mask[i] {
                *t.entry(k) += 7;
                model.insert(k, 7);
            }
        }
        let seen: BTreeMap<u64, u64> = t.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(seen, model);
    }
}
