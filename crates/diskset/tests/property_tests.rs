use codec::{I64Codec, Utf8Codec};
use diskset::DiskSet;
use proptest::prelude::*;
use std::collections::BTreeSet;

proptest! {
    #[test]
    fn prop_inserts_preserve_invariants(values in prop::collection::vec(any::<i64>(), 1..120)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.set");
        let mut set = DiskSet::open(&path, I64Codec).unwrap();
        let mut reference = BTreeSet::new();

        for v in &values {
            prop_assert_eq!(set.add(v).unwrap(), reference.insert(*v));
        }

        let stats = set.verify().unwrap();
        prop_assert_eq!(stats.nodes, reference.len() as u64);
        prop_assert_eq!(set.len().unwrap(), reference.len() as u64);

        for v in &reference {
            prop_assert!(set.contains(v).unwrap());
        }

        // in-order traversal equals the reference ordering
        let got: Vec<i64> = set.iter().map(|v| v.unwrap()).collect();
        let want: Vec<i64> = reference.iter().copied().collect();
        prop_assert_eq!(got, want);

        // re-inserting any present value is a byte-level no-op
        let image = std::fs::read(&path).unwrap();
        for v in reference.iter().take(8) {
            prop_assert!(!set.add(v).unwrap());
        }
        prop_assert_eq!(std::fs::read(&path).unwrap(), image);
    }

    #[test]
    fn prop_neighbors_agree_with_reference(
        values in prop::collection::vec(any::<i64>(), 1..80),
        probes in prop::collection::vec(any::<i64>(), 1..80),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut set = DiskSet::open(dir.path().join("p.set"), I64Codec).unwrap();
        let mut reference = BTreeSet::new();
        for v in &values {
            set.add(v).unwrap();
            reference.insert(*v);
        }

        prop_assert_eq!(set.first().unwrap(), *reference.iter().next().unwrap());
        prop_assert_eq!(set.last().unwrap(), *reference.iter().next_back().unwrap());

        for q in &probes {
            let higher = if *q == i64::MAX {
                None
            } else {
                reference.range(q + 1..).next().copied()
            };
            prop_assert_eq!(set.higher(q).unwrap(), higher);
            prop_assert_eq!(set.ceiling(q).unwrap(), reference.range(q..).next().copied());
            prop_assert_eq!(set.floor(q).unwrap(), reference.range(..=q).next_back().copied());
        }
    }

    #[test]
    fn prop_string_payloads_iterate_in_order(
        values in prop::collection::vec("[a-z]{0,12}", 1..60)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut set = DiskSet::open(dir.path().join("p.set"), Utf8Codec).unwrap();
        let mut reference = BTreeSet::new();
        for v in &values {
            prop_assert_eq!(set.add(v).unwrap(), reference.insert(v.clone()));
        }
        set.verify().unwrap();

        let got: Vec<String> = set.iter().map(|v| v.unwrap()).collect();
        let want: Vec<String> = reference.iter().cloned().collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn prop_reopen_round_trips(values in prop::collection::vec(any::<i64>(), 1..60)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.set");
        let mut reference = BTreeSet::new();
        {
            let mut set = DiskSet::open(&path, I64Codec).unwrap();
            for v in &values {
                set.add(v).unwrap();
                reference.insert(*v);
            }
            set.close().unwrap();
        }

        let mut set = DiskSet::open(&path, I64Codec).unwrap();
        set.verify().unwrap();
        prop_assert_eq!(set.len().unwrap(), reference.len() as u64);
        let got: Vec<i64> = set.iter().map(|v| v.unwrap()).collect();
        let want: Vec<i64> = reference.iter().copied().collect();
        prop_assert_eq!(got, want);
    }
}
