//! Property tests comparing `BTree` against a `std::collections::BTreeMap`
//! reference model under random insert/delete sequences, plus a
//! `KeySchema` encode/decode round-trip property. Kept separate from the
//! example-style unit tests in `tests.rs`.

use crate::datum::{Datum, KeySchema};
use crate::record_id::RecordId;
use crate::tree::{BTree, IndexDescriptor};
use buffer::buffer::BufferManager;
use file::file_catalog::FileCatalog;
use file::in_memory_file_manager::InMemoryFileManager;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::cmp::Ordering;
use std::sync::Arc;
use storage_api::storage_manager::StorageManager;

struct IntSchema;

impl KeySchema for IntSchema {
    fn num_fields(&self) -> usize {
        1
    }

    fn write_payload(&self, values: &[Datum], out: &mut Vec<u8>) {
        let Datum::Int(v) = values[0] else { panic!("expected Int") };
        out.extend_from_slice(&v.to_le_bytes());
    }

    fn disassemble_payload(&self, bytes: &[u8]) -> Vec<Datum> {
        vec![Datum::Int(i64::from_le_bytes(bytes.try_into().unwrap()))]
    }

    fn compare_field(&self, _index: usize, a: &Datum, b: &Datum) -> Ordering {
        let (Datum::Int(a), Datum::Int(b)) = (a, b) else {
            panic!("expected Int")
        };
        a.cmp(b)
    }
}

fn new_tree(unique: bool) -> BTree<InMemoryFileManager, IntSchema> {
    let file_manager = Arc::new(InMemoryFileManager::new(Arc::new(FileCatalog::new())));
    let buffer_manager = Arc::new(BufferManager::new(file_manager.clone(), 64));
    let storage = Arc::new(StorageManager::new(file_manager, buffer_manager));
    BTree::create(storage, IndexDescriptor { file_id: 1, unique }, IntSchema).unwrap()
}

fn scan_keys(tree: &BTree<InMemoryFileManager, IntSchema>) -> Vec<i64> {
    let mut out = Vec::new();
    let mut it = tree.start_scan(None, false, None, false).unwrap();
    while it.is_at_valid_item() {
        let item = tree.key_schema().disassemble_payload(&it.current_item().unwrap());
        let Datum::Int(v) = item[0] else { unreachable!() };
        out.push(v);
        if !it.next().unwrap() {
            break;
        }
    }
    out
}

#[derive(Clone, Debug)]
enum PropOp {
    Put(i64),
    Delete(i64),
}

fn op_strategy() -> impl Strategy<Value = PropOp> {
    let key_range = 0i64..80;
    prop_oneof![
        key_range.clone().prop_map(PropOp::Put),
        key_range.prop_map(PropOp::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A unique index, driven by a random sequence of inserts/deletes,
    /// always scans back in the same sorted key order a `BTreeMap` used as
    /// a reference model would produce — regardless of the order ops were
    /// applied in.
    #[test]
    fn btree_matches_btreemap_under_random_ops(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let tree = new_tree(true);
        let mut reference: BTreeMap<i64, RecordId> = BTreeMap::new();
        let mut next_slot = 1u32;

        for op in ops {
            match op {
                PropOp::Put(key) => {
                    let recid = RecordId::new(2, next_slot, 1);
                    let inserted = tree.insert_key(&[Datum::Int(key)], recid).unwrap();
                    if reference.contains_key(&key) {
                        prop_assert!(!inserted);
                    } else {
                        prop_assert!(inserted);
                        reference.insert(key, recid);
                        next_slot += 1;
                    }
                }
                PropOp::Delete(key) => {
                    let deleted = tree.delete_key(&[Datum::Int(key)], None).unwrap();
                    prop_assert_eq!(deleted.is_some(), reference.contains_key(&key));
                    reference.remove(&key);
                }
            }
        }

        let expected: Vec<i64> = reference.keys().copied().collect();
        prop_assert_eq!(scan_keys(&tree), expected);
    }

    /// Inserting the same set of distinct keys in any order produces the
    /// same sorted scan result — the tree's final shape is order-insensitive.
    #[test]
    fn insert_order_does_not_affect_scan_result(
        mut keys in prop::collection::hash_set(0i64..200, 1..80),
        seed in any::<u64>(),
    ) {
        let mut keys: Vec<i64> = keys.drain().collect();
        let mut sorted = keys.clone();
        sorted.sort();

        // Deterministic shuffle seeded by the proptest-generated `seed`.
        let n = keys.len();
        for i in 0..n {
            let j = ((seed.wrapping_add(i as u64).wrapping_mul(2654435761)) as usize) % n;
            keys.swap(i, j);
        }

        let tree = new_tree(true);
        for (i, &k) in keys.iter().enumerate() {
            tree.insert_key(&[Datum::Int(k)], RecordId::new(2, i as u32 + 1, 1)).unwrap();
        }

        prop_assert_eq!(scan_keys(&tree), sorted);
    }

    /// `IntSchema`'s `write_payload`/`disassemble_payload` round-trip any
    /// `i64` value.
    #[test]
    fn int_schema_payload_round_trips(v in any::<i64>()) {
        let schema = IntSchema;
        let mut buf = Vec::new();
        schema.write_payload(&[Datum::Int(v)], &mut buf);
        let decoded = schema.disassemble_payload(&buf);
        prop_assert_eq!(decoded.len(), 1);
        let Datum::Int(got) = decoded[0] else { unreachable!() };
        prop_assert_eq!(got, v);
    }
}
