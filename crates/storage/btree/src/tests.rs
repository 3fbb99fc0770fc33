//! Crate-level scenario tests: multi-page splits, merges, rebalances, root
//! collapse, and range scans, per §8. Uses `InMemoryFileManager` (the same
//! test double every other storage crate uses) wired up through a real
//! `BufferManager`/`StorageManager` pair — no mocking of the B-tree's own
//! logic.

use crate::datum::{Datum, KeySchema};
use crate::layout::{LEAF_RECORD_HEADER_SIZE, PAGE_SIZE, compute_page_usage};
use crate::record_id::RecordId;
use crate::tree::{BTree, IndexDescriptor};
use binary_helpers::align::max_align;
use buffer::buffer::BufferManager;
use file::file_catalog::FileCatalog;
use file::in_memory_file_manager::InMemoryFileManager;
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

/// (id: Int, payload: Text) schema, used for the large-value scenario.
struct IntTextSchema;

impl KeySchema for IntTextSchema {
    fn num_fields(&self) -> usize {
        2
    }

    fn write_payload(&self, values: &[Datum], out: &mut Vec<u8>) {
        let Datum::Int(id) = values[0] else { panic!("expected Int") };
        out.extend_from_slice(&id.to_le_bytes());
        if values.len() > 1 {
            let Datum::Text(t) = &values[1] else { panic!("expected Text") };
            out.extend_from_slice(&(t.len() as u32).to_le_bytes());
            out.extend_from_slice(t.as_bytes());
        }
    }

    fn disassemble_payload(&self, bytes: &[u8]) -> Vec<Datum> {
        let id = i64::from_le_bytes(bytes[0..8].try_into().unwrap());
        if bytes.len() == 8 {
            return vec![Datum::Int(id)];
        }
        let len = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        let text = String::from_utf8(bytes[12..12 + len].to_vec()).unwrap();
        vec![Datum::Int(id), Datum::Text(text)]
    }

    fn compare_field(&self, index: usize, a: &Datum, b: &Datum) -> Ordering {
        match index {
            0 => {
                let (Datum::Int(a), Datum::Int(b)) = (a, b) else {
                    panic!("expected Int")
                };
                a.cmp(b)
            }
            _ => {
                let (Datum::Text(a), Datum::Text(b)) = (a, b) else {
                    panic!("expected Text")
                };
                a.cmp(b)
            }
        }
    }
}

fn new_storage() -> (Arc<StorageManager<InMemoryFileManager>>, u32) {
    let file_manager = Arc::new(InMemoryFileManager::new(Arc::new(FileCatalog::new())));
    let buffer_manager = Arc::new(BufferManager::new(file_manager.clone(), 256));
    let storage = Arc::new(StorageManager::new(file_manager, buffer_manager));
    (storage, 1)
}

fn int_tree(storage: Arc<StorageManager<InMemoryFileManager>>, file_id: u32, unique: bool) -> BTree<InMemoryFileManager, IntSchema> {
    BTree::create(storage, IndexDescriptor { file_id, unique }, IntSchema).unwrap()
}

/// The largest number of fixed-size leaf records `IntSchema` can pack onto a
/// single leaf page, computed via the same `compute_page_usage` the
/// production split/merge code uses.
fn int_leaf_capacity() -> usize {
    let aligned_reclen = max_align(LEAF_RECORD_HEADER_SIZE + 8);
    let mut n = 0usize;
    while compute_page_usage(n + 1, (n + 1) * aligned_reclen) <= PAGE_SIZE {
        n += 1;
    }
    n
}

fn scan_all(tree: &BTree<InMemoryFileManager, IntSchema>) -> Vec<(i64, RecordId)> {
    let mut out = Vec::new();
    let mut it = tree.start_scan(None, false, None, false).unwrap();
    while it.is_at_valid_item() {
        let item = tree.key_schema().disassemble_payload(&it.current_item().unwrap());
        let Datum::Int(v) = item[0] else { unreachable!() };
        out.push((v, it.current_record_id().unwrap()));
        if !it.next().unwrap() {
            break;
        }
    }
    out
}

#[test]
fn single_leaf_fits_without_splitting() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, true);
    let capacity = int_leaf_capacity();

    for k in 1..=capacity as i64 {
        assert!(tree.insert_key(&[Datum::Int(k)], RecordId::new(2, k as u32, 1)).unwrap());
    }

    assert_eq!(tree.tree_height().unwrap(), 1);
    let scanned = scan_all(&tree);
    assert_eq!(scanned.len(), capacity);
    let keys: Vec<i64> = scanned.iter().map(|(k, _)| *k).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn one_more_than_capacity_forces_a_split() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, true);
    let capacity = int_leaf_capacity();

    for k in 1..=(capacity as i64 + 1) {
        assert!(tree.insert_key(&[Datum::Int(k)], RecordId::new(2, k as u32, 1)).unwrap());
    }

    assert_eq!(tree.tree_height().unwrap(), 2);
    let scanned = scan_all(&tree);
    assert_eq!(scanned.len(), capacity + 1);
    let keys: Vec<i64> = scanned.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, (1..=(capacity as i64 + 1)).collect::<Vec<_>>());
}

#[test]
fn large_value_keys_build_a_multi_level_tree_and_scan_in_order() {
    let (storage, file_id) = new_storage();
    let tree = BTree::create(
        storage,
        IndexDescriptor { file_id, unique: true },
        IntTextSchema,
    )
    .unwrap();

    let payload = "x".repeat(380);
    for k in 1..=4000i64 {
        let values = vec![Datum::Int(k), Datum::Text(payload.clone())];
        assert!(tree.insert_key(&values, RecordId::new(2, k as u32, 1)).unwrap());
    }

    assert!(tree.tree_height().unwrap() >= 3);

    let mut it = tree.start_scan(None, false, None, false).unwrap();
    let mut count = 0i64;
    let mut last = 0i64;
    while it.is_at_valid_item() {
        let item = tree.key_schema().disassemble_payload(&it.current_item().unwrap());
        let Datum::Int(v) = item[0] else { unreachable!() };
        assert!(v > last);
        last = v;
        count += 1;
        if !it.next().unwrap() {
            break;
        }
    }
    assert_eq!(count, 4000);
}

#[test]
fn unique_index_rejects_duplicate_key() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, true);
    assert!(tree.insert_key(&[Datum::Int(1)], RecordId::new(2, 1, 1)).unwrap());
    assert!(!tree.insert_key(&[Datum::Int(1)], RecordId::new(2, 2, 1)).unwrap());
    assert_eq!(scan_all(&tree).len(), 1);
}

#[test]
fn non_unique_index_keeps_every_recid_for_a_repeated_key() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, false);
    assert!(tree.insert_key(&[Datum::Int(1)], RecordId::new(2, 1, 1)).unwrap());
    assert!(tree.insert_key(&[Datum::Int(1)], RecordId::new(2, 2, 1)).unwrap());
    assert!(tree.insert_key(&[Datum::Int(1)], RecordId::new(2, 3, 1)).unwrap());
    assert_eq!(scan_all(&tree).len(), 3);
}

#[test]
fn range_scan_honors_strict_and_inclusive_bounds() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, true);
    for k in 1..=500i64 {
        tree.insert_key(&[Datum::Int(k)], RecordId::new(2, k as u32, 1)).unwrap();
    }

    let lower = vec![Datum::Int(250)];
    let upper = vec![Datum::Int(500)];

    let mut it = tree.start_scan(Some(&lower), false, Some(&upper), true).unwrap();
    let mut keys = Vec::new();
    while it.is_at_valid_item() {
        let item = tree.key_schema().disassemble_payload(&it.current_item().unwrap());
        let Datum::Int(v) = item[0] else { unreachable!() };
        keys.push(v);
        if !it.next().unwrap() {
            break;
        }
    }
    assert_eq!(keys, (250..500).collect::<Vec<_>>());

    let mut it2 = tree.start_scan(Some(&lower), true, Some(&upper), false).unwrap();
    let mut keys2 = Vec::new();
    while it2.is_at_valid_item() {
        let item = tree.key_schema().disassemble_payload(&it2.current_item().unwrap());
        let Datum::Int(v) = item[0] else { unreachable!() };
        keys2.push(v);
        if !it2.next().unwrap() {
            break;
        }
    }
    assert_eq!(keys2, (251..=500).collect::<Vec<_>>());
}

#[test]
fn delete_brings_a_leaf_below_min_usage_and_triggers_a_merge() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, true);
    let capacity = int_leaf_capacity();

    let total = (capacity as i64) * 3;
    for k in 1..=total {
        tree.insert_key(&[Datum::Int(k)], RecordId::new(2, k as u32, 1)).unwrap();
    }
    let height_before = tree.tree_height().unwrap();
    assert!(height_before >= 2);

    for k in 1..(capacity as i64) {
        let deleted = tree.delete_key(&[Datum::Int(k)], None).unwrap();
        assert!(deleted.is_some());
    }

    let scanned = scan_all(&tree);
    let remaining: Vec<i64> = scanned.iter().map(|(k, _)| *k).collect();
    assert_eq!(remaining, ((capacity as i64)..=total).collect::<Vec<_>>());
    assert!(tree.tree_height().unwrap() <= height_before);
}

#[test]
fn deleting_every_inserted_key_empties_the_tree_back_to_height_one() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, true);

    let mut keys: Vec<i64> = (1..=4000).collect();
    // Deterministic pseudo-shuffle so insertion order isn't sorted, without
    // reaching for a disallowed nondeterministic source.
    for i in 0..keys.len() {
        let j = (i * 2654435761u64 as usize + 17) % keys.len();
        keys.swap(i, j);
    }

    for &k in &keys {
        tree.insert_key(&[Datum::Int(k)], RecordId::new(2, k as u32, 1)).unwrap();
    }
    assert!(!tree.is_empty().unwrap());

    let mut delete_order = keys.clone();
    for i in 0..delete_order.len() {
        let j = (i * 40503u64 as usize + 7) % delete_order.len();
        delete_order.swap(i, j);
    }
    for &k in &delete_order {
        let deleted = tree.delete_key(&[Datum::Int(k)], None).unwrap();
        assert!(deleted.is_some());
    }

    assert!(tree.is_empty().unwrap());
    assert_eq!(tree.tree_height().unwrap(), 1);
}

#[test]
fn delete_with_explicit_recid_only_removes_the_matching_record() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, false);
    let a = RecordId::new(2, 1, 1);
    let b = RecordId::new(2, 2, 1);
    tree.insert_key(&[Datum::Int(9)], a).unwrap();
    tree.insert_key(&[Datum::Int(9)], b).unwrap();

    let deleted = tree.delete_key(&[Datum::Int(9)], Some(a)).unwrap();
    assert_eq!(deleted, Some(a));

    let remaining = scan_all(&tree);
    assert_eq!(remaining, vec![(9, b)]);
}

#[test]
fn deleting_a_missing_key_returns_none() {
    let (storage, file_id) = new_storage();
    let tree = int_tree(storage, file_id, true);
    tree.insert_key(&[Datum::Int(1)], RecordId::new(2, 1, 1)).unwrap();
    assert_eq!(tree.delete_key(&[Datum::Int(2)], None).unwrap(), None);
}
