//! `InsertKey`: descend to the target leaf, find the insertion slot, build
//! the leaf record, and insert — splitting (and, if the split propagates
//! past the root, creating a new root) as many times as needed per §4.4.

use crate::datum::{Datum, KeySchema};
use crate::descent::{PathEntry, find_leaf_page_number};
use crate::errors::{BTreeError, BTreeResult};
use crate::layout::{
    BTreePageHeaderMut, MAX_RECORD_SIZE, build_internal_record, build_leaf_record,
    compute_page_usage, headerless_internal_record, record_heap_recid, record_payload,
    write_root_pid,
};
use crate::record_id::{RecIdBound, RecordId};
use crate::search::{SearchKey, binary_search_on_page, keys_equal};
use binary_helpers::align::max_align;
use file::api::FileManager;
use page::page::outcomes::InsertOutcome;
use page::page_id::{FileId, PageId};
use storage_api::storage_manager::StorageManager;
use tracing::trace;

/// Inserts `values` -> `recid` into the tree rooted at `file_id`. Returns
/// `false` without modifying anything if `unique` and an equal key (ignoring
/// recid) already exists.
pub fn insert_key<F: FileManager, K: KeySchema>(
    storage: &StorageManager<F>,
    file_id: FileId,
    schema: &K,
    unique: bool,
    values: &[Datum],
    recid: RecordId,
) -> BTreeResult<bool> {
    let mut key_payload = Vec::new();
    schema.write_payload(values, &mut key_payload);
    let leaf_reclen = crate::layout::LEAF_RECORD_HEADER_SIZE + key_payload.len();
    if leaf_reclen > MAX_RECORD_SIZE {
        return Err(BTreeError::KeyTooLarge {
            size: leaf_reclen,
            max: MAX_RECORD_SIZE,
        });
    }

    // During descent, a unique index biases toward the rightmost leaf that
    // could hold an equal key (so the duplicate check below sees it); a
    // non-unique index descends using the real recid.
    let descent_bound = if unique {
        RecIdBound::PlusInfinity
    } else {
        RecIdBound::Valid(recid)
    };
    let descent_search = SearchKey {
        values,
        recid: descent_bound,
    };
    let mut path = Vec::new();
    let leaf_pgno = find_leaf_page_number(storage, file_id, schema, &descent_search, Some(&mut path))?;

    let exact_search = SearchKey {
        values,
        recid: RecIdBound::Valid(recid),
    };
    let insertion_sid;
    {
        let leaf = storage.read_page(PageId::new(file_id, leaf_pgno));
        let pred = binary_search_on_page(&leaf, true, schema, &exact_search)?;
        if unique {
            if let Some(sid) = pred {
                let rec = leaf.get_record(sid)?;
                let rec_values = schema.disassemble_payload(record_payload(rec, true));
                if keys_equal(schema, values, &rec_values) {
                    return Ok(false);
                }
            }
        }
        insertion_sid = pred.map(|s| s + 1).unwrap_or(1);
    }

    let leaf_rec = build_leaf_record(&key_payload, recid);
    insert_with_split_propagation(storage, file_id, leaf_pgno, insertion_sid, leaf_rec, true, path)?;
    Ok(true)
}

/// Inserts `rec` at `sid` on `pgno`; if the page doesn't have room, splits it
/// and propagates the resulting separator up `path`, creating a new root if
/// the split reaches past the one recorded (empty path).
fn insert_with_split_propagation<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    mut pgno: u32,
    mut sid: u32,
    mut rec: Vec<u8>,
    mut is_leaf: bool,
    mut path: Vec<PathEntry>,
) -> BTreeResult<()> {
    loop {
        let mut page = storage.write_page(PageId::new(file_id, pgno));
        let outcome = page.insert_record_at(sid, &rec)?;

        match outcome {
            InsertOutcome::Inserted(_) => {
                let mut hdr = BTreePageHeaderMut::new(page.user_data_mut()?);
                let totrlen = hdr.totrlen()?;
                hdr.set_totrlen(totrlen + max_align(rec.len()) as i32)?;
                return Ok(());
            }
            InsertOutcome::WontFit | InsertOutcome::WontFitCompactable => {
                drop(page);
                let (separator, right_pgno) = split_page(storage, file_id, pgno, sid, &rec, is_leaf)?;
                trace!(file_id, left = pgno, right = right_pgno, is_leaf, "split page");
                match path.pop() {
                    Some(parent) => {
                        pgno = parent.page_number;
                        sid = parent.slot_id + 1;
                        rec = separator;
                        is_leaf = false;
                        continue;
                    }
                    None => {
                        create_new_root(storage, file_id, pgno, right_pgno, separator)?;
                        trace!(file_id, old_root = pgno, new_right = right_pgno, "created new root");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Rewrites `pgno`'s record set from scratch: clears every existing slot and
/// re-inserts `records` in order, then sets `totrlen` accordingly. Used by
/// both the split and rebalance algorithms, which compute the desired final
/// record set off-page before committing it.
pub(crate) fn rewrite_page_records<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    pgno: u32,
    records: &[Vec<u8>],
) -> BTreeResult<()> {
    let mut page = storage.write_page(PageId::new(file_id, pgno));
    let max = page.max_slot_id()?;
    for s in (1..=max).rev() {
        page.remove_slot(s)?;
    }
    let mut totrlen = 0i32;
    for rec in records {
        match page.insert_record(rec)? {
            InsertOutcome::Inserted(_) => {}
            other => panic!(
                "btree: page {pgno} could not hold a record set it was already sized for: {other:?}"
            ),
        }
        totrlen += max_align(rec.len()) as i32;
    }
    let mut hdr = BTreePageHeaderMut::new(page.user_data_mut()?);
    hdr.set_totrlen(totrlen)?;
    Ok(())
}

/// Splits `left_pgno`, treating `ins_rec` as already inserted at `sid_ins`
/// (it is not actually written to `left_pgno` by this function). Returns the
/// separator record to insert into the parent, and the new right sibling's
/// page number.
fn split_page<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    left_pgno: u32,
    sid_ins: u32,
    ins_rec: &[u8],
    is_leaf: bool,
) -> BTreeResult<(Vec<u8>, u32)> {
    let (mut all, was_root, prev_pid, old_next_pid) = {
        let left = storage.read_page(PageId::new(file_id, left_pgno));
        let max_sid = left.max_slot_id()?;
        let mut all = Vec::with_capacity(max_sid as usize + 1);
        for s in 1..=max_sid {
            all.push(left.get_record(s)?.to_vec());
        }
        let hdr = crate::layout::BTreePageHeaderRef::new(left.user_data()?);
        let was_root = hdr.is_root()?;
        let prev_pid = hdr.prev_pid()?;
        let old_next_pid = hdr.next_pid()?;
        (all, was_root, prev_pid, old_next_pid)
    };
    all.insert((sid_ins - 1) as usize, ins_rec.to_vec());

    let n = all.len();
    let mut best_split = 1usize;
    let mut best_diff = i64::MAX;
    let mut prev_diff: Option<i64> = None;
    let mut running_left_len = 0usize;

    for k in 1..n {
        running_left_len += max_align(all[k - 1].len());
        let right_len: usize = all[k..].iter().map(|r| max_align(r.len())).sum();
        let usage_left = compute_page_usage(k, running_left_len);
        let usage_right = compute_page_usage(n - k, right_len);
        if usage_left > crate::layout::PAGE_SIZE || usage_right > crate::layout::PAGE_SIZE {
            continue;
        }
        let diff = (usage_left as i64 - usage_right as i64).abs();
        if diff < best_diff {
            best_diff = diff;
            best_split = k;
        }
        if is_leaf {
            if let Some(pd) = prev_diff {
                if diff > pd {
                    break;
                }
            }
            prev_diff = Some(diff);
        }
    }

    if best_diff == i64::MAX {
        panic!("btree: no valid split point found for page {left_pgno}");
    }

    let left_records: Vec<Vec<u8>> = all[..best_split].to_vec();
    let mut right_records: Vec<Vec<u8>> = all[best_split..].to_vec();

    let separator_src = right_records[0].clone();
    if !is_leaf {
        right_records[0].truncate(crate::layout::INTERNAL_RECORD_HEADER_SIZE);
    }

    let right_pgno = {
        let mut right = storage.allocate_page(file_id);
        right.initialize_page(crate::layout::BTREE_HEADER_SIZE)?;
        right.page_id().page_number
    };

    let heap_recid = record_heap_recid(&separator_src, is_leaf);
    let key_payload = record_payload(&separator_src, is_leaf).to_vec();
    let separator = build_internal_record(right_pgno, heap_recid, &key_payload);

    {
        let mut right = storage.write_page(PageId::new(file_id, right_pgno));
        let mut hdr = BTreePageHeaderMut::new(right.user_data_mut()?);
        let flags = if is_leaf { crate::layout::IS_LEAF_FLAG } else { 0 };
        hdr.initialize(flags, left_pgno, old_next_pid)?;
    }
    rewrite_page_records(storage, file_id, right_pgno, &right_records)?;

    if old_next_pid != 0 {
        let mut next = storage.write_page(PageId::new(file_id, old_next_pid));
        let mut hdr = BTreePageHeaderMut::new(next.user_data_mut()?);
        hdr.set_prev_pid(right_pgno)?;
    }

    rewrite_page_records(storage, file_id, left_pgno, &left_records)?;
    {
        let mut left = storage.write_page(PageId::new(file_id, left_pgno));
        let mut hdr = BTreePageHeaderMut::new(left.user_data_mut()?);
        hdr.set_next_pid(right_pgno)?;
        if was_root {
            let flags = hdr.flags()? & !crate::layout::IS_ROOT_FLAG;
            hdr.set_flags(flags)?;
        }
    }
    let _ = prev_pid;

    Ok((separator, right_pgno))
}

/// Allocates a new internal root with two entries (a headerless pointer to
/// the old root, then `separator` pointing at the new right page) and
/// repoints the meta page's `root_pid` at it.
fn create_new_root<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    old_root_pgno: u32,
    _right_pgno: u32,
    separator: Vec<u8>,
) -> BTreeResult<()> {
    let first_rec = headerless_internal_record(old_root_pgno);

    let new_root_pgno = {
        let mut new_root = storage.allocate_page(file_id);
        new_root.initialize_page(crate::layout::BTREE_HEADER_SIZE)?;
        let mut hdr = BTreePageHeaderMut::new(new_root.user_data_mut()?);
        hdr.initialize(crate::layout::IS_ROOT_FLAG, 0, 0)?;
        new_root.page_id().page_number
    };
    rewrite_page_records(storage, file_id, new_root_pgno, &[first_rec, separator])?;

    {
        let mut meta = storage.write_page(storage.first_page_number(file_id));
        write_root_pid(&mut meta, new_root_pgno)?;
    }
    Ok(())
}
