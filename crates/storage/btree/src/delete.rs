//! `DeleteKey`: find the slot holding the target record, remove it, and (per
//! §4.5) cascade underflow handling up through the tree — merging or
//! rebalancing with a sibling, collapsing the root if it becomes a single
//! internal child.

use crate::datum::{Datum, KeySchema};
use crate::descent::{PathEntry, find_leaf_page_number};
use crate::errors::BTreeResult;
use crate::insert::rewrite_page_records;
use crate::layout::{
    BTreePageHeaderMut, BTreePageHeaderRef, MAX_RECORD_SIZE, build_internal_record,
    compute_page_usage, internal_child_page_number, internal_heap_recid, internal_record_payload,
    leaf_record_id, leaf_record_payload, MIN_PAGE_USAGE, PAGE_SIZE, record_payload, write_root_pid,
};
use crate::record_id::{RecIdBound, RecordId};
use crate::search::{SearchKey, binary_search_on_page, keys_equal};
use binary_helpers::align::max_align;
use file::api::FileManager;
use page::page::outcomes::UpdateOutcome;
use page::page_id::{FileId, PageId};
use storage_api::storage_manager::StorageManager;
use tracing::trace;

/// Deletes the record for `values` from the tree. `recid` pins down exactly
/// which record to remove when several share the same key; `None` deletes
/// whichever one is found first. Returns the recid actually removed, or
/// `None` if nothing matched.
pub fn delete_key<F: FileManager, K: KeySchema>(
    storage: &StorageManager<F>,
    file_id: FileId,
    schema: &K,
    values: &[Datum],
    recid: Option<RecordId>,
) -> BTreeResult<Option<RecordId>> {
    let bound = recid.map(RecIdBound::Valid).unwrap_or(RecIdBound::Unspecified);
    let mut path = Vec::new();
    let (leaf_pgno, sid) = find_deletion_slot(storage, file_id, schema, values, bound, &mut path)?;
    let Some(sid) = sid else {
        return Ok(None);
    };

    let deleted_recid;
    let root_emptied_as_leaf;
    {
        let mut leaf = storage.write_page(PageId::new(file_id, leaf_pgno));
        let rec = leaf.get_record(sid)?;
        deleted_recid = leaf_record_id(rec);
        let reclen = max_align(rec.len()) as i32;
        leaf.remove_slot(sid)?;

        let mut hdr = BTreePageHeaderMut::new(leaf.user_data_mut()?);
        let totrlen = hdr.totrlen()?;
        hdr.set_totrlen(totrlen - reclen)?;
        root_emptied_as_leaf = hdr.is_root()? && leaf.max_slot_id()? == 0;
    }

    if !root_emptied_as_leaf {
        handle_min_page_usage(storage, file_id, schema, leaf_pgno, true, path)?;
    }
    Ok(Some(deleted_recid))
}

/// Finds the leaf and slot holding the record to delete, per §4.5.2. For a
/// `Valid` recid, requires an exact (key, recid) match. For `Unspecified`,
/// descends using `-infinity` (landing on the leaf that would hold the start
/// of an equal-key run) and takes the slot right after the predecessor,
/// spilling onto the right sibling if the run starts exactly at its boundary.
fn find_deletion_slot<F: FileManager, K: KeySchema>(
    storage: &StorageManager<F>,
    file_id: FileId,
    schema: &K,
    values: &[Datum],
    recid: RecIdBound,
    path: &mut Vec<PathEntry>,
) -> BTreeResult<(u32, Option<u32>)> {
    match recid {
        RecIdBound::Valid(target) => {
            let search = SearchKey { values, recid };
            let leaf_pgno = find_leaf_page_number(storage, file_id, schema, &search, Some(path))?;
            let leaf = storage.read_page(PageId::new(file_id, leaf_pgno));
            let sid = binary_search_on_page(&leaf, true, schema, &search)?;
            let found = match sid {
                None => None,
                Some(s) => {
                    let rec = leaf.get_record(s)?;
                    let rec_values = schema.disassemble_payload(leaf_record_payload(rec));
                    let rec_recid = leaf_record_id(rec);
                    if keys_equal(schema, values, &rec_values) && rec_recid == target {
                        Some(s)
                    } else {
                        None
                    }
                }
            };
            Ok((leaf_pgno, found))
        }
        _ => {
            let search = SearchKey {
                values,
                recid: RecIdBound::MinusInfinity,
            };
            let mut leaf_pgno = find_leaf_page_number(storage, file_id, schema, &search, Some(path))?;
            let pred = {
                let leaf = storage.read_page(PageId::new(file_id, leaf_pgno));
                binary_search_on_page(&leaf, true, schema, &search)?
            };
            let mut candidate = pred.map(|s| s + 1).unwrap_or(1);

            // The matching run may start exactly at the boundary between
            // this leaf and its right sibling.
            loop {
                let (max_sid, next_pid) = {
                    let leaf = storage.read_page(PageId::new(file_id, leaf_pgno));
                    let hdr = BTreePageHeaderRef::new(leaf.user_data()?);
                    (leaf.max_slot_id()?, hdr.next_pid()?)
                };
                if candidate <= max_sid {
                    break;
                }
                if next_pid == 0 {
                    return Ok((leaf_pgno, None));
                }
                leaf_pgno = next_pid;
                candidate = 1;
            }

            let rec = {
                let leaf = storage.read_page(PageId::new(file_id, leaf_pgno));
                leaf.get_record(candidate)?.to_vec()
            };
            let rec_values = schema.disassemble_payload(leaf_record_payload(&rec));
            if keys_equal(schema, values, &rec_values) {
                Ok((leaf_pgno, Some(candidate)))
            } else {
                Ok((leaf_pgno, None))
            }
        }
    }
}

fn page_stats<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    pgno: u32,
) -> BTreeResult<(usize, usize)> {
    let page = storage.read_page(PageId::new(file_id, pgno));
    let n = page.max_slot_id()? as usize;
    let hdr = BTreePageHeaderRef::new(page.user_data()?);
    Ok((n, hdr.totrlen()? as usize))
}

fn read_all_records<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    pgno: u32,
) -> BTreeResult<Vec<Vec<u8>>> {
    let page = storage.read_page(PageId::new(file_id, pgno));
    let max = page.max_slot_id()?;
    let mut out = Vec::with_capacity(max as usize);
    for s in 1..=max {
        out.push(page.get_record(s)?.to_vec());
    }
    Ok(out)
}

/// Checks `pgno`'s usage against [`MIN_PAGE_USAGE`] and, if it has fallen
/// below, tries to fix it up: collapsing the root, removing a now-empty
/// page's parent pointer and recursing, or merging/rebalancing with a
/// sibling. A page that cannot be fixed up (no sibling merge/rebalance
/// succeeds) is simply left underfull — the tree stays correct, just less
/// tightly packed, matching §4.5.4.
fn handle_min_page_usage<F: FileManager, K: KeySchema>(
    storage: &StorageManager<F>,
    file_id: FileId,
    schema: &K,
    pgno: u32,
    is_leaf: bool,
    mut path: Vec<PathEntry>,
) -> BTreeResult<()> {
    let (is_root, num_recs, totrlen) = {
        let page = storage.read_page(PageId::new(file_id, pgno));
        let hdr = BTreePageHeaderRef::new(page.user_data()?);
        (hdr.is_root()?, page.max_slot_id()? as usize, hdr.totrlen()? as usize)
    };

    if is_root {
        if !is_leaf && num_recs == 1 {
            let child = {
                let page = storage.read_page(PageId::new(file_id, pgno));
                internal_child_page_number(page.get_record(1)?)
            };
            storage.free_page(PageId::new(file_id, pgno));
            trace!(file_id, old_root = pgno, new_root_candidate = child, "collapsing root");
            return collapse_root(storage, file_id, child);
        }
        return Ok(());
    }

    if compute_page_usage(num_recs, totrlen) >= MIN_PAGE_USAGE {
        return Ok(());
    }

    let Some(parent_entry) = path.pop() else {
        return Ok(());
    };
    let parent_pgno = parent_entry.page_number;
    let lsid = parent_entry.slot_id;

    if num_recs == 0 {
        {
            let mut parent = storage.write_page(PageId::new(file_id, parent_pgno));
            let rec = parent.get_record(lsid)?;
            let reclen = max_align(rec.len()) as i32;
            parent.remove_slot(lsid)?;
            let mut hdr = BTreePageHeaderMut::new(parent.user_data_mut()?);
            let t = hdr.totrlen()?;
            hdr.set_totrlen(t - reclen)?;
        }
        storage.free_page(PageId::new(file_id, pgno));
        return handle_min_page_usage(storage, file_id, schema, parent_pgno, false, path);
    }

    let parent_max = {
        let parent = storage.read_page(PageId::new(file_id, parent_pgno));
        parent.max_slot_id()?
    };

    if lsid < parent_max {
        let right_pgno = {
            let parent = storage.read_page(PageId::new(file_id, parent_pgno));
            internal_child_page_number(parent.get_record(lsid + 1)?)
        };
        if try_merge_or_rebalance(storage, file_id, parent_pgno, lsid, pgno, right_pgno, is_leaf)? {
            return handle_min_page_usage(storage, file_id, schema, parent_pgno, false, path);
        }
    }
    if lsid > 1 {
        let left_pgno = {
            let parent = storage.read_page(PageId::new(file_id, parent_pgno));
            internal_child_page_number(parent.get_record(lsid - 1)?)
        };
        if try_merge_or_rebalance(storage, file_id, parent_pgno, lsid - 1, left_pgno, pgno, is_leaf)? {
            return handle_min_page_usage(storage, file_id, schema, parent_pgno, false, path);
        }
    }

    Ok(())
}

fn collapse_root<F: FileManager>(storage: &StorageManager<F>, file_id: FileId, mut current: u32) -> BTreeResult<()> {
    loop {
        let (is_leaf, num_recs) = {
            let page = storage.read_page(PageId::new(file_id, current));
            let hdr = BTreePageHeaderRef::new(page.user_data()?);
            (hdr.is_leaf()?, page.max_slot_id()?)
        };
        if is_leaf || num_recs != 1 {
            break;
        }
        let child = {
            let page = storage.read_page(PageId::new(file_id, current));
            internal_child_page_number(page.get_record(1)?)
        };
        storage.free_page(PageId::new(file_id, current));
        current = child;
    }

    {
        let mut page = storage.write_page(PageId::new(file_id, current));
        let mut hdr = BTreePageHeaderMut::new(page.user_data_mut()?);
        let flags = hdr.flags()? | crate::layout::IS_ROOT_FLAG;
        hdr.set_flags(flags)?;
    }

    let mut meta = storage.write_page(storage.first_page_number(file_id));
    write_root_pid(&mut meta, current)?;
    Ok(())
}

fn try_merge_or_rebalance<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    parent_pgno: u32,
    lsid: u32,
    left_pgno: u32,
    right_pgno: u32,
    is_leaf: bool,
) -> BTreeResult<bool> {
    if try_merge(storage, file_id, parent_pgno, lsid, left_pgno, right_pgno, is_leaf)? {
        return Ok(true);
    }
    try_rebalance(storage, file_id, parent_pgno, lsid, left_pgno, right_pgno, is_leaf)
}

/// Tries to fold `right_pgno`'s records into `left_pgno`, removing the
/// parent's separator at `lsid + 1`. Succeeds only if everything fits in one
/// page; leaves all pages untouched on failure.
fn try_merge<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    parent_pgno: u32,
    lsid: u32,
    left_pgno: u32,
    right_pgno: u32,
    is_leaf: bool,
) -> BTreeResult<bool> {
    let (left_n, left_len) = page_stats(storage, file_id, left_pgno)?;
    let (right_n, _) = page_stats(storage, file_id, right_pgno)?;

    let sep_rec = {
        let parent = storage.read_page(PageId::new(file_id, parent_pgno));
        parent.get_record(lsid + 1)?.to_vec()
    };

    let mut right_records = read_all_records(storage, file_id, right_pgno)?;
    if !is_leaf {
        let heap_recid = internal_heap_recid(&sep_rec);
        let child = internal_child_page_number(&right_records[0]);
        right_records[0] = build_internal_record(child, heap_recid, internal_record_payload(&sep_rec));
    }

    let total_n = left_n + right_n;
    let right_len_aligned: usize = right_records.iter().map(|r| max_align(r.len())).sum();
    let total_len = left_len + right_len_aligned;
    if compute_page_usage(total_n, total_len) > PAGE_SIZE {
        return Ok(false);
    }

    let next_pid_after = {
        let right = storage.read_page(PageId::new(file_id, right_pgno));
        let hdr = BTreePageHeaderRef::new(right.user_data()?);
        hdr.next_pid()?
    };

    {
        let mut left = storage.write_page(PageId::new(file_id, left_pgno));
        let base = left.max_slot_id()?;
        for (i, rec) in right_records.iter().enumerate() {
            match left.insert_record_at(base + 1 + i as u32, rec)? {
                page::page::outcomes::InsertOutcome::Inserted(_) => {}
                other => panic!("btree merge: left page {left_pgno} rejected a record it was sized for: {other:?}"),
            }
        }
        let mut hdr = BTreePageHeaderMut::new(left.user_data_mut()?);
        let t = hdr.totrlen()?;
        let added = right_len_aligned as i32;
        hdr.set_totrlen(t + added)?;
        hdr.set_next_pid(next_pid_after)?;
    }

    if next_pid_after != 0 {
        let mut next = storage.write_page(PageId::new(file_id, next_pid_after));
        let mut hdr = BTreePageHeaderMut::new(next.user_data_mut()?);
        hdr.set_prev_pid(left_pgno)?;
    }

    storage.free_page(PageId::new(file_id, right_pgno));

    {
        let mut parent = storage.write_page(PageId::new(file_id, parent_pgno));
        let rec = parent.get_record(lsid + 1)?;
        let reclen = max_align(rec.len()) as i32;
        parent.remove_slot(lsid + 1)?;
        let mut hdr = BTreePageHeaderMut::new(parent.user_data_mut()?);
        let t = hdr.totrlen()?;
        hdr.set_totrlen(t - reclen)?;
    }

    trace!(file_id, left_pgno, right_pgno, "merged page into left sibling");
    Ok(true)
}

/// Moves records between `left_pgno` and `right_pgno` so both clear
/// [`MIN_PAGE_USAGE`], taking from whichever currently has more and giving
/// to whichever has less, then rewrites the parent's separator in place.
/// Computes everything against off-page copies first so a page that turns
/// out not to have a valid redistribution is left untouched.
fn try_rebalance<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
    parent_pgno: u32,
    lsid: u32,
    left_pgno: u32,
    right_pgno: u32,
    is_leaf: bool,
) -> BTreeResult<bool> {
    let mut left_records = read_all_records(storage, file_id, left_pgno)?;
    let mut right_records = read_all_records(storage, file_id, right_pgno)?;

    let sep_rec = {
        let parent = storage.read_page(PageId::new(file_id, parent_pgno));
        parent.get_record(lsid + 1)?.to_vec()
    };
    if !is_leaf {
        let heap_recid = internal_heap_recid(&sep_rec);
        let child = internal_child_page_number(&right_records[0]);
        right_records[0] = build_internal_record(child, heap_recid, internal_record_payload(&sep_rec));
    }

    let usage_of =
        |recs: &[Vec<u8>]| compute_page_usage(recs.len(), recs.iter().map(|r| max_align(r.len())).sum());

    let src_is_left = usage_of(&left_records) >= usage_of(&right_records);

    loop {
        let lu = usage_of(&left_records);
        let ru = usage_of(&right_records);
        if lu >= MIN_PAGE_USAGE && ru >= MIN_PAGE_USAGE {
            break;
        }
        if src_is_left {
            if left_records.len() <= 1 || lu < MIN_PAGE_USAGE {
                break;
            }
            let moved = left_records.pop().unwrap();
            right_records.insert(0, moved);
        } else {
            if right_records.len() <= 1 || ru < MIN_PAGE_USAGE {
                break;
            }
            let moved = right_records.remove(0);
            left_records.push(moved);
        }
    }

    let lu = usage_of(&left_records);
    let ru = usage_of(&right_records);
    if lu > PAGE_SIZE || ru > PAGE_SIZE || lu < MIN_PAGE_USAGE || ru < MIN_PAGE_USAGE {
        return Ok(false);
    }

    let new_sep = if is_leaf {
        let first = &right_records[0];
        build_internal_record(right_pgno, leaf_record_id(first), record_payload(first, true))
    } else {
        let first = right_records[0].clone();
        let heap_recid = internal_heap_recid(&first);
        let payload = internal_record_payload(&first).to_vec();
        let child = internal_child_page_number(&first);
        right_records[0] = build_internal_record(child, RecordId::new(0, 0, 0), &[]);
        build_internal_record(right_pgno, heap_recid, &payload)
    };
    if new_sep.len() > MAX_RECORD_SIZE {
        return Ok(false);
    }

    rewrite_page_records(storage, file_id, left_pgno, &left_records)?;
    rewrite_page_records(storage, file_id, right_pgno, &right_records)?;

    {
        let mut parent = storage.write_page(PageId::new(file_id, parent_pgno));
        let old_len = max_align(parent.get_record(lsid + 1)?.len()) as i32;
        match parent.update_record(lsid + 1, &new_sep)? {
            UpdateOutcome::Updated => {}
            other => panic!("btree rebalance: parent {parent_pgno} rejected its updated separator: {other:?}"),
        }
        let mut hdr = BTreePageHeaderMut::new(parent.user_data_mut()?);
        let t = hdr.totrlen()?;
        hdr.set_totrlen(t - old_len + max_align(new_sep.len()) as i32)?;
    }

    trace!(file_id, left_pgno, right_pgno, "rebalanced records across siblings");
    Ok(true)
}
