//! Forward range scans per §4.6: `StartScan` descends to the first
//! qualifying leaf slot, `Next` walks forward across leaf boundaries via
//! `next_pid`, stopping once the (optional) upper bound is passed.

use crate::datum::{Datum, KeySchema};
use crate::descent::{find_leaf_page_number, find_leftmost_leaf};
use crate::errors::BTreeResult;
use crate::layout::{BTreePageHeaderRef, leaf_record_id, leaf_record_payload};
use crate::record_id::{RecIdBound, RecordId};
use crate::search::{SearchKey, binary_search_on_page, compare_key_values};
use file::api::FileManager;
use page::page_id::{FileId, PageId};
use std::cmp::Ordering;
use storage_api::storage_manager::StorageManager;

/// A forward cursor over a contiguous key range. Re-pins pages on demand
/// rather than holding one across calls, so it never holds a buffer pin
/// between `Next` calls.
pub struct BTreeIterator<'s, F: FileManager, K: KeySchema> {
    storage: &'s StorageManager<F>,
    file_id: FileId,
    schema: &'s K,
    current_pgno: u32,
    current_sid: u32,
    max_sid: u32,
    upper: Option<Vec<Datum>>,
    upper_strict: bool,
    done: bool,
}

/// Starts a scan over `[lower, upper]` (or half/fully open if either bound is
/// `None`), honoring `lower_strict`/`upper_strict`.
pub fn start_scan<'s, F: FileManager, K: KeySchema>(
    storage: &'s StorageManager<F>,
    file_id: FileId,
    schema: &'s K,
    lower: Option<&[Datum]>,
    lower_strict: bool,
    upper: Option<&[Datum]>,
    upper_strict: bool,
) -> BTreeResult<BTreeIterator<'s, F, K>> {
    let (leaf_pgno, start_sid) = match lower {
        None => (find_leftmost_leaf(storage, file_id)?, 0u32),
        Some(values) => {
            let recid_bound = if lower_strict {
                RecIdBound::PlusInfinity
            } else {
                RecIdBound::MinusInfinity
            };
            let search = SearchKey {
                values,
                recid: recid_bound,
            };
            let pgno = find_leaf_page_number(storage, file_id, schema, &search, None)?;
            let pred = {
                let leaf = storage.read_page(PageId::new(file_id, pgno));
                binary_search_on_page(&leaf, true, schema, &search)?
            };
            (pgno, pred.unwrap_or(0))
        }
    };

    let max_sid = {
        let page = storage.read_page(PageId::new(file_id, leaf_pgno));
        page.max_slot_id()?
    };

    let mut it = BTreeIterator {
        storage,
        file_id,
        schema,
        current_pgno: leaf_pgno,
        current_sid: start_sid,
        max_sid,
        upper: upper.map(|u| u.to_vec()),
        upper_strict,
        done: false,
    };
    // `start_sid` sits one slot before the first qualifying record (or on
    // slot 0 of the leftmost leaf); advance once so the cursor is already on
    // the first item, or correctly marked done for an empty range.
    it.next()?;
    Ok(it)
}

impl<'s, F: FileManager, K: KeySchema> BTreeIterator<'s, F, K> {
    /// Advances to the next qualifying record. Returns `false` (and marks
    /// the scan done) once the leaf list is exhausted or the upper bound is
    /// passed.
    pub fn next(&mut self) -> BTreeResult<bool> {
        if self.done {
            return Ok(false);
        }

        loop {
            self.current_sid += 1;
            if self.current_sid > self.max_sid {
                let next_pid = {
                    let page = self.storage.read_page(PageId::new(self.file_id, self.current_pgno));
                    let hdr = BTreePageHeaderRef::new(page.user_data()?);
                    hdr.next_pid()?
                };
                if next_pid == 0 {
                    self.done = true;
                    return Ok(false);
                }
                self.current_pgno = next_pid;
                self.max_sid = {
                    let page = self.storage.read_page(PageId::new(self.file_id, self.current_pgno));
                    page.max_slot_id()?
                };
                self.current_sid = 0;
                continue;
            }
            break;
        }

        if let Some(upper) = &self.upper {
            let page = self.storage.read_page(PageId::new(self.file_id, self.current_pgno));
            let rec = page.get_record(self.current_sid)?;
            let values = self.schema.disassemble_payload(leaf_record_payload(rec));
            let cmp = compare_key_values(self.schema, &values, upper);
            let out_of_range = if self.upper_strict {
                cmp != Ordering::Less
            } else {
                cmp == Ordering::Greater
            };
            if out_of_range {
                self.done = true;
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Whether the cursor currently sits on a valid record.
    pub fn is_at_valid_item(&self) -> bool {
        !self.done
    }

    /// The key payload (excluding the recid header) of the current record.
    pub fn current_item(&self) -> BTreeResult<Vec<u8>> {
        let page = self.storage.read_page(PageId::new(self.file_id, self.current_pgno));
        let rec = page.get_record(self.current_sid)?;
        Ok(leaf_record_payload(rec).to_vec())
    }

    /// The heap recid of the current record.
    pub fn current_record_id(&self) -> BTreeResult<RecordId> {
        let page = self.storage.read_page(PageId::new(self.file_id, self.current_pgno));
        let rec = page.get_record(self.current_sid)?;
        Ok(leaf_record_id(rec))
    }

    /// Ends the scan; idempotent.
    pub fn end_scan(&mut self) {
        self.done = true;
    }
}
