use crate::PAGE_SIZE;
use crate::errors::page_error::{PageResult, WithPageId};
use crate::errors::page_op_error::PageOpError;
use crate::errors::slot_error::SlotError;
use crate::header::{DEFAULT_USER_DATA_OFFSET, SLOTTED_HEADER_OFFSET, SLOTTED_HEADER_SIZE};
use crate::page::outcomes::{InsertOutcome, UpdateOutcome};
use crate::page_id::PageId;
use crate::slot::SLOT_SIZE;
use crate::slot_array::MIN_SLOT_ID;
use binary_helpers::align::max_align;

/// Re-exported so every submodule (`ctors`, `accessors`, `insert`, ...) can
/// refer to the struct as `crate::page::api::Page`.
pub use crate::page::Page;

/// Public API surface of the `Page` struct. All public methods return
/// `PageResult`, wrapping the underlying operation error with the page id.
impl Page {
    /// Formats the page as an empty `SlottedPage` reserving `user_data_size`
    /// bytes for the caller.
    pub fn initialize_page(&mut self, user_data_size: usize) -> PageResult<()> {
        self.initialize_page_internal(user_data_size)
            .map_err(PageOpError::from)
            .with_page_id(self.page_id)
    }

    /// The reserved user-data region: a fixed-size area just past the
    /// `SlottedPage` header, never moved by insert/update/compaction.
    pub fn user_data(&self) -> PageResult<&[u8]> {
        self.user_data_internal()
            .map_err(PageOpError::from)
            .with_page_id(self.page_id)
    }

    /// Mutable counterpart of [`Page::user_data`].
    pub fn user_data_mut(&mut self) -> PageResult<&mut [u8]> {
        let page_id = self.page_id;
        self.user_data_mut_internal().map_err(PageOpError::from).with_page_id(page_id)
    }

    /// The smallest slot id a page can ever have: always `1`.
    pub fn min_slot_id(&self) -> u32 {
        MIN_SLOT_ID
    }

    /// The highest slot id currently in the directory (occupied, per the
    /// trailing-tombstone-trim invariant, unless the page is empty).
    pub fn max_slot_id(&self) -> PageResult<u32> {
        self.header_ref()
            .and_then(|h| h.nslots())
            .map(u32::from)
            .map_err(PageOpError::from)
            .with_page_id(self.page_id)
    }

    /// Number of occupied slots.
    pub fn record_count(&self) -> PageResult<u16> {
        self.header_ref()
            .and_then(|h| h.cnt())
            .map_err(PageOpError::from)
            .with_page_id(self.page_id)
    }

    /// Whether `sid` currently holds a live record. Errors on an
    /// out-of-range slot id.
    pub fn is_occupied(&self, sid: u32) -> PageResult<bool> {
        let page_id = self.page_id;
        (|| -> Result<bool, PageOpError> {
            let nslots = self.header_ref()?.nslots()? as u32;
            if sid < MIN_SLOT_ID || sid > nslots {
                return Err(SlotError::InvalidSlot {
                    slot_index: sid as usize,
                }
                .into());
            }
            Ok(self.slot_array_ref()?.slot_ref(sid)?.is_occupied()?)
        })()
        .with_page_id(page_id)
    }

    /// Borrows the bytes of the record stored at `sid`.
    pub fn get_record(&self, sid: u32) -> PageResult<&[u8]> {
        self.get_record_internal(sid)
            .map_err(PageOpError::from)
            .with_page_id(self.page_id)
    }

    /// Inserts `rec`, reusing the smallest tombstoned slot id if any,
    /// otherwise appending a new one.
    pub fn insert_record(&mut self, rec: &[u8]) -> PageResult<InsertOutcome> {
        let page_id = self.page_id;
        self.insert_record_internal(rec).map_err(PageOpError::from).with_page_id(page_id)
    }

    /// Inserts `rec` at exactly `sid`, shifting later slots right if needed.
    pub fn insert_record_at(&mut self, sid: u32, rec: &[u8]) -> PageResult<InsertOutcome> {
        let page_id = self.page_id;
        self.insert_record_at_internal(sid, rec)
            .map_err(PageOpError::from)
            .with_page_id(page_id)
    }

    /// Tombstones `sid`. Returns `false` if it was already tombstoned.
    pub fn erase_record(&mut self, sid: u32) -> PageResult<bool> {
        let page_id = self.page_id;
        self.erase_record_internal(sid).map_err(PageOpError::from).with_page_id(page_id)
    }

    /// Overwrites the record at `sid` with `rec`, relocating or compacting
    /// as necessary.
    pub fn update_record(&mut self, sid: u32, rec: &[u8]) -> PageResult<UpdateOutcome> {
        let page_id = self.page_id;
        self.update_record_internal(sid, rec)
            .map_err(PageOpError::from)
            .with_page_id(page_id)
    }

    /// Removes the slot id itself, shifting `[sid + 1, nslots]` left by one.
    pub fn remove_slot(&mut self, sid: u32) -> PageResult<()> {
        let page_id = self.page_id;
        self.remove_slot_internal(sid).map_err(PageOpError::from).with_page_id(page_id)
    }

    /// Renumbers the slot directory by `n` slots; see
    /// [`Page::shift_slots_internal`] for the truncate/reserve semantics.
    pub fn shift_slots(&mut self, n: u32, truncate: bool) -> PageResult<()> {
        let page_id = self.page_id;
        self.shift_slots_internal(n, truncate)
            .map_err(PageOpError::from)
            .with_page_id(page_id)
    }

    /// Static estimator: free space left on an otherwise-empty page that
    /// reserves `user_data_size` bytes and holds `num_recs` max-aligned
    /// records totalling `total_reclen` bytes, or `-1` if they wouldn't fit.
    pub fn compute_free_space(user_data_size: usize, num_recs: usize, total_reclen: usize) -> i32 {
        let ph_sz = max_align(SLOTTED_HEADER_OFFSET + SLOTTED_HEADER_SIZE + user_data_size);
        let used = ph_sz + num_recs * SLOT_SIZE + total_reclen;
        if used > PAGE_SIZE {
            -1
        } else {
            (PAGE_SIZE - used) as i32
        }
    }

    /// Raw page bytes, for handing to the file manager on flush.
    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    /// Mutable raw page bytes, for the file manager to fill on a page read.
    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_free_space_rejects_oversized_workload() {
        assert_eq!(Page::compute_free_space(0, PAGE_SIZE, 0), -1);
    }

    #[test]
    fn compute_free_space_accounts_for_header_and_slot_directory() {
        let free = Page::compute_free_space(0, 1, 16);
        let expected = (PAGE_SIZE - DEFAULT_USER_DATA_OFFSET - SLOT_SIZE - 16) as i32;
        assert_eq!(free, expected);
    }

    #[test]
    fn full_insert_get_erase_round_trip_through_the_public_api() {
        let page_id = PageId::new(1, 7);
        let mut page = Page::new_zeroed(page_id);
        page.initialize_page(0).unwrap();

        let outcome = page.insert_record(b"hello").unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted(1));
        assert_eq!(page.get_record(1).unwrap(), b"hello");
        assert_eq!(page.record_count().unwrap(), 1);
        assert!(page.is_occupied(1).unwrap());

        assert!(page.erase_record(1).unwrap());
        assert!(!page.erase_record(1).unwrap());
    }
}
