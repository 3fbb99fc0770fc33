use crate::PAGE_SIZE;
use crate::errors::header_error::HeaderError;
use crate::header::{SLOTTED_HEADER_OFFSET, SLOTTED_HEADER_SIZE};
use crate::page::api::Page;
use crate::page_id::PageId;
use binary_helpers::align::max_align;

impl Page {
    /// Creates a new page with all bytes zeroed. Does not format any header;
    /// callers must follow with `initialize_page` (or `new_from_bytes` when
    /// reading an existing page off disk).
    pub fn new_zeroed(page_id: PageId) -> Self {
        Self {
            page_id,
            data: Box::new([0; PAGE_SIZE]),
        }
    }

    /// Wraps an existing, already-formatted page buffer.
    pub fn new_from_bytes(bytes: Box<[u8; PAGE_SIZE]>, page_id: PageId) -> Self {
        Self {
            data: bytes,
            page_id,
        }
    }

    /// Formats the page as an empty `SlottedPage` reserving `user_data_size`
    /// bytes for the caller right after the header. Does not touch the
    /// file-manager-owned file header.
    pub(crate) fn initialize_page_internal(&mut self, user_data_size: usize) -> Result<(), HeaderError> {
        let ph_sz = max_align(SLOTTED_HEADER_OFFSET + SLOTTED_HEADER_SIZE + user_data_size);

        // Must leave room for at least one minimal record plus its slot.
        if ph_sz + crate::slot::SLOT_SIZE > PAGE_SIZE {
            return Err(HeaderError::HeaderTooLarge {
                user_data_size,
                page_size: PAGE_SIZE,
            });
        }

        self.data[SLOTTED_HEADER_OFFSET..ph_sz].fill(0);

        let mut header = self.header_mut()?;
        header.initialize(ph_sz as i32, ph_sz as i32)?;

        Ok(())
    }
}
