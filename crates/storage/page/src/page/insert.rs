use crate::PAGE_SIZE;
use crate::errors::insert_error::InsertError;
use crate::page::api::Page;
use crate::page::outcomes::InsertOutcome;
use crate::slot::SLOT_SIZE;
use crate::slot_array::MIN_SLOT_ID;
use binary_helpers::align::max_align;
use tracing::trace;

impl Page {
    /// Chooses the smallest tombstoned slot id if any, otherwise `nslots + 1`.
    pub(crate) fn insert_record_internal(&mut self, rec: &[u8]) -> Result<InsertOutcome, InsertError> {
        let nslots = self.header_ref()?.nslots()? as u32;
        let mut reuse = None;
        {
            let slots = self.slot_array_ref()?;
            for sid in MIN_SLOT_ID..=nslots {
                if !slots.slot_ref(sid)?.is_occupied()? {
                    reuse = Some(sid);
                    break;
                }
            }
        }
        let sid = reuse.unwrap_or(nslots + 1);
        self.place_record(sid, rec, reuse.is_none())
    }

    /// Inserts at an exact slot id, preserving ordering of existing slots.
    pub(crate) fn insert_record_at_internal(
        &mut self,
        sid: u32,
        rec: &[u8],
    ) -> Result<InsertOutcome, InsertError> {
        let nslots = self.header_ref()?.nslots()? as u32;
        if sid < MIN_SLOT_ID || sid > nslots + 1 {
            return Err(InsertError::InvalidInsertionSlot { slot_id: sid });
        }

        let occupied_at_sid = sid <= nslots && self.slot_array_ref()?.slot_ref(sid)?.is_occupied()?;

        if sid <= nslots && occupied_at_sid {
            // First make sure there's room for the new slot-directory entry
            // before committing to any shift.
            let new_slot_array_start = PAGE_SIZE - (nslots as usize + 1) * SLOT_SIZE;
            let fs_begin = self.header_ref()?.fs_begin()? as usize;
            if new_slot_array_start < fs_begin {
                return Ok(InsertOutcome::WontFit);
            }
            let mut cursor = nslots;
            loop {
                self.slot_array_mut()?.copy_slot(cursor, cursor + 1)?;
                if cursor == sid {
                    break;
                }
                cursor -= 1;
            }
            self.header_mut()?.set_nslots(nslots as u16 + 1)?;
        }

        self.place_record(sid, rec, !occupied_at_sid && sid > nslots)
    }

    /// Writes `rec`'s bytes into the record area and points slot `sid` at
    /// them, growing the slot directory by one entry first if `slot_is_new`.
    /// Never mutates the page when returning `WontFit`/`WontFitCompactable`.
    fn place_record(&mut self, sid: u32, rec: &[u8], slot_is_new: bool) -> Result<InsertOutcome, InsertError> {
        let aligned_len = max_align(rec.len());
        let nslots_after = if slot_is_new {
            self.header_ref()?.nslots()? as usize + 1
        } else {
            self.header_ref()?.nslots()? as usize
        };
        let slot_array_start_after = PAGE_SIZE - nslots_after * SLOT_SIZE;
        let fs_begin = self.header_ref()?.fs_begin()? as usize;

        if slot_array_start_after < fs_begin {
            return Ok(InsertOutcome::WontFit);
        }

        let contiguous = slot_array_start_after - fs_begin;
        if aligned_len > contiguous {
            let ph_sz = self.header_ref()?.ph_sz()? as usize;
            let region = slot_array_start_after.saturating_sub(ph_sz);
            let occupied_after_compaction: usize = self
                .occupied_slots()?
                .iter()
                .map(|&(_, _, len)| max_align(len as usize))
                .sum();
            let free_after_compaction = region.saturating_sub(occupied_after_compaction);
            return if aligned_len <= free_after_compaction {
                Ok(InsertOutcome::WontFitCompactable)
            } else {
                Ok(InsertOutcome::WontFit)
            };
        }

        let offset = fs_begin;
        self.data[offset..offset + rec.len()].copy_from_slice(rec);

        if slot_is_new {
            let new_nslots = self.header_ref()?.nslots()? + 1;
            self.header_mut()?.set_nslots(new_nslots)?;
        }
        self.slot_array_mut()?
            .set_slot(sid, offset as i32, rec.len() as i32)?;

        let new_cnt = self.header_ref()?.cnt()? + 1;
        self.header_mut()?.set_cnt(new_cnt)?;
        self.header_mut()?.set_fs_begin((fs_begin + aligned_len) as i32)?;

        trace!(page = %self.page_id, slot_id = sid, len = rec.len(), "inserted record");

        Ok(InsertOutcome::Inserted(sid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_id::PageId;

    #[test]
    fn inserts_into_a_fresh_page_at_slot_one() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        let outcome = page.insert_record_internal(&[1, 2, 3]).unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted(1));
    }

    #[test]
    fn reuses_the_smallest_tombstoned_slot() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        page.insert_record_internal(&[1]).unwrap();
        page.insert_record_internal(&[2]).unwrap();
        page.erase_record_internal(1).unwrap();
        let outcome = page.insert_record_internal(&[9, 9]).unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted(1));
    }

    #[test]
    fn insert_record_at_shifts_existing_slots_right() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        page.insert_record_internal(&[1]).unwrap();
        page.insert_record_internal(&[2]).unwrap();

        let outcome = page.insert_record_at_internal(1, &[9]).unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted(1));
        assert_eq!(page.get_record_internal(1).unwrap(), &[9]);
        assert_eq!(page.get_record_internal(2).unwrap(), &[1]);
        assert_eq!(page.get_record_internal(3).unwrap(), &[2]);
    }

    #[test]
    fn rejects_slot_id_far_out_of_range() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        let result = page.insert_record_at_internal(5, &[1]);
        assert!(matches!(result, Err(InsertError::InvalidInsertionSlot { slot_id: 5 })));
    }

    #[test]
    fn wont_fit_when_record_exceeds_even_an_empty_page() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        let huge = vec![0u8; PAGE_SIZE];
        let outcome = page.insert_record_internal(&huge).unwrap();
        assert_eq!(outcome, InsertOutcome::WontFit);
    }
}
