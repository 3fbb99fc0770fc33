use crate::PAGE_SIZE;
use crate::errors::slot_error::SlotError;
use crate::page::api::Page;
use crate::slot_array::{SlotArrayMut, SlotArrayRef};
use binary_helpers::align::max_align;

/// Internal (non-public) helpers shared by insert/delete/update/compaction.
impl Page {
    #[inline]
    pub(crate) fn slot_array_ref(&self) -> Result<SlotArrayRef<'_>, SlotError> {
        SlotArrayRef::new(&self.data[..])
    }

    #[inline]
    pub(crate) fn slot_array_mut(&mut self) -> Result<SlotArrayMut<'_>, SlotError> {
        SlotArrayMut::new(&mut self.data[..])
    }

    /// Occupied `(slot_id, offset, length)` triples, ascending by slot id.
    pub(crate) fn occupied_slots(&self) -> Result<Vec<(u32, i32, i32)>, SlotError> {
        let nslots = self.header_ref()?.nslots()? as u32;
        let slots = self.slot_array_ref()?;
        let mut out = Vec::new();
        for sid in 1..=nslots {
            let slot = slots.slot_ref(sid)?;
            if slot.is_occupied()? {
                out.push((sid, slot.offset()?, slot.length()?));
            }
        }
        Ok(out)
    }

    /// Compacts the record-data area: occupied records are moved down to
    /// contiguous, max-aligned offsets starting at `ph_sz`, preserving slot
    /// ids. `fs_begin` is updated and `has_hole` cleared.
    pub(crate) fn compact(&mut self) -> Result<(), SlotError> {
        let ph_sz = self.header_ref()?.ph_sz()? as usize;

        let mut occupied = self.occupied_slots()?;
        occupied.sort_by_key(|&(_, offset, _)| offset);

        let mut write_head = ph_sz;
        let mut moves = Vec::with_capacity(occupied.len());
        for (sid, offset, length) in occupied {
            let aligned = max_align(write_head);
            moves.push((sid, offset as usize, length as usize, aligned));
            write_head = aligned + length as usize;
        }

        // Move bytes low-to-high so earlier moves never clobber later sources.
        for &(_, src_offset, length, dst_offset) in &moves {
            if src_offset != dst_offset {
                let (src, dst) = (src_offset..src_offset + length, dst_offset);
                // Safe: src and [dst, dst+length) never overlap because
                // dst <= src for every move once sorted by ascending offset.
                self.data.copy_within(src, dst);
            }
        }

        for &(sid, _, length, dst_offset) in &moves {
            self.slot_array_mut()?
                .set_slot(sid, dst_offset as i32, length as i32)?;
        }

        let mut header = self.header_mut()?;
        header.set_fs_begin(write_head as i32)?;
        header.set_has_hole(false)?;

        Ok(())
    }

    /// Free contiguous space between `fs_begin` and the slot-array start.
    pub(crate) fn contiguous_free_space(&self) -> Result<usize, SlotError> {
        let header = self.header_ref()?;
        let fs_begin = header.fs_begin()? as usize;
        let nslots = header.nslots()? as usize;
        let slot_array_start = PAGE_SIZE - nslots * crate::slot::SLOT_SIZE;
        Ok(slot_array_start.saturating_sub(fs_begin))
    }

    /// Total free bytes on the page if it were perfectly compacted: space
    /// between `ph_sz` and the slot-array start, minus occupied record
    /// bytes.
    pub(crate) fn compactable_free_space(&self) -> Result<usize, SlotError> {
        let header = self.header_ref()?;
        let ph_sz = header.ph_sz()? as usize;
        let nslots = header.nslots()? as usize;
        let slot_array_start = PAGE_SIZE - nslots * crate::slot::SLOT_SIZE;
        let region = slot_array_start.saturating_sub(ph_sz);
        let occupied: usize = self
            .occupied_slots()?
            .iter()
            .map(|&(_, _, len)| max_align(len as usize))
            .sum();
        Ok(region.saturating_sub(occupied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_id::PageId;

    #[test]
    fn compact_reclaims_space_from_a_tombstoned_slot() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();

        let first = page.insert_record_internal(&[1, 2, 3, 4]).unwrap();
        let second = page.insert_record_internal(&[5, 6, 7, 8, 9]).unwrap();
        let first_sid = match first {
            crate::page::outcomes::InsertOutcome::Inserted(sid) => sid,
            other => panic!("unexpected outcome {other:?}"),
        };
        let _ = second;

        page.erase_record_internal(first_sid).unwrap();
        let before = page.header_ref().unwrap().fs_begin().unwrap();
        page.compact().unwrap();
        let after = page.header_ref().unwrap().fs_begin().unwrap();
        assert!(after <= before);
        assert!(!page.header_ref().unwrap().has_hole().unwrap());
    }

    #[test]
    fn compact_preserves_slot_ids_and_bytes() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        page.insert_record_internal(&[9, 9, 9]).unwrap();
        let second = page.insert_record_internal(&[1, 2]).unwrap();
        let second_sid = match second {
            crate::page::outcomes::InsertOutcome::Inserted(sid) => sid,
            other => panic!("unexpected outcome {other:?}"),
        };
        page.erase_record_internal(1).unwrap();
        page.compact().unwrap();
        assert_eq!(page.get_record_internal(second_sid).unwrap(), &[1, 2]);
    }
}
