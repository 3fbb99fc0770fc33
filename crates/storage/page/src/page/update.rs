use crate::PAGE_SIZE;
use crate::errors::slot_error::SlotError;
use crate::errors::update_error::UpdateError;
use crate::page::api::Page;
use crate::page::outcomes::UpdateOutcome;
use crate::slot::SLOT_SIZE;
use crate::slot_array::MIN_SLOT_ID;
use binary_helpers::align::max_align;
use tracing::trace;

impl Page {
    /// Updates the record at `sid` in place when possible; otherwise tries
    /// to extend it, then the current free space, then a compaction, and
    /// finally gives up in favor of the caller reinserting it elsewhere.
    pub(crate) fn update_record_internal(&mut self, sid: u32, rec: &[u8]) -> Result<UpdateOutcome, UpdateError> {
        let nslots = self.header_ref()?.nslots()? as u32;
        if sid < MIN_SLOT_ID || sid > nslots {
            return Err(SlotError::InvalidSlot {
                slot_index: sid as usize,
            }
            .into());
        }

        let (old_offset, old_length) = {
            let slot = self.slot_array_ref()?.slot_ref(sid)?;
            if !slot.is_occupied()? {
                return Err(SlotError::InvalidSlot {
                    slot_index: sid as usize,
                }
                .into());
            }
            (slot.offset()? as usize, slot.length()? as usize)
        };

        let old_aligned = max_align(old_length);
        let new_aligned = max_align(rec.len());

        // Fits in the space the old record already occupies.
        if new_aligned <= old_aligned {
            self.data[old_offset..old_offset + rec.len()].copy_from_slice(rec);
            self.slot_array_mut()?.slot_mut(sid)?.set_length(rec.len() as i32)?;
            trace!(page = %self.page_id, slot_id = sid, "updated record in place");
            return Ok(UpdateOutcome::Updated);
        }

        let fs_begin = self.header_ref()?.fs_begin()? as usize;
        let is_topmost = old_offset + old_aligned == fs_begin;

        if is_topmost {
            let slot_array_start = PAGE_SIZE - nslots as usize * SLOT_SIZE;
            if old_offset + new_aligned <= slot_array_start {
                self.data[old_offset..old_offset + rec.len()].copy_from_slice(rec);
                self.slot_array_mut()?.slot_mut(sid)?.set_length(rec.len() as i32)?;
                self.header_mut()?.set_fs_begin((old_offset + new_aligned) as i32)?;
                trace!(page = %self.page_id, slot_id = sid, "extended topmost record in place");
                return Ok(UpdateOutcome::Updated);
            }
        }

        // Try to relocate into the current contiguous free space, leaving
        // the old bytes behind as a hole for a later compaction.
        let slot_array_start = PAGE_SIZE - nslots as usize * SLOT_SIZE;
        let contiguous = slot_array_start.saturating_sub(fs_begin);
        if new_aligned <= contiguous {
            let offset = fs_begin;
            self.data[offset..offset + rec.len()].copy_from_slice(rec);
            {
                let mut slots = self.slot_array_mut()?;
                let mut slot = slots.slot_mut(sid)?;
                slot.set_offset(offset as i32)?;
                slot.set_length(rec.len() as i32)?;
            }
            self.header_mut()?.set_fs_begin((offset + new_aligned) as i32)?;
            self.header_mut()?.set_has_hole(true)?;
            trace!(page = %self.page_id, slot_id = sid, "relocated record into free space");
            return Ok(UpdateOutcome::Updated);
        }

        // Try after compaction.
        self.compact()?;
        let fs_begin = self.header_ref()?.fs_begin()? as usize;
        let contiguous = slot_array_start.saturating_sub(fs_begin);
        if new_aligned <= contiguous {
            let offset = fs_begin;
            self.data[offset..offset + rec.len()].copy_from_slice(rec);
            {
                let mut slots = self.slot_array_mut()?;
                let mut slot = slots.slot_mut(sid)?;
                slot.set_offset(offset as i32)?;
                slot.set_length(rec.len() as i32)?;
            }
            self.header_mut()?.set_fs_begin((offset + new_aligned) as i32)?;
            trace!(page = %self.page_id, slot_id = sid, "relocated record after compaction");
            return Ok(UpdateOutcome::Updated);
        }

        // Would the record fit at all on a freshly emptied page?
        let ph_sz = self.header_ref()?.ph_sz()? as usize;
        let empty_page_capacity = (PAGE_SIZE - SLOT_SIZE).saturating_sub(ph_sz);
        if new_aligned <= empty_page_capacity {
            self.erase_record_internal(sid)?;
            trace!(page = %self.page_id, slot_id = sid, "moved record off page for reinsertion");
            Ok(UpdateOutcome::MovedOff)
        } else {
            Ok(UpdateOutcome::WontFit)
        }
    }
}
