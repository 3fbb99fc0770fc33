use crate::errors::delete_error::DeleteError;
use crate::errors::slot_error::SlotError;
use crate::page::api::Page;
use crate::slot_array::MIN_SLOT_ID;
use binary_helpers::align::max_align;
use tracing::trace;

impl Page {
    /// Tombstones the slot. Reclaims space immediately if its payload was
    /// the topmost record; otherwise flags the page as holey for a later
    /// compaction. Trims trailing tombstones. Returns `false` if the slot
    /// was already tombstoned.
    pub(crate) fn erase_record_internal(&mut self, sid: u32) -> Result<bool, DeleteError> {
        let nslots = self.header_ref()?.nslots()? as u32;
        if sid < MIN_SLOT_ID || sid > nslots {
            return Err(SlotError::InvalidSlot {
                slot_index: sid as usize,
            }
            .into());
        }

        let (offset, length) = {
            let slot = self.slot_array_ref()?.slot_ref(sid)?;
            if !slot.is_occupied()? {
                return Ok(false);
            }
            (slot.offset()? as usize, slot.length()? as usize)
        };

        self.slot_array_mut()?.tombstone(sid)?;

        let aligned_len = max_align(length);
        let mut header = self.header_mut()?;
        let fs_begin = header.fs_begin()? as usize;
        if offset + aligned_len == fs_begin {
            header.set_fs_begin(offset as i32)?;
        } else {
            header.set_has_hole(true)?;
        }
        let new_cnt = header.cnt()?.saturating_sub(1);
        header.set_cnt(new_cnt)?;
        drop(header);

        self.trim_trailing_tombstones()?;

        trace!(page = %self.page_id, slot_id = sid, "erased record");
        Ok(true)
    }

    /// Removes the slot id itself, shifting `[sid + 1, nslots]` left by one.
    pub(crate) fn remove_slot_internal(&mut self, sid: u32) -> Result<(), DeleteError> {
        let nslots = self.header_ref()?.nslots()? as u32;
        if sid < MIN_SLOT_ID || sid > nslots {
            return Err(SlotError::InvalidSlot {
                slot_index: sid as usize,
            }
            .into());
        }

        let was_occupied = self.slot_array_ref()?.slot_ref(sid)?.is_occupied()?;

        for cursor in sid..nslots {
            self.slot_array_mut()?.copy_slot(cursor + 1, cursor)?;
        }

        if was_occupied {
            let new_cnt = self.header_ref()?.cnt()?.saturating_sub(1);
            self.header_mut()?.set_cnt(new_cnt)?;
        }
        self.header_mut()?.set_nslots((nslots - 1) as u16)?;
        self.trim_trailing_tombstones()?;

        Ok(())
    }

    /// Lowers `nslots` while the highest-numbered slot is tombstoned, so
    /// `MaxSlotId` always refers to an occupied slot on a non-empty page.
    pub(crate) fn trim_trailing_tombstones(&mut self) -> Result<(), DeleteError> {
        let mut nslots = self.header_ref()?.nslots()? as u32;
        while nslots >= MIN_SLOT_ID {
            if self.slot_array_ref()?.slot_ref(nslots)?.is_occupied()? {
                break;
            }
            nslots -= 1;
        }
        self.header_mut()?.set_nslots(nslots as u16)?;
        Ok(())
    }
}
