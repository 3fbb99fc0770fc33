use crate::PAGE_SIZE;
use crate::errors::shift_error::ShiftError;
use crate::page::api::Page;
use crate::slot::SLOT_SIZE;

impl Page {
    /// Renumbers the slot directory by `n` slots, used by rebalance when
    /// records migrate between sibling pages.
    ///
    /// `truncate = true` drops slot ids `[1, n]`; the remaining slots
    /// renumber down starting at `1`. `truncate = false` reserves `n` new
    /// tombstoned slot ids at the low end, shifting every existing slot id
    /// up by `n`; the caller is expected to fill the reserved slots before
    /// any further slot-enumerating call. Compacts the page if the grown
    /// slot directory would otherwise overrun the record area; panics if
    /// there still isn't room after compaction, since that is a programmer
    /// error (the caller should have checked capacity first).
    pub(crate) fn shift_slots_internal(&mut self, n: u32, truncate: bool) -> Result<(), ShiftError> {
        let nslots = self.header_ref()?.nslots()? as u32;

        if truncate {
            debug_assert!(n <= nslots, "cannot drop more slots than exist");
            let new_nslots = nslots.saturating_sub(n);

            let mut dropped_occupied = 0u16;
            for sid in 1..=n.min(nslots) {
                if self.slot_array_ref()?.slot_ref(sid)?.is_occupied()? {
                    dropped_occupied += 1;
                }
            }

            for i in 1..=new_nslots {
                self.slot_array_mut()?.copy_slot(n + i, i)?;
            }

            let new_cnt = self.header_ref()?.cnt()?.saturating_sub(dropped_occupied);
            self.header_mut()?.set_nslots(new_nslots as u16)?;
            self.header_mut()?.set_cnt(new_cnt)?;
            self.trim_trailing_tombstones()?;
            return Ok(());
        }

        let new_nslots = nslots + n;
        let mut slot_array_start = PAGE_SIZE - new_nslots as usize * SLOT_SIZE;
        let mut fs_begin = self.header_ref()?.fs_begin()? as usize;
        if slot_array_start < fs_begin {
            self.compact()?;
            fs_begin = self.header_ref()?.fs_begin()? as usize;
            slot_array_start = PAGE_SIZE - new_nslots as usize * SLOT_SIZE;
        }
        assert!(
            slot_array_start >= fs_begin,
            "page {}: no room to reserve {n} slots even after compaction",
            self.page_id
        );

        for cursor in (1..=nslots).rev() {
            self.slot_array_mut()?.copy_slot(cursor, cursor + n)?;
        }
        for sid in 1..=n {
            self.slot_array_mut()?.tombstone(sid)?;
        }
        self.header_mut()?.set_nslots(new_nslots as u16)?;

        Ok(())
    }
}
