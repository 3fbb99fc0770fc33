use crate::errors::read_row_error::ReadRowError;
use crate::errors::slot_error::SlotError;
use crate::page::api::Page;
use crate::slot_array::MIN_SLOT_ID;

/// Internal row access methods for the `Page` struct.
impl Page {
    /// Retrieves the bytes of the record stored at `sid`.
    pub(crate) fn get_record_internal(&self, sid: u32) -> Result<&[u8], ReadRowError> {
        let nslots = self.header_ref()?.nslots()? as u32;
        if sid < MIN_SLOT_ID || sid > nslots {
            return Err(SlotError::InvalidSlot {
                slot_index: sid as usize,
            }
            .into());
        }

        let slot = self.slot_array_ref()?.slot_ref(sid)?;
        if !slot.is_occupied()? {
            return Err(ReadRowError::TombstonedSlot { slot_id: sid });
        }

        let (offset, length) = (slot.offset()? as usize, slot.length()? as usize);
        Ok(&self.data[offset..offset + length])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_id::PageId;

    #[test]
    fn reads_back_an_inserted_record() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        page.insert_record_internal(&[1, 2, 3]).unwrap();
        assert_eq!(page.get_record_internal(1).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn rejects_out_of_range_slot() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        assert!(matches!(
            page.get_record_internal(1),
            Err(ReadRowError::SlotError(SlotError::InvalidSlot { slot_index: 1 }))
        ));
    }

    #[test]
    fn rejects_reading_a_tombstoned_slot() {
        let mut page = Page::new_zeroed(PageId::new(1, 0));
        page.initialize_page_internal(0).unwrap();
        page.insert_record_internal(&[1]).unwrap();
        page.erase_record_internal(1).unwrap();
        assert!(matches!(
            page.get_record_internal(1),
            Err(ReadRowError::TombstonedSlot { slot_id: 1 })
        ));
    }
}
