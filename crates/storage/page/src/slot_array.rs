//! Slot Array Handling for Slotted Pages
//! -------------------------------------
//!
//! Zero-copy immutable and mutable views (`SlotArrayRef`/`SlotArrayMut`) over
//! the slot directory of a slotted page. The directory grows **downward from
//! the end of the page**: slot id `s` (1-based) lives at byte
//! `PAGE_SIZE - s * SLOT_SIZE`. Slot id `0` is never valid; the minimum slot
//! id on any page is `1`.
//!
//! These views borrow the *whole page buffer*, not just the slot region,
//! since the addressing formula is anchored to `PAGE_SIZE` rather than to the
//! length of a sub-slice.

use crate::PAGE_SIZE;
use crate::errors::slot_error::SlotError;
use crate::slot::{SLOT_SIZE, SlotMut, SlotRef};
use std::ops::Range;

/// Smallest valid slot id on any page.
pub(crate) const MIN_SLOT_ID: u32 = 1;

fn slot_range(slot_id: u32) -> Result<Range<usize>, SlotError> {
    if slot_id < MIN_SLOT_ID {
        return Err(SlotError::InvalidSlot {
            slot_index: slot_id as usize,
        });
    }
    let end = PAGE_SIZE
        .checked_sub((slot_id as usize - 1) * SLOT_SIZE)
        .ok_or(SlotError::InvalidSlot {
            slot_index: slot_id as usize,
        })?;
    let start = end
        .checked_sub(SLOT_SIZE)
        .ok_or(SlotError::InvalidSlot {
            slot_index: slot_id as usize,
        })?;
    Ok(start..end)
}

/// Immutable zero-copy view into the slot directory of a slotted page.
#[derive(Debug)]
pub(crate) struct SlotArrayRef<'a> {
    page: &'a [u8],
}

impl<'a> SlotArrayRef<'a> {
    /// Wraps the full page buffer. `page.len()` must be exactly `PAGE_SIZE`.
    pub(crate) fn new(page: &'a [u8]) -> Result<Self, SlotError> {
        if page.len() != PAGE_SIZE {
            return Err(SlotError::SlotRegionSizeMismatch {
                expected_size: PAGE_SIZE,
                actual_size: page.len(),
            });
        }
        Ok(Self { page })
    }

    /// Returns a read-only view of the slot at `slot_id` (1-based).
    pub(crate) fn slot_ref(&self, slot_id: u32) -> Result<SlotRef<'a>, SlotError> {
        let range = slot_range(slot_id)?;
        let bytes = self.page.get(range).ok_or(SlotError::InvalidSlot {
            slot_index: slot_id as usize,
        })?;
        SlotRef::new(slot_id, bytes)
    }
}

/// Mutable zero-copy view into the slot directory of a slotted page.
#[derive(Debug)]
pub(crate) struct SlotArrayMut<'a> {
    page: &'a mut [u8],
}

impl<'a> SlotArrayMut<'a> {
    /// Wraps the full page buffer. `page.len()` must be exactly `PAGE_SIZE`.
    pub(crate) fn new(page: &'a mut [u8]) -> Result<Self, SlotError> {
        if page.len() != PAGE_SIZE {
            return Err(SlotError::SlotRegionSizeMismatch {
                expected_size: PAGE_SIZE,
                actual_size: page.len(),
            });
        }
        Ok(Self { page })
    }

    /// Returns a read-only view of the slot at `slot_id` (1-based).
    pub(crate) fn slot_ref(&self, slot_id: u32) -> Result<SlotRef<'_>, SlotError> {
        let range = slot_range(slot_id)?;
        let bytes = self.page.get(range).ok_or(SlotError::InvalidSlot {
            slot_index: slot_id as usize,
        })?;
        SlotRef::new(slot_id, bytes)
    }

    /// Returns a mutable view of the slot at `slot_id` (1-based).
    pub(crate) fn slot_mut(&mut self, slot_id: u32) -> Result<SlotMut<'_>, SlotError> {
        let range = slot_range(slot_id)?;
        let bytes = self.page.get_mut(range).ok_or(SlotError::InvalidSlot {
            slot_index: slot_id as usize,
        })?;
        SlotMut::new(slot_id, bytes)
    }

    /// Sets both fields of the slot at `slot_id` in one call.
    pub(crate) fn set_slot(&mut self, slot_id: u32, offset: i32, length: i32) -> Result<(), SlotError> {
        self.slot_mut(slot_id)?.set(offset, length)?;
        Ok(())
    }

    /// Tombstones the slot at `slot_id`.
    pub(crate) fn tombstone(&mut self, slot_id: u32) -> Result<(), SlotError> {
        self.slot_mut(slot_id)?.tombstone()
    }

    /// Copies the contents of `from` into `to`, leaving `from` untouched.
    /// Used when shifting slots during compaction or trailing-tombstone trim.
    pub(crate) fn copy_slot(&mut self, from: u32, to: u32) -> Result<(), SlotError> {
        let (offset, length) = {
            let src = self.slot_ref(from)?;
            (src.offset()?, src.length()?)
        };
        self.set_slot(to, offset, length)
    }
}

#[cfg(test)]
mod slot_array_ref_tests {
    use super::*;

    #[test]
    fn rejects_non_page_sized_buffer() {
        let bytes = vec![0u8; 10];
        assert!(matches!(
            SlotArrayRef::new(&bytes),
            Err(SlotError::SlotRegionSizeMismatch { .. })
        ));
    }

    #[test]
    fn slot_one_sits_at_the_very_end_of_the_page() {
        let mut bytes = vec![0u8; PAGE_SIZE];
        bytes[PAGE_SIZE - SLOT_SIZE..PAGE_SIZE - 4].copy_from_slice(&7i32.to_le_bytes());
        bytes[PAGE_SIZE - 4..PAGE_SIZE].copy_from_slice(&9i32.to_le_bytes());
        let arr = SlotArrayRef::new(&bytes).unwrap();
        let slot = arr.slot_ref(1).unwrap();
        assert_eq!(slot.offset().unwrap(), 7);
        assert_eq!(slot.length().unwrap(), 9);
    }

    #[test]
    fn slot_zero_is_invalid() {
        let bytes = vec![0u8; PAGE_SIZE];
        let arr = SlotArrayRef::new(&bytes).unwrap();
        assert!(matches!(
            arr.slot_ref(0),
            Err(SlotError::InvalidSlot { slot_index: 0 })
        ));
    }

    #[test]
    fn second_slot_sits_immediately_before_the_first() {
        let mut bytes = vec![0u8; PAGE_SIZE];
        bytes[PAGE_SIZE - 2 * SLOT_SIZE..PAGE_SIZE - 2 * SLOT_SIZE + 4]
            .copy_from_slice(&42i32.to_le_bytes());
        let arr = SlotArrayRef::new(&bytes).unwrap();
        assert_eq!(arr.slot_ref(2).unwrap().offset().unwrap(), 42);
    }
}

#[cfg(test)]
mod slot_array_mut_tests {
    use super::*;

    #[test]
    fn set_slot_then_read_back() {
        let mut bytes = vec![0u8; PAGE_SIZE];
        let mut arr = SlotArrayMut::new(&mut bytes).unwrap();
        arr.set_slot(1, 128, 16).unwrap();
        arr.set_slot(2, 256, 32).unwrap();

        assert_eq!(arr.slot_ref(1).unwrap().offset().unwrap(), 128);
        assert_eq!(arr.slot_ref(2).unwrap().length().unwrap(), 32);
    }

    #[test]
    fn tombstone_clears_offset() {
        let mut bytes = vec![0u8; PAGE_SIZE];
        let mut arr = SlotArrayMut::new(&mut bytes).unwrap();
        arr.set_slot(1, 128, 16).unwrap();
        arr.tombstone(1).unwrap();
        assert!(!arr.slot_ref(1).unwrap().is_occupied().unwrap());
    }

    #[test]
    fn copy_slot_duplicates_offset_and_length() {
        let mut bytes = vec![0u8; PAGE_SIZE];
        let mut arr = SlotArrayMut::new(&mut bytes).unwrap();
        arr.set_slot(1, 64, 8).unwrap();
        arr.copy_slot(1, 2).unwrap();
        let moved = arr.slot_ref(2).unwrap();
        assert_eq!(moved.offset().unwrap(), 64);
        assert_eq!(moved.length().unwrap(), 8);
    }

    #[test]
    fn invalid_slot_index_is_rejected() {
        let mut bytes = vec![0u8; PAGE_SIZE];
        let mut arr = SlotArrayMut::new(&mut bytes).unwrap();
        assert!(matches!(
            arr.slot_mut(0),
            Err(SlotError::InvalidSlot { slot_index: 0 })
        ));
    }
}
