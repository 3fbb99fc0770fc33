//! A single slot-directory entry: `(offset, length)`, both `i32`, stored
//! little-endian. `offset == 0` marks a tombstoned (unoccupied) slot.

use crate::errors::slot_error::SlotError;
use binary_helpers::le::{read_le, write_le};

/// Size in bytes of one slot-directory entry.
pub(crate) const SLOT_SIZE: usize = 8;

const OFFSET_OFFSET: usize = 0;
const LENGTH_OFFSET: usize = 4;

/// Immutable view over one slot-directory entry.
#[derive(Debug)]
pub struct SlotRef<'a> {
    slot_id: u32,
    bytes: &'a [u8; SLOT_SIZE],
}

impl<'a> SlotRef<'a> {
    pub(crate) fn new(slot_id: u32, bytes: &'a [u8]) -> Result<Self, SlotError> {
        let bytes: &[u8; SLOT_SIZE] = bytes.try_into().map_err(|_| SlotError::SlotSizeMismatch {
            expected_size: SLOT_SIZE,
            actual_size: bytes.len(),
        })?;
        Ok(Self { slot_id, bytes })
    }

    /// The 1-based slot id this view was constructed for.
    pub fn slot_id(&self) -> u32 {
        self.slot_id
    }

    /// Byte offset of the record within the page, or `0` if tombstoned.
    pub fn offset(&self) -> Result<i32, SlotError> {
        Ok(read_le::<i32>(self.bytes, OFFSET_OFFSET)?)
    }

    /// Length of the record in bytes. Meaningless if the slot is tombstoned.
    pub fn length(&self) -> Result<i32, SlotError> {
        Ok(read_le::<i32>(self.bytes, LENGTH_OFFSET)?)
    }

    /// A slot is occupied iff its offset is non-zero.
    pub fn is_occupied(&self) -> Result<bool, SlotError> {
        Ok(self.offset()? != 0)
    }
}

/// Mutable view over one slot-directory entry.
#[derive(Debug)]
pub struct SlotMut<'a> {
    slot_id: u32,
    bytes: &'a mut [u8; SLOT_SIZE],
}

impl<'a> SlotMut<'a> {
    pub(crate) fn new(slot_id: u32, bytes: &'a mut [u8]) -> Result<Self, SlotError> {
        let len = bytes.len();
        let bytes: &mut [u8; SLOT_SIZE] =
            bytes.try_into().map_err(|_| SlotError::SlotSizeMismatch {
                expected_size: SLOT_SIZE,
                actual_size: len,
            })?;
        Ok(Self { slot_id, bytes })
    }

    /// The 1-based slot id this view was constructed for.
    pub fn slot_id(&self) -> u32 {
        self.slot_id
    }

    /// Byte offset of the record.
    pub fn offset(&self) -> Result<i32, SlotError> {
        Ok(read_le::<i32>(self.bytes, OFFSET_OFFSET)?)
    }

    /// Length of the record in bytes.
    pub fn length(&self) -> Result<i32, SlotError> {
        Ok(read_le::<i32>(self.bytes, LENGTH_OFFSET)?)
    }

    /// Sets the offset.
    pub fn set_offset(&mut self, offset: i32) -> Result<(), SlotError> {
        write_le::<i32>(self.bytes, OFFSET_OFFSET, offset)?;
        Ok(())
    }

    /// Sets the length.
    pub fn set_length(&mut self, length: i32) -> Result<(), SlotError> {
        write_le::<i32>(self.bytes, LENGTH_OFFSET, length)?;
        Ok(())
    }

    /// Sets both fields at once.
    pub fn set(&mut self, offset: i32, length: i32) -> Result<(), SlotError> {
        self.set_offset(offset)?;
        self.set_length(length)
    }

    /// Tombstones the slot (`offset = 0`). The length is left as-is; callers
    /// that care zero it too, but nothing reads a tombstoned slot's length.
    pub fn tombstone(&mut self) -> Result<(), SlotError> {
        self.set_offset(0)
    }
}

#[cfg(test)]
mod slot_ref_tests {
    use super::*;

    #[test]
    fn reads_offset_and_length() {
        let mut buf = [0u8; SLOT_SIZE];
        write_le::<i32>(&mut buf, OFFSET_OFFSET, 128).unwrap();
        write_le::<i32>(&mut buf, LENGTH_OFFSET, 32).unwrap();
        let slot = SlotRef::new(1, &buf).unwrap();
        assert_eq!(slot.offset().unwrap(), 128);
        assert_eq!(slot.length().unwrap(), 32);
        assert!(slot.is_occupied().unwrap());
    }

    #[test]
    fn zero_offset_is_not_occupied() {
        let buf = [0u8; SLOT_SIZE];
        let slot = SlotRef::new(1, &buf).unwrap();
        assert!(!slot.is_occupied().unwrap());
    }

    #[test]
    fn rejects_wrong_size_slice() {
        let buf = [0u8; SLOT_SIZE - 1];
        assert!(SlotRef::new(1, &buf).is_err());
    }
}

#[cfg(test)]
mod slot_mut_tests {
    use super::*;

    #[test]
    fn writes_offset_and_length() {
        let mut buf = [0u8; SLOT_SIZE];
        {
            let mut slot = SlotMut::new(1, &mut buf).unwrap();
            slot.set(64, 16).unwrap();
        }
        let slot = SlotRef::new(1, &buf).unwrap();
        assert_eq!(slot.offset().unwrap(), 64);
        assert_eq!(slot.length().unwrap(), 16);
    }

    #[test]
    fn tombstone_clears_offset_only() {
        let mut buf = [0u8; SLOT_SIZE];
        {
            let mut slot = SlotMut::new(1, &mut buf).unwrap();
            slot.set(64, 16).unwrap();
            slot.tombstone().unwrap();
        }
        let slot = SlotRef::new(1, &buf).unwrap();
        assert!(!slot.is_occupied().unwrap());
        assert_eq!(slot.length().unwrap(), 16);
    }
}
