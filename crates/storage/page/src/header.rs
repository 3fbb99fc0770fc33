//! Module defining the layout and accessors for the two header regions of a
//! slotted page: the file-manager-owned file header, and the `SlottedPage`'s
//! own header that immediately follows it.
//!
//! # Page layout
//!
//! ```text
//! +----------------+------------------+-------------------+---------------+----------------------+
//! |  File header   | SlottedPage hdr  |     User data      |  Record data  |      Slot Array      |
//! |  (opaque)      |  (ph_sz,fs_begin,|  (B-tree header)   |  (grows up)   |     (grows down)     |
//! |  FILE_HEADER_  |   has_hole,cnt,  |                    |               |                      |
//! |  SIZE bytes    |   nslots)        |                    |               |                      |
//! +----------------+------------------+-------------------+---------------+----------------------+
//! ```
//!
//! The file header is owned by the file manager and never interpreted by
//! `SlottedPage`; it must be preserved byte-for-byte. Everything from
//! [`SLOTTED_HEADER_OFFSET`] onward belongs to `SlottedPage`.
//!
//! ## Note on the `SlottedPage` header's bit layout
//!
//! `ph_sz` and `fs_begin` are full 32-bit fields (the on-disk format calls for
//! `i32` offsets, wide enough for pages far larger than the typical 4 KiB).
//! `has_hole`, `cnt`, and `nslots` are then packed into one 32-bit word
//! (`has_hole: 1 bit, reserved: 1 bit, cnt: 14 bits, reserved: 2 bits, nslots:
//! 14 bits`) so the whole header still fits in a small, max-aligned region
//! (12 bytes of content, rounded up to 16).

use crate::errors::header_error::HeaderError;
use binary_helpers::align::max_align;
use binary_helpers::le::{read_le, write_le};
use paste::paste;

/// Size of the file-manager-owned header that precedes every `SlottedPage`.
pub const FILE_HEADER_SIZE: usize = 16;

/// Size of the `SlottedPage`-owned header (`ph_sz`, `fs_begin`, and the packed
/// `has_hole`/`cnt`/`nslots` word), max-aligned.
pub const SLOTTED_HEADER_SIZE: usize = max_align(4 + 4 + 4);

/// Byte offset at which the `SlottedPage` header begins.
pub const SLOTTED_HEADER_OFFSET: usize = FILE_HEADER_SIZE;

/// Byte offset at which the page's user-data region (and, past that, record
/// storage) begins: right after both header regions.
pub const DEFAULT_USER_DATA_OFFSET: usize = SLOTTED_HEADER_OFFSET + SLOTTED_HEADER_SIZE;

const PH_SZ_OFFSET: usize = 0;
const FS_BEGIN_OFFSET: usize = 4;
const FLAGS_OFFSET: usize = 8;

const HAS_HOLE_BIT: u32 = 1 << 0;
const CNT_SHIFT: u32 = 2;
const CNT_MASK: u32 = 0x3FFF; // 14 bits
const NSLOTS_SHIFT: u32 = 18;
const NSLOTS_MASK: u32 = 0x3FFF; // 14 bits

/// Immutable view of the file-manager-owned header preceding a `SlottedPage`.
#[derive(Debug)]
pub struct FileHeaderRef<'a> {
    bytes: &'a [u8; FILE_HEADER_SIZE],
}

impl<'a> FileHeaderRef<'a> {
    /// Builds a view over the first [`FILE_HEADER_SIZE`] bytes of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Result<Self, HeaderError> {
        let bytes: &[u8; FILE_HEADER_SIZE] =
            bytes
                .get(..FILE_HEADER_SIZE)
                .and_then(|s| s.try_into().ok())
                .ok_or(HeaderError::HeaderSliceSizeMismatch {
                    actual: bytes.len(),
                    expected: FILE_HEADER_SIZE,
                })?;
        Ok(Self { bytes })
    }
}

/// Mutable view of the file-manager-owned header preceding a `SlottedPage`.
#[derive(Debug)]
pub struct FileHeaderMut<'a> {
    bytes: &'a mut [u8; FILE_HEADER_SIZE],
}

impl<'a> FileHeaderMut<'a> {
    /// Builds a mutable view over the first [`FILE_HEADER_SIZE`] bytes of `bytes`.
    pub fn new(bytes: &'a mut [u8]) -> Result<Self, HeaderError> {
        let len = bytes.len();
        let bytes: &mut [u8; FILE_HEADER_SIZE] =
            bytes
                .get_mut(..FILE_HEADER_SIZE)
                .and_then(|s| s.try_into().ok())
                .ok_or(HeaderError::HeaderSliceSizeMismatch {
                    actual: len,
                    expected: FILE_HEADER_SIZE,
                })?;
        Ok(Self { bytes })
    }
}

macro_rules! impl_file_header_accessors {
    ( $( $field_name:ident : $field_type:ty = $field_offset:expr ; )* ) => {
        paste! {
            $(
                #[doc = concat!("Byte offset of `", stringify!($field_name), "` within the file header.")]
                pub const [<$field_name:upper _OFFSET>] : usize = $field_offset;

                impl<'a> FileHeaderRef<'a> {
                    #[doc = concat!("Reads `", stringify!($field_name), "`.")]
                    pub fn [<get_ $field_name>](&self) -> Result<$field_type, HeaderError> {
                        Ok(read_le::<$field_type>(self.bytes, $field_offset)?)
                    }
                }

                impl<'a> FileHeaderMut<'a> {
                    #[doc = concat!("Writes `", stringify!($field_name), "`.")]
                    pub fn [<set_ $field_name>](&mut self, val: $field_type) -> Result<(), HeaderError> {
                        write_le::<$field_type>(self.bytes, $field_offset, val)?;
                        Ok(())
                    }
                }
            )*
        }
    };
}

impl_file_header_accessors! {
    page_number : u32 = 0;
    page_type   : u16 = 4;
    // 2 reserved bytes at offset 6
    last_lsn    : u64 = 8;
}

/// Immutable view over the `SlottedPage`-owned header.
#[derive(Debug)]
pub struct SlottedHeaderRef<'a> {
    bytes: &'a [u8; SLOTTED_HEADER_SIZE],
}

impl<'a> SlottedHeaderRef<'a> {
    /// Builds a view over `SLOTTED_HEADER_SIZE` bytes starting at [`SLOTTED_HEADER_OFFSET`].
    pub fn new(bytes: &'a [u8]) -> Result<Self, HeaderError> {
        let region = bytes
            .get(SLOTTED_HEADER_OFFSET..SLOTTED_HEADER_OFFSET + SLOTTED_HEADER_SIZE)
            .ok_or(HeaderError::HeaderSliceSizeMismatch {
                actual: bytes.len(),
                expected: SLOTTED_HEADER_OFFSET + SLOTTED_HEADER_SIZE,
            })?;
        Ok(Self {
            bytes: region.try_into().unwrap(),
        })
    }

    /// Total size of header + user-data area, aligned up.
    pub fn ph_sz(&self) -> Result<i32, HeaderError> {
        Ok(read_le::<i32>(self.bytes, PH_SZ_OFFSET)?)
    }

    /// Offset at which free space starts.
    pub fn fs_begin(&self) -> Result<i32, HeaderError> {
        Ok(read_le::<i32>(self.bytes, FS_BEGIN_OFFSET)?)
    }

    fn flags_word(&self) -> Result<u32, HeaderError> {
        Ok(read_le::<u32>(self.bytes, FLAGS_OFFSET)?)
    }

    /// Whether records may be non-contiguous; a compaction may recover space.
    pub fn has_hole(&self) -> Result<bool, HeaderError> {
        Ok(self.flags_word()? & HAS_HOLE_BIT != 0)
    }

    /// Number of occupied slots.
    pub fn cnt(&self) -> Result<u16, HeaderError> {
        Ok(((self.flags_word()? >> CNT_SHIFT) & CNT_MASK) as u16)
    }

    /// Number of slot-directory entries (occupied + tombstoned).
    pub fn nslots(&self) -> Result<u16, HeaderError> {
        Ok(((self.flags_word()? >> NSLOTS_SHIFT) & NSLOTS_MASK) as u16)
    }
}

/// Mutable view over the `SlottedPage`-owned header.
#[derive(Debug)]
pub struct SlottedHeaderMut<'a> {
    bytes: &'a mut [u8; SLOTTED_HEADER_SIZE],
}

impl<'a> SlottedHeaderMut<'a> {
    /// Builds a mutable view over `SLOTTED_HEADER_SIZE` bytes starting at [`SLOTTED_HEADER_OFFSET`].
    pub fn new(bytes: &'a mut [u8]) -> Result<Self, HeaderError> {
        let len = bytes.len();
        let region = bytes
            .get_mut(SLOTTED_HEADER_OFFSET..SLOTTED_HEADER_OFFSET + SLOTTED_HEADER_SIZE)
            .ok_or(HeaderError::HeaderSliceSizeMismatch {
                actual: len,
                expected: SLOTTED_HEADER_OFFSET + SLOTTED_HEADER_SIZE,
            })?;
        Ok(Self {
            bytes: region.try_into().unwrap(),
        })
    }

    /// Sets `ph_sz`.
    pub fn set_ph_sz(&mut self, val: i32) -> Result<(), HeaderError> {
        write_le::<i32>(self.bytes, PH_SZ_OFFSET, val)?;
        Ok(())
    }

    /// Sets `fs_begin`.
    pub fn set_fs_begin(&mut self, val: i32) -> Result<(), HeaderError> {
        write_le::<i32>(self.bytes, FS_BEGIN_OFFSET, val)?;
        Ok(())
    }

    fn flags_word(&self) -> Result<u32, HeaderError> {
        Ok(read_le::<u32>(self.bytes, FLAGS_OFFSET)?)
    }

    fn set_flags_word(&mut self, val: u32) -> Result<(), HeaderError> {
        write_le::<u32>(self.bytes, FLAGS_OFFSET, val)?;
        Ok(())
    }

    /// Sets the `has_hole` hint.
    pub fn set_has_hole(&mut self, val: bool) -> Result<(), HeaderError> {
        let mut word = self.flags_word()?;
        if val {
            word |= HAS_HOLE_BIT;
        } else {
            word &= !HAS_HOLE_BIT;
        }
        self.set_flags_word(word)
    }

    /// Sets the occupied-slot count.
    pub fn set_cnt(&mut self, val: u16) -> Result<(), HeaderError> {
        let mut word = self.flags_word()?;
        word &= !(CNT_MASK << CNT_SHIFT);
        word |= (u32::from(val) & CNT_MASK) << CNT_SHIFT;
        self.set_flags_word(word)
    }

    /// Sets the slot-directory entry count.
    pub fn set_nslots(&mut self, val: u16) -> Result<(), HeaderError> {
        let mut word = self.flags_word()?;
        word &= !(NSLOTS_MASK << NSLOTS_SHIFT);
        word |= (u32::from(val) & NSLOTS_MASK) << NSLOTS_SHIFT;
        self.set_flags_word(word)
    }

    /// Zeroes the header and sets initial values for a freshly formatted page.
    pub fn initialize(&mut self, ph_sz: i32, fs_begin: i32) -> Result<(), HeaderError> {
        self.bytes.fill(0);
        self.set_ph_sz(ph_sz)?;
        self.set_fs_begin(fs_begin)?;
        self.set_has_hole(false)?;
        self.set_cnt(0)?;
        self.set_nslots(0)?;
        Ok(())
    }
}
