//! B-tree page layout: the header living in every leaf/internal page's
//! `SlottedPage` user-data region, the meta page's `root_pid`, and the
//! leaf/internal record shapes built on top of `page::page::Page`'s opaque
//! record bytes.
//!
//! ```text
//! Meta page user data:    root_pid: u32
//!
//! Leaf/internal header:   flags: u16, totrlen: i32, prev_pid: u32,
//!                          next_pid: u32, reserved: u32   (max-aligned)
//!
//! Leaf record:            file_id: u32, page_number: u32, slot_id: u32,
//!                          key payload
//!
//! Internal record:        child_page_number: u32, heap file_id: u32,
//!                          heap page_number: u32, heap slot_id: u32,
//!                          key payload (absent on a page's first record)
//! ```

use crate::errors::BTreeResult;
use crate::record_id::RecordId;
use binary_helpers::align::max_align;
use page::page::Page;
use page::page_id::FileId;

/// Every page in the system is this many bytes; re-exported here so callers
/// of this crate don't need a direct `page` dependency just for the constant.
pub use page::PAGE_SIZE;

/// Size, in bytes, of the B-tree page header reserved as a leaf/internal
/// page's `user_data` region.
pub const BTREE_HEADER_SIZE: usize = max_align(2 + 4 + 4 + 4 + 4);

/// Size, in bytes, of the meta page's `user_data` region (just `root_pid`).
pub const META_USER_DATA_SIZE: usize = 4;

/// Set on a page currently playing the role of tree root.
pub const IS_ROOT_FLAG: u16 = 1 << 0;
/// Set on leaf pages; unset on internal pages.
pub const IS_LEAF_FLAG: u16 = 1 << 1;

/// Longest an encoded leaf or internal record may be. Bounds the longest key
/// a caller can insert: past this, no split could ever make room for it.
pub const MAX_RECORD_SIZE: usize = 2000;

/// A non-root page below this fraction of `PAGE_SIZE` triggers the
/// underflow cascade (merge-or-rebalance with a sibling).
pub const MIN_PAGE_USAGE: usize = PAGE_SIZE * 2 / 5;

/// Header of a leaf record: the heap/underlying recid the key points at.
pub const LEAF_RECORD_HEADER_SIZE: usize = 4 + 4 + 4;

/// Header of an internal record: the child page pointer, plus the heap
/// recid carried along so a later leaf-record reconstruction during
/// rebalance/merge doesn't need to re-read the leaf.
pub const INTERNAL_RECORD_HEADER_SIZE: usize = 4 + 4 + 4 + 4;

const FLAGS_OFFSET: usize = 0;
const TOTRLEN_OFFSET: usize = 4;
const PREV_PID_OFFSET: usize = 8;
const NEXT_PID_OFFSET: usize = 12;

/// Computes on-page usage (header + slot directory + record bytes) for a
/// hypothetical page holding `num_recs` records totalling `total_reclen`
/// bytes of (already max-aligned) record payloads plus their slot entries.
/// Mirrors `Page::compute_free_space`'s accounting, just expressed as
/// "bytes used" rather than "bytes free".
pub fn compute_page_usage(num_recs: usize, total_reclen: usize) -> usize {
    let free = Page::compute_free_space(BTREE_HEADER_SIZE, num_recs, total_reclen);
    if free < 0 {
        PAGE_SIZE + 1
    } else {
        PAGE_SIZE - free as usize
    }
}

/// Immutable view of a leaf/internal page's header, over the exact
/// `BTREE_HEADER_SIZE`-byte slice returned by `Page::user_data`.
pub struct BTreePageHeaderRef<'a> {
    bytes: &'a [u8],
}

impl<'a> BTreePageHeaderRef<'a> {
    /// Wraps `bytes`, which must be exactly [`BTREE_HEADER_SIZE`] long.
    pub fn new(bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len(), BTREE_HEADER_SIZE);
        Self { bytes }
    }

    /// The raw flags word.
    pub fn flags(&self) -> BTreeResult<u16> {
        Ok(binary_helpers::le::read_le(self.bytes, FLAGS_OFFSET)?)
    }

    /// Whether [`IS_ROOT_FLAG`] is set.
    pub fn is_root(&self) -> BTreeResult<bool> {
        Ok(self.flags()? & IS_ROOT_FLAG != 0)
    }

    /// Whether [`IS_LEAF_FLAG`] is set.
    pub fn is_leaf(&self) -> BTreeResult<bool> {
        Ok(self.flags()? & IS_LEAF_FLAG != 0)
    }

    /// Sum of the byte lengths of every record currently stored on the page.
    pub fn totrlen(&self) -> BTreeResult<i32> {
        Ok(binary_helpers::le::read_le(self.bytes, TOTRLEN_OFFSET)?)
    }

    /// Left sibling's page number, or `0` if there is none.
    pub fn prev_pid(&self) -> BTreeResult<u32> {
        Ok(binary_helpers::le::read_le(self.bytes, PREV_PID_OFFSET)?)
    }

    /// Right sibling's page number, or `0` if there is none.
    pub fn next_pid(&self) -> BTreeResult<u32> {
        Ok(binary_helpers::le::read_le(self.bytes, NEXT_PID_OFFSET)?)
    }
}

/// Mutable counterpart of [`BTreePageHeaderRef`].
pub struct BTreePageHeaderMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> BTreePageHeaderMut<'a> {
    /// Wraps `bytes`, which must be exactly [`BTREE_HEADER_SIZE`] long.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        debug_assert_eq!(bytes.len(), BTREE_HEADER_SIZE);
        Self { bytes }
    }

    /// Zeroes the header and sets the initial flags/sibling pointers for a
    /// freshly initialized page.
    pub fn initialize(&mut self, flags: u16, prev_pid: u32, next_pid: u32) -> BTreeResult<()> {
        self.bytes.fill(0);
        self.set_flags(flags)?;
        self.set_totrlen(0)?;
        self.set_prev_pid(prev_pid)?;
        self.set_next_pid(next_pid)?;
        Ok(())
    }

    /// Overwrites the raw flags word.
    pub fn set_flags(&mut self, flags: u16) -> BTreeResult<()> {
        Ok(binary_helpers::le::write_le(self.bytes, FLAGS_OFFSET, flags)?)
    }

    /// Sets `totrlen`.
    pub fn set_totrlen(&mut self, totrlen: i32) -> BTreeResult<()> {
        Ok(binary_helpers::le::write_le(self.bytes, TOTRLEN_OFFSET, totrlen)?)
    }

    /// Sets `prev_pid`.
    pub fn set_prev_pid(&mut self, prev_pid: u32) -> BTreeResult<()> {
        Ok(binary_helpers::le::write_le(self.bytes, PREV_PID_OFFSET, prev_pid)?)
    }

    /// Sets `next_pid`.
    pub fn set_next_pid(&mut self, next_pid: u32) -> BTreeResult<()> {
        Ok(binary_helpers::le::write_le(self.bytes, NEXT_PID_OFFSET, next_pid)?)
    }
}

/// Reads the meta page's `root_pid`.
pub fn read_root_pid(meta: &Page) -> BTreeResult<u32> {
    let data = meta.user_data()?;
    Ok(binary_helpers::le::read_le(data, 0)?)
}

/// Sets the meta page's `root_pid`.
pub fn write_root_pid(meta: &mut Page, root_pid: u32) -> BTreeResult<()> {
    let data = meta.user_data_mut()?;
    Ok(binary_helpers::le::write_le(data, 0, root_pid)?)
}

/// Builds a leaf record: `recid` header followed by the schema-encoded key.
pub fn build_leaf_record(key_payload: &[u8], recid: RecordId) -> Vec<u8> {
    let mut buf = vec![0u8; LEAF_RECORD_HEADER_SIZE + key_payload.len()];
    binary_helpers::le::write_le(&mut buf, 0, recid.page_id.file_id).expect("fixed-size header");
    binary_helpers::le::write_le(&mut buf, 4, recid.page_id.page_number).expect("fixed-size header");
    binary_helpers::le::write_le(&mut buf, 8, recid.slot_id).expect("fixed-size header");
    buf[LEAF_RECORD_HEADER_SIZE..].copy_from_slice(key_payload);
    buf
}

/// The recid embedded in a leaf record.
pub fn leaf_record_id(rec: &[u8]) -> RecordId {
    let file_id: FileId =
        binary_helpers::le::read_le(rec, 0).expect("corrupt leaf record header");
    let page_number: u32 =
        binary_helpers::le::read_le(rec, 4).expect("corrupt leaf record header");
    let slot_id: u32 = binary_helpers::le::read_le(rec, 8).expect("corrupt leaf record header");
    RecordId::new(file_id, page_number, slot_id)
}

/// The key payload (everything past the header) of a leaf record.
pub fn leaf_record_payload(rec: &[u8]) -> &[u8] {
    &rec[LEAF_RECORD_HEADER_SIZE..]
}

/// Builds an internal record: child pointer + heap recid header, followed
/// by `key_payload` (empty for a page's headerless first record).
pub fn build_internal_record(child_page_number: u32, heap_recid: RecordId, key_payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; INTERNAL_RECORD_HEADER_SIZE + key_payload.len()];
    binary_helpers::le::write_le(&mut buf, 0, child_page_number).expect("fixed-size header");
    binary_helpers::le::write_le(&mut buf, 4, heap_recid.page_id.file_id).expect("fixed-size header");
    binary_helpers::le::write_le(&mut buf, 8, heap_recid.page_id.page_number)
        .expect("fixed-size header");
    binary_helpers::le::write_le(&mut buf, 12, heap_recid.slot_id).expect("fixed-size header");
    buf[INTERNAL_RECORD_HEADER_SIZE..].copy_from_slice(key_payload);
    buf
}

/// The child page number embedded in an internal record.
pub fn internal_child_page_number(rec: &[u8]) -> u32 {
    binary_helpers::le::read_le(rec, 0).expect("corrupt internal record header")
}

/// The heap recid embedded in an internal record.
pub fn internal_heap_recid(rec: &[u8]) -> RecordId {
    let file_id: FileId =
        binary_helpers::le::read_le(rec, 4).expect("corrupt internal record header");
    let page_number: u32 =
        binary_helpers::le::read_le(rec, 8).expect("corrupt internal record header");
    let slot_id: u32 =
        binary_helpers::le::read_le(rec, 12).expect("corrupt internal record header");
    RecordId::new(file_id, page_number, slot_id)
}

/// The key payload of an internal record; empty for a page's first entry.
pub fn internal_record_payload(rec: &[u8]) -> &[u8] {
    &rec[INTERNAL_RECORD_HEADER_SIZE..]
}

/// Builds a headerless (no key payload) internal record pointing at
/// `child_page_number`, as used for a page's first entry.
pub fn headerless_internal_record(child_page_number: u32) -> Vec<u8> {
    build_internal_record(child_page_number, RecordId::new(0, 0, 0), &[])
}

/// The heap recid of a record on a page of the given leaf-ness.
pub fn record_heap_recid(rec: &[u8], is_leaf: bool) -> RecordId {
    if is_leaf {
        leaf_record_id(rec)
    } else {
        internal_heap_recid(rec)
    }
}

/// The key payload of a record on a page of the given leaf-ness.
pub fn record_payload(rec: &[u8], is_leaf: bool) -> &[u8] {
    if is_leaf {
        leaf_record_payload(rec)
    } else {
        internal_record_payload(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_mut_then_ref() {
        let mut bytes = vec![0u8; BTREE_HEADER_SIZE];
        {
            let mut hdr = BTreePageHeaderMut::new(&mut bytes);
            hdr.initialize(IS_ROOT_FLAG | IS_LEAF_FLAG, 11, 22).unwrap();
            hdr.set_totrlen(123).unwrap();
        }
        let hdr = BTreePageHeaderRef::new(&bytes);
        assert!(hdr.is_root().unwrap());
        assert!(hdr.is_leaf().unwrap());
        assert_eq!(hdr.prev_pid().unwrap(), 11);
        assert_eq!(hdr.next_pid().unwrap(), 22);
        assert_eq!(hdr.totrlen().unwrap(), 123);
    }

    #[test]
    fn leaf_record_round_trips_recid_and_payload() {
        let recid = RecordId::new(4, 9, 2);
        let rec = build_leaf_record(b"hello", recid);
        assert_eq!(leaf_record_id(&rec), recid);
        assert_eq!(leaf_record_payload(&rec), b"hello");
    }

    #[test]
    fn internal_record_round_trips_child_and_heap_recid() {
        let heap_recid = RecordId::new(1, 2, 3);
        let rec = build_internal_record(77, heap_recid, b"k");
        assert_eq!(internal_child_page_number(&rec), 77);
        assert_eq!(internal_heap_recid(&rec), heap_recid);
        assert_eq!(internal_record_payload(&rec), b"k");
    }

    #[test]
    fn headerless_internal_record_has_no_payload() {
        let rec = headerless_internal_record(42);
        assert_eq!(internal_child_page_number(&rec), 42);
        assert!(internal_record_payload(&rec).is_empty());
    }

    #[test]
    fn compute_page_usage_grows_with_record_count_and_length() {
        let empty = compute_page_usage(0, 0);
        let some = compute_page_usage(10, 200);
        assert!(some > empty);
    }

    #[test]
    fn compute_page_usage_flags_oversized_pages() {
        let usage = compute_page_usage(1, PAGE_SIZE * 2);
        assert!(usage > PAGE_SIZE);
    }
}
