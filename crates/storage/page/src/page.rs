//! A fixed-size slotted page: variable-length records addressed by a 1-based
//! slot directory that grows down from the end of the page, while record
//! payloads grow up from just past the header.
//!
//! ```text
//!   +----------------+------------------+----------------+---------------+----------------------+
//!   |  File header   | SlottedPage hdr  |   User data    |  Record data  |      Slot Array      |
//!   |  (opaque)      |  (ph_sz,fs_begin,|  (fixed size,  |  (grows up)   |     (grows down)     |
//!   |                |   has_hole,cnt,  |   never moved) |               |                      |
//!   |                |   nslots)        |                |               |                      |
//!   +----------------+------------------+----------------+---------------+----------------------+
//! ```
//!
//! `SlottedPage` never performs I/O and knows nothing about B-tree semantics;
//! it is a pure in-memory manipulation of one page buffer.

use crate::PAGE_SIZE;
use crate::page_id::PageId;

pub(crate) mod accessors;
pub(crate) mod ctors;
pub(crate) mod delete;
pub(crate) mod insert;
pub(crate) mod internal;
pub(crate) mod read_row;
pub(crate) mod shift;
pub(crate) mod update;

/// Outcome types returned by the public insert/update operations.
pub mod outcomes;

/// Public API surface of the `Page` struct.
pub mod api;

/// A page's bytes, owned by the buffer manager; `Page` is a convenience
/// wrapper that also remembers its own identity.
#[derive(Debug)]
pub struct Page {
    /// Identifier of the file and page number this buffer corresponds to.
    pub(crate) page_id: PageId,
    /// The full `PAGE_SIZE` bytes of the page, boxed to avoid stack blowup.
    pub(crate) data: Box<[u8; PAGE_SIZE]>,
}
