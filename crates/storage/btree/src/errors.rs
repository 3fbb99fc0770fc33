//! The tree's error type. Only the caller-mistake/resource-limit kinds in
//! §7 of the design (a key too large to ever fit, or a lower-layer page
//! error) are represented here — broken invariants (a split with no valid
//! point, a merge whose accounting doesn't add up) are bugs, and surface as
//! `panic!` at the point they're discovered rather than a `Result` variant.

use binary_helpers::bin_error::BinaryError;
use page::errors::page_error::PageError;
use thiserror::Error;

/// Errors a `BTree` operation can return.
#[derive(Debug, Error)]
pub enum BTreeError {
    /// The encoded key (plus its leaf-record header) is larger than
    /// [`crate::layout::MAX_RECORD_SIZE`], so it could never fit on an empty
    /// page no matter how the tree splits.
    #[error("encoded key of {size} bytes exceeds the maximum record size of {max} bytes")]
    KeyTooLarge {
        /// Size of the offending encoded record, in bytes.
        size: usize,
        /// `MAX_RECORD_SIZE`.
        max: usize,
    },

    /// A lower-layer page operation failed (out-of-range slot id, a record
    /// too large for the page it targeted, a header too small to decode).
    #[error(transparent)]
    Page(#[from] PageError),

    /// Decoding or encoding a field of the B-tree page header or a record
    /// header failed — the slice handed to `read_le`/`write_le` was the
    /// wrong size. Only possible if a page's user-data region was
    /// initialized with the wrong size, which is itself a bug.
    #[error(transparent)]
    Binary(#[from] BinaryError),
}

/// Result type returned by every `btree` operation.
pub type BTreeResult<T> = Result<T, BTreeError>;
