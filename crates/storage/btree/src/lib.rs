//! A disk-backed B-tree index over `storage-api`'s `StorageManager`: ordered
//! key-to-recordid lookups, range scans, and the split/merge/rebalance
//! machinery that keeps leaves at a healthy occupancy. Knows nothing about
//! SQL or the heap; callers hand it an already-encoded key (via
//! [`KeySchema`]) and a [`RecordId`] pointing wherever the real row lives.

#![allow(missing_docs)]

/// Key encoding/comparison contract and the `Datum` values it operates over.
pub mod datum;

/// `BTreeError`, the crate's single error type.
pub mod errors;

/// Record id and its `-infinity`/`+infinity` scan/descent sentinels.
pub mod record_id;

/// On-page layout: header accessors, record builders/parsers, size constants.
pub mod layout;

/// Key comparison and binary search within a page.
pub mod search;

/// Root-to-leaf descent, recording the path taken.
pub mod descent;

/// `InsertKey` and the page-split algorithm.
pub mod insert;

/// `DeleteKey`, underflow handling, merge, and rebalance.
pub mod delete;

/// Forward range scans.
pub mod iterator;

/// The `BTree<F, K>` facade tying the above together.
pub mod tree;

pub use datum::{Datum, KeySchema};
pub use errors::{BTreeError, BTreeResult};
pub use iterator::BTreeIterator;
pub use record_id::{RecIdBound, RecordId};
pub use tree::{BTree, IndexDescriptor};

#[cfg(test)]
mod tests;

#[cfg(test)]
mod proptests;
