//! Record identifiers and the `-infinity`/`+infinity` sentinels used to bias
//! tuple comparison during descent, per §4.3's tie-break rules.

use page::page_id::{FileId, PageId};
use std::cmp::Ordering;

/// Identifies one record: the page it lives on, plus its slot id within that
/// page. Generalizes the original engine's file-id-less `{PageNumber,
/// SlotId}` record id, since here a `PageId` always threads a `FileId` — an
/// index's heap file and its own file are not necessarily the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    /// The page the record lives on.
    pub page_id: PageId,
    /// The record's slot id within `page_id`.
    pub slot_id: u32,
}

impl RecordId {
    /// Builds a `RecordId` from its three components directly.
    pub fn new(file_id: FileId, page_number: u32, slot_id: u32) -> Self {
        Self {
            page_id: PageId::new(file_id, page_number),
            slot_id,
        }
    }

    fn sort_key(&self) -> (FileId, u32, u32) {
        (self.page_id.file_id, self.page_id.page_number, self.slot_id)
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// A `RecordId`, or one of the two sentinels used only during descent and
/// binary search, never stored on a page. `MinusInfinity` makes any
/// equal-key record compare greater than the search key (positions a scan at
/// the first record of a key run); `PlusInfinity` makes any equal-key record
/// compare less (skips past every record sharing a key, used for
/// unique-index duplicate detection and strict lower bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecIdBound {
    /// Compares less than every valid `RecordId`.
    MinusInfinity,
    /// An ordinary, on-page record id.
    Valid(RecordId),
    /// Compares greater than every valid `RecordId`.
    PlusInfinity,
    /// Used only by delete's "remove any record with this key" mode: the
    /// caller doesn't know (or care) which of possibly several matching
    /// recids to remove. Never reaches tuple comparison directly — callers
    /// route it through a `PlusInfinity` descent first.
    Unspecified,
}

impl RecIdBound {
    /// Orders `self` (a bound) against a concrete on-page `other`.
    pub fn compare_to(&self, other: RecordId) -> Ordering {
        match self {
            RecIdBound::MinusInfinity => Ordering::Less,
            RecIdBound::PlusInfinity => Ordering::Greater,
            RecIdBound::Valid(r) => r.cmp(&other),
            RecIdBound::Unspecified => {
                unreachable!("Unspecified recid bound must never reach tuple comparison")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_file_then_page_then_slot() {
        let a = RecordId::new(1, 5, 9);
        let b = RecordId::new(1, 5, 10);
        let c = RecordId::new(2, 0, 0);
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn minus_and_plus_infinity_bracket_every_valid_recid() {
        let r = RecordId::new(7, 3, 2);
        assert_eq!(RecIdBound::MinusInfinity.compare_to(r), Ordering::Less);
        assert_eq!(RecIdBound::PlusInfinity.compare_to(r), Ordering::Greater);
        assert_eq!(RecIdBound::Valid(r).compare_to(r), Ordering::Equal);
    }

    #[test]
    #[should_panic]
    fn unspecified_bound_panics_on_direct_comparison() {
        let r = RecordId::new(0, 0, 0);
        let _ = RecIdBound::Unspecified.compare_to(r);
    }
}
