//! Result types for operations that can legitimately fail to make progress
//! without that being an error: a full page is an expected outcome, not a
//! bug.

/// Outcome of `InsertRecord`/`InsertRecordAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written at the given slot id.
    Inserted(u32),
    /// The page has no room for the record, even after compaction.
    WontFit,
    /// The page was not attempted to be compacted; the caller may retry
    /// after compacting. An implementation may fold this into `WontFit`,
    /// but must never modify the page on failure either way.
    WontFitCompactable,
}

/// Outcome of `UpdateRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record was updated in place (or relocated) on this page.
    Updated,
    /// The record did not fit on this page even after compaction, but would
    /// fit on an empty page; its slot has been erased and the caller is
    /// expected to reinsert it elsewhere.
    MovedOff,
    /// The record is too large to ever fit, even on an empty page.
    WontFit,
}
