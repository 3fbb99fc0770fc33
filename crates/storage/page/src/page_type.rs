use std::convert::TryFrom;

/// Enumeration of different page types in the storage system.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Simple slotted unsorted data page.
    Unsorted = 1,
    /// B+ tree index root page.
    IndexRoot = 2,
    /// B+ tree index internal page.
    IndexInternal = 3,
    /// B+ tree index leaf data page.
    IndexLeaf = 4,
}

impl From<PageType> for u16 {
    /// Converts a `PageType` enum variant to its corresponding `u16` value.
    fn from(p: PageType) -> Self {
        p as u16
    }
}

impl TryFrom<u16> for PageType {
    type Error = ();

    /// Attempts to convert a `u16` value to its corresponding `PageType` enum variant.
    fn try_from(v: u16) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(PageType::Unsorted),
            2 => Ok(PageType::IndexRoot),
            3 => Ok(PageType::IndexInternal),
            4 => Ok(PageType::IndexLeaf),
            _ => Err(()),
        }
    }
}
