use crate::errors::header_error::HeaderError;
use crate::header::{FileHeaderMut, FileHeaderRef, SlottedHeaderMut, SlottedHeaderRef};
use crate::page::api::Page;
use crate::page_id::PageId;

/// Accessor methods for the `Page` struct.
impl Page {
    /// Returns the unique identifier of the page.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Sets the `PageId` field of the page instance.
    pub fn set_page_id(&mut self, page_id: PageId) {
        self.page_id = page_id;
    }

    /// Returns a read-only view of the opaque, file-manager-owned header.
    pub(crate) fn file_header_ref(&self) -> Result<FileHeaderRef<'_>, HeaderError> {
        FileHeaderRef::new(&self.data[..])
    }

    /// Returns a mutable view of the opaque, file-manager-owned header.
    pub(crate) fn file_header_mut(&mut self) -> Result<FileHeaderMut<'_>, HeaderError> {
        FileHeaderMut::new(&mut self.data[..])
    }

    /// Returns a read-only view of the `SlottedPage`'s own header.
    pub(crate) fn header_ref(&self) -> Result<SlottedHeaderRef<'_>, HeaderError> {
        SlottedHeaderRef::new(&self.data[..])
    }

    /// Returns a mutable view of the `SlottedPage`'s own header.
    pub(crate) fn header_mut(&mut self) -> Result<SlottedHeaderMut<'_>, HeaderError> {
        SlottedHeaderMut::new(&mut self.data[..])
    }

    /// Returns the reserved user-data region: the bytes between the end of
    /// the `SlottedPage` header and `ph_sz`, the start of the record area.
    pub(crate) fn user_data_internal(&self) -> Result<&[u8], HeaderError> {
        let ph_sz = self.header_ref()?.ph_sz()? as usize;
        Ok(&self.data[crate::header::SLOTTED_HEADER_OFFSET + crate::header::SLOTTED_HEADER_SIZE..ph_sz])
    }

    /// Mutable counterpart of [`Page::user_data_internal`].
    pub(crate) fn user_data_mut_internal(&mut self) -> Result<&mut [u8], HeaderError> {
        let ph_sz = self.header_ref()?.ph_sz()? as usize;
        let start = crate::header::SLOTTED_HEADER_OFFSET + crate::header::SLOTTED_HEADER_SIZE;
        Ok(&mut self.data[start..ph_sz])
    }
}
