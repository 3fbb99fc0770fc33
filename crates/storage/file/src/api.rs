//! Public API for the `file` crate

use crate::file_catalog::FileCatalog;
use page::page_id::{FileId, PageId};
use std::sync::Arc;

/// File manager public API
///
/// A `FileManager` manages a collection of fixed-size pages addressed by
/// `PageId`. Implementations are free to choose the backing storage layout and
/// error reporting strategy. The trait itself documents method-level
/// expectations.
pub trait FileManager {
    /// Definition
    /// Create a new file manager instance bound to `path`.
    ///
    /// Params
    /// - `path`: A value convertible into `PathBuf` that identifies the backing
    ///   storage resource for this manager (interpretation left to the
    ///   implementation).
    ///
    /// Return
    /// - `Self`: an instance of the file manager bound to `path`.
    fn new(file_catalog: Arc<FileCatalog>) -> Self;

    /// Definition
    /// Read the page identified by `page_id` into `destination`.
    ///
    /// Params
    /// - `page_id`: Identifier of the page to read.
    /// - `destination`: Caller-provided buffer to receive the page bytes. The
    ///   buffer length must equal the storage page size.
    ///
    /// Return
    /// - `bool`: `true` if the page existed and was copied into
    ///   `destination`; `false` if the page does not exist. Implementations
    ///   may decide how to handle buffer-size mismatches (see implementation
    ///   docs / future error types).
    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> bool; //TODO change return type to Result

    /// Definition
    /// Write the contents of `page_data` as the page for `page_id`.
    ///
    /// Params
    /// - `page_id`: Identifier of the page to write.
    /// - `page_data`: Byte slice containing exactly one page worth of data. The
    ///   length must equal the storage page size.
    ///
    /// Return
    /// - `()`: No value is returned. Implementations control how they report
    ///   internal failures; this trait does not expose an error type yet.
    fn write_page(&self, page_id: PageId, page_data: &[u8]); //TODO change return type to Result

    /// Definition
    /// Allocates a fresh page number within `file_id`, reusing a page number
    /// previously returned to the free list by `free_page` if one is
    /// available, otherwise growing the file by one page.
    ///
    /// Params
    /// - `file_id`: The file the new page belongs to.
    ///
    /// Return
    /// - `PageId`: Identifier of the newly allocated page. Not undone on a
    ///   later failure; callers that fail after allocating are expected to
    ///   eventually `free_page` it rather than relying on rollback here.
    fn allocate_page(&self, file_id: FileId) -> PageId;

    /// Definition
    /// Returns `page_id`'s page number to `file_id`'s free list, to be
    /// reused by a later `allocate_page`. Does not touch the page's bytes.
    fn free_page(&self, page_id: PageId);

    /// Definition
    /// The fixed page number of `file_id`'s meta page: always the first
    /// page of the file.
    fn first_page_number(&self, file_id: FileId) -> PageId {
        PageId::new(file_id, 0)
    }
}
