//! The storage manager
use buffer::buffer::BufferManager;
use buffer::guards::{PageReadGuard, PageWriteGuard};
use file::api::FileManager;
use page::page_id::{FileId, PageId};
use std::sync::Arc;

/// The storage manager
#[derive(Debug)]
pub struct StorageManager<F: FileManager> {
    file_manager: Arc<F>,
    buffer_manager: Arc<BufferManager<F>>,
}

impl<F: FileManager> StorageManager<F> {
    /// Creates a new instance of the `StorageManager`
    pub fn new(file_manager: Arc<F>, buffer_manager: Arc<BufferManager<F>>) -> Self {
        Self {
            file_manager,
            buffer_manager,
        }
    }

    /// Obtain a `&Page` via `PageReadGuard` for the provided `PageId`
    pub fn read_page(&self, page_id: PageId) -> PageReadGuard<'_> {
        match self.buffer_manager.read_page(page_id) {
            Ok(page_read_guard) => page_read_guard,
            Err(_) => panic!("buffer manager poisoned"),
        }
    }

    /// Obtain a `&mut Page` via `PageWriteGuard` for the provided `PageId`
    pub fn write_page(&self, page_id: PageId) -> PageWriteGuard<'_> {
        match self.buffer_manager.read_page_mut(page_id) {
            Ok(page_read_guard) => page_read_guard,
            Err(_) => panic!("buffer manager poisoned"),
        }
    }

    /// Initialize a new `Page` on the buffer for the provided `PageId` and obtain a `&mut Page`
    /// via a `PageWriteGuard`
    pub fn new_page(&self, page_id: PageId) -> PageWriteGuard<'_> {
        match self.buffer_manager.allocate_new_page(page_id) {
            Ok(page_write_guard) => page_write_guard,
            Err(_) => panic!("buffer manager poisoned"),
        }
    }

    /// Allocates a fresh page number within `file_id` and returns a write
    /// guard over it, freshly claimed in the buffer pool.
    pub fn allocate_page(&self, file_id: FileId) -> PageWriteGuard<'_> {
        let page_id = self.file_manager.allocate_page(file_id);
        self.new_page(page_id)
    }

    /// Returns `page_id`'s page number to its file's free list.
    pub fn free_page(&self, page_id: PageId) {
        self.file_manager.free_page(page_id);
    }

    /// The fixed page number of `file_id`'s meta page.
    pub fn first_page_number(&self, file_id: FileId) -> PageId {
        self.file_manager.first_page_number(file_id)
    }
}
