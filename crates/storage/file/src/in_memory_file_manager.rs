//! Defines an in-memory `FileManager`, used by every unit and integration
//! test in this repository instead of real files.

use crate::api::FileManager;
use crate::file_catalog::FileCatalog;
use page::page_id::{FileId, PageId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Per-file page allocation state: the next never-used page number, plus a
/// free list of page numbers returned by `free_page`.
#[derive(Debug)]
struct PageAllocState {
    next_page_number: u32,
    free_list: Vec<u32>,
}

/// A temporary in memory file manager
#[derive(Debug)]
pub struct InMemoryFileManager {
    // For now unused beyond this, as filenames are not yet needed in-memory.
    file_catalog: Arc<FileCatalog>,
    pages: RwLock<HashMap<PageId, Box<[u8]>>>,
    alloc_state: RwLock<HashMap<FileId, PageAllocState>>,
}

impl FileManager for InMemoryFileManager {
    fn new(file_catalog: Arc<FileCatalog>) -> Self {
        Self {
            file_catalog,
            pages: RwLock::new(HashMap::new()),
            alloc_state: RwLock::new(HashMap::new()),
        }
    }

    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> bool {
        if let Some(page) = self.pages.read().unwrap().get(&page_id) {
            destination.copy_from_slice(page);
            true
        } else {
            false
        }
    }

    fn write_page(&self, page_id: PageId, page_data: &[u8]) {
        let boxed = page_data.to_vec().into_boxed_slice();
        self.pages.write().unwrap().insert(page_id, boxed);
    }

    fn allocate_page(&self, file_id: FileId) -> PageId {
        let mut alloc_state = self.alloc_state.write().unwrap();
        let state = alloc_state.entry(file_id).or_insert_with(|| PageAllocState {
            next_page_number: 1,
            free_list: Vec::new(),
        });

        let page_number = match state.free_list.pop() {
            Some(n) => n,
            None => {
                let n = state.next_page_number;
                state.next_page_number += 1;
                n
            }
        };

        PageId::new(file_id, page_number)
    }

    fn free_page(&self, page_id: PageId) {
        let mut alloc_state = self.alloc_state.write().unwrap();
        alloc_state
            .entry(page_id.file_id)
            .or_insert_with(|| PageAllocState {
                next_page_number: 1,
                free_list: Vec::new(),
            })
            .free_list
            .push(page_id.page_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back_round_trips() {
        let mgr = InMemoryFileManager::new(Arc::new(FileCatalog::new()));
        let page_id = PageId::new(1, 0);
        let data = vec![7u8; 4096];
        mgr.write_page(page_id, &data);

        let mut dest = vec![0u8; 4096];
        assert!(mgr.read_page(page_id, &mut dest));
        assert_eq!(dest, data);
    }

    #[test]
    fn read_missing_page_returns_false() {
        let mgr = InMemoryFileManager::new(Arc::new(FileCatalog::new()));
        let mut dest = vec![0u8; 4096];
        assert!(!mgr.read_page(PageId::new(1, 0), &mut dest));
    }

    #[test]
    fn allocate_page_starts_at_one_and_increments() {
        let mgr = InMemoryFileManager::new(Arc::new(FileCatalog::new()));
        assert_eq!(mgr.allocate_page(1).page_number, 1);
        assert_eq!(mgr.allocate_page(1).page_number, 2);
    }

    #[test]
    fn freed_page_numbers_are_reused_before_growing() {
        let mgr = InMemoryFileManager::new(Arc::new(FileCatalog::new()));
        let first = mgr.allocate_page(1);
        let second = mgr.allocate_page(1);
        mgr.free_page(second);
        let reused = mgr.allocate_page(1);
        assert_eq!(reused, second);
        let _ = first;
    }

    #[test]
    fn first_page_number_is_the_meta_page() {
        let mgr = InMemoryFileManager::new(Arc::new(FileCatalog::new()));
        assert_eq!(mgr.first_page_number(3), PageId::new(3, 0));
    }
}
