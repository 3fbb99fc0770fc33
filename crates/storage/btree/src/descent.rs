//! Root-to-leaf descent, optionally recording the `(page_number, slot_id)`
//! path taken so callers can walk back up after a split or during the
//! underflow cascade. The root itself is never recorded (per §9: "root not
//! recorded" — there is no parent slot to fix up for it).

use crate::errors::BTreeResult;
use crate::layout::{BTreePageHeaderRef, read_root_pid};
use crate::search::{SearchKey, binary_search_on_page};
use file::api::FileManager;
use page::page_id::{FileId, PageId};
use storage_api::storage_manager::StorageManager;

/// One step of the recorded descent path: the internal page visited, and
/// the slot id of the child pointer followed from it.
#[derive(Debug, Clone, Copy)]
pub struct PathEntry {
    /// Page number of the internal page.
    pub page_number: u32,
    /// Slot id, on that page, whose child pointer was followed.
    pub slot_id: u32,
}

/// Descends from `file_id`'s root to the leaf that `search` would land on,
/// appending each internal hop to `path` if provided. Returns the leaf's
/// page number.
pub fn find_leaf_page_number<F: FileManager, K: crate::datum::KeySchema>(
    storage: &StorageManager<F>,
    file_id: FileId,
    schema: &K,
    search: &SearchKey<'_>,
    mut path: Option<&mut Vec<PathEntry>>,
) -> BTreeResult<u32> {
    let root_pid = {
        let meta = storage.read_page(storage.first_page_number(file_id));
        read_root_pid(&meta)?
    };

    let mut current = root_pid;
    loop {
        let page = storage.read_page(PageId::new(file_id, current));
        let header = BTreePageHeaderRef::new(page.user_data()?);
        if header.is_leaf()? {
            return Ok(current);
        }

        let sid = binary_search_on_page(&page, false, schema, search)?
            .expect("internal page binary search always yields a slot");
        let rec = page.get_record(sid)?;
        let child = crate::layout::internal_child_page_number(rec);

        if let Some(p) = path.as_deref_mut() {
            p.push(PathEntry {
                page_number: current,
                slot_id: sid,
            });
        }

        drop(page);
        current = child;
    }
}

/// Descends always via the first child pointer at each internal level,
/// landing on the leftmost leaf. Used by `StartScan` when no lower bound was
/// given.
pub fn find_leftmost_leaf<F: FileManager>(
    storage: &StorageManager<F>,
    file_id: FileId,
) -> BTreeResult<u32> {
    let root_pid = {
        let meta = storage.read_page(storage.first_page_number(file_id));
        read_root_pid(&meta)?
    };

    let mut current = root_pid;
    loop {
        let page = storage.read_page(PageId::new(file_id, current));
        let header = BTreePageHeaderRef::new(page.user_data()?);
        if header.is_leaf()? {
            return Ok(current);
        }
        let rec = page.get_record(1)?;
        let child = crate::layout::internal_child_page_number(rec);
        drop(page);
        current = child;
    }
}
