//! `BTree<F, K>`: the facade a caller actually holds. Ties together the meta
//! page, the per-operation modules (`insert`, `delete`, `iterator`), and the
//! `(file_id, unique)` pair that identifies one index.

use crate::datum::{Datum, KeySchema};
use crate::delete;
use crate::descent::find_leaf_page_number;
use crate::errors::BTreeResult;
use crate::insert;
use crate::iterator::{self, BTreeIterator};
use crate::layout::{
    BTreePageHeaderMut, BTreePageHeaderRef, IS_LEAF_FLAG, IS_ROOT_FLAG, META_USER_DATA_SIZE,
    internal_child_page_number, read_root_pid, write_root_pid,
};
use crate::record_id::RecordId;
use crate::search::SearchKey;
use file::api::FileManager;
use page::page_id::{FileId, PageId};
use std::sync::Arc;
use storage_api::storage_manager::StorageManager;

/// Identifies one index: which file backs it, and whether it enforces
/// uniqueness on its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDescriptor {
    /// The file the index's pages live in.
    pub file_id: FileId,
    /// Whether `insert_key` rejects a key that already exists.
    pub unique: bool,
}

/// A B-tree index over `storage`'s file `descriptor.file_id`, keyed per
/// `schema`.
pub struct BTree<F: FileManager, K: KeySchema> {
    storage: Arc<StorageManager<F>>,
    descriptor: IndexDescriptor,
    schema: K,
}

impl<F: FileManager, K: KeySchema> BTree<F, K> {
    /// Initializes a brand-new, empty index: a meta page at `first_page_number`
    /// pointing at a freshly allocated, empty leaf root.
    pub fn create(storage: Arc<StorageManager<F>>, descriptor: IndexDescriptor, schema: K) -> BTreeResult<Self> {
        let file_id = descriptor.file_id;

        {
            let mut meta = storage.new_page(storage.first_page_number(file_id));
            meta.initialize_page(META_USER_DATA_SIZE)?;
        }

        let root_pgno = {
            let mut root = storage.allocate_page(file_id);
            root.initialize_page(crate::layout::BTREE_HEADER_SIZE)?;
            let mut hdr = BTreePageHeaderMut::new(root.user_data_mut()?);
            hdr.initialize(IS_ROOT_FLAG | IS_LEAF_FLAG, 0, 0)?;
            root.page_id().page_number
        };

        {
            let mut meta = storage.write_page(storage.first_page_number(file_id));
            write_root_pid(&mut meta, root_pgno)?;
        }

        Ok(Self {
            storage,
            descriptor,
            schema,
        })
    }

    /// Wraps an already-created index (its meta page already holds a valid
    /// `root_pid`).
    pub fn attach(storage: Arc<StorageManager<F>>, descriptor: IndexDescriptor, schema: K) -> Self {
        Self {
            storage,
            descriptor,
            schema,
        }
    }

    /// The schema this index was built with.
    pub fn key_schema(&self) -> &K {
        &self.schema
    }

    /// This index's descriptor.
    pub fn descriptor(&self) -> IndexDescriptor {
        self.descriptor
    }

    /// Inserts `values -> recid`. Returns `false` without modifying anything
    /// if this is a unique index and an equal key already exists.
    pub fn insert_key(&self, values: &[Datum], recid: RecordId) -> BTreeResult<bool> {
        insert::insert_key(
            &self.storage,
            self.descriptor.file_id,
            &self.schema,
            self.descriptor.unique,
            values,
            recid,
        )
    }

    /// Deletes the record for `values`, optionally pinned down to a specific
    /// `recid` when several records share the key. Returns the recid removed.
    pub fn delete_key(&self, values: &[Datum], recid: Option<RecordId>) -> BTreeResult<Option<RecordId>> {
        delete::delete_key(&self.storage, self.descriptor.file_id, &self.schema, values, recid)
    }

    /// Starts a forward scan over `[lower, upper]` (either bound `None` means
    /// unbounded on that side), honoring strictness on each bound.
    pub fn start_scan(
        &self,
        lower: Option<&[Datum]>,
        lower_strict: bool,
        upper: Option<&[Datum]>,
        upper_strict: bool,
    ) -> BTreeResult<BTreeIterator<'_, F, K>> {
        iterator::start_scan(
            &self.storage,
            self.descriptor.file_id,
            &self.schema,
            lower,
            lower_strict,
            upper,
            upper_strict,
        )
    }

    /// Bulk-loads `items` by inserting each one in turn. Items should already
    /// be sorted by key for a well-packed tree, but this is not required for
    /// correctness.
    pub fn bulk_load(&self, items: impl IntoIterator<Item = (Vec<Datum>, RecordId)>) -> BTreeResult<()> {
        for (values, recid) in items {
            self.insert_key(&values, recid)?;
        }
        Ok(())
    }

    /// Whether the tree's root is an empty leaf.
    pub fn is_empty(&self) -> BTreeResult<bool> {
        let root_pgno = self.root_page_number()?;
        let root = self.storage.read_page(PageId::new(self.descriptor.file_id, root_pgno));
        let hdr = BTreePageHeaderRef::new(root.user_data()?);
        Ok(hdr.is_leaf()? && root.max_slot_id()? == 0)
    }

    /// Number of levels in the tree: `1` for a leaf-only root, incrementing
    /// once per internal level between the root and the leaves.
    pub fn tree_height(&self) -> BTreeResult<u32> {
        let mut current = self.root_page_number()?;
        let mut height = 1;
        loop {
            let page = self.storage.read_page(PageId::new(self.descriptor.file_id, current));
            let hdr = BTreePageHeaderRef::new(page.user_data()?);
            if hdr.is_leaf()? {
                return Ok(height);
            }
            let child = internal_child_page_number(page.get_record(1)?);
            drop(page);
            current = child;
            height += 1;
        }
    }

    /// Finds the leaf page that would hold `values`, without caring which
    /// slot: a thin convenience over `descent::find_leaf_page_number` useful
    /// for diagnostics and tests.
    pub fn locate_leaf(&self, values: &[Datum]) -> BTreeResult<u32> {
        let search = SearchKey {
            values,
            recid: crate::record_id::RecIdBound::MinusInfinity,
        };
        find_leaf_page_number(&self.storage, self.descriptor.file_id, &self.schema, &search, None)
    }

    fn root_page_number(&self) -> BTreeResult<u32> {
        let meta = self.storage.read_page(self.storage.first_page_number(self.descriptor.file_id));
        read_root_pid(&meta)
    }
}

