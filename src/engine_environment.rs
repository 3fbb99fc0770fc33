//! Owner of the singleton-like instances needed for the entire lifetime of
//! the process: the file catalog, file manager, buffer manager, and the
//! `StorageManager` built from them.

use crate::config::EngineConfig;
use buffer::buffer::BufferManager;
use file::api::FileManager;
use file::disk_file_manager::DiskFileManager;
use file::file_catalog::FileCatalog;
use page::page_id::FileId;
use std::path::PathBuf;
use std::sync::Arc;
use storage_api::storage_manager::StorageManager;

/// Holds the storage stack for the process's lifetime.
#[derive(Debug)]
pub struct EngineEnvironment {
    pub file_manager: Arc<DiskFileManager>,
    pub buffer: Arc<BufferManager<DiskFileManager>>,
    pub storage: Arc<StorageManager<DiskFileManager>>,
    pub file_catalog: Arc<FileCatalog>,
    pub engine_config: EngineConfig,
}

impl EngineEnvironment {
    /// Builds the storage stack from `config`.
    pub fn new(config: EngineConfig) -> Self {
        let file_catalog = Arc::new(FileCatalog::new());
        let file_manager = Arc::new(DiskFileManager::new(file_catalog.clone()));
        let buffer = Arc::new(BufferManager::new(
            file_manager.clone(),
            config.storage.buffer_pages.get(),
        ));
        let storage = Arc::new(StorageManager::new(file_manager.clone(), buffer.clone()));
        Self {
            file_manager,
            buffer,
            storage,
            file_catalog,
            engine_config: config,
        }
    }

    /// Registers `file_id`'s backing file under `storage.data_dir`, so the
    /// file manager can open it on first access.
    pub fn register_file(&self, file_id: FileId, relative_path: impl Into<PathBuf>) {
        let path = self.engine_config.storage.data_dir.join(relative_path.into());
        tracing::info!(file_id, path = %path.display(), "registering index file");
        self.file_catalog.add_file(file_id, path);
    }
}
