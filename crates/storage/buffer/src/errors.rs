use page::page_id::PageId;
use thiserror::Error;

/// Buffer error.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Buffer was full
    #[error("buffer pool is full, no frame available to evict")]
    BufferFull,
    /// Could not read file from disk
    #[error("failed to read page {0} from disk")]
    IoReadFailed(PageId),
}
