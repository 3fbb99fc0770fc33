use crate::errors::delete_error::DeleteError;
use crate::errors::header_error::HeaderError;
use crate::errors::slot_error::SlotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum UpdateError {
    #[error("Error while accessing slot array")]
    SlotError(#[from] SlotError),
    #[error("Error while accessing header")]
    HeaderError(#[from] HeaderError),
    #[error("Error while deleting the old row during a move-off update")]
    DeleteError(#[from] DeleteError),
}
