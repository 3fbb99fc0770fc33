use crate::errors::header_error::HeaderError;
use crate::errors::slot_error::SlotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InsertError {
    #[error("Attempted to insert at slot {slot_id}, outside [1, nslots + 1]")]
    InvalidInsertionSlot { slot_id: u32 },
    #[error("Error while accessing slot array")]
    SlotError(#[from] SlotError),
    #[error("Error while accessing header")]
    HeaderError(#[from] HeaderError),
}
