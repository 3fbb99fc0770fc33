use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum HeaderError {
    #[error("Header error")]
    BinaryError(#[from] binary_helpers::bin_error::BinaryError),
    #[error("Arithmetic error while computing offsets within header")]
    OffsetArithmetic,
    #[error("Provided slice length ({actual}) does not match the expected length")]
    HeaderSliceSizeMismatch { actual: usize, expected: usize },
    #[error(
        "Header plus {user_data_size} bytes of user data does not leave room for a single record on a {page_size}-byte page"
    )]
    HeaderTooLarge {
        user_data_size: usize,
        page_size: usize,
    },
}
