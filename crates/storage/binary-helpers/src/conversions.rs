use thiserror::Error;

pub trait UsizeConversion {
    fn to_u16(self) -> Result<u16, ConversionError>;
    fn to_u32(self) -> Result<u32, ConversionError>;
    fn to_i32(self) -> Result<i32, ConversionError>;
}

impl UsizeConversion for usize {
    fn to_u16(self) -> Result<u16, ConversionError> {
        u16::try_from(self).map_err(|_| ConversionError::Overflow)
    }

    fn to_u32(self) -> Result<u32, ConversionError> {
        u32::try_from(self).map_err(|_| ConversionError::Overflow)
    }

    fn to_i32(self) -> Result<i32, ConversionError> {
        i32::try_from(self).map_err(|_| ConversionError::Overflow)
    }
}

/// Narrows an `i32` offset/length back down to `usize` for slice indexing.
pub trait I32Conversion {
    fn to_usize(self) -> Result<usize, ConversionError>;
}

impl I32Conversion for i32 {
    fn to_usize(self) -> Result<usize, ConversionError> {
        usize::try_from(self).map_err(|_| ConversionError::Overflow)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Value exceeds maximum for target type")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrows_within_range() {
        assert_eq!(10usize.to_u16(), Ok(10));
        assert_eq!(10usize.to_i32(), Ok(10));
        assert_eq!(10i32.to_usize(), Ok(10));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            (u16::MAX as usize + 1).to_u16(),
            Err(ConversionError::Overflow)
        );
        assert_eq!((-1i32).to_usize(), Err(ConversionError::Overflow));
    }
}
