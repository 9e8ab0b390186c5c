use std::error;
use std::fmt;

/// Fatal and non-fatal conditions raised while decoding a world or map file.
///
/// Fatal variants (`InvalidFile`, `UnsupportedVersion`, `Truncated`,
/// `OutOfRange`, `VarintOverflow`, `MissingAsset`) are returned as `Err`.
/// `Inconsistency` is never returned; it is collected into a
/// [`crate::diagnostics::Warnings`] sink instead.
#[derive(Debug)]
pub enum DecodeError {
    InvalidFile { reason: &'static str, offset: Option<u64> },
    UnsupportedVersion { found: u32, minimum: u32 },
    Truncated { wanted: usize, offset: u64 },
    OutOfRange { reason: &'static str, offset: Option<u64> },
    VarintOverflow { offset: u64 },
    MissingAsset { name: &'static str, detail: String },
}

impl DecodeError {
    pub(crate) fn invalid(reason: &'static str) -> Self {
        DecodeError::InvalidFile { reason, offset: None }
    }

    pub(crate) fn invalid_at(reason: &'static str, offset: u64) -> Self {
        DecodeError::InvalidFile { reason, offset: Some(offset) }
    }

    pub(crate) fn out_of_range(reason: &'static str, offset: u64) -> Self {
        DecodeError::OutOfRange { reason, offset: Some(offset) }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidFile { reason, offset } => match offset {
                Some(off) => write!(f, "invalid file: {reason} (at byte {off})"),
                None => write!(f, "invalid file: {reason}"),
            },
            DecodeError::UnsupportedVersion { found, minimum } => write!(
                f,
                "unsupported version {found}, need at least {minimum}"
            ),
            DecodeError::Truncated { wanted, offset } => write!(
                f,
                "unexpected end of file: wanted {wanted} more byte(s) at offset {offset}"
            ),
            DecodeError::OutOfRange { reason, offset } => match offset {
                Some(off) => write!(f, "value out of range: {reason} (at byte {off})"),
                None => write!(f, "value out of range: {reason}"),
            },
            DecodeError::VarintOverflow { offset } => {
                write!(f, "packed varint overflowed 64 bits (starting at byte {offset})")
            }
            DecodeError::MissingAsset { name, detail } => {
                write!(f, "missing or malformed asset {name}: {detail}")
            }
        }
    }
}

impl error::Error for DecodeError {}

pub type Result<T> = std::result::Result<T, DecodeError>;
