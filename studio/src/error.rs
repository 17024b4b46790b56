use std::{io, ops::Range};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    /// An offset/count pair, or a count derived from two offsets, does not fit the data
    /// it points into, or points back into data already read too many times.
    #[error("corrupt data in `{field}`: bytes {}..{} cannot be read ({len} byte buffer)", range.start, range.end)]
    CorruptData {
        field: &'static str,
        range: Range<i64>,
        len: usize,
    },
    #[error("truncated string in `{field}`: no terminator after byte {offset}")]
    Truncated { field: &'static str, offset: usize },
    #[error("{path:?} file not found")]
    MissingFile { path: String },
    #[error("IOError: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl StudioError {
    pub(crate) fn corrupt(field: &'static str, range: Range<i64>, len: usize) -> Self {
        Self::CorruptData { field, range, len }
    }

    /// Name of the field that failed to decode, if the error came from decoding.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::CorruptData { field, .. } | Self::Truncated { field, .. } => Some(field),
            Self::MissingFile { .. } | Self::Io { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
