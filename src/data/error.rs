//! Data loading errors.

use std::fmt;

/// Errors produced by the data loading module.
///
/// # Variants
///
/// - **Io**: The input file could not be read (missing, unreadable, or not
///   valid UTF-8). The source error carries details.
///
/// - **EmptyFile**: The file was read but yields no data items, so there is
///   nothing to train on.
///
/// - **EmptyDataItem**: A line trimmed to an empty string; every line must be
///   a non-empty document.
#[derive(Debug)]
pub enum DataError {
    /// I/O error while reading the input file.
    Io(std::io::Error),

    /// The input file yields no data items.
    EmptyFile,

    /// A line was empty after trimming.
    EmptyDataItem,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "data io: {e}"),
            DataError::EmptyFile => write!(f, "data: input file is empty"),
            DataError::EmptyDataItem => write!(f, "data: empty line in input"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(e) => Some(e),
            DataError::EmptyFile | DataError::EmptyDataItem => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e)
    }
}
