//! Error types for colpack containers.

use std::error::Error;
use std::fmt;

/// Errors raised while configuring or growing a packed-column container.
///
/// Index preconditions are not represented here: an out-of-range index is a
/// caller bug and panics at the call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArraysError {
    /// A configured alignment is not a power of two.
    InvalidAlignment {
        /// The column the alignment was set for, or `None` for the
        /// container-wide default.
        column: Option<usize>,
        /// The rejected value in bytes.
        align: usize,
    },
    /// An alignment override names a column the container does not have.
    UnknownColumn {
        /// The requested column index.
        column: usize,
        /// Number of columns in the container.
        columns: usize,
    },
    /// The buffer size for the requested capacity does not fit in memory.
    CapacityOverflow {
        /// The requested element capacity.
        capacity: usize,
    },
    /// The allocator could not satisfy the request.
    AllocationFailed {
        /// Number of bytes requested.
        bytes: usize,
    },
}

impl fmt::Display for ArraysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAlignment {
                column: Some(column),
                align,
            } => {
                write!(f, "alignment {align} for column {column} is not a power of two")
            }
            Self::InvalidAlignment {
                column: None,
                align,
            } => {
                write!(f, "default alignment {align} is not a power of two")
            }
            Self::UnknownColumn { column, columns } => {
                write!(f, "column {column} out of range for {columns} columns")
            }
            Self::CapacityOverflow { capacity } => {
                write!(f, "buffer size for capacity {capacity} overflows")
            }
            Self::AllocationFailed { bytes } => {
                write!(f, "allocation of {bytes} bytes failed")
            }
        }
    }
}

impl Error for ArraysError {}
