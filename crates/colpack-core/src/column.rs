//! Per-column descriptor metadata.
//!
//! A [`ColumnMeta`] captures everything the layout planner and the lifecycle
//! dispatcher need to know about a column without knowing its element type:
//! size, effective alignment, and how values are relocated and destroyed.

use std::fmt;

use crate::align::Alignment;

/// How a column's elements are moved and destroyed.
///
/// Resolved once per column when the descriptor is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relocation {
    /// No destructor. Ranges move with a single overlapping memory copy and
    /// destruction is a no-op.
    Bitwise,
    /// Has a destructor. Elements are moved one at a time (read at the
    /// source, written at the destination) in an order that is safe for
    /// overlapping ranges, and destroyed one at a time.
    General,
}

impl Relocation {
    /// The relocation class of `T`.
    pub const fn of<T>() -> Self {
        if std::mem::needs_drop::<T>() {
            Self::General
        } else {
            Self::Bitwise
        }
    }
}

/// Type-erased description of one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Rust type name of the element, for diagnostics.
    pub type_name: &'static str,
    /// Size of one element in bytes.
    pub size: usize,
    /// Effective alignment of the column's base address.
    ///
    /// Never weaker than the element type's natural alignment.
    pub align: Alignment,
    /// Move/destroy strategy.
    pub relocation: Relocation,
}

impl ColumnMeta {
    /// Describe a column of `T` with the requested alignment.
    ///
    /// The effective alignment is the stricter of `requested` and
    /// `align_of::<T>()`.
    pub fn of<T>(requested: Alignment) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            size: std::mem::size_of::<T>(),
            align: requested.max(Alignment::of::<T>()),
            relocation: Relocation::of::<T>(),
        }
    }

    /// Bytes occupied by `n` elements of this column, or `None` on overflow.
    pub fn footprint(&self, n: usize) -> Option<usize> {
        self.size.checked_mul(n)
    }
}

impl fmt::Display for ColumnMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (size {}, align {}, {:?})",
            self.type_name, self.size, self.align, self.relocation
        )
    }
}
