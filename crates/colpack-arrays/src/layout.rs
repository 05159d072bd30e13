//! Column placement inside a single buffer.
//!
//! The [`LayoutPlanner`] answers two questions for a capacity `n`: how many
//! bytes to request from the allocator, and where each column starts inside
//! the region it returns. Columns are laid out in declaration order:
//!
//! ```text
//! region start
//! │ pad │ column 0: size_0 × n │ pad │ column 1: size_1 × n │ ... │ slack │
//!       ^ aligned to align_0         ^ aligned to align_1
//! ```
//!
//! The byte budget is `Σ size_i × n + Σ align_i`. Each column needs at most
//! `align_i - 1` bytes of padding, so the budget never under-allocates no
//! matter where the allocator places the region.

use std::fmt;
use std::ptr::NonNull;

use smallvec::SmallVec;

use colpack_core::{Alignment, ArraysError, ColumnMeta};

use crate::alloc::Buffer;
use crate::lifecycle::ColumnDispatch;

/// One base pointer per column.
pub(crate) type PointerTable = SmallVec<[NonNull<u8>; 8]>;

/// Plans buffer size and column placement for a set of columns.
#[derive(Clone, Copy, Debug)]
pub struct LayoutPlanner<'a> {
    columns: &'a [ColumnDispatch],
}

impl<'a> LayoutPlanner<'a> {
    /// Create a planner over `columns`, in declaration order.
    pub fn new(columns: &'a [ColumnDispatch]) -> Self {
        Self { columns }
    }

    fn metas(&self) -> impl Iterator<Item = &'a ColumnMeta> + 'a {
        self.columns.iter().map(ColumnDispatch::meta)
    }

    /// Total bytes to request for `n` elements per column.
    ///
    /// Fails with [`ArraysError::CapacityOverflow`] if the size does not fit
    /// in `isize::MAX`.
    pub fn buffer_bytes(&self, n: usize) -> Result<usize, ArraysError> {
        let overflow = ArraysError::CapacityOverflow { capacity: n };
        let mut total: usize = 0;
        for meta in self.metas() {
            total = meta
                .footprint(n)
                .and_then(|bytes| total.checked_add(bytes))
                .and_then(|sum| sum.checked_add(meta.align.get()))
                .ok_or(overflow.clone())?;
        }
        if total > isize::MAX as usize {
            return Err(overflow);
        }
        Ok(total)
    }

    /// Byte offset of each column from `base_addr` for capacity `n`.
    ///
    /// Each offset makes `base_addr + offset` a multiple of the column's
    /// alignment, and the last column ends within
    /// [`buffer_bytes(n)`](Self::buffer_bytes) of `base_addr`.
    pub fn offsets(&self, base_addr: usize, n: usize) -> Result<SmallVec<[usize; 8]>, ArraysError> {
        let overflow = ArraysError::CapacityOverflow { capacity: n };
        let mut offsets = SmallVec::with_capacity(self.columns.len());
        let mut cursor = base_addr;
        for meta in self.metas() {
            let start = meta.align.align_up(cursor).ok_or(overflow.clone())?;
            offsets.push(start - base_addr);
            cursor = meta
                .footprint(n)
                .and_then(|bytes| start.checked_add(bytes))
                .ok_or(overflow.clone())?;
        }
        Ok(offsets)
    }

    /// Base pointers for every column inside `buffer`, sized for `n`.
    ///
    /// # Safety
    ///
    /// `buffer` must span at least `buffer_bytes(n)` bytes.
    pub(crate) unsafe fn place(
        &self,
        buffer: &Buffer,
        n: usize,
    ) -> Result<PointerTable, ArraysError> {
        let base = buffer.ptr();
        let offsets = self.offsets(base.as_ptr() as usize, n)?;
        Ok(offsets
            .into_iter()
            // SAFETY: every offset lies within `buffer_bytes(n)`, which the
            // caller guarantees the buffer spans.
            .map(|offset| unsafe { base.add(offset) })
            .collect())
    }

    /// Placeholder base pointers for a container with no buffer.
    ///
    /// Each pointer is non-null and aligned for its column, so zero-length
    /// slices can be formed from it.
    pub(crate) fn dangling(&self) -> PointerTable {
        self.metas().map(|meta| dangling_for(meta.align)).collect()
    }

    /// Describe where each column sits inside a region starting at
    /// `base_addr` with capacity `n`.
    pub fn describe(&self, base_addr: usize, n: usize) -> Result<BufferLayout, ArraysError> {
        let bytes = self.buffer_bytes(n)?;
        let offsets = self.offsets(base_addr, n)?;
        let columns = self
            .metas()
            .zip(offsets)
            .map(|(meta, offset)| ColumnSpan {
                offset,
                bytes: meta.size * n,
                align: meta.align,
            })
            .collect();
        Ok(BufferLayout {
            capacity: n,
            bytes,
            columns,
        })
    }
}

fn dangling_for(align: Alignment) -> NonNull<u8> {
    let ptr = std::ptr::without_provenance_mut::<u8>(align.get());
    // SAFETY: alignments are non-zero powers of two.
    unsafe { NonNull::new_unchecked(ptr) }
}

/// Placement of one column inside a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnSpan {
    /// Byte offset of the column's first element from the region start.
    pub offset: usize,
    /// Bytes reserved for the column (`size × capacity`).
    pub bytes: usize,
    /// Alignment of the column's base address.
    pub align: Alignment,
}

/// Snapshot of a buffer's column placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferLayout {
    /// Element capacity the layout was planned for.
    pub capacity: usize,
    /// Total bytes requested from the allocator.
    pub bytes: usize,
    /// Per-column placement, in column order.
    pub columns: SmallVec<[ColumnSpan; 8]>,
}

impl fmt::Display for BufferLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "capacity {} in {} bytes", self.capacity, self.bytes)?;
        for (i, span) in self.columns.iter().enumerate() {
            writeln!(
                f,
                " {i}: offset {} ({} bytes, align {})",
                span.offset, span.bytes, span.align
            )?;
        }
        Ok(())
    }
}
