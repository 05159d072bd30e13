//! Element lifecycle dispatch: destroy, relocate, and swap ranges of
//! elements across every column.
//!
//! Each column carries a [`ColumnDispatch`]: its [`ColumnMeta`] plus three
//! monomorphised function pointers captured when the column set is
//! described. The range operations below walk the column table and route
//! every column through its [`Relocation`] class:
//!
//! - `Bitwise` columns move with one overlapping byte copy and need no
//!   destruction.
//! - `General` columns move one element at a time, ascending when the
//!   destination lies below the source and descending otherwise, and drop
//!   each destroyed element exactly once.
//!
//! All functions here are `unsafe`: they trust the caller's pointer table
//! and index ranges. [`Arrays`](crate::Arrays) is the only caller.

use std::mem;
use std::ptr::{self, NonNull};

use colpack_core::{Alignment, ColumnMeta, Relocation};

/// Type-erased operations for one column.
#[derive(Clone, Copy, Debug)]
pub struct ColumnDispatch {
    meta: ColumnMeta,
    drop_range: unsafe fn(NonNull<u8>, usize),
    move_one: unsafe fn(NonNull<u8>, NonNull<u8>),
    swap_one: unsafe fn(NonNull<u8>, NonNull<u8>),
}

impl ColumnDispatch {
    /// Build the dispatch entry for a column of `T`.
    pub fn of<T>(requested: Alignment) -> Self {
        Self {
            meta: ColumnMeta::of::<T>(requested),
            drop_range: drop_range::<T>,
            move_one: move_one::<T>,
            swap_one: swap_one::<T>,
        }
    }

    /// The column's metadata.
    pub fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    /// Address of element `index` in a column starting at `base`.
    ///
    /// # Safety
    ///
    /// `index` must be within the column's allocated capacity.
    unsafe fn slot(&self, base: NonNull<u8>, index: usize) -> NonNull<u8> {
        // SAFETY: index * size stays inside the column's region per the
        // caller contract.
        unsafe { base.add(index * self.meta.size) }
    }

    /// Drop `count` live elements starting at `from`.
    ///
    /// # Safety
    ///
    /// Slots `[from, from + count)` must hold live values of this column's
    /// type. They are uninitialised afterwards.
    pub(crate) unsafe fn destroy(&self, base: NonNull<u8>, from: usize, count: usize) {
        match self.meta.relocation {
            Relocation::Bitwise => {}
            Relocation::General => {
                // SAFETY: caller contract.
                unsafe { (self.drop_range)(self.slot(base, from), count) }
            }
        }
    }

    /// Move `count` elements from `src[src_from..]` to `dst[dst_from..]`.
    ///
    /// The ranges may overlap (same base, shifted indices). After the call
    /// the destination range holds the values and the part of the source
    /// range not covered by the destination is uninitialised.
    ///
    /// # Safety
    ///
    /// The source range must hold live values; the destination range must be
    /// allocated, and any part of it outside the source range must be
    /// uninitialised.
    pub(crate) unsafe fn relocate(
        &self,
        src: NonNull<u8>,
        src_from: usize,
        dst: NonNull<u8>,
        dst_from: usize,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        // SAFETY: both ranges lie within allocated column regions per the
        // caller contract.
        let (from, to) = unsafe { (self.slot(src, src_from), self.slot(dst, dst_from)) };
        match self.meta.relocation {
            Relocation::Bitwise => {
                // SAFETY: `ptr::copy` is memmove and tolerates overlap.
                unsafe { ptr::copy(from.as_ptr(), to.as_ptr(), count * self.meta.size) }
            }
            Relocation::General => {
                let size = self.meta.size;
                let step = |i: usize| {
                    // SAFETY: element i is live at the source and its
                    // destination slot has already been vacated (or was
                    // never initialised) given the traversal order.
                    unsafe { (self.move_one)(from.add(i * size), to.add(i * size)) }
                };
                if to < from {
                    (0..count).for_each(step);
                } else {
                    (0..count).rev().for_each(step);
                }
            }
        }
    }

    /// Exchange elements `a` and `b`.
    ///
    /// # Safety
    ///
    /// Both slots must hold live values and `a != b`.
    pub(crate) unsafe fn swap(&self, base: NonNull<u8>, a: usize, b: usize) {
        // SAFETY: caller contract; distinct indices give disjoint slots.
        unsafe {
            let (pa, pb) = (self.slot(base, a), self.slot(base, b));
            match self.meta.relocation {
                Relocation::Bitwise => {
                    ptr::swap_nonoverlapping(pa.as_ptr(), pb.as_ptr(), self.meta.size)
                }
                Relocation::General => (self.swap_one)(pa, pb),
            }
        }
    }
}

unsafe fn drop_range<T>(first: NonNull<u8>, count: usize) {
    let slice = ptr::slice_from_raw_parts_mut(first.cast::<T>().as_ptr(), count);
    // SAFETY: caller guarantees `count` live, aligned values of T.
    unsafe { ptr::drop_in_place(slice) }
}

unsafe fn move_one<T>(src: NonNull<u8>, dst: NonNull<u8>) {
    // SAFETY: src holds a live T which is moved out (and so ends there);
    // dst is an aligned, vacant slot.
    unsafe { dst.cast::<T>().write(src.cast::<T>().read()) }
}

unsafe fn swap_one<T>(a: NonNull<u8>, b: NonNull<u8>) {
    let (a, b) = (a.cast::<T>(), b.cast::<T>());
    // SAFETY: a and b are distinct live slots; the three moves leave each
    // holding exactly one live value.
    unsafe {
        let tmp = a.read();
        a.copy_from_nonoverlapping(b, 1);
        b.write(tmp);
    }
}

/// Drop `[from, from + count)` in every column.
///
/// If an element's destructor panics, the columns after it are still
/// destroyed while unwinding.
///
/// # Safety
///
/// See [`ColumnDispatch::destroy`]; `ptrs` holds one base per column.
pub(crate) unsafe fn destroy_range(
    columns: &[ColumnDispatch],
    ptrs: &[NonNull<u8>],
    from: usize,
    count: usize,
) {
    debug_assert_eq!(columns.len(), ptrs.len());
    for (i, (column, &base)) in columns.iter().zip(ptrs).enumerate() {
        let rest = DestroyRest {
            columns: &columns[i + 1..],
            ptrs: &ptrs[i + 1..],
            from,
            count,
        };
        // SAFETY: forwarded caller contract.
        unsafe { column.destroy(base, from, count) };
        mem::forget(rest);
    }
}

/// Destroys the remaining columns of a [`destroy_range`] call when dropped.
/// Only dropped during unwinding; forgotten otherwise.
struct DestroyRest<'a> {
    columns: &'a [ColumnDispatch],
    ptrs: &'a [NonNull<u8>],
    from: usize,
    count: usize,
}

impl Drop for DestroyRest<'_> {
    fn drop(&mut self) {
        // SAFETY: these columns were not touched yet, so the range still
        // holds live values per the `destroy_range` contract.
        unsafe { destroy_range(self.columns, self.ptrs, self.from, self.count) }
    }
}

/// Relocate `count` elements in every column, from `src` tables to `dst`
/// tables. `src` and `dst` may be the same table.
///
/// # Safety
///
/// See [`ColumnDispatch::relocate`].
pub(crate) unsafe fn relocate_range(
    columns: &[ColumnDispatch],
    src: &[NonNull<u8>],
    src_from: usize,
    dst: &[NonNull<u8>],
    dst_from: usize,
    count: usize,
) {
    debug_assert_eq!(columns.len(), src.len());
    debug_assert_eq!(columns.len(), dst.len());
    for ((column, &from), &to) in columns.iter().zip(src).zip(dst) {
        // SAFETY: forwarded caller contract.
        unsafe { column.relocate(from, src_from, to, dst_from, count) }
    }
}

/// Swap rows `a` and `b` in every column.
///
/// # Safety
///
/// See [`ColumnDispatch::swap`].
pub(crate) unsafe fn swap_rows(
    columns: &[ColumnDispatch],
    ptrs: &[NonNull<u8>],
    a: usize,
    b: usize,
) {
    for (column, &base) in columns.iter().zip(ptrs) {
        // SAFETY: forwarded caller contract.
        unsafe { column.swap(base, a, b) }
    }
}
