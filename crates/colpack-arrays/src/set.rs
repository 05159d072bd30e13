//! Column sets: tuples of element types.
//!
//! A container is parameterised by a tuple such as `(i32, String)`; each
//! tuple position is one column. [`ColumnSet`] is implemented for tuples of
//! one to twelve elements. It turns the tuple into a runtime
//! [`ColumnDispatch`] table and provides the typed row paths (write, read,
//! borrow) that the type-erased dispatcher cannot. [`ColumnAt`] maps a
//! column index to its element type for typed column access.
//!
//! Because a row is the tuple itself, passing the wrong number of values to
//! `append` or `insert_at` is a type error.

use std::ptr::NonNull;

use smallvec::SmallVec;

use colpack_core::Alignment;

use crate::lifecycle::ColumnDispatch;

/// Descriptor table for a column set.
pub type ColumnTable = SmallVec<[ColumnDispatch; 8]>;

mod sealed {
    pub trait Sealed {}
}

/// A fixed, ordered set of column element types.
///
/// Sealed: implemented for tuples `(T0,)` through
/// `(T0, ..., T11)`.
pub trait ColumnSet: sealed::Sealed + Sized {
    /// Number of columns.
    const COLUMNS: usize;

    /// A row of shared references, one per column.
    type Ref<'a>
    where
        Self: 'a;

    /// A row of mutable references, one per column.
    type Mut<'a>
    where
        Self: 'a;

    /// Build the dispatch table, one entry per column, using the requested
    /// alignment of each column.
    ///
    /// `alignments` holds exactly [`COLUMNS`](Self::COLUMNS) entries.
    fn describe(alignments: &[Alignment]) -> ColumnTable;

    /// Move each tuple field into slot `index` of its column.
    ///
    /// # Safety
    ///
    /// `ptrs` holds one correctly aligned base per column and slot `index`
    /// is allocated and vacant in every column.
    unsafe fn write_row(self, ptrs: &[NonNull<u8>], index: usize);

    /// Move the values in slot `index` out of every column.
    ///
    /// # Safety
    ///
    /// Slot `index` holds live values in every column; they are vacant
    /// afterwards.
    unsafe fn read_row(ptrs: &[NonNull<u8>], index: usize) -> Self;

    /// Borrow slot `index` of every column.
    ///
    /// # Safety
    ///
    /// Slot `index` holds live values in every column, and no mutable
    /// borrow of them exists for `'a`.
    unsafe fn row_ref<'a>(ptrs: &[NonNull<u8>], index: usize) -> Self::Ref<'a>
    where
        Self: 'a;

    /// Mutably borrow slot `index` of every column.
    ///
    /// # Safety
    ///
    /// Slot `index` holds live values in every column, and no other borrow
    /// of them exists for `'a`.
    unsafe fn row_mut<'a>(ptrs: &[NonNull<u8>], index: usize) -> Self::Mut<'a>
    where
        Self: 'a;
}

/// Element type of column `I` in a column set.
pub trait ColumnAt<const I: usize>: ColumnSet {
    /// The element type stored in column `I`.
    type Elem;
}

macro_rules! column_at {
    (($($all:ident),+);) => {};
    (($($all:ident),+); $idx:tt $T:ident $(, $rest_idx:tt $rest_T:ident)*) => {
        impl<$($all),+> ColumnAt<$idx> for ($($all,)+) {
            type Elem = $T;
        }
        column_at!(($($all),+); $($rest_idx $rest_T),*);
    };
}

macro_rules! column_set {
    ($count:expr; $($idx:tt $T:ident),+) => {
        impl<$($T),+> sealed::Sealed for ($($T,)+) {}

        impl<$($T),+> ColumnSet for ($($T,)+) {
            const COLUMNS: usize = $count;

            type Ref<'a> = ($(&'a $T,)+) where Self: 'a;
            type Mut<'a> = ($(&'a mut $T,)+) where Self: 'a;

            fn describe(alignments: &[Alignment]) -> ColumnTable {
                debug_assert_eq!(alignments.len(), Self::COLUMNS);
                let mut table = ColumnTable::new();
                $( table.push(ColumnDispatch::of::<$T>(alignments[$idx])); )+
                table
            }

            unsafe fn write_row(self, ptrs: &[NonNull<u8>], index: usize) {
                // SAFETY: caller contract.
                $( unsafe { ptrs[$idx].cast::<$T>().add(index).write(self.$idx) }; )+
            }

            unsafe fn read_row(ptrs: &[NonNull<u8>], index: usize) -> Self {
                // SAFETY: caller contract.
                ($( unsafe { ptrs[$idx].cast::<$T>().add(index).read() }, )+)
            }

            unsafe fn row_ref<'a>(ptrs: &[NonNull<u8>], index: usize) -> Self::Ref<'a>
            where
                Self: 'a,
            {
                // SAFETY: caller contract.
                ($( unsafe { ptrs[$idx].cast::<$T>().add(index).as_ref() }, )+)
            }

            unsafe fn row_mut<'a>(ptrs: &[NonNull<u8>], index: usize) -> Self::Mut<'a>
            where
                Self: 'a,
            {
                // SAFETY: caller contract; columns are disjoint regions.
                ($( unsafe { ptrs[$idx].cast::<$T>().add(index).as_mut() }, )+)
            }
        }

        column_at!(($($T),+); $($idx $T),+);
    };
}

column_set!(1; 0 T0);
column_set!(2; 0 T0, 1 T1);
column_set!(3; 0 T0, 1 T1, 2 T2);
column_set!(4; 0 T0, 1 T1, 2 T2, 3 T3);
column_set!(5; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4);
column_set!(6; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5);
column_set!(7; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6);
column_set!(8; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7);
column_set!(9; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7, 8 T8);
column_set!(10; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7, 8 T8, 9 T9);
column_set!(11; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7, 8 T8, 9 T9, 10 T10);
column_set!(12; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7, 8 T8, 9 T9, 10 T10, 11 T11);
