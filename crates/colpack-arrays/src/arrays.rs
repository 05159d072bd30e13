//! The packed-column container.

use std::alloc::{handle_alloc_error, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::slice;

use smallvec::SmallVec;

use colpack_core::{Alignment, ArraysConfig, ArraysError, ColumnMeta, GrowthPolicy};

use crate::alloc::{Allocator, Buffer, HeapAllocator};
use crate::layout::{BufferLayout, LayoutPlanner, PointerTable};
use crate::lifecycle::{self, ColumnDispatch};
use crate::set::{ColumnAt, ColumnSet, ColumnTable};
use crate::view::ColumnView;

/// A struct-of-arrays container: one column per element of the tuple `C`,
/// all columns stored back to back in a single allocation from `A`.
///
/// Every column always has the same length. Rows are appended, inserted,
/// removed, and swapped across all columns at once; columns are read and
/// written individually through [`data`](Self::data),
/// [`at`](Self::at), and their `_mut` counterparts.
///
/// ```
/// use colpack_arrays::Arrays;
///
/// let mut people: Arrays<(u32, String)> = Arrays::new();
/// people.append((1, "one".to_string()));
/// people.append((3, "three".to_string()));
/// people.insert_at(1, (2, "two".to_string()));
///
/// assert_eq!(people.data::<0>(), &[1, 2, 3]);
/// assert_eq!(people.at::<1>(1), "two");
/// ```
pub struct Arrays<C: ColumnSet, A: Allocator = HeapAllocator> {
    /// Live rows in every column.
    len: usize,
    /// Allocated rows in every column.
    capacity: usize,
    buffer: Option<Buffer>,
    /// Base of each column; dangling but aligned while `buffer` is `None`.
    ptrs: PointerTable,
    columns: ColumnTable,
    growth: GrowthPolicy,
    alloc: A,
    _rows: PhantomData<C>,
}

// SAFETY: the container exclusively owns its buffer and the values in it,
// so moving it to another thread moves those values with it.
unsafe impl<C: ColumnSet + Send, A: Allocator + Send> Send for Arrays<C, A> {}

impl<C: ColumnSet> Arrays<C> {
    /// Create an empty container on the global heap with default
    /// configuration. Does not allocate.
    pub fn new() -> Self {
        Self::new_in(HeapAllocator)
    }

    /// Create a container on the global heap with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arrays = Self::new();
        arrays.reserve(capacity);
        arrays
    }

    /// Create an empty container on the global heap with the given
    /// configuration.
    pub fn with_config(config: &ArraysConfig) -> Result<Self, ArraysError> {
        Self::with_config_in(config, HeapAllocator)
    }
}

impl<C: ColumnSet, A: Allocator> Arrays<C, A> {
    /// Create an empty container drawing memory from `alloc`. Does not
    /// allocate.
    pub fn new_in(alloc: A) -> Self {
        let alignments: SmallVec<[Alignment; 8]> =
            SmallVec::from_elem(Alignment::DEFAULT, C::COLUMNS);
        Self::from_parts(&alignments, GrowthPolicy::default(), alloc)
    }

    /// Create an empty container drawing memory from `alloc` with the given
    /// configuration.
    ///
    /// Fails if an alignment is not a power of two or an override names a
    /// column past the end of `C`.
    pub fn with_config_in(config: &ArraysConfig, alloc: A) -> Result<Self, ArraysError> {
        let alignments = config.resolve_alignments(C::COLUMNS)?;
        Ok(Self::from_parts(&alignments, config.growth, alloc))
    }

    fn from_parts(alignments: &[Alignment], growth: GrowthPolicy, alloc: A) -> Self {
        let columns = C::describe(alignments);
        let ptrs = LayoutPlanner::new(&columns).dangling();
        Self {
            len: 0,
            capacity: 0,
            buffer: None,
            ptrs,
            columns,
            growth,
            alloc,
            _rows: PhantomData,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of rows. Alias of [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.len
    }

    /// Whether the container holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of rows the current buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The allocator backing this container.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// The growth policy used by [`append`](Self::append) and
    /// [`insert_at`](Self::insert_at).
    pub fn growth(&self) -> GrowthPolicy {
        self.growth
    }

    /// Metadata of each column, in column order.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &ColumnMeta> + '_ {
        self.columns.iter().map(ColumnDispatch::meta)
    }

    /// Placement of each column inside the current buffer, or `None` if
    /// nothing has been allocated yet.
    pub fn layout(&self) -> Option<BufferLayout> {
        let buffer = self.buffer.as_ref()?;
        LayoutPlanner::new(&self.columns)
            .describe(buffer.ptr().as_ptr() as usize, self.capacity)
            .ok()
    }

    /// Ensure capacity for at least `capacity` rows in total.
    ///
    /// Note that `capacity` is absolute, not additional. No-op if the
    /// current capacity is already large enough; otherwise a new buffer
    /// holding exactly `capacity` rows replaces the old one.
    ///
    /// # Panics
    ///
    /// Panics if the buffer size overflows; aborts through
    /// [`handle_alloc_error`] if the allocator fails.
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(err) = self.try_reserve(capacity) {
            growth_failed(err);
        }
    }

    /// Fallible [`reserve`](Self::reserve).
    ///
    /// On error the container is unchanged.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), ArraysError> {
        if capacity <= self.capacity {
            return Ok(());
        }
        let planner = LayoutPlanner::new(&self.columns);
        let bytes = planner.buffer_bytes(capacity)?;
        let buffer = Buffer::allocate(&self.alloc, bytes).inspect_err(|err| {
            tracing::warn!(%err, bytes, capacity, "column buffer allocation failed");
        })?;
        // SAFETY: the buffer spans `buffer_bytes(capacity)` bytes.
        let ptrs = match unsafe { planner.place(&buffer, capacity) } {
            Ok(ptrs) => ptrs,
            Err(err) => {
                // SAFETY: fresh buffer from this allocator, nothing written.
                unsafe { buffer.release(&self.alloc) };
                return Err(err);
            }
        };
        // SAFETY: rows [0, len) are live in the old columns, and the new
        // columns are vacant and do not overlap the old buffer.
        unsafe { lifecycle::relocate_range(&self.columns, &self.ptrs, 0, &ptrs, 0, self.len) };
        if let Some(old) = self.buffer.replace(buffer) {
            // SAFETY: every live value was moved out of the old buffer above.
            unsafe { old.release(&self.alloc) };
        }
        let previous = self.capacity;
        self.ptrs = ptrs;
        self.capacity = capacity;
        tracing::debug!(
            previous,
            capacity,
            bytes,
            columns = self.columns.len(),
            "column buffer replaced"
        );
        Ok(())
    }

    fn grow_for_one(&mut self) {
        let Some(required) = self.len.checked_add(1) else {
            growth_failed(ArraysError::CapacityOverflow {
                capacity: self.len,
            });
        };
        let target = self.growth.next_capacity(self.capacity, required);
        self.reserve(target);
    }

    /// Append a row: one value per column, in column order.
    pub fn append(&mut self, row: C) {
        self.grow_for_one();
        // SAFETY: len < capacity after growing, so slot `len` is allocated
        // and vacant in every column.
        unsafe { row.write_row(&self.ptrs, self.len) };
        self.len += 1;
    }

    /// Insert a row at `index`, shifting rows `[index, len)` up by one.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_at(&mut self, index: usize, row: C) {
        let len = self.len;
        assert!(index <= len, "insert_at index {index} out of range (len {len})");
        self.grow_for_one();
        // SAFETY: capacity > len, so shifting [index, len) up by one stays
        // in bounds and leaves slot `index` vacant for the new row.
        unsafe {
            let ptrs = &self.ptrs;
            lifecycle::relocate_range(&self.columns, ptrs, index, ptrs, index + 1, len - index);
            row.write_row(&self.ptrs, index);
        }
        self.len += 1;
    }

    /// Remove the row at `index` and return it, shifting rows after it down
    /// by one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn take_at(&mut self, index: usize) -> C {
        let len = self.len;
        assert!(index < len, "remove index {index} out of range (len {len})");
        // SAFETY: slot `index` is live; once it is moved out, rows
        // (index, len) shift down into the vacated slot.
        unsafe {
            let row = C::read_row(&self.ptrs, index);
            let ptrs = &self.ptrs;
            lifecycle::relocate_range(&self.columns, ptrs, index + 1, ptrs, index, len - index - 1);
            self.len -= 1;
            row
        }
    }

    /// Remove and drop the row at `index`, shifting rows after it down by
    /// one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) {
        drop(self.take_at(index));
    }

    /// Exchange rows `a` and `b` in every column. No-op when `a == b`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn swap_at(&mut self, a: usize, b: usize) {
        let len = self.len;
        assert!(a < len, "swap index {a} out of range (len {len})");
        assert!(b < len, "swap index {b} out of range (len {len})");
        if a != b {
            // SAFETY: both rows are live and distinct.
            unsafe { lifecycle::swap_rows(&self.columns, &self.ptrs, a, b) };
        }
    }

    /// Remove and return the last row.
    pub fn pop(&mut self) -> Option<C> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was the last live row and is now outside the
        // live range.
        Some(unsafe { C::read_row(&self.ptrs, self.len) })
    }

    /// Drop rows `[len, self.len())`, keeping the buffer. No-op if `len` is
    /// not smaller than the current length.
    pub fn truncate(&mut self, len: usize) {
        let old = self.len;
        if len >= old {
            return;
        }
        self.len = len;
        // SAFETY: rows [len, old) were live and are now outside the live
        // range, so they are dropped exactly once.
        unsafe { lifecycle::destroy_range(&self.columns, &self.ptrs, len, old - len) };
    }

    /// Drop every row, keeping the buffer.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// The live elements of column `I`.
    pub fn data<const I: usize>(&self) -> &[<C as ColumnAt<I>>::Elem]
    where
        C: ColumnAt<I>,
    {
        // SAFETY: column I starts at ptrs[I], is aligned for its element
        // type, and holds `len` live elements.
        unsafe { slice::from_raw_parts(self.ptrs[I].cast().as_ptr(), self.len) }
    }

    /// The live elements of column `I`, mutably.
    pub fn data_mut<const I: usize>(&mut self) -> &mut [<C as ColumnAt<I>>::Elem]
    where
        C: ColumnAt<I>,
    {
        // SAFETY: as in `data`; `&mut self` makes the borrow unique.
        unsafe { slice::from_raw_parts_mut(self.ptrs[I].cast().as_ptr(), self.len) }
    }

    /// Base pointer of column `I`.
    ///
    /// Valid for `capacity()` elements; only the first `len()` are
    /// initialised. Invalidated by any operation that grows the container.
    pub fn as_ptr<const I: usize>(&self) -> *const <C as ColumnAt<I>>::Elem
    where
        C: ColumnAt<I>,
    {
        self.ptrs[I].cast().as_ptr()
    }

    /// Mutable base pointer of column `I`. See [`as_ptr`](Self::as_ptr).
    pub fn as_mut_ptr<const I: usize>(&mut self) -> *mut <C as ColumnAt<I>>::Elem
    where
        C: ColumnAt<I>,
    {
        self.ptrs[I].cast().as_ptr()
    }

    /// Element `index` of column `I`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn at<const I: usize>(&self, index: usize) -> &<C as ColumnAt<I>>::Elem
    where
        C: ColumnAt<I>,
    {
        let len = self.len;
        assert!(index < len, "at index {index} out of range (len {len})");
        &self.data::<I>()[index]
    }

    /// Element `index` of column `I`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn at_mut<const I: usize>(&mut self, index: usize) -> &mut <C as ColumnAt<I>>::Elem
    where
        C: ColumnAt<I>,
    {
        let len = self.len;
        assert!(index < len, "at index {index} out of range (len {len})");
        &mut self.data_mut::<I>()[index]
    }

    /// Read-only view of column `I`.
    pub fn column<const I: usize>(&self) -> ColumnView<'_, <C as ColumnAt<I>>::Elem>
    where
        C: ColumnAt<I>,
    {
        ColumnView::new(self.data::<I>())
    }

    /// Borrow row `index` as a tuple of references.
    pub fn row<'a>(&'a self, index: usize) -> Option<C::Ref<'a>> {
        // SAFETY: the row is live and `&self` excludes mutable borrows.
        (index < self.len).then(|| unsafe { C::row_ref(&self.ptrs, index) })
    }

    /// Borrow row `index` as a tuple of mutable references.
    pub fn row_mut<'a>(&'a mut self, index: usize) -> Option<C::Mut<'a>> {
        // SAFETY: the row is live and `&mut self` makes the borrow unique.
        (index < self.len).then(|| unsafe { C::row_mut(&self.ptrs, index) })
    }

    /// Iterate rows as tuples of references.
    pub fn rows<'a>(&'a self) -> impl Iterator<Item = C::Ref<'a>> + 'a {
        let ptrs = &self.ptrs;
        // SAFETY: every index below len is a live row borrowed for 'a.
        (0..self.len).map(move |index| unsafe { C::row_ref(ptrs, index) })
    }

    /// Iterate rows as tuples of mutable references.
    pub fn rows_mut<'a>(&'a mut self) -> impl Iterator<Item = C::Mut<'a>> + 'a {
        let ptrs = &self.ptrs;
        // SAFETY: `&mut self` is held for 'a and each index is yielded once,
        // so no two yielded rows alias.
        (0..self.len).map(move |index| unsafe { C::row_mut(ptrs, index) })
    }
}

#[cold]
fn growth_failed(err: ArraysError) -> ! {
    if let ArraysError::AllocationFailed { bytes } = err {
        if let Ok(layout) = Layout::from_size_align(bytes, 1) {
            handle_alloc_error(layout);
        }
    }
    panic!("packed column growth failed: {err}");
}

impl<C: ColumnSet, A: Allocator> Drop for Arrays<C, A> {
    fn drop(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        let _release = ReleaseOnDrop {
            buffer: self.buffer.take(),
            alloc: &self.alloc,
        };
        // SAFETY: rows [0, len) are live and `len` is already zero, so each
        // is dropped exactly once. The guard frees the buffer afterwards,
        // also when a destructor panics.
        unsafe { lifecycle::destroy_range(&self.columns, &self.ptrs, 0, len) };
    }
}

/// Returns a buffer to its allocator when dropped.
struct ReleaseOnDrop<'a, A: Allocator> {
    buffer: Option<Buffer>,
    alloc: &'a A,
}

impl<A: Allocator> Drop for ReleaseOnDrop<'_, A> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            // SAFETY: the owning container has destroyed every live value,
            // and the buffer came from this allocator.
            unsafe { buffer.release(self.alloc) };
        }
    }
}

impl<C: ColumnSet, A: Allocator + Default> Default for Arrays<C, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<C: ColumnSet, A: Allocator> Extend<C> for Arrays<C, A> {
    fn extend<I: IntoIterator<Item = C>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(self.len.saturating_add(lower));
        for row in iter {
            self.append(row);
        }
    }
}

impl<C: ColumnSet> FromIterator<C> for Arrays<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut arrays = Self::new();
        arrays.extend(iter);
        arrays
    }
}

impl<C: ColumnSet, A: Allocator> fmt::Debug for Arrays<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arrays")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("bytes", &self.buffer.as_ref().map_or(0, Buffer::bytes))
            .field("growth", &self.growth)
            .field("columns", &self.columns().collect::<Vec<_>>())
            .finish()
    }
}
