//! The allocator seam and the owned buffer handle.
//!
//! An [`Allocator`] hands out raw byte regions with no alignment promise
//! beyond one byte; the layout planner pads for column alignment itself.
//! A [`Buffer`] records one such region so it can be released exactly once.

use std::alloc::Layout;
use std::ptr::NonNull;

use colpack_core::ArraysError;

/// Source of raw memory for a packed-column container.
///
/// The container calls [`allocate`](Allocator::allocate) once per growth
/// event and [`deallocate`](Allocator::deallocate) once for every region it
/// obtained, when the region is replaced or the container is dropped.
pub trait Allocator {
    /// Obtain a fresh, uninitialised region of at least `bytes` bytes.
    fn allocate(&self, bytes: usize) -> Result<NonNull<u8>, ArraysError>;

    /// Release a region.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate`](Allocator::allocate) on
    /// this allocator with the same `bytes`, and must not have been released
    /// already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize);
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, bytes: usize) -> Result<NonNull<u8>, ArraysError> {
        (**self).allocate(bytes)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).deallocate(ptr, bytes) }
    }
}

/// Allocator backed by the global heap (`std::alloc`).
///
/// Stateless; this is the default allocator of
/// [`Arrays`](crate::Arrays).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapAllocator;

impl HeapAllocator {
    /// Alignment requested from the global heap for every region.
    pub const REGION_ALIGN: usize = std::mem::align_of::<usize>();

    fn layout(bytes: usize) -> Result<Layout, ArraysError> {
        Layout::from_size_align(bytes, Self::REGION_ALIGN)
            .map_err(|_| ArraysError::AllocationFailed { bytes })
    }
}

impl Allocator for HeapAllocator {
    fn allocate(&self, bytes: usize) -> Result<NonNull<u8>, ArraysError> {
        let layout = Self::layout(bytes)?;
        if layout.size() == 0 {
            return Ok(NonNull::<usize>::dangling().cast());
        }
        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { std::alloc::alloc(layout) };
        tracing::trace!(bytes, addr = ptr as usize, "heap region allocated");
        NonNull::new(ptr).ok_or(ArraysError::AllocationFailed { bytes })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize) {
        let Ok(layout) = Self::layout(bytes) else {
            debug_assert!(false, "release of {bytes} bytes that were never allocatable");
            tracing::warn!(bytes, "heap region release skipped: invalid layout");
            return;
        };
        if layout.size() == 0 {
            return;
        }
        tracing::trace!(bytes, addr = ptr.as_ptr() as usize, "heap region released");
        // SAFETY: caller guarantees ptr came from `allocate(bytes)`, which
        // used this same layout.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// One region obtained from an [`Allocator`].
///
/// Not `Clone`: the handle is the single owner of the region and is consumed
/// by [`Buffer::release`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Buffer {
    ptr: NonNull<u8>,
    bytes: usize,
}

impl Buffer {
    /// Allocate a region of `bytes` bytes from `alloc`.
    pub(crate) fn allocate<A: Allocator>(alloc: &A, bytes: usize) -> Result<Self, ArraysError> {
        let ptr = alloc.allocate(bytes)?;
        Ok(Self { ptr, bytes })
    }

    /// Start of the region.
    pub(crate) fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Size of the region in bytes.
    pub(crate) fn bytes(&self) -> usize {
        self.bytes
    }

    /// Return the region to `alloc`.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator this buffer was obtained from, and no
    /// live value may remain in the region.
    pub(crate) unsafe fn release<A: Allocator>(self, alloc: &A) {
        // SAFETY: the handle was produced by `Buffer::allocate` on `alloc`
        // and is consumed here, so the region is released once.
        unsafe { alloc.deallocate(self.ptr, self.bytes) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_allocate_returns_region_of_requested_size() {
        let heap = HeapAllocator;
        let ptr = heap.allocate(64).unwrap();
        assert_eq!(ptr.as_ptr() as usize % HeapAllocator::REGION_ALIGN, 0);
        // SAFETY: 64 bytes were just allocated.
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0xAB, 64);
            assert_eq!(*ptr.as_ptr().add(63), 0xAB);
            heap.deallocate(ptr, 64);
        }
    }

    #[test]
    fn heap_zero_byte_region_is_dangling_and_free_is_noop() {
        let heap = HeapAllocator;
        let ptr = heap.allocate(0).unwrap();
        // SAFETY: zero-byte regions are never dereferenced.
        unsafe { heap.deallocate(ptr, 0) };
    }

    #[test]
    fn heap_oversized_request_fails() {
        let heap = HeapAllocator;
        let result = heap.allocate(usize::MAX);
        assert_eq!(
            result,
            Err(ArraysError::AllocationFailed { bytes: usize::MAX })
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "never allocatable")]
    fn heap_release_of_invalid_size_is_flagged() {
        let heap = HeapAllocator;
        // SAFETY: the size has no valid layout, so nothing is freed.
        unsafe { heap.deallocate(NonNull::dangling(), usize::MAX) };
    }

    #[test]
    fn buffer_release_round_trip() {
        let heap = HeapAllocator;
        let buffer = Buffer::allocate(&heap, 128).unwrap();
        assert_eq!(buffer.bytes(), 128);
        // SAFETY: nothing was written into the buffer.
        unsafe { buffer.release(&heap) };
    }

    #[test]
    fn reference_forwards_to_allocator() {
        let heap = HeapAllocator;
        let by_ref: &HeapAllocator = &heap;
        let ptr = Allocator::allocate(&by_ref, 16).unwrap();
        // SAFETY: allocated just above with the same size.
        unsafe { Allocator::deallocate(&by_ref, ptr, 16) };
    }
}
