//! Test utilities for colpack development.
//!
//! Provides instrumented [`Allocator`]s that record every region they hand
//! out ([`CountingAllocator`], [`FailingAllocator`]) and drop-tracking
//! values ([`Tracked`], [`DropTally`]) for checking that the container
//! destroys each element exactly once.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod tracked;

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use colpack_arrays::{Allocator, HeapAllocator};
use colpack_core::ArraysError;

pub use tracked::{DropTally, Tracked};

/// Heap allocator that counts and audits every region.
///
/// Panics on a release of a region it does not consider live, so a double
/// free or a size mismatch fails the test at the point it happens.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    live: Mutex<Vec<(usize, usize)>>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regions handed out so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Regions released so far.
    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::Relaxed)
    }

    /// Regions handed out and not yet released.
    pub fn live_regions(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Total bytes of regions not yet released.
    pub fn live_bytes(&self) -> usize {
        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.iter().map(|&(_, bytes)| bytes).sum()
    }

    /// Sizes of every live region, oldest first.
    pub fn live_sizes(&self) -> Vec<usize> {
        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.iter().map(|&(_, bytes)| bytes).collect()
    }
}

#[allow(unsafe_code)]
impl Allocator for CountingAllocator {
    fn allocate(&self, bytes: usize) -> Result<NonNull<u8>, ArraysError> {
        let ptr = HeapAllocator.allocate(bytes)?;
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((ptr.as_ptr() as usize, bytes));
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize) {
        let addr = ptr.as_ptr() as usize;
        {
            let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(pos) = live.iter().position(|&entry| entry == (addr, bytes)) else {
                panic!("release of {bytes} bytes at {addr:#x} which is not a live region");
            };
            live.remove(pos);
        }
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        // SAFETY: the region was recorded live by `allocate` with this size.
        unsafe { HeapAllocator.deallocate(ptr, bytes) }
    }
}

/// Allocator that succeeds `succeed_count` times then fails every request.
///
/// Failed requests return [`ArraysError::AllocationFailed`] without
/// touching the heap.
#[derive(Debug)]
pub struct FailingAllocator {
    pub succeed_count: usize,
    call_count: AtomicUsize,
    inner: CountingAllocator,
}

impl FailingAllocator {
    /// Create an allocator that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
            inner: CountingAllocator::new(),
        }
    }

    /// How many times `allocate()` has been called, including failures.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The auditing allocator behind the successful requests.
    pub fn counts(&self) -> &CountingAllocator {
        &self.inner
    }
}

#[allow(unsafe_code)]
impl Allocator for FailingAllocator {
    fn allocate(&self, bytes: usize) -> Result<NonNull<u8>, ArraysError> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed);
        if call >= self.succeed_count {
            return Err(ArraysError::AllocationFailed { bytes });
        }
        self.inner.allocate(bytes)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize) {
        // SAFETY: forwarded caller contract; only `inner` hands out regions.
        unsafe { self.inner.deallocate(ptr, bytes) }
    }
}
