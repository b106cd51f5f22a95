//! Bump allocator with marker-based rollback.
//!
//! Individual allocations cannot be released. Callers take a
//! [`StackMarker`] and later roll the stack back to it, releasing everything
//! allocated since in one step.

use std::ptr::NonNull;

use crate::allocator::Allocator;
use crate::base;
use crate::block::MemoryBlock;
use crate::MemoryError;

/// A saved stack position, obtained from [`StackAllocator::marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StackMarker(usize);

/// Linear allocator that only grows until it is rolled back or cleared.
#[derive(Debug)]
pub struct StackAllocator<'a> {
    block: MemoryBlock<'a>,
    /// Offset of the first unused byte.
    top: usize,
    memory_in_use: usize,
}

impl<'a> StackAllocator<'a> {
    /// Create an empty stack over `block`.
    pub fn new(block: MemoryBlock<'a>) -> Self {
        tracing::debug!(size = block.len(), "stack allocator created");
        Self {
            block,
            top: 0,
            memory_in_use: 0,
        }
    }

    /// The current top of the stack.
    pub fn marker(&self) -> StackMarker {
        StackMarker(self.top)
    }

    /// Release everything allocated after `marker` was taken.
    ///
    /// Markers must be used in LIFO order: rolling back to a marker taken
    /// after the current top corrupts the byte accounting. Debug builds
    /// assert on that misuse.
    pub fn deallocate_to_marker(&mut self, marker: StackMarker) {
        debug_assert!(
            marker.0 <= self.top,
            "stack marker {} is above the current top {}",
            marker.0,
            self.top
        );
        let released = self.top.saturating_sub(marker.0);
        self.memory_in_use -= released.min(self.memory_in_use);
        self.top = marker.0;
        tracing::trace!(released, "stack rolled back to marker");
    }

    /// Release every allocation.
    pub fn clear_stack(&mut self) {
        self.top = 0;
        self.memory_in_use = 0;
    }
}

impl Allocator for StackAllocator<'_> {
    fn allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        let current = base::add_to_address(self.block.address(), self.top)?;
        let padding = base::alignment_offset(current, alignment)?;
        let total = base::add_to_address(size, padding)?;
        let available = self.memory_available();
        if total > available {
            tracing::warn!(requested = total, available, "stack allocator out of memory");
            return Err(MemoryError::OutOfMemory {
                requested: total,
                available,
            });
        }
        let ptr = self.block.ptr_at(self.top + padding);
        self.top += total;
        self.memory_in_use += total;
        Ok(ptr)
    }

    /// Individual stack allocations are released through markers, so this
    /// does nothing.
    unsafe fn deallocate(&mut self, _ptr: NonNull<u8>) -> Result<(), MemoryError> {
        Ok(())
    }

    fn memory_in_use(&self) -> usize {
        self.memory_in_use
    }

    fn memory_size(&self) -> usize {
        self.block.len()
    }
}

impl Drop for StackAllocator<'_> {
    fn drop(&mut self) {
        if self.memory_in_use != 0 && !std::thread::panicking() {
            tracing::error!(in_use = self.memory_in_use, "stack allocator dropped while in use");
            debug_assert_eq!(self.memory_in_use, 0, "stack allocator leaked memory");
        }
    }
}
