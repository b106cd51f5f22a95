//! Two stacks sharing one block, growing towards each other.
//!
//! The bottom stack grows upward from offset 0 and the top stack grows
//! downward from the end of the block. A typical use keeps long-lived data
//! on one end and per-frame scratch data on the other.

use std::ptr::NonNull;

use crate::allocator::Allocator;
use crate::base;
use crate::block::MemoryBlock;
use crate::MemoryError;

/// A saved position of the bottom stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BottomStackMarker(usize);

/// A saved position of the top stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopStackMarker(usize);

/// Double-ended stack allocator.
///
/// [`Allocator::allocate`] serves from the top end; use
/// [`allocate_from_bottom`](Self::allocate_from_bottom) for the other end.
#[derive(Debug)]
pub struct DoubleEndedStackAllocator<'a> {
    block: MemoryBlock<'a>,
    /// Offset of the first unused byte above the bottom stack.
    bottom: usize,
    /// Offset of the lowest byte used by the top stack.
    top: usize,
    bottom_in_use: usize,
    top_in_use: usize,
}

impl<'a> DoubleEndedStackAllocator<'a> {
    /// Create an allocator with both stacks empty.
    pub fn new(block: MemoryBlock<'a>) -> Self {
        let top = block.len();
        tracing::debug!(size = top, "double-ended stack allocator created");
        Self {
            block,
            bottom: 0,
            top,
            bottom_in_use: 0,
            top_in_use: 0,
        }
    }

    fn out_of_memory(&self, requested: usize) -> MemoryError {
        let available = self.memory_available();
        tracing::warn!(requested, available, "double-ended stack out of memory");
        MemoryError::OutOfMemory {
            requested,
            available,
        }
    }

    /// Allocate upward from the bottom end.
    pub fn allocate_from_bottom(
        &mut self,
        size: usize,
        alignment: usize,
    ) -> Result<NonNull<u8>, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        let current = base::add_to_address(self.block.address(), self.bottom)?;
        let padding = base::alignment_offset(current, alignment)?;
        let total = base::add_to_address(size, padding)?;
        if total > self.memory_available() {
            return Err(self.out_of_memory(total));
        }
        let ptr = self.block.ptr_at(self.bottom + padding);
        self.bottom += total;
        self.bottom_in_use += total;
        Ok(ptr)
    }

    /// Allocate downward from the top end.
    ///
    /// The returned address is aligned down, so the padding sits between the
    /// new allocation and the previous top.
    pub fn allocate_from_top(
        &mut self,
        size: usize,
        alignment: usize,
    ) -> Result<NonNull<u8>, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        base::check_alignment(alignment)?;
        let unaligned = self
            .top
            .checked_sub(size)
            .ok_or_else(|| self.out_of_memory(size))?;
        let address = base::add_to_address(self.block.address(), unaligned)?;
        let padding = address & (alignment - 1);
        let total = base::add_to_address(size, padding)?;
        if total > self.memory_available() {
            return Err(self.out_of_memory(total));
        }
        self.top = unaligned - padding;
        self.top_in_use += total;
        Ok(self.block.ptr_at(self.top))
    }

    /// Current position of the bottom stack.
    pub fn bottom_marker(&self) -> BottomStackMarker {
        BottomStackMarker(self.bottom)
    }

    /// Current position of the top stack.
    pub fn top_marker(&self) -> TopStackMarker {
        TopStackMarker(self.top)
    }

    /// Release bottom allocations made after `marker` was taken.
    pub fn deallocate_to_bottom_marker(&mut self, marker: BottomStackMarker) {
        debug_assert!(
            marker.0 <= self.bottom,
            "bottom marker {} is above the bottom stack at {}",
            marker.0,
            self.bottom
        );
        let released = self.bottom.saturating_sub(marker.0);
        self.bottom_in_use -= released.min(self.bottom_in_use);
        self.bottom = marker.0;
    }

    /// Release top allocations made after `marker` was taken.
    pub fn deallocate_to_top_marker(&mut self, marker: TopStackMarker) {
        debug_assert!(
            marker.0 >= self.top,
            "top marker {} is below the top stack at {}",
            marker.0,
            self.top
        );
        let released = marker.0.saturating_sub(self.top);
        self.top_in_use -= released.min(self.top_in_use);
        self.top = marker.0;
    }

    /// Release every bottom allocation.
    pub fn clear_bottom_stack(&mut self) {
        self.bottom = 0;
        self.bottom_in_use = 0;
    }

    /// Release every top allocation.
    pub fn clear_top_stack(&mut self) {
        self.top = self.block.len();
        self.top_in_use = 0;
    }

    /// Release both stacks.
    pub fn clear(&mut self) {
        self.clear_bottom_stack();
        self.clear_top_stack();
    }

    /// Bytes held by the bottom stack.
    pub fn bottom_in_use(&self) -> usize {
        self.bottom_in_use
    }

    /// Bytes held by the top stack.
    pub fn top_in_use(&self) -> usize {
        self.top_in_use
    }
}

impl Allocator for DoubleEndedStackAllocator<'_> {
    fn allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, MemoryError> {
        self.allocate_from_top(size, alignment)
    }

    /// Released through markers only; does nothing.
    unsafe fn deallocate(&mut self, _ptr: NonNull<u8>) -> Result<(), MemoryError> {
        Ok(())
    }

    fn memory_in_use(&self) -> usize {
        self.bottom_in_use + self.top_in_use
    }

    fn memory_size(&self) -> usize {
        self.block.len()
    }
}

impl Drop for DoubleEndedStackAllocator<'_> {
    fn drop(&mut self) {
        let in_use = self.memory_in_use();
        if in_use != 0 && !std::thread::panicking() {
            tracing::error!(in_use, "double-ended stack allocator dropped while in use");
            debug_assert_eq!(in_use, 0, "double-ended stack allocator leaked memory");
        }
    }
}
