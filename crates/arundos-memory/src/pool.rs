//! Fixed-size chunk allocator.
//!
//! The block is cut into equally sized chunks at construction. Free chunks
//! form a singly linked list threaded through their own first bytes: each
//! free chunk stores the block offset of the next free chunk. Allocation pops
//! the head, deallocation pushes onto it, both in O(1).

use std::ptr::{self, NonNull};

use crate::allocator::Allocator;
use crate::base;
use crate::block::MemoryBlock;
use crate::MemoryError;

/// End-of-list sentinel stored in the last free chunk.
const NO_NEXT_CHUNK: usize = usize::MAX;

/// Allocator for many objects of one size.
#[derive(Debug)]
pub struct PoolAllocator<'a> {
    block: MemoryBlock<'a>,
    chunk_size: usize,
    /// `chunk_size` rounded up to a multiple of `alignment`.
    aligned_chunk_size: usize,
    alignment: usize,
    /// Offset of the first chunk, past any padding needed to align it.
    first_chunk: usize,
    chunk_count: usize,
    free_head: Option<usize>,
    memory_in_use: usize,
}

impl<'a> PoolAllocator<'a> {
    /// Partition `block` into chunks of `chunk_size` bytes aligned to
    /// `alignment`.
    ///
    /// Bytes at the end of the block that cannot hold a whole chunk are left
    /// unused.
    pub fn new(
        block: MemoryBlock<'a>,
        chunk_size: usize,
        alignment: usize,
    ) -> Result<Self, MemoryError> {
        let minimum = std::mem::size_of::<usize>();
        if chunk_size < minimum {
            return Err(MemoryError::ChunkTooSmall {
                chunk_size,
                minimum,
            });
        }
        let aligned_chunk_size = base::aligned_address(chunk_size, alignment)?;
        let first_chunk = base::alignment_offset(block.address(), alignment)?;
        let chunk_count = block.len().saturating_sub(first_chunk) / aligned_chunk_size;

        let mut pool = Self {
            block,
            chunk_size,
            aligned_chunk_size,
            alignment,
            first_chunk,
            chunk_count,
            free_head: None,
            memory_in_use: 0,
        };
        pool.reset();
        tracing::debug!(chunk_size, alignment, chunk_count, "pool allocator created");
        Ok(pool)
    }

    /// Thread every chunk back onto the free list, releasing all allocations.
    pub fn reset(&mut self) {
        for index in 0..self.chunk_count {
            let next = if index + 1 < self.chunk_count {
                self.chunk_offset(index + 1)
            } else {
                NO_NEXT_CHUNK
            };
            self.write_link(self.chunk_offset(index), next);
        }
        self.free_head = (self.chunk_count > 0).then_some(self.first_chunk);
        self.memory_in_use = 0;
    }

    /// Number of chunks the block was cut into.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Number of chunks currently on the free list.
    pub fn free_chunk_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.free_head;
        while let Some(offset) = cursor {
            count += 1;
            cursor = self.read_link(offset);
        }
        count
    }

    /// Size of a chunk including its alignment padding.
    pub fn aligned_chunk_size(&self) -> usize {
        self.aligned_chunk_size
    }

    fn chunk_offset(&self, index: usize) -> usize {
        self.first_chunk + index * self.aligned_chunk_size
    }

    fn read_link(&self, offset: usize) -> Option<usize> {
        // Every chunk holds at least one usize, checked in `new`.
        let next =
            unsafe { ptr::read_unaligned(self.block.ptr_at(offset).as_ptr().cast::<usize>()) };
        (next != NO_NEXT_CHUNK).then_some(next)
    }

    fn write_link(&mut self, offset: usize, next: usize) {
        unsafe {
            ptr::write_unaligned(self.block.ptr_at(offset).as_ptr().cast::<usize>(), next);
        }
    }
}

impl Allocator for PoolAllocator<'_> {
    /// Pop a chunk. `size` and `alignment` must fit the pool's chunk shape.
    fn allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        base::check_alignment(alignment)?;
        if size > self.chunk_size || alignment > self.alignment {
            return Err(MemoryError::UnsupportedRequest {
                size,
                alignment,
                chunk_size: self.chunk_size,
                chunk_alignment: self.alignment,
            });
        }
        let Some(offset) = self.free_head else {
            tracing::warn!(chunks = self.chunk_count, "pool allocator exhausted");
            return Err(MemoryError::OutOfMemory {
                requested: self.aligned_chunk_size,
                available: 0,
            });
        };
        self.free_head = self.read_link(offset);
        self.memory_in_use += self.aligned_chunk_size;
        Ok(self.block.ptr_at(offset))
    }

    /// Push a chunk back onto the free list.
    ///
    /// Pointers outside the block or off a chunk boundary are rejected with
    /// [`MemoryError::ForeignPointer`].
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>) -> Result<(), MemoryError> {
        let address = ptr.as_ptr() as usize;
        let foreign = MemoryError::ForeignPointer { address };
        let offset = self.block.offset_of(ptr).ok_or(foreign.clone())?;
        let relative = offset.checked_sub(self.first_chunk).ok_or(foreign.clone())?;
        if relative % self.aligned_chunk_size != 0
            || relative / self.aligned_chunk_size >= self.chunk_count
        {
            return Err(foreign);
        }
        debug_assert!(
            self.memory_in_use >= self.aligned_chunk_size,
            "pool chunk released more often than allocated"
        );
        let next = self.free_head.unwrap_or(NO_NEXT_CHUNK);
        self.write_link(offset, next);
        self.free_head = Some(offset);
        self.memory_in_use = self.memory_in_use.saturating_sub(self.aligned_chunk_size);
        Ok(())
    }

    fn memory_in_use(&self) -> usize {
        self.memory_in_use
    }

    fn memory_size(&self) -> usize {
        self.block.len()
    }
}

impl Drop for PoolAllocator<'_> {
    fn drop(&mut self) {
        if self.memory_in_use != 0 && !std::thread::panicking() {
            tracing::error!(in_use = self.memory_in_use, "pool allocator dropped while in use");
            debug_assert_eq!(self.memory_in_use, 0, "pool allocator leaked memory");
        }
    }
}
