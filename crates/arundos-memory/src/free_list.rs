//! Variable-size allocator with a first-fit free list.
//!
//! Every chunk, free or allocated, starts with a two-word [`ChunkHeader`].
//! For a free chunk the second word links to the next free chunk; for an
//! allocated chunk it is unused padding. Between the header and the user
//! pointer sits the alignment padding, whose length is recorded in the byte
//! just before the user pointer so deallocation can find the header again.
//!
//! ```text
//!  chunk start                               user pointer
//!  |                                         |
//!  [ size | link ][ padding ... | distance ][ user data ... ][ (split) ]
//! ```
//!
//! Freed chunks are pushed onto the front of the list and are never merged
//! with their neighbours, so long-running workloads fragment.

use std::ptr::{self, NonNull};

use crate::allocator::Allocator;
use crate::base;
use crate::block::MemoryBlock;
use crate::MemoryError;

/// End-of-list sentinel in a free chunk's link word.
const NO_NEXT_CHUNK: usize = usize::MAX;

/// Size of the header at the start of every chunk.
pub const CHUNK_HEADER_SIZE: usize = std::mem::size_of::<ChunkHeader>();

/// Header at the start of every chunk.
///
/// `size` always covers the whole chunk: header, padding and user bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkHeader {
    size: usize,
    link: usize,
}

impl ChunkHeader {
    fn free(size: usize, next: Option<usize>) -> Self {
        Self {
            size,
            link: next.unwrap_or(NO_NEXT_CHUNK),
        }
    }

    fn allocated(size: usize) -> Self {
        Self { size, link: 0 }
    }

    fn next(&self) -> Option<usize> {
        (self.link != NO_NEXT_CHUNK).then_some(self.link)
    }
}

/// First-fit allocator for objects of varying size.
#[derive(Debug)]
pub struct FreeListAllocator<'a> {
    block: MemoryBlock<'a>,
    free_head: Option<usize>,
    memory_in_use: usize,
}

impl<'a> FreeListAllocator<'a> {
    /// Create an allocator whose free list is one chunk spanning `block`.
    pub fn new(block: MemoryBlock<'a>) -> Result<Self, MemoryError> {
        if block.len() <= CHUNK_HEADER_SIZE {
            return Err(MemoryError::BlockTooSmall {
                size: block.len(),
                required: CHUNK_HEADER_SIZE + 1,
            });
        }
        let mut allocator = Self {
            block,
            free_head: None,
            memory_in_use: 0,
        };
        allocator.reset();
        tracing::debug!(size = allocator.block.len(), "free-list allocator created");
        Ok(allocator)
    }

    /// Drop every allocation and restore the single spanning free chunk.
    pub fn reset(&mut self) {
        self.write_header(0, ChunkHeader::free(self.block.len(), None));
        self.free_head = Some(0);
        self.memory_in_use = 0;
    }

    /// `(offset, size)` of each free chunk, in list order.
    pub fn free_chunks(&self) -> Vec<(usize, usize)> {
        let mut chunks = Vec::new();
        let mut cursor = self.free_head;
        while let Some(offset) = cursor {
            let header = self.read_header(offset);
            chunks.push((offset, header.size));
            cursor = header.next();
        }
        chunks
    }

    // -- header access --------------------------------------------------------
    //
    // The only places chunk bytes are reinterpreted as headers. Callers pass
    // offsets of chunk starts, and every chunk is larger than a header.

    fn read_header(&self, offset: usize) -> ChunkHeader {
        debug_assert!(offset + CHUNK_HEADER_SIZE <= self.block.len());
        unsafe { ptr::read_unaligned(self.block.ptr_at(offset).as_ptr().cast::<ChunkHeader>()) }
    }

    fn write_header(&mut self, offset: usize, header: ChunkHeader) {
        debug_assert!(offset + CHUNK_HEADER_SIZE <= self.block.len());
        unsafe {
            ptr::write_unaligned(
                self.block.ptr_at(offset).as_ptr().cast::<ChunkHeader>(),
                header,
            );
        }
    }

    /// Point whatever currently references the free chunk after `previous`
    /// at `next` instead.
    fn relink(&mut self, previous: Option<usize>, next: Option<usize>) {
        match previous {
            Some(offset) => {
                let mut header = self.read_header(offset);
                header.link = next.unwrap_or(NO_NEXT_CHUNK);
                self.write_header(offset, header);
            }
            None => self.free_head = next,
        }
    }
}

impl Allocator for FreeListAllocator<'_> {
    fn allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        let block_address = self.block.address();
        let mut previous = None;
        let mut cursor = self.free_head;

        while let Some(offset) = cursor {
            let header = self.read_header(offset);
            let chunk_address = base::add_to_address(block_address, offset)?;
            let (user_address, distance) = base::aligned_address_with_minimum_offset(
                chunk_address,
                CHUNK_HEADER_SIZE,
                alignment,
            )?;
            let padding = base::address_difference(user_address, chunk_address)?;
            let required = base::add_to_address(size, padding)?;

            if header.size < required {
                previous = Some(offset);
                cursor = header.next();
                continue;
            }

            let remainder = header.size - required;
            let chunk_size = if remainder > CHUNK_HEADER_SIZE {
                let split = offset + required;
                self.write_header(split, ChunkHeader::free(remainder, header.next()));
                self.relink(previous, Some(split));
                required
            } else {
                self.relink(previous, header.next());
                header.size
            };

            self.write_header(offset, ChunkHeader::allocated(chunk_size));
            let user = self.block.ptr_at(offset + padding);
            // The distance byte lies between the header and `user`.
            unsafe { base::write_stored_offset(user, distance) };
            self.memory_in_use += chunk_size;
            tracing::trace!(offset, size, chunk_size, "free-list chunk allocated");
            return Ok(user);
        }

        let available = self.memory_available();
        tracing::warn!(requested = size, available, "free-list allocator found no fitting chunk");
        Err(MemoryError::OutOfMemory {
            requested: size,
            available,
        })
    }

    /// Return a chunk to the front of the free list.
    ///
    /// The chunk is not merged with adjacent free chunks.
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>) -> Result<(), MemoryError> {
        let address = ptr.as_ptr() as usize;
        let foreign = MemoryError::ForeignPointer { address };
        let user_offset = self.block.offset_of(ptr).ok_or(foreign.clone())?;
        if user_offset <= CHUNK_HEADER_SIZE {
            return Err(foreign);
        }
        let distance = base::read_stored_offset(ptr);
        let chunk_offset = user_offset
            .checked_sub(distance + CHUNK_HEADER_SIZE)
            .ok_or(foreign)?;

        let size = self.read_header(chunk_offset).size;
        debug_assert!(
            self.memory_in_use >= size,
            "free-list chunk of {size} bytes released more often than allocated"
        );
        self.write_header(chunk_offset, ChunkHeader::free(size, self.free_head));
        self.free_head = Some(chunk_offset);
        self.memory_in_use = self.memory_in_use.saturating_sub(size);
        tracing::trace!(offset = chunk_offset, size, "free-list chunk released");
        Ok(())
    }

    fn memory_in_use(&self) -> usize {
        self.memory_in_use
    }

    fn memory_size(&self) -> usize {
        self.block.len()
    }
}

impl Drop for FreeListAllocator<'_> {
    fn drop(&mut self) {
        if self.memory_in_use != 0 && !std::thread::panicking() {
            tracing::error!(in_use = self.memory_in_use, "free-list allocator dropped while in use");
            debug_assert_eq!(self.memory_in_use, 0, "free-list allocator leaked memory");
        }
    }
}
