//! Arundos Memory -- arena allocators over caller-owned memory blocks.
//!
//! Every allocator in this crate manages a single pre-allocated
//! [`MemoryBlock`] and never touches the global allocator after construction.
//! The [`MemoryManager`] owns one large block and carves it into disjoint
//! sub-blocks, one per allocator.
//!
//! | Allocator                      | Strategy                                     |
//! |--------------------------------|----------------------------------------------|
//! | [`StackAllocator`]             | bump pointer, marker rollback                |
//! | [`DoubleEndedStackAllocator`]  | two bump pointers growing towards each other |
//! | [`PoolAllocator`]              | fixed-size chunks on an intrusive free list  |
//! | [`FreeListAllocator`]          | variable-size chunks, first-fit with split   |
//!
//! [`ArenaAdapter`] lends any of them to `allocator_api2` collections.
//!
//! # Quick Start
//!
//! ```
//! use arundos_memory::prelude::*;
//!
//! let manager = MemoryManager::new(1024).unwrap();
//! let mut pool = PoolAllocator::new(manager.carve(128).unwrap(), 16, 8).unwrap();
//!
//! let chunk = pool.allocate(16, 8).unwrap();
//! assert_eq!(pool.memory_in_use(), 16);
//!
//! unsafe { pool.deallocate(chunk).unwrap() };
//! assert_eq!(pool.memory_in_use(), 0);
//! ```

#![deny(unsafe_code)]

#[allow(unsafe_code)]
pub mod adapter;
#[allow(unsafe_code)]
pub mod allocator;
#[allow(unsafe_code)]
pub mod base;
#[allow(unsafe_code)]
pub mod block;
#[allow(unsafe_code)]
pub mod de_stack;
#[allow(unsafe_code)]
pub mod free_list;
#[allow(unsafe_code)]
pub mod manager;
#[allow(unsafe_code)]
pub mod pool;
#[allow(unsafe_code)]
pub mod stack;

pub use adapter::ArenaAdapter;
pub use allocator::Allocator;
pub use block::MemoryBlock;
pub use de_stack::{BottomStackMarker, DoubleEndedStackAllocator, TopStackMarker};
pub use free_list::FreeListAllocator;
pub use manager::MemoryManager;
pub use pool::PoolAllocator;
pub use stack::{StackAllocator, StackMarker};

// ---------------------------------------------------------------------------
// Platform constants
// ---------------------------------------------------------------------------

/// Default alignment, in bytes, for allocations on the target platform.
#[cfg(target_pointer_width = "64")]
pub const MEMORY_ALIGNMENT: usize = 8;

/// Default alignment, in bytes, for allocations on the target platform.
#[cfg(not(target_pointer_width = "64"))]
pub const MEMORY_ALIGNMENT: usize = 4;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the allocators and the alignment helpers.
///
/// None of these are transient: each one means the arena was sized too small
/// or the caller broke an allocator contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The arena cannot satisfy the request.
    #[error("out of memory: requested {requested} bytes, {available} bytes available")]
    OutOfMemory { requested: usize, available: usize },

    /// A zero byte allocation was requested.
    #[error("cannot allocate zero bytes")]
    ZeroSizedAllocation,

    /// An alignment of zero was requested.
    #[error("cannot align to 0 bytes")]
    ZeroAlignment,

    /// The requested alignment is not a power of two.
    #[error("alignment {alignment} is not a power of two")]
    AlignmentNotPowerOfTwo { alignment: usize },

    /// The alignment cannot be recorded in a single stored-offset byte.
    #[error("alignment {alignment} exceeds the stored-offset maximum of {max} bytes")]
    AlignmentTooLarge { alignment: usize, max: usize },

    /// Adding or subtracting a byte count from an address overflowed.
    #[error("pointer overflow applying {bytes} bytes to address {address:#x}")]
    PointerOverflow { address: usize, bytes: usize },

    /// A pointer handed back to an allocator does not belong to it.
    #[error("address {address:#x} was not allocated from this allocator")]
    ForeignPointer { address: usize },

    /// A pool received a request that does not fit its fixed chunk shape.
    #[error(
        "pool chunks are {chunk_size} bytes aligned to {chunk_alignment}, \
         cannot serve {size} bytes aligned to {alignment}"
    )]
    UnsupportedRequest {
        size: usize,
        alignment: usize,
        chunk_size: usize,
        chunk_alignment: usize,
    },

    /// A pool chunk cannot hold the intrusive free-list link.
    #[error("chunk size {chunk_size} is below the minimum of {minimum} bytes")]
    ChunkTooSmall { chunk_size: usize, minimum: usize },

    /// The memory block is too small for the allocator's bookkeeping.
    #[error("memory block of {size} bytes is too small, at least {required} bytes are required")]
    BlockTooSmall { size: usize, required: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::adapter::ArenaAdapter;
    pub use crate::allocator::Allocator;
    pub use crate::block::MemoryBlock;
    pub use crate::de_stack::{BottomStackMarker, DoubleEndedStackAllocator, TopStackMarker};
    pub use crate::free_list::FreeListAllocator;
    pub use crate::manager::MemoryManager;
    pub use crate::pool::PoolAllocator;
    pub use crate::stack::{StackAllocator, StackMarker};
    pub use crate::{MemoryError, MEMORY_ALIGNMENT};
}
