//! The contract shared by every arena allocator.

use std::ptr::NonNull;

use crate::MemoryError;

/// A strategy for handing out sub-ranges of a single memory block.
///
/// Implementations track the number of bytes currently in use, padding and
/// bookkeeping headers included, and assert in debug builds that nothing is
/// still in use when they are dropped.
pub trait Allocator {
    /// Reserve `size` bytes aligned to `alignment`.
    ///
    /// `alignment` must be a non-zero power of two. The returned pointer stays
    /// valid until it is released or the allocator is reset or dropped.
    fn allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, MemoryError>;

    /// Return memory obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this same allocator and
    /// must not have been released since. The caller must not access the
    /// memory after this call.
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>) -> Result<(), MemoryError>;

    /// Bytes currently reserved, including padding and headers.
    fn memory_in_use(&self) -> usize;

    /// Total size of the managed block in bytes.
    fn memory_size(&self) -> usize;

    /// Bytes not currently reserved. Fragmentation may keep a request of
    /// this size from succeeding.
    fn memory_available(&self) -> usize {
        self.memory_size() - self.memory_in_use()
    }

    /// Reserve uninitialised space for one `T`.
    fn allocate_for<T>(&mut self) -> Result<NonNull<T>, MemoryError>
    where
        Self: Sized,
    {
        let size = std::mem::size_of::<T>().max(1);
        self.allocate(size, std::mem::align_of::<T>())
            .map(NonNull::cast)
    }
}
