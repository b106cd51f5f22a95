//! Owner of the single up-front allocation that all arenas are carved from.

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::ptr::NonNull;

use crate::base;
use crate::block::MemoryBlock;
use crate::{MemoryError, MEMORY_ALIGNMENT};

/// Alignment of the manager's backing allocation.
pub const BLOCK_ALIGNMENT: usize = 64;

/// Reserves one large block from the system allocator and splits it into
/// disjoint [`MemoryBlock`]s.
///
/// Carving only moves a cursor forward; blocks are never returned to the
/// manager. Each carved block borrows the manager, so the backing memory
/// cannot be freed while an allocator still uses it.
pub struct MemoryManager {
    base: NonNull<u8>,
    layout: Layout,
    carved: Cell<usize>,
}

impl MemoryManager {
    /// Reserve `size` bytes, zero-initialised.
    pub fn new(size: usize) -> Result<Self, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        let out_of_memory = MemoryError::OutOfMemory {
            requested: size,
            available: 0,
        };
        let layout =
            Layout::from_size_align(size, BLOCK_ALIGNMENT).map_err(|_| out_of_memory.clone())?;
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let base = NonNull::new(raw).ok_or(out_of_memory)?;
        tracing::debug!(size, "memory manager reserved backing block");
        Ok(Self {
            base,
            layout,
            carved: Cell::new(0),
        })
    }

    /// Split off the next `size` bytes, starting at a
    /// [`MEMORY_ALIGNMENT`]-aligned offset.
    pub fn carve(&self, size: usize) -> Result<MemoryBlock<'_>, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        let start = base::aligned_address(self.carved.get(), MEMORY_ALIGNMENT)?;
        let end = base::add_to_address(start, size)?;
        if end > self.capacity() {
            let available = self.capacity().saturating_sub(start);
            tracing::warn!(requested = size, available, "memory manager exhausted");
            return Err(MemoryError::OutOfMemory {
                requested: size,
                available,
            });
        }
        self.carved.set(end);
        tracing::trace!(offset = start, size, "carved memory block");
        // [start, end) lies inside the backing allocation and no earlier
        // block overlaps it since the cursor only moves forward.
        unsafe {
            let ptr = NonNull::new_unchecked(self.base.as_ptr().add(start));
            Ok(MemoryBlock::from_raw_parts(ptr, size))
        }
    }

    /// Total bytes in the backing block.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Bytes not yet carved.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.carved.get()
    }
}

impl Drop for MemoryManager {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
    }
}

impl std::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("capacity", &self.capacity())
            .field("carved", &self.carved.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carved_blocks_are_disjoint_and_aligned() {
        let manager = MemoryManager::new(256).unwrap();
        let a = manager.carve(13).unwrap();
        let b = manager.carve(32).unwrap();
        assert_eq!(a.address() % BLOCK_ALIGNMENT, 0);
        assert_eq!(b.address() % MEMORY_ALIGNMENT, 0);
        assert!(b.address() >= a.address() + a.len());
    }

    #[test]
    fn remaining_shrinks_as_blocks_are_carved() {
        let manager = MemoryManager::new(128).unwrap();
        assert_eq!(manager.capacity(), 128);
        let _block = manager.carve(64).unwrap();
        assert_eq!(manager.remaining(), 64);
    }

    #[test]
    fn carving_past_capacity_fails() {
        let manager = MemoryManager::new(64).unwrap();
        let _block = manager.carve(64).unwrap();
        assert_eq!(
            manager.carve(8).unwrap_err(),
            MemoryError::OutOfMemory {
                requested: 8,
                available: 0
            }
        );
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert_eq!(
            MemoryManager::new(0).unwrap_err(),
            MemoryError::ZeroSizedAllocation
        );
        let manager = MemoryManager::new(16).unwrap();
        assert!(manager.carve(0).is_err());
    }
}
