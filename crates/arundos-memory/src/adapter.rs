//! Collection allocator backed by an arena.
//!
//! [`ArenaAdapter`] lets `allocator_api2` collections (`Vec`, `Box`,
//! `hashbrown` maps) take their storage from any [`Allocator`] in this crate.
//! The arena sits in a [`RefCell`] so several collections can share it; each
//! adapter is a cheap copy of the shared reference.
//!
//! ```
//! use std::cell::RefCell;
//!
//! use allocator_api2::vec::Vec;
//! use arundos_memory::prelude::*;
//!
//! let manager = MemoryManager::new(4096).unwrap();
//! let arena = RefCell::new(FreeListAllocator::new(manager.carve(2048).unwrap()).unwrap());
//!
//! {
//!     // The arena is not reset while `scores` is alive.
//!     let adapter = unsafe { ArenaAdapter::new(&arena) };
//!     let mut scores = Vec::new_in(adapter);
//!     scores.extend([3u32, 1, 4, 1, 5]);
//!     assert!(arena.borrow().memory_in_use() >= 5 * 4);
//! }
//! assert_eq!(arena.borrow().memory_in_use(), 0);
//! ```

use std::alloc::Layout;
use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator as CollectionAllocator};

use crate::allocator::Allocator;

/// Shared handle that turns an arena into a collection allocator.
pub struct ArenaAdapter<'r, A> {
    arena: &'r RefCell<A>,
}

impl<'r, A: Allocator> ArenaAdapter<'r, A> {
    /// Wrap `arena` for use by collections.
    ///
    /// # Safety
    ///
    /// The arena must not be reset, cleared or rewound to a marker while any
    /// collection allocated through this adapter, or a copy of it, still
    /// holds memory. Those operations would hand its storage out again.
    pub unsafe fn new(arena: &'r RefCell<A>) -> Self {
        Self { arena }
    }

    /// The shared arena.
    pub fn arena(&self) -> &'r RefCell<A> {
        self.arena
    }
}

impl<A> Clone for ArenaAdapter<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for ArenaAdapter<'_, A> {}

/// Adapters are equal when they share an arena, so memory from one may be
/// released through the other.
impl<A> PartialEq for ArenaAdapter<'_, A> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.arena, other.arena)
    }
}

impl<A> Eq for ArenaAdapter<'_, A> {}

impl<A> fmt::Debug for ArenaAdapter<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAdapter")
            .field("arena", &std::any::type_name::<A>())
            .finish()
    }
}

/// Aligned, non-null address for zero-sized requests. Never dereferenced.
fn dangling(layout: Layout) -> NonNull<u8> {
    NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling())
}

// SAFETY: blocks come from the arena, which the `'r` borrow keeps alive, and
// stay valid until released because `new` forbids resetting the arena while
// they are outstanding. Copies share the arena, so any copy may release them.
unsafe impl<A: Allocator> CollectionAllocator for ArenaAdapter<'_, A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            return Ok(NonNull::slice_from_raw_parts(dangling(layout), 0));
        }
        let mut arena = self.arena.try_borrow_mut().map_err(|_| AllocError)?;
        match arena.allocate(layout.size(), layout.align()) {
            Ok(ptr) => Ok(NonNull::slice_from_raw_parts(ptr, layout.size())),
            Err(err) => {
                tracing::debug!(
                    size = layout.size(),
                    align = layout.align(),
                    error = %err,
                    "collection allocation refused"
                );
                Err(AllocError)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        let Ok(mut arena) = self.arena.try_borrow_mut() else {
            tracing::error!(address = ptr.as_ptr() as usize, "arena busy, collection memory leaked");
            return;
        };
        // SAFETY: the collection hands back a pointer this adapter, or a copy
        // sharing the same arena, allocated with `layout`.
        if let Err(err) = unsafe { arena.deallocate(ptr) } {
            tracing::error!(error = %err, "collection released memory the arena does not own");
        }
    }
}
