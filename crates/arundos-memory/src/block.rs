//! A borrowed, exclusively owned range of bytes that an allocator manages.

use std::marker::PhantomData;
use std::ptr::NonNull;

/// A contiguous byte range handed to exactly one allocator.
///
/// The block behaves like `&'a mut [u8]`: it borrows memory owned elsewhere
/// (a [`MemoryManager`](crate::MemoryManager) or a caller's buffer) and that
/// memory outlives every pointer the allocator hands out.
#[derive(Debug)]
pub struct MemoryBlock<'a> {
    base: NonNull<u8>,
    len: usize,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> MemoryBlock<'a> {
    /// Wrap a caller-owned buffer.
    pub fn from_slice(bytes: &'a mut [u8]) -> Self {
        let len = bytes.len();
        Self {
            base: NonNull::from(bytes).cast(),
            len,
            _marker: PhantomData,
        }
    }

    /// Wrap a raw byte range.
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `len` bytes for the whole
    /// of `'a`, and nothing else may access that range while the block or any
    /// pointer derived from it is in use.
    pub unsafe fn from_raw_parts(base: NonNull<u8>, len: usize) -> Self {
        Self {
            base,
            len,
            _marker: PhantomData,
        }
    }

    /// Size of the block in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block has no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Numeric address of the first byte.
    #[inline]
    pub fn address(&self) -> usize {
        self.base.as_ptr() as usize
    }

    /// Pointer `offset` bytes into the block.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the block.
    #[inline]
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(
            offset <= self.len,
            "offset {offset} is outside a block of {} bytes",
            self.len
        );
        // In bounds (or one past the end) of the block, so the add cannot
        // wrap and the result is non-null.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }
    }

    /// Offset of `ptr` from the start of the block, if it points inside it.
    #[inline]
    pub(crate) fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let address = ptr.as_ptr() as usize;
        let base = self.address();
        if address >= base && address - base < self.len {
            Some(address - base)
        } else {
            None
        }
    }
}
