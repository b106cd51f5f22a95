//! Alignment and address arithmetic shared by the allocators.
//!
//! Addresses are plain `usize` values here. The allocators turn them back into
//! pointers by offsetting from their block's base pointer, so no pointer is
//! ever rebuilt from an integer.
//!
//! Two families of alignment are provided:
//!
//! - **Plain alignment** ([`aligned_address`], [`alignment_offset`]) rounds an
//!   address up and leaves an already aligned address untouched.
//! - **Stored-offset alignment** ([`aligned_address_with_stored_offset`],
//!   [`aligned_address_with_minimum_offset`]) always moves forward by at least
//!   one byte so the distance can be written into the byte just before the
//!   aligned address and recovered later with [`read_stored_offset`].

use std::ptr::NonNull;

use crate::MemoryError;

/// Largest alignment whose stored offset fits in one byte.
///
/// The byte holds `distance - 1`, so a full 256-byte step is representable.
pub const MAX_STORED_OFFSET_ALIGNMENT: usize = 256;

/// Reject zero and non power of two alignments.
pub fn check_alignment(alignment: usize) -> Result<(), MemoryError> {
    if alignment == 0 {
        return Err(MemoryError::ZeroAlignment);
    }
    if !alignment.is_power_of_two() {
        return Err(MemoryError::AlignmentNotPowerOfTwo { alignment });
    }
    Ok(())
}

/// Round `address` up to the next multiple of `alignment`.
///
/// An address that is already aligned is returned unchanged.
pub fn aligned_address(address: usize, alignment: usize) -> Result<usize, MemoryError> {
    let offset = alignment_offset(address, alignment)?;
    add_to_address(address, offset)
}

/// Number of bytes between `address` and the next aligned address.
///
/// Returns 0 when `address` is already aligned.
pub fn alignment_offset(address: usize, alignment: usize) -> Result<usize, MemoryError> {
    check_alignment(alignment)?;
    let misalignment = address & (alignment - 1);
    if misalignment == 0 {
        Ok(0)
    } else {
        Ok(alignment - misalignment)
    }
}

/// Align `address` up, always advancing by at least one byte.
///
/// Returns the aligned address and the distance moved. When `address` is
/// already aligned the distance is a full `alignment`, which leaves room for
/// the stored-offset byte.
pub fn aligned_address_with_stored_offset(
    address: usize,
    alignment: usize,
) -> Result<(usize, usize), MemoryError> {
    if alignment > MAX_STORED_OFFSET_ALIGNMENT {
        check_alignment(alignment)?;
        return Err(MemoryError::AlignmentTooLarge {
            alignment,
            max: MAX_STORED_OFFSET_ALIGNMENT,
        });
    }
    let offset = alignment_offset(address, alignment)?;
    let distance = if offset == 0 { alignment } else { offset };
    Ok((add_to_address(address, distance)?, distance))
}

/// Stored-offset alignment of `address + minimum_offset`.
///
/// Used to reserve a header in front of the aligned address. The returned
/// distance is measured from `address + minimum_offset`, not from `address`.
pub fn aligned_address_with_minimum_offset(
    address: usize,
    minimum_offset: usize,
    alignment: usize,
) -> Result<(usize, usize), MemoryError> {
    let after_header = add_to_address(address, minimum_offset)?;
    aligned_address_with_stored_offset(after_header, alignment)
}

/// `address + bytes`, failing instead of wrapping.
pub fn add_to_address(address: usize, bytes: usize) -> Result<usize, MemoryError> {
    address
        .checked_add(bytes)
        .ok_or(MemoryError::PointerOverflow { address, bytes })
}

/// `address - bytes`, failing instead of wrapping.
pub fn subtract_from_address(address: usize, bytes: usize) -> Result<usize, MemoryError> {
    address
        .checked_sub(bytes)
        .ok_or(MemoryError::PointerOverflow { address, bytes })
}

/// Byte distance from `lower` up to `upper`.
pub fn address_difference(upper: usize, lower: usize) -> Result<usize, MemoryError> {
    subtract_from_address(upper, lower)
}

/// Recover the address a stored-offset alignment started from.
pub fn base_from_aligned_address(aligned: usize, distance: usize) -> Result<usize, MemoryError> {
    subtract_from_address(aligned, distance)
}

/// Record `distance` in the byte immediately before `aligned`.
///
/// # Safety
///
/// The byte at `aligned - 1` must be writable and belong to the same
/// allocation as `aligned`. `distance` must be in `1..=256`.
pub unsafe fn write_stored_offset(aligned: NonNull<u8>, distance: usize) {
    debug_assert!((1..=MAX_STORED_OFFSET_ALIGNMENT).contains(&distance));
    aligned.as_ptr().sub(1).write((distance - 1) as u8);
}

/// Read back a distance recorded by [`write_stored_offset`].
///
/// # Safety
///
/// The byte at `aligned - 1` must have been written by `write_stored_offset`
/// and still be readable.
pub unsafe fn read_stored_offset(aligned: NonNull<u8>) -> usize {
    usize::from(aligned.as_ptr().sub(1).read()) + 1
}
