//! Power-of-two alignment arithmetic.

use std::mem::size_of;

use crate::error::{BlobError, BlobResult};

/// Fails unless `alignment` is a non-zero power of two.
pub fn check_alignment(alignment: usize) -> BlobResult<()> {
    if alignment.is_power_of_two() {
        Ok(())
    } else {
        Err(BlobError::InvalidArgument(format!(
            "alignment must be a positive power of two, got {alignment}"
        )))
    }
}

/// Round `address` up to the next multiple of `alignment`.
pub fn align(address: usize, alignment: usize) -> BlobResult<usize> {
    check_alignment(alignment)?;
    let mask = alignment - 1;
    address
        .checked_add(mask)
        .map(|padded| padded & !mask)
        .ok_or_else(|| {
            BlobError::InvalidArgument(format!(
                "address {address} overflows when aligned to {alignment}"
            ))
        })
}

/// Whether `address` is a multiple of `alignment`. False for invalid alignments.
pub fn is_aligned(address: usize, alignment: usize) -> bool {
    alignment.is_power_of_two() && address & (alignment - 1) == 0
}

#[repr(C)]
struct AlignProbe<T> {
    _lead: u8,
    _value: T,
}

/// The alignment `T` needs when laid out after a single byte.
///
/// Measured from the padding a `#[repr(C)]` layout inserts, so it agrees with
/// how nested headers place their fields.
pub const fn natural_alignment_of<T>() -> usize {
    size_of::<AlignProbe<T>>() - size_of::<T>()
}
