// SPDX-License-Identifier: MIT
//! Zero-fill padding to the region boundary

/// Region boundary in bytes; every box region starts on a multiple of it
pub const BOUNDARY: u64 = 4096;

/// Padding needed to round `size` up to the next multiple of [`BOUNDARY`]
#[inline]
pub fn padding_len(size: u64) -> usize {
    ((BOUNDARY - size % BOUNDARY) % BOUNDARY) as usize
}

/// Zero-filled buffer of [`padding_len`] bytes
#[inline]
pub fn padding(size: u64) -> Vec<u8> {
    vec![0u8; padding_len(size)]
}

/// `size` rounded up to the next boundary
#[inline]
pub fn align_up(size: u64) -> u64 {
    size + padding_len(size) as u64
}
