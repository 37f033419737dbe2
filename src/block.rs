//! Pool-block header
//!
//! A block is a free-list cell: one tagged word of header followed by its
//! payload area. The header's tag holds the payload size in bytes, its
//! flag bit marks the block free (`1`) or allocated (`0`), and its address
//! field is the (possibly null) pointer to the next block in the pool's
//! singly-linked, ascending-address, non-cyclic list.

use core::mem::size_of;
use core::ptr;

use crate::tagged::{address_only, from_parts, get_flag, get_tag, with_flag, with_tag};

/// Size in bytes of a block's header word.
pub const HEADER_SIZE: usize = size_of::<usize>();

/// Largest payload a single block may govern: `((1<<16)-1) & !7`.
pub const MAX_BLOCK_SIZE: usize = ((1usize << 16) - 1) & !7;

#[inline(always)]
unsafe fn read_word(location: *mut u8) -> usize {
    ptr::read(location.cast::<usize>())
}

#[inline(always)]
unsafe fn write_word(location: *mut u8, word: usize) {
    ptr::write(location.cast::<usize>(), word);
}

/// Writes a fresh block header at `location`.
///
/// # Safety
/// `location` must be valid for a `usize` write and 8-byte aligned.
pub unsafe fn new_block(location: *mut u8, next: *mut u8, size: u16, is_free: bool) {
    debug_assert_eq!(location as usize & 7, 0);
    let word = from_parts(next as usize, size, is_free);
    write_word(location, word);
}

/// # Safety
/// `block` must point at a live block header.
pub unsafe fn get_next(block: *mut u8) -> *mut u8 {
    address_only(read_word(block)) as *mut u8
}

/// # Safety
/// `block` must point at a live block header.
pub unsafe fn set_next(block: *mut u8, next: *mut u8) {
    let word = read_word(block);
    let tag = get_tag(word);
    let flag = get_flag(word);
    write_word(block, from_parts(next as usize, tag, flag));
}

/// # Safety
/// `block` must point at a live block header.
pub unsafe fn get_size(block: *mut u8) -> u16 {
    get_tag(read_word(block))
}

/// # Safety
/// `block` must point at a live block header.
pub unsafe fn set_size(block: *mut u8, size: u16) {
    let word = read_word(block);
    write_word(block, with_tag(word, size));
}

/// # Safety
/// `block` must point at a live block header.
pub unsafe fn is_free(block: *mut u8) -> bool {
    get_flag(read_word(block))
}

/// # Safety
/// `block` must point at a live block header.
pub unsafe fn set_free(block: *mut u8, free: bool) {
    let word = read_word(block);
    write_word(block, with_flag(word, free));
}

/// Pointer to the first byte of this block's payload area.
///
/// # Safety
/// `block` must point at a live block header.
pub unsafe fn payload(block: *mut u8) -> *mut u8 {
    block.add(HEADER_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned_buf(len: usize) -> Vec<u8> {
        // Vec<u8>'s allocation is at least pointer-aligned on every mainstream
        // target, which already satisfies the 8-byte requirement here.
        vec![0u8; len]
    }

    #[test]
    fn round_trips_size_free_flag_and_next() {
        let mut buf = aligned_buf(64);
        let ptr = buf.as_mut_ptr();
        unsafe {
            new_block(ptr, ptr::null_mut(), 48, true);
            assert_eq!(get_size(ptr), 48);
            assert!(is_free(ptr));
            assert!(get_next(ptr).is_null());

            set_size(ptr, 16);
            assert_eq!(get_size(ptr), 16);
            assert!(is_free(ptr));

            set_free(ptr, false);
            assert!(!is_free(ptr));
            assert_eq!(get_size(ptr), 16);

            let next_loc = ptr.add(HEADER_SIZE + 16);
            set_next(ptr, next_loc);
            assert_eq!(get_next(ptr), next_loc);
            assert_eq!(get_size(ptr), 16);
            assert!(!is_free(ptr));
        }
    }

    #[test]
    fn payload_starts_right_after_header() {
        let mut buf = aligned_buf(32);
        let ptr = buf.as_mut_ptr();
        unsafe {
            new_block(ptr, ptr::null_mut(), 24, true);
            assert_eq!(payload(ptr), ptr.add(HEADER_SIZE));
        }
    }

    #[test]
    fn max_block_size_is_65528() {
        assert_eq!(MAX_BLOCK_SIZE, 65_528);
    }
}
