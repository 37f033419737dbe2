//! Free-list allocator over a single contiguous buffer
//!
//! The buffer is requested from [`crate::provider`] (the process-global
//! platform memory provider, so a client that calls
//! [`crate::provider::set_allocator`] before constructing a pool
//! actually redirects where a pool's backing memory comes from) and
//! carved, once at construction, into a singly-linked chain of blocks in
//! ascending-address order (see [`block`](crate::block)). Every block —
//! free or allocated — stays on this one list for the lifetime of the
//! pool; there is no separate free list and no coalescing of adjacent
//! free blocks on sweep (see `Pool::collect`). `alloc` does a linear
//! first-fit search of the chain and, when the leftover space in a hit
//! is large enough to host another block header, splits it off and
//! shrinks the hit down to exactly what was requested.

use core::ptr;

use crate::block::{self, HEADER_SIZE, MAX_BLOCK_SIZE};
use crate::error::{PoolError, PoolResult};
use crate::provider;

/// Largest `data_size + slot bytes` request `alloc` will ever attempt to
/// satisfy, one past the block-header tag's 16-bit range.
const MAX_TOTAL_SIZE: usize = 1 << 16;

pub(crate) struct FreeList {
    buffer: *mut u8,
    capacity: usize,
    head: *mut u8,
}

impl FreeList {
    /// Requests a `capacity`-byte buffer from the installed provider and
    /// carves it into a chain of free blocks, each governing up to
    /// [`MAX_BLOCK_SIZE`] payload bytes.
    pub(crate) fn new(capacity: usize) -> PoolResult<Self> {
        if capacity < HEADER_SIZE + 1 {
            return Err(PoolError::ConstructionFailed);
        }

        let base = provider::allocate(capacity);
        if base.is_null() {
            return Err(PoolError::ConstructionFailed);
        }
        if base as usize % 8 != 0 {
            // SAFETY: `base` was just returned by `provider::allocate(capacity)`.
            unsafe { provider::release(base, capacity) };
            return Err(PoolError::ConstructionFailed);
        }
        // SAFETY: `base` is a fresh, capacity-byte allocation.
        unsafe { ptr::write_bytes(base, 0, capacity) };

        let mut remaining = capacity - HEADER_SIZE;
        let head_size = core::cmp::min(remaining, MAX_BLOCK_SIZE);
        remaining -= head_size;
        // SAFETY: `base` is freshly allocated, 8-byte aligned (checked above)
        // and large enough.
        unsafe { block::new_block(base, ptr::null_mut(), head_size as u16, true) };

        let mut current = base;
        let mut cursor = unsafe { base.add(HEADER_SIZE + head_size) };
        while remaining > HEADER_SIZE {
            remaining -= HEADER_SIZE;
            let size = core::cmp::min(remaining, MAX_BLOCK_SIZE);
            remaining -= size;

            unsafe {
                block::new_block(cursor, ptr::null_mut(), size as u16, true);
                block::set_next(current, cursor);
            }
            current = cursor;
            cursor = unsafe { cursor.add(HEADER_SIZE + size) };
        }

        Ok(Self {
            buffer: base,
            capacity,
            head: base,
        })
    }

    /// First block header of the chain; the entry point for sweeping.
    pub(crate) fn head(&self) -> *mut u8 {
        self.head
    }

    /// Finds the first free block whose payload can hold
    /// `slot_bytes + data_size`, marks it allocated, and splits off the
    /// leftover space as a new free block when there's enough of it left
    /// to host another header. Returns the carved block's payload
    /// pointer (ready to be handed to [`crate::node::new_node`]), or
    /// `None` if no block is large enough.
    pub(crate) fn alloc(&mut self, slot_bytes: usize, data_size: usize) -> Option<*mut u8> {
        let aligned_data = (data_size + 7) & !7;
        let total_size = slot_bytes + aligned_data;
        debug_assert!(total_size < MAX_TOTAL_SIZE);
        let needed = total_size as u16;

        let mut cur = self.head;
        while !cur.is_null() {
            // SAFETY: every node reached by following `get_next` from
            // `self.head` is a live block header inside `self.buffer`.
            let (is_free, size) = unsafe { (block::is_free(cur), block::get_size(cur)) };
            if is_free && size >= needed {
                unsafe { self.carve(cur, needed, size) };
                return Some(cur);
            }
            cur = unsafe { block::get_next(cur) };
        }
        None
    }

    /// # Safety
    /// `block` must be a live, free block header with `total_size >= needed`.
    unsafe fn carve(&mut self, block_ptr: *mut u8, needed: u16, total_size: u16) {
        let leftover = total_size - needed;
        if leftover as usize > HEADER_SIZE {
            let split_payload = leftover as usize - HEADER_SIZE;
            let split_ptr = block_ptr.add(HEADER_SIZE + needed as usize);
            let old_next = block::get_next(block_ptr);
            block::new_block(split_ptr, old_next, split_payload as u16, true);
            block::set_next(block_ptr, split_ptr);
            block::set_size(block_ptr, needed);
        }
        block::set_free(block_ptr, false);
    }

    /// Total capacity of the backing buffer, for diagnostics.
    #[allow(dead_code)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for FreeList {
    fn drop(&mut self) {
        // SAFETY: `self.buffer` was obtained from a single
        // `provider::allocate(self.capacity)` call in `new` and has not
        // been released before now.
        unsafe { provider::release(self.buffer, self.capacity) };
    }
}
