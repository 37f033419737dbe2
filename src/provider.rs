//! Platform memory provider
//!
//! A process-global pair of byte-allocate/release primitives, mirroring
//! `custom_malloc`/`custom_free` in the original C sources: a default
//! backed by the platform allocator, overridable exactly once before any
//! pool is constructed.
//!
//! [`crate::allocator::FreeList`] requests its backing buffer through
//! `allocate`/`release` here, so a client that calls [`set_allocator`]
//! before constructing any [`crate::pool::Pool`] redirects every
//! subsequent pool's buffer to come from an arena, a mmap'd region, or
//! similar — the same role `custom_malloc`/`custom_free` played in the
//! original.

use core::alloc::Layout;
use std::alloc::{alloc as std_alloc, dealloc as std_dealloc};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 8-byte alignment matches the tagged-pointer scheme's assumption that
/// every block and node payload starts on an 8-byte boundary.
const ALIGN: usize = 8;

/// Requests `size` bytes, 8-byte aligned. Returns null on failure.
pub type AllocateFn = unsafe fn(usize) -> *mut u8;
/// Releases a block previously returned by the installed `AllocateFn`,
/// given the same `size` it was allocated with.
pub type ReleaseFn = unsafe fn(*mut u8, usize);

unsafe fn default_allocate(size: usize) -> *mut u8 {
    match Layout::from_size_align(size, ALIGN) {
        Ok(layout) if size > 0 => std_alloc(layout),
        _ => core::ptr::null_mut(),
    }
}

unsafe fn default_release(ptr: *mut u8, size: usize) {
    if ptr.is_null() || size == 0 {
        return;
    }
    if let Ok(layout) = Layout::from_size_align(size, ALIGN) {
        std_dealloc(ptr, layout);
    }
}

static ALLOCATE: AtomicUsize = AtomicUsize::new(default_allocate as usize);
static RELEASE: AtomicUsize = AtomicUsize::new(default_release as usize);

/// Requests `size` bytes from the currently installed provider.
pub fn allocate(size: usize) -> *mut u8 {
    let raw = ALLOCATE.load(Ordering::Acquire);
    // SAFETY: only ever stores a value written by `set_allocator` or the
    // initializer above, both of type `AllocateFn`.
    let f: AllocateFn = unsafe { core::mem::transmute::<usize, AllocateFn>(raw) };
    unsafe { f(size) }
}

/// Releases `ptr` (of `size` bytes) back to the currently installed
/// provider.
///
/// # Safety
/// `ptr` must have been returned by a prior call to [`allocate`] with the
/// same `size`, under whichever provider was installed at that time.
pub unsafe fn release(ptr: *mut u8, size: usize) {
    let raw = RELEASE.load(Ordering::Acquire);
    let f: ReleaseFn = core::mem::transmute::<usize, ReleaseFn>(raw);
    f(ptr, size)
}

/// Overrides the process-global allocate/release pair.
///
/// # Safety
/// Must be called before any [`crate::pool::Pool`] that will use the
/// provider is constructed, and must not race with any other call into
/// this module. Swapping providers while buffers from the previous one
/// are still live is undefined behavior on release.
pub unsafe fn set_allocator(allocate_fn: AllocateFn, release_fn: ReleaseFn) {
    ALLOCATE.store(allocate_fn as usize, Ordering::Release);
    RELEASE.store(release_fn as usize, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_provider_round_trips_a_block() {
        let ptr = allocate(64);
        assert!(!ptr.is_null());
        unsafe {
            ptr.write_bytes(0xAB, 64);
            release(ptr, 64);
        }
    }

    #[test]
    fn zero_size_request_yields_null_without_crashing() {
        assert!(allocate(0).is_null());
        unsafe { release(core::ptr::null_mut(), 0) };
    }
}
