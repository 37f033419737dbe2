//! Typed handle over a pool-allocated node
//!
//! `Pool` itself only ever moves raw bytes: `alloc` hands back a
//! [`NodeRef`] whose payload is uninitialized memory, and a pool's single
//! finalizer is a bare `fn(*mut u8)`. `TypedHandle<T>` is the thin,
//! construct-in-place wrapper around that contract, grounded on the
//! allocator crate's `PoolBox<T>`: a pool is homogeneous in the type it
//! stores, so its finalizer is [`finalizer::<T>`], which the pool calls
//! on every reclaimed node's payload — exactly the `drop_in_place`
//! closure a typed wrapper would install.

use core::marker::PhantomData;
use core::ptr;

use crate::pool::{NodeRef, Pool};
use crate::error::PoolResult;

/// A node reference known to carry a live `T` in its payload.
///
/// Does not run `T`'s destructor itself — that happens when the pool
/// reclaims the node (via `collect` or `Drop for Pool`), which is why a
/// pool intended to hold `TypedHandle<T>` values must be constructed with
/// [`finalizer::<T>`] installed.
pub struct TypedHandle<T> {
    node: NodeRef,
    _value: PhantomData<T>,
}

impl<T> core::fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypedHandle").field("node", &self.node).finish()
    }
}

impl<T> TypedHandle<T> {
    /// Allocates a node sized for `T` plus `neighbour_count` neighbour
    /// slots, and writes `value` into its payload in place.
    ///
    /// # Safety
    /// `pool` must have been constructed with `finalizer::<T>` installed
    /// (via [`Pool::with_finalizer`]) if `T` needs its destructor run on
    /// reclamation; otherwise reclaiming a live `T` leaks it instead of
    /// dropping it.
    pub unsafe fn new(pool: &mut Pool, value: T, neighbour_count: u16) -> PoolResult<Self> {
        let node = pool.alloc(core::mem::size_of::<T>(), neighbour_count)?;
        ptr::write(node.payload().cast::<T>(), value);
        Ok(Self {
            node,
            _value: PhantomData,
        })
    }

    /// The underlying untyped node reference.
    pub fn node(&self) -> NodeRef {
        self.node
    }

    /// Borrows the payload as `&T`.
    ///
    /// # Safety
    /// The node must not have been reclaimed by a collection since this
    /// handle was created.
    pub unsafe fn as_ref(&self) -> &T {
        &*self.node.payload().cast::<T>()
    }

    /// Borrows the payload as `&mut T`.
    ///
    /// # Safety
    /// The node must not have been reclaimed by a collection since this
    /// handle was created.
    pub unsafe fn as_mut(&mut self) -> &mut T {
        &mut *self.node.payload().cast::<T>()
    }
}

impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            _value: PhantomData,
        }
    }
}
impl<T> Copy for TypedHandle<T> {}

/// A pool finalizer that drops a `T` in place. Install via
/// `Pool::with_finalizer(size, finalizer::<T>)` for any pool whose nodes
/// are all allocated through `TypedHandle::<T>::new`.
///
/// # Safety
/// Must only be installed on a pool whose every allocated node's payload
/// holds a live, properly initialized `T` at the moment it is reclaimed.
pub unsafe fn finalizer<T>(payload: *mut u8) {
    ptr::drop_in_place(payload.cast::<T>());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct DropCounter(Rc<RefCell<u32>>);
    impl Drop for DropCounter {
        fn drop(&mut self) {
            *self.0.borrow_mut() += 1;
        }
    }

    #[test]
    fn reclaimed_typed_node_runs_destructor() {
        let count = Rc::new(RefCell::new(0));
        let mut pool = unsafe { Pool::with_finalizer(1024, finalizer::<DropCounter>).unwrap() };

        unsafe {
            let _h = TypedHandle::new(&mut pool, DropCounter(count.clone()), 0).unwrap();
        }
        assert_eq!(*count.borrow(), 0);

        pool.collect(); // not rooted: reclaimed, destructor runs
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn rooted_typed_node_survives_collect_and_reads_back() {
        let count = Rc::new(RefCell::new(0));
        let mut pool = unsafe { Pool::with_finalizer(1024, finalizer::<DropCounter>).unwrap() };

        let h = unsafe { TypedHandle::new(&mut pool, DropCounter(count.clone()), 0).unwrap() };
        pool.add_root(h.node());
        pool.collect();

        assert_eq!(*count.borrow(), 0);
        unsafe { assert!(Rc::ptr_eq(&h.as_ref().0, &count)) };
    }
}
