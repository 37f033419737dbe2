//! The owning pool: construction, allocation, rooting, and mark-and-sweep
//! collection.
//!
//! Grounded on `memoryPool_new`/`memoryPool_alloc`/`memoryPool_free`/
//! `memoryPool_gc_mark_and_sweep` — this module is the thin layer that
//! wires the free-list allocator ([`crate::allocator`]), node headers
//! ([`crate::node`]), the root set ([`crate::roots`]) and the DFS
//! ([`crate::dfs`]) together behind a safe-looking but still
//! single-threaded, `!Sync` API.

use core::ptr::NonNull;

use crate::allocator::FreeList;
use crate::block;
use crate::config::PoolConfig;
use crate::dfs;
use crate::error::{PoolError, PoolResult};
use crate::node;
use crate::roots::RootSet;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// A reference to a node allocated in a [`Pool`]. Opaque outside the
/// crate; valid only as long as the node's block has not been swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub(crate) NonNull<u8>);

impl NodeRef {
    pub(crate) fn as_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }

    pub(crate) unsafe fn from_raw(ptr: *mut u8) -> Self {
        debug_assert!(!ptr.is_null());
        Self(NonNull::new_unchecked(ptr))
    }

    /// Number of neighbour slots this node was allocated with.
    pub fn neighbour_count(self) -> u16 {
        unsafe { node::neighbour_count(self.as_ptr()) }
    }

    /// Reads neighbour `index`. `None` represents a null reference.
    ///
    /// # Panics
    /// In debug builds, if `index >= max(1, neighbour_count())`.
    pub fn get_neighbour(self, index: u16) -> Option<NodeRef> {
        let raw = unsafe { node::get_neighbour(self.as_ptr(), index) };
        NonNull::new(raw).map(Self)
    }

    /// Writes neighbour `index`. `value = None` stores a null reference.
    ///
    /// # Safety
    /// `value`, if present, must be a node allocated from the same pool
    /// as `self`. Cross-pool references are a contract violation (see
    /// the crate-level concurrency/ownership model).
    pub unsafe fn set_neighbour(self, index: u16, value: Option<NodeRef>) {
        let raw = value.map_or(core::ptr::null_mut(), NodeRef::as_ptr);
        node::set_neighbour(self.as_ptr(), raw, index);
    }

    /// Pointer to the first payload byte past this node's neighbour slots.
    pub fn payload(self) -> *mut u8 {
        unsafe { node::payload(self.as_ptr()) }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Stats {
    allocations: u64,
    collections: u64,
    finalized: u64,
}

/// A fixed-capacity, garbage-collected memory pool for an object graph.
///
/// `Pool` is deliberately `!Sync` (and effectively `!Send` in spirit,
/// though not enforced by the type system beyond the raw pointers it
/// holds) — every operation, `collect` above all, walks and temporarily
/// mutates every node reachable from the root set, which is unsound to
/// interleave with any other access to the same pool. See the
/// concurrency note in the crate root docs.
pub struct Pool {
    free_list: FreeList,
    roots: RootSet,
    finalizer: Option<unsafe fn(*mut u8)>,
    config: PoolConfig,
    stats: Stats,
    _not_sync: core::marker::PhantomData<core::cell::Cell<()>>,
}

impl Pool {
    /// Builds a pool over a freshly allocated `size`-byte buffer, with the
    /// default [`PoolConfig`] and no finalizer.
    pub fn new(size: usize) -> PoolResult<Self> {
        Self::with_config(size, PoolConfig::default(), None)
    }

    /// Builds a pool with an explicit finalizer, invoked on the payload
    /// pointer of every node reclaimed by `collect` or by `Drop`.
    ///
    /// # Safety
    /// `finalizer` must not re-enter this pool (allocate, root, or
    /// collect) and must not panic.
    pub unsafe fn with_finalizer(size: usize, finalizer: unsafe fn(*mut u8)) -> PoolResult<Self> {
        Self::with_config(size, PoolConfig::default(), Some(finalizer))
    }

    /// Builds a pool with both an explicit [`PoolConfig`] and an optional
    /// finalizer.
    ///
    /// # Safety
    /// See [`Pool::with_finalizer`] for the finalizer's contract.
    pub fn with_config(
        size: usize,
        config: PoolConfig,
        finalizer: Option<unsafe fn(*mut u8)>,
    ) -> PoolResult<Self> {
        let free_list = FreeList::new(size)?;
        let roots = RootSet::new()?;
        #[cfg(feature = "logging")]
        debug!(size, has_finalizer = finalizer.is_some(), "pool constructed");
        Ok(Self {
            free_list,
            roots,
            finalizer,
            config,
            stats: Stats::default(),
            _not_sync: core::marker::PhantomData,
        })
    }

    /// Allocates a node with `neighbour_count` neighbour slots (all
    /// initialized to null) and at least `data_size` payload bytes.
    ///
    /// # Errors
    /// [`PoolError::AllocFailed`] if no free block is large enough. The
    /// pool is left unmodified.
    pub fn alloc(&mut self, data_size: usize, neighbour_count: u16) -> PoolResult<NodeRef> {
        debug_assert_ne!(neighbour_count, 0xFFFF);
        let slot_bytes = core::cmp::max(1, neighbour_count) as usize * 8;

        let block_ptr = self
            .free_list
            .alloc(slot_bytes, data_size)
            .ok_or(PoolError::AllocFailed)?;

        unsafe {
            let node_ptr = block::payload(block_ptr);
            node::new_node(node_ptr, neighbour_count);
            if let Some(pattern) = self.config.alloc_pattern {
                let payload = node::payload(node_ptr);
                let payload_len = block::get_size(block_ptr) as usize - slot_bytes;
                core::ptr::write_bytes(payload, pattern, payload_len);
            }
            if self.config.track_stats {
                self.stats.allocations += 1;
            }
            #[cfg(feature = "logging")]
            trace!(data_size, neighbour_count, "node allocated");
            Ok(NodeRef::from_raw(node_ptr))
        }
    }

    /// Adds `node` to the root set. Returns `false` (leaving the root set
    /// unmodified) if backing storage could not grow to hold it.
    pub fn add_root(&mut self, node: NodeRef) -> bool {
        self.roots.push(node.as_ptr())
    }

    /// Runs mark-and-sweep collection: marks everything reachable from
    /// the root set (in insertion order), then sweeps the block list,
    /// finalizing and freeing every unmarked allocated block. No
    /// coalescing of adjacent free blocks is performed.
    ///
    /// TODO: coalesce adjacent free blocks during sweep to reduce
    /// fragmentation under alloc/collect churn.
    pub fn collect(&mut self) {
        #[cfg(feature = "logging")]
        debug!(roots = self.roots.len(), "collection started");
        for root in self.roots.iter() {
            unsafe { dfs::dfs(root, &mut |_| {}) };
        }
        self.sweep();
        if self.config.track_stats {
            self.stats.collections += 1;
        }
        #[cfg(feature = "logging")]
        debug!(finalized = self.stats.finalized, "collection finished");
    }

    fn sweep(&mut self) {
        let mut cur = self.free_list.head();
        while !cur.is_null() {
            unsafe {
                if !block::is_free(cur) {
                    let node_ptr = block::payload(cur);
                    if node::is_marked(node_ptr) {
                        node::clear_mark(node_ptr);
                    } else {
                        if let Some(finalizer) = self.finalizer {
                            finalizer(node::payload(node_ptr));
                        }
                        if let Some(pattern) = self.config.dealloc_pattern {
                            let slot_bytes =
                                core::cmp::max(1, node::neighbour_count(node_ptr)) as usize * 8;
                            let payload = node::payload(node_ptr);
                            let payload_len = block::get_size(cur) as usize - slot_bytes;
                            core::ptr::write_bytes(payload, pattern, payload_len);
                        }
                        block::set_free(cur, true);
                        if self.config.track_stats {
                            self.stats.finalized += 1;
                        }
                    }
                }
                cur = block::get_next(cur);
            }
        }
    }

    /// Finalizes every remaining allocated block, consuming the pool.
    /// Equivalent to dropping it, spelled out for callers that want the
    /// release to be visible at the call site.
    pub fn release(mut self) {
        self.finalize_all();
    }

    fn finalize_all(&mut self) {
        let mut cur = self.free_list.head();
        while !cur.is_null() {
            unsafe {
                if !block::is_free(cur) {
                    if let Some(finalizer) = self.finalizer {
                        let node_ptr = block::payload(cur);
                        finalizer(node::payload(node_ptr));
                    }
                    block::set_free(cur, true);
                }
                cur = block::get_next(cur);
            }
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.finalize_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn wire(from: NodeRef, index: u16, to: NodeRef) {
        unsafe { from.set_neighbour(index, Some(to)) };
    }

    #[test]
    fn three_node_cycle_non_rooted_is_fully_collected() {
        let mut pool = Pool::new(1024).unwrap();
        let a = pool.alloc(8, 1).unwrap();
        let b = pool.alloc(8, 1).unwrap();
        let c = pool.alloc(8, 1).unwrap();
        wire(a, 0, b);
        wire(b, 0, c);
        wire(c, 0, a);

        pool.collect();

        unsafe {
            assert!(block::is_free(block_of(a)));
            assert!(block::is_free(block_of(b)));
            assert!(block::is_free(block_of(c)));
        }

        pool.collect(); // idempotent: no-op
    }

    #[test]
    fn cycle_with_one_root_survives_and_marks_clear() {
        let mut pool = Pool::new(1024).unwrap();
        let a = pool.alloc(8, 1).unwrap();
        let b = pool.alloc(8, 1).unwrap();
        let c = pool.alloc(8, 1).unwrap();
        wire(a, 0, b);
        wire(b, 0, c);
        wire(c, 0, a);
        assert!(pool.add_root(a));

        pool.collect();

        unsafe {
            for n in [a, b, c] {
                assert!(!block::is_free(block_of(n)));
                assert!(!node::is_marked(n.as_ptr()));
            }
        }
    }

    #[test]
    fn alloc_to_failure_then_collect_then_retry_succeeds() {
        let mut pool = Pool::new(1024).unwrap();
        let mut count = 0;
        loop {
            match pool.alloc(64, 1) {
                Ok(_) => count += 1,
                Err(PoolError::AllocFailed) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(count > 0);

        pool.collect(); // no roots: everything freed
        assert!(pool.alloc(64, 1).is_ok());
    }

    #[test]
    fn finalizer_fires_once_per_unreachable_node() {
        thread_local! {
            static COUNTER: RefCell<u32> = RefCell::new(0);
        }
        unsafe fn bump(_payload: *mut u8) {
            COUNTER.with(|c| *c.borrow_mut() += 1);
        }

        let mut pool = unsafe { Pool::with_finalizer(1024, bump).unwrap() };
        for _ in 0..5 {
            pool.alloc(8, 0).unwrap();
        }
        pool.collect();
        COUNTER.with(|c| assert_eq!(*c.borrow(), 5));

        pool.collect();
        COUNTER.with(|c| assert_eq!(*c.borrow(), 5));
    }

    #[test]
    fn drop_finalizes_remaining_allocated_blocks() {
        // Finalizers are plain fn pointers, so route the counter through a
        // thread-local instead of capturing state in a closure.
        thread_local! {
            static DROPS: RefCell<u32> = RefCell::new(0);
        }
        unsafe fn bump(_payload: *mut u8) {
            DROPS.with(|c| *c.borrow_mut() += 1);
        }

        {
            let mut pool = unsafe { Pool::with_finalizer(256, bump).unwrap() };
            pool.alloc(8, 0).unwrap();
            pool.alloc(8, 0).unwrap();
        }
        DROPS.with(|c| assert_eq!(*c.borrow(), 2));
    }

    unsafe fn block_of(n: NodeRef) -> *mut u8 {
        n.as_ptr().sub(block::HEADER_SIZE)
    }
}
