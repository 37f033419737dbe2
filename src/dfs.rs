//! Pointer-reversal depth-first traversal (Deutsch–Schorr–Waite style)
//!
//! Visits every node reachable from a starting node exactly once, marking
//! each and invoking `for_each` on first visit, using O(1) auxiliary
//! memory: the per-node counter and mark bit plus two local references
//! (`current`, `previous`).
//!
//! Along the path from the root to `current`, every intermediate node has
//! exactly one neighbour slot whose address field has been temporarily
//! reversed to point at its predecessor instead of its original successor:
//! slot `counter - 1` for a `>= 2`-neighbour node, slot `0` for a
//! single-neighbour node. A `0`-neighbour node is never on the reversal
//! path — traversal reverses at the parent instead. Each reversal is
//! restored exactly once, when the walk backs off through that node.

use core::ptr;

use crate::node;

/// Runs the traversal from `start`, calling `for_each` once per
/// newly-visited node. A no-op if `start` is null or already marked.
/// When it returns, every edge visited has been restored to its original
/// value — the graph's topology is bit-identical to before the call; only
/// mark bits have changed.
///
/// Generic over the visitor rather than taking a trait object: each
/// monomorphized call site gets its own non-virtual `for_each`, matching
/// a plain function pointer rather than a vtable dispatch.
///
/// # Safety
/// `start`, if non-null, must point at a live node header in a pool that
/// is not concurrently mutated by anything else while this call is in
/// progress (see the crate-level concurrency contract).
pub unsafe fn dfs<F: FnMut(*mut u8)>(start: *mut u8, for_each: &mut F) {
    if start.is_null() || node::is_marked(start) {
        return;
    }
    node::mark(start);
    for_each(start);

    let count = node::neighbour_count(start);
    if count == 0 {
        return;
    }

    let previous: *mut u8 = ptr::null_mut();
    if count == 1 {
        if let Some((current, previous)) = forward(start, previous, for_each) {
            main_loop(current, previous, for_each);
        }
    } else {
        main_loop(start, previous, for_each);
    }
}

/// Backs off along the reversal path. Returns `None` once the path is
/// exhausted (the whole walk is complete), or `Some((current, previous))`
/// once it reaches a `>=2`-neighbour node with dispatch still pending —
/// control then resumes in `main_loop`.
fn back_off(mut current: *mut u8, mut previous: *mut u8) -> Option<(*mut u8, *mut u8)> {
    loop {
        let next = current;
        current = previous;
        if current.is_null() {
            return None;
        }

        // SAFETY: `current` came from a neighbour slot written by this
        // traversal, so it is a live node in the same pool.
        let count = unsafe { node::neighbour_count(current) };
        if count >= 2 {
            let c = unsafe { node::get_counter(current) };
            previous = unsafe { node::get_neighbour(current, c) };
            unsafe { node::set_neighbour(current, next, c) };
            unsafe { node::inc_counter(current) };
            return Some((current, previous));
        }

        previous = unsafe { node::get_neighbour(current, 0) };
        unsafe { node::set_neighbour(current, next, 0) };
    }
}

/// Runs forward through a chain of single-neighbour nodes starting at
/// `current` (which has exactly one neighbour). Returns `Some((current,
/// previous))` once it reaches a `>=2`-neighbour node (to resume in
/// `main_loop`), or `None` once `back_off` has exhausted the path.
fn forward<F: FnMut(*mut u8)>(
    mut current: *mut u8,
    mut previous: *mut u8,
    for_each: &mut F,
) -> Option<(*mut u8, *mut u8)> {
    loop {
        let next = unsafe { node::get_neighbour(current, 0) };
        if next.is_null() || unsafe { node::is_marked(next) } {
            return back_off(current, previous);
        }

        unsafe { node::mark(next) };
        for_each(next);

        let count = unsafe { node::neighbour_count(next) };
        if count == 0 {
            return back_off(current, previous);
        }

        unsafe { node::set_neighbour(current, previous, 0) };
        previous = current;
        current = next;

        if count >= 2 {
            return Some((current, previous));
        }
        // count == 1: keep skating forward.
    }
}

/// Visits all neighbours of `current` (which has `>= 2` neighbours) and
/// everything reachable from them, descending via `forward` through any
/// single-neighbour chain it meets along the way. Returns once the whole
/// walk is complete.
fn main_loop<F: FnMut(*mut u8)>(mut current: *mut u8, mut previous: *mut u8, for_each: &mut F) {
    loop {
        if current.is_null() {
            return;
        }

        let count = unsafe { node::neighbour_count(current) };
        debug_assert!(count >= 2);
        let c = unsafe { node::get_counter(current) };

        if c == count {
            unsafe { node::reset_counter(current) };
            match back_off(current, previous) {
                None => return,
                Some((c2, p2)) => {
                    current = c2;
                    previous = p2;
                    continue;
                }
            }
        }

        let next = unsafe { node::get_neighbour(current, c) };
        if next.is_null() || unsafe { node::is_marked(next) } {
            unsafe { node::inc_counter(current) };
            continue;
        }

        unsafe { node::mark(next) };
        for_each(next);

        let next_count = unsafe { node::neighbour_count(next) };
        if next_count == 0 {
            unsafe { node::inc_counter(current) };
            continue;
        }

        unsafe { node::set_neighbour(current, previous, c) };
        previous = current;
        current = next;

        if next_count >= 2 {
            continue;
        }

        match forward(current, previous, for_each) {
            None => return,
            Some((c2, p2)) => {
                current = c2;
                previous = p2;
            }
        }
    }
}
