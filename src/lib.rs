//! A fixed-capacity, garbage-collected memory pool for object graphs.
//!
//! A client allocates *nodes* inside a single contiguous region; each node
//! carries a fixed-size payload and a fixed number of outgoing references
//! to other nodes in the same pool. A subset of nodes is the *root set*.
//! Running [`Pool::collect`] reclaims every node unreachable from the
//! root set, invoking an optional finalizer on each reclaimed node's
//! payload.
//!
//! The three tightly coupled subsystems doing the real work:
//!
//! - a first-fit free-list allocator over one contiguous buffer, with
//!   block bookkeeping packed into a single tagged pointer;
//! - a node header (neighbour count, mark bit, DFS counter) packed into
//!   the tag bits of the node's own neighbour slots;
//! - an iterative, stackless depth-first traversal using pointer
//!   reversal (Deutsch–Schorr–Waite), which the mark-and-sweep collector
//!   runs from every root.
//!
//! # Concurrency
//! [`Pool`] is `!Sync`: every operation — `collect` above all — walks and
//! temporarily mutates the whole reachable graph, which is unsound to
//! interleave with any other access to the same pool. Distinct pools are
//! fully independent.
#![warn(missing_docs)]

pub mod tagged;

mod allocator;
mod block;
mod config;
mod dfs;
mod error;
mod node;
mod pool;
mod provider;
mod roots;
mod typed;

pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use pool::{NodeRef, Pool};
pub use provider::{allocate, release, set_allocator, AllocateFn, ReleaseFn};
pub use typed::{finalizer, TypedHandle};
