//! Recoverable failure types
//!
//! Contract violations (out-of-range neighbour index, counter access on a
//! node with fewer than two neighbours, oversized allocation requests,
//! misaligned buffers, `neighbour_count == 0xFFFF`) are programmer errors
//! and are enforced with `debug_assert!` at the call sites that can reach
//! them, not through this type.

use core::fmt;

/// Recoverable failures surfaced by `Pool`'s public operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// No free block is large enough to satisfy an `alloc` request.
    /// The pool is left unmodified; the caller typically responds by
    /// calling `collect` and retrying.
    AllocFailed,
    /// The pool's buffer or root-set backing storage could not be
    /// obtained at construction time.
    ConstructionFailed,
}

impl PoolError {
    /// A short, stable description suitable for logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PoolError::AllocFailed => "no free block fits the requested allocation",
            PoolError::ConstructionFailed => "pool backing storage could not be allocated",
        }
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PoolError {}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_non_empty_for_every_variant() {
        for e in [PoolError::AllocFailed, PoolError::ConstructionFailed] {
            assert!(!e.to_string().is_empty());
        }
    }
}
