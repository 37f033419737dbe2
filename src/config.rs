//! Construction-time tunables for a [`Pool`](crate::pool::Pool)
//!
//! Mirrors the shape of a pool allocator's debug/production/performance
//! configuration split: the knobs here never change the pool's observable
//! collection semantics, only whether fresh and reclaimed payload bytes get
//! an identifiable fill pattern.

/// Configuration for [`Pool::with_config`](crate::pool::Pool::with_config).
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Track allocation/collection counters on the pool.
    pub track_stats: bool,
    /// Byte pattern written across a freshly carved node's payload before
    /// handing it to the caller, if set. Helps catch reads of
    /// uninitialized payload bytes in debug builds.
    pub alloc_pattern: Option<u8>,
    /// Byte pattern written across a block's payload by the sweeper
    /// immediately before the block is returned to the free list.
    pub dealloc_pattern: Option<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) { Some(0xBB) } else { None },
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
        }
    }
}

impl PoolConfig {
    /// Optimized for production: no stats, no fill patterns.
    pub const fn production() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Optimized for catching bugs: stats on, both fill patterns set.
    pub const fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Minimal overhead: same as `production`, kept distinct so call
    /// sites can name their intent.
    pub const fn performance() -> Self {
        Self::production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_disables_fill_patterns() {
        let c = PoolConfig::production();
        assert!(!c.track_stats);
        assert_eq!(c.alloc_pattern, None);
        assert_eq!(c.dealloc_pattern, None);
    }

    #[test]
    fn debug_enables_fill_patterns() {
        let c = PoolConfig::debug();
        assert!(c.track_stats);
        assert_eq!(c.alloc_pattern, Some(0xBB));
        assert_eq!(c.dealloc_pattern, Some(0xDD));
    }
}
