//! Decides which chunks must be resident around the player.
//!
//! The controller only plans; the world executes the plan because it owns the
//! store, the generator and the storage backend.

use crate::config::StreamingConfig;
use crate::core::chunk::ChunkCoord;
use crate::world::store::ChunkStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub generated: u64,
    pub restored: u64,
    pub evicted: u64,
    pub flushed: u64,
    pub flush_failures: u64,
}

pub struct StreamingController {
    config: StreamingConfig,
    last_center: Option<ChunkCoord>,
    /// Work was left over last tick (budget exhausted, workers busy, failed flush).
    backlog: bool,
    stats: StreamStats,
}

impl StreamingController {
    pub fn new(config: StreamingConfig) -> Self {
        StreamingController {
            config,
            last_center: None,
            backlog: false,
            stats: StreamStats::default(),
        }
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StreamStats {
        &mut self.stats
    }

    pub fn last_center(&self) -> Option<ChunkCoord> {
        self.last_center
    }

    /// O(1): nothing to do when the player stayed in the same chunk and the
    /// previous tick finished its work.
    #[inline]
    pub fn needs_update(&self, center: ChunkCoord) -> bool {
        self.backlog || self.last_center != Some(center)
    }

    pub fn is_required(&self, center: ChunkCoord, coord: ChunkCoord) -> bool {
        coord.chebyshev(center) <= self.config.radius
    }

    /// Coordinates inside the radius that are not resident, nearest first.
    /// The window is cut off at the edge of the addressable chunk range.
    pub fn missing(&self, center: ChunkCoord, store: &ChunkStore) -> Vec<ChunkCoord> {
        let r = self.config.radius.max(0);
        let span = |axis: i32| {
            axis.saturating_sub(r).max(ChunkCoord::MIN_AXIS)
                ..=axis.saturating_add(r).min(ChunkCoord::MAX_AXIS)
        };
        let mut missing = Vec::new();
        for cx in span(center.cx) {
            for cz in span(center.cz) {
                let coord = ChunkCoord::new(cx, cz);
                if !store.contains(coord) {
                    missing.push(coord);
                }
            }
        }
        missing.sort_by_key(|coord| (coord.distance_sq(center), *coord));
        missing
    }

    /// Resident chunks past the radius plus the hysteresis margin.
    pub fn evictable(&self, center: ChunkCoord, store: &ChunkStore) -> Vec<ChunkCoord> {
        store.coords_beyond(center, self.config.evict_distance())
    }

    pub fn finish_tick(&mut self, center: ChunkCoord, backlog: bool) {
        self.last_center = Some(center);
        self.backlog = backlog;
    }

    /// Forgets the last position so the next tick replans from scratch.
    pub fn reset(&mut self) {
        self.last_center = None;
        self.backlog = false;
    }
}
