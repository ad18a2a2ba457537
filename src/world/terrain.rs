use glam::Vec3;
use rustc_hash::FxHashSet;

use crate::config::StreamingConfig;
use crate::constants::*;
use crate::core::block::{BlockId, BlockType};
use crate::core::chunk::{Chunk, ChunkCoord, resolve};
use crate::core::registry::BlockRegistry;
use crate::error::{PersistenceError, WorldError};
use crate::save::{
    self, META_KEY, PlayerSnapshot, SaveRecord, SavedChunk, chunk_key, decode_chunk, decode_meta,
    encode_chunk, encode_meta,
};
use crate::storage::Storage;
use crate::world::generator::TerrainGenerator;
use crate::world::loader::{ChunkGenResult, ChunkLoader};
use crate::world::store::ChunkStore;
use crate::world::streaming::{StreamStats, StreamingController};

/// Where a resident chunk came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkSource {
    Generated,
    Worker,
    Restored,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    BlockChanged {
        x: i32,
        y: i32,
        z: i32,
        old: BlockType,
        new: BlockType,
    },
    ChunkLoaded(ChunkCoord, ChunkSource),
    ChunkEvicted(ChunkCoord),
    Saved { chunks: usize },
    Loaded,
    Deleted,
}

type WorldObserver = Box<dyn FnMut(&WorldEvent) + Send>;

/// The voxel world: resident chunks around the player, streamed in from
/// storage or the generator and flushed back out on eviction.
pub struct World {
    store: ChunkStore,
    generator: TerrainGenerator,
    loader: Option<ChunkLoader>,
    streaming: StreamingController,
    storage: Box<dyn Storage>,
    /// Chunks that have a blob in storage and must be restored, not regenerated.
    persisted: FxHashSet<ChunkCoord>,
    registry: &'static BlockRegistry,
    observer: Option<WorldObserver>,
}

impl World {
    pub fn new<S: Storage + 'static>(seed: u32, storage: S) -> Self {
        Self::with_config(seed, StreamingConfig::default(), storage)
    }

    pub fn with_config<S: Storage + 'static>(
        seed: u32,
        streaming: StreamingConfig,
        storage: S,
    ) -> Self {
        let loader = spawn_loader(streaming.workers, seed);
        tracing::info!(
            "world created (seed {}, radius {}, {} workers)",
            seed,
            streaming.radius,
            loader.as_ref().map_or(0, ChunkLoader::worker_count)
        );
        World {
            store: ChunkStore::new(),
            generator: TerrainGenerator::new(seed),
            loader,
            streaming: StreamingController::new(streaming),
            storage: Box::new(storage),
            persisted: FxHashSet::default(),
            registry: BlockRegistry::global(),
            observer: None,
        }
    }

    /// Registers the single world event callback, replacing any previous one.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&WorldEvent) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    fn emit(&mut self, event: WorldEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    pub fn seed(&self) -> u32 {
        self.generator.seed()
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn streaming_config(&self) -> &StreamingConfig {
        self.streaming.config()
    }

    pub fn stats(&self) -> StreamStats {
        self.streaming.stats()
    }

    // ---- Block access ----

    /// Air for unloaded chunks and for `y` outside the column.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        let (coord, lx, lz) = resolve(x, z);
        self.store
            .get(coord)
            .map_or(BlockType::Air, |chunk| chunk.get_block(lx, y, lz))
    }

    /// Writes a block if its chunk is resident. Returns whether anything changed.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        if !block.is_placeable() {
            tracing::debug!("refusing to place item {} at ({}, {}, {})", block.name(), x, y, z);
            return false;
        }
        if !(0..CHUNK_HEIGHT).contains(&y) {
            return false;
        }

        let (coord, lx, lz) = resolve(x, z);
        let Some(chunk) = self.store.get_mut(coord) else {
            tracing::debug!("set_block on unloaded chunk {:?} ignored", coord);
            return false;
        };
        let old = chunk.get_block(lx, y, lz);
        if !chunk.set_block(lx, y, lz, block) {
            return false;
        }

        self.emit(WorldEvent::BlockChanged {
            x,
            y,
            z,
            old,
            new: block,
        });
        true
    }

    pub fn has_block(&self, x: i32, y: i32, z: i32) -> bool {
        !self.get_block(x, y, z).is_air()
    }

    /// Physics and AI must check this before acting on a position.
    pub fn is_chunk_loaded(&self, x: f32, z: f32) -> bool {
        self.store.contains(ChunkCoord::from_world(x, z))
    }

    pub fn get_break_time(&self, block_id: BlockId, tool_id: BlockId) -> f32 {
        self.registry.get_break_time(block_id, tool_id)
    }

    // ---- Chunk access ----

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.store.get(coord)
    }

    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.store.contains(coord)
    }

    pub fn loaded_chunk_count(&self) -> usize {
        self.store.len()
    }

    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.store.coords().collect();
        coords.sort();
        coords
    }

    /// Chunks the mesher has not seen since their last change.
    pub fn dirty_chunks(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self
            .store
            .iter()
            .filter(|chunk| chunk.is_dirty())
            .map(Chunk::coord)
            .collect();
        coords.sort();
        coords
    }

    pub fn clear_dirty(&mut self, coord: ChunkCoord) {
        if let Some(chunk) = self.store.get_mut(coord) {
            chunk.clear_dirty();
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.iter().any(Chunk::has_unsaved_changes)
    }

    pub fn pending_generation(&self) -> usize {
        self.loader.as_ref().map_or(0, ChunkLoader::pending_count)
    }

    // ---- Streaming ----

    /// Streams chunks around the player: drains finished worker output, fills
    /// the radius nearest-first, then evicts what fell past the hysteresis ring.
    pub fn update(&mut self, player: Vec3) {
        let center = ChunkCoord::from_world(player.x, player.z);
        let delivered = self.drain_generated(center);
        if delivered == 0 && !self.streaming.needs_update(center) {
            return;
        }

        let mut backlog = self.load_missing(center);
        backlog |= self.evict_distant(center);
        self.streaming.finish_tick(center, backlog);
    }

    fn drain_generated(&mut self, center: ChunkCoord) -> usize {
        let Some(loader) = self.loader.as_mut() else {
            return 0;
        };
        let results = loader.poll_results(WORKER_RESULTS_PER_TICK);
        let delivered = results.len();

        for ChunkGenResult { coord, chunk } in results {
            // Saved data always wins over fresh terrain.
            if !self.streaming.is_required(center, coord)
                || self.store.contains(coord)
                || self.persisted.contains(&coord)
            {
                tracing::debug!("discarding generated chunk {:?}", coord);
                continue;
            }
            self.insert_chunk(chunk, ChunkSource::Worker);
        }
        delivered
    }

    /// Returns true if work was left for a later tick.
    fn load_missing(&mut self, center: ChunkCoord) -> bool {
        let missing = self.streaming.missing(center, &self.store);
        if missing.is_empty() {
            return false;
        }

        let budget = self
            .streaming
            .config()
            .max_chunks_per_tick
            .unwrap_or(usize::MAX);
        let mut spent = 0;
        let mut backlog = false;

        // `missing` is nearest first, so the inner ring is always handled
        // before the budget can run out.
        for coord in missing {
            let inner = coord.chebyshev(center) <= INNER_RING_RADIUS;
            if !inner && spent >= budget {
                backlog = true;
                break;
            }

            if self.persisted.contains(&coord) {
                if let Some(chunk) = self.restore_chunk(coord) {
                    self.insert_chunk(chunk, ChunkSource::Restored);
                    spent += 1;
                    continue;
                }
            }

            if !inner {
                if let Some(loader) = self.loader.as_mut() {
                    if !loader.request_chunk(coord) {
                        backlog = true;
                    }
                    continue;
                }
            }

            let chunk = self.generator.generate_chunk(coord);
            self.insert_chunk(chunk, ChunkSource::Generated);
            spent += 1;
        }
        backlog
    }

    /// Returns true if a chunk had to be kept because its flush failed.
    fn evict_distant(&mut self, center: ChunkCoord) -> bool {
        let mut backlog = false;
        for coord in self.streaming.evictable(center, &self.store) {
            if let Err(e) = self.flush_chunk(coord) {
                tracing::warn!("keeping chunk {:?}, flush before eviction failed: {}", coord, e);
                self.streaming.stats_mut().flush_failures += 1;
                backlog = true;
                continue;
            }
            if self.store.remove(coord).is_some() {
                tracing::debug!("evicted chunk {:?}", coord);
                self.streaming.stats_mut().evicted += 1;
                self.emit(WorldEvent::ChunkEvicted(coord));
            }
        }
        backlog
    }

    fn insert_chunk(&mut self, chunk: Chunk, source: ChunkSource) {
        let coord = chunk.coord();
        if !self.store.insert(chunk) {
            return;
        }
        let stats = self.streaming.stats_mut();
        match source {
            ChunkSource::Generated | ChunkSource::Worker => stats.generated += 1,
            ChunkSource::Restored => stats.restored += 1,
        }
        tracing::debug!("loaded chunk {:?} ({:?})", coord, source);
        self.emit(WorldEvent::ChunkLoaded(coord, source));
    }

    fn read_saved_chunk(
        &self,
        coord: ChunkCoord,
        seed: u32,
    ) -> Result<Option<SavedChunk>, PersistenceError> {
        match self.storage.load(&chunk_key(coord))? {
            Some(bytes) => decode_chunk(coord, seed, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Loads a persisted chunk. Anything unreadable is dropped from the index
    /// so the chunk regenerates.
    fn restore_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        let restored = match self.read_saved_chunk(coord, self.seed()) {
            Ok(Some(saved)) => Chunk::from_saved(coord, saved.blocks),
            Ok(None) => {
                tracing::warn!("chunk {:?} is indexed but missing from storage", coord);
                self.persisted.remove(&coord);
                return None;
            }
            Err(e) => Err(e.into()),
        };
        match restored {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                tracing::warn!("failed to restore chunk {:?}, regenerating: {}", coord, e);
                self.persisted.remove(&coord);
                None
            }
        }
    }

    /// Writes a resident chunk if it holds unsaved edits. Returns whether a
    /// write happened.
    fn flush_chunk(&mut self, coord: ChunkCoord) -> Result<bool, PersistenceError> {
        let Some(chunk) = self.store.get(coord) else {
            return Ok(false);
        };
        if !chunk.has_unsaved_changes() {
            return Ok(false);
        }

        let blob = encode_chunk(self.generator.seed(), chunk)?;
        self.storage.save(&chunk_key(coord), &blob)?;
        if let Some(chunk) = self.store.get_mut(coord) {
            chunk.mark_saved();
        }
        self.persisted.insert(coord);
        self.streaming.stats_mut().flushed += 1;
        Ok(true)
    }

    // ---- Persistence ----

    /// Writes every chunk with unsaved edits, then the meta blob. Returns the
    /// number of chunks written. On failure the remaining chunks keep their
    /// unsaved flag, so the next save retries them.
    pub fn save_world(&mut self, player: &PlayerSnapshot) -> Result<usize, WorldError> {
        let mut pending: Vec<ChunkCoord> = self
            .store
            .iter()
            .filter(|chunk| chunk.has_unsaved_changes())
            .map(Chunk::coord)
            .collect();
        pending.sort();

        let mut written = 0;
        for coord in pending {
            if self.flush_chunk(coord)? {
                written += 1;
            }
        }

        let mut index: Vec<ChunkCoord> = self.persisted.iter().copied().collect();
        index.sort();
        let meta = encode_meta(self.seed(), player, &index)?;
        self.storage.save(META_KEY, &meta)?;

        tracing::info!(
            "saved world (seed {}, {} chunks written, {} persisted)",
            self.seed(),
            written,
            index.len()
        );
        self.emit(WorldEvent::Saved { chunks: written });
        Ok(written)
    }

    /// Restores the saved world. On any error before the commit point the
    /// in-memory world is left exactly as it was.
    pub fn load_world(&mut self) -> Result<SaveRecord, WorldError> {
        let bytes = self.storage.load(META_KEY)?.ok_or(WorldError::NoSaveFound)?;
        let meta = decode_meta(&bytes)?;

        // Chunks flushed on eviction after the last save are newer than the
        // meta index, so storage keys count too.
        let mut index: FxHashSet<ChunkCoord> = meta.chunk_index.iter().copied().collect();
        index.extend(
            self.storage
                .keys()?
                .iter()
                .filter_map(|key| save::parse_chunk_key(key)),
        );
        let mut coords: Vec<ChunkCoord> = index.into_iter().collect();
        coords.sort();

        let mut chunks = Vec::with_capacity(coords.len());
        for coord in coords {
            match self.read_saved_chunk(coord, meta.seed) {
                Ok(Some(saved)) => chunks.push(saved),
                Ok(None) => {
                    tracing::warn!("saved chunk {:?} is missing, it will regenerate", coord)
                }
                Err(e) => tracing::warn!("skipping unreadable chunk {:?}: {}", coord, e),
            }
        }

        // Commit.
        self.reset(meta.seed);
        self.persisted = chunks.iter().map(|chunk| chunk.coord).collect();
        tracing::info!(
            "loaded world (seed {}, {} saved chunks)",
            meta.seed,
            chunks.len()
        );
        self.emit(WorldEvent::Loaded);

        Ok(SaveRecord {
            version: save::VERSION,
            seed: meta.seed,
            saved_at: meta.saved_at,
            player: meta.player,
            chunks,
        })
    }

    /// Removes every persisted blob and drops all resident chunks.
    pub fn delete_world(&mut self) -> Result<(), WorldError> {
        for key in self.storage.keys()? {
            self.storage.delete(&key)?;
        }
        self.store.clear();
        self.persisted.clear();
        self.streaming.reset();
        tracing::info!("deleted saved world");
        self.emit(WorldEvent::Deleted);
        Ok(())
    }

    /// Drops all resident chunks, including unsaved edits, and continues with
    /// `seed`. Storage is not touched.
    pub fn reset(&mut self, seed: u32) {
        // Same seed: in-flight worker output is still valid terrain and gets
        // filtered on arrival like any other result.
        if seed != self.generator.seed() {
            self.generator = TerrainGenerator::new(seed);
            self.loader = spawn_loader(self.streaming.config().workers, seed);
        }
        self.store.clear();
        self.persisted.clear();
        self.streaming.reset();
    }
}

fn spawn_loader(workers: usize, seed: u32) -> Option<ChunkLoader> {
    if workers == 0 {
        return None;
    }
    let loader = ChunkLoader::new(workers, seed);
    if loader.worker_count() == 0 {
        tracing::warn!("no chunk workers could be started, generating on the tick thread");
        return None;
    }
    Some(loader)
}
