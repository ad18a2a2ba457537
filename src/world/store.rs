use rustc_hash::FxHashMap;

use crate::core::chunk::{Chunk, ChunkCoord};

/// Exclusive owner of every resident chunk.
#[derive(Default)]
pub struct ChunkStore {
    chunks: FxHashMap<ChunkCoord, Chunk>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    #[inline]
    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    #[inline]
    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Inserts a chunk keyed by its own coordinate. An existing chunk is kept,
    /// since it may hold edits the incoming copy lacks.
    pub fn insert(&mut self, chunk: Chunk) -> bool {
        let coord = chunk.coord();
        if self.chunks.contains_key(&coord) {
            return false;
        }
        self.chunks.insert(coord, chunk);
        true
    }

    pub fn remove(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        self.chunks.remove(&coord)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Resident chunks whose Chebyshev distance from `center` exceeds `max_distance`.
    pub fn coords_beyond(&self, center: ChunkCoord, max_distance: i32) -> Vec<ChunkCoord> {
        let mut far: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|coord| coord.chebyshev(center) > max_distance)
            .copied()
            .collect();
        far.sort_unstable();
        far
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::BlockType;

    #[test]
    fn insert_keeps_existing_chunk() {
        let mut store = ChunkStore::new();
        let coord = ChunkCoord::new(1, -1);
        let mut edited = Chunk::new(coord);
        edited.set_block(0, 0, 0, BlockType::Stone);
        assert!(store.insert(edited));
        assert!(!store.insert(Chunk::new(coord)));
        assert_eq!(store.get(coord).unwrap().get_block(0, 0, 0), BlockType::Stone);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn coords_beyond_uses_chebyshev_distance() {
        let mut store = ChunkStore::new();
        for (cx, cz) in [(0, 0), (2, 2), (3, 0), (-3, 1), (0, -4)] {
            store.insert(Chunk::new(ChunkCoord::new(cx, cz)));
        }
        let far = store.coords_beyond(ChunkCoord::new(0, 0), 2);
        assert_eq!(
            far,
            vec![
                ChunkCoord::new(-3, 1),
                ChunkCoord::new(0, -4),
                ChunkCoord::new(3, 0)
            ]
        );
        assert!(store.remove(ChunkCoord::new(3, 0)).is_some());
        assert!(!store.contains(ChunkCoord::new(3, 0)));
    }
}
