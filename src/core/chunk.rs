use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::core::block::BlockType;
use crate::error::{PersistenceError, WorldError};

/// Horizontal position of a chunk, in chunk units.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    /// Chunk axis values whose blocks all have an `i32` world coordinate.
    pub const MIN_AXIS: i32 = i32::MIN / CHUNK_SIZE;
    pub const MAX_AXIS: i32 = i32::MAX / CHUNK_SIZE;

    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Chunk containing the integer block column `(x, z)`.
    #[inline]
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            cx: x.div_euclid(CHUNK_SIZE),
            cz: z.div_euclid(CHUNK_SIZE),
        }
    }

    /// Chunk containing the floating point position `(x, z)`.
    #[inline]
    pub fn from_world(x: f32, z: f32) -> Self {
        Self::from_block(x.floor() as i32, z.floor() as i32)
    }

    #[inline]
    pub fn chebyshev(self, other: ChunkCoord) -> i32 {
        let d = self.cx.abs_diff(other.cx).max(self.cz.abs_diff(other.cz));
        i32::try_from(d).unwrap_or(i32::MAX)
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx) - i64::from(other.cx);
        let dz = i64::from(self.cz) - i64::from(other.cz);
        dx * dx + dz * dz
    }

    /// True when every block of the chunk has an `i32` world coordinate.
    #[inline]
    pub fn is_addressable(self) -> bool {
        let axis = Self::MIN_AXIS..=Self::MAX_AXIS;
        axis.contains(&self.cx) && axis.contains(&self.cz)
    }

    #[inline]
    pub fn base_x(self) -> i32 {
        self.cx.saturating_mul(CHUNK_SIZE)
    }

    #[inline]
    pub fn base_z(self) -> i32 {
        self.cz.saturating_mul(CHUNK_SIZE)
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Splits a world block coordinate into its chunk and the local offset inside it.
#[inline]
pub fn resolve(x: i32, z: i32) -> (ChunkCoord, i32, i32) {
    (
        ChunkCoord::from_block(x, z),
        x.rem_euclid(CHUNK_SIZE),
        z.rem_euclid(CHUNK_SIZE),
    )
}

#[inline]
fn in_bounds(x: i32, y: i32, z: i32) -> bool {
    x >= 0 && x < CHUNK_SIZE && y >= 0 && y < CHUNK_HEIGHT && z >= 0 && z < CHUNK_SIZE
}

#[inline]
fn index(x: i32, y: i32, z: i32) -> usize {
    ((y * CHUNK_SIZE + z) * CHUNK_SIZE + x) as usize
}

/// A 16x128x16 column of blocks. Owns its voxel data exclusively.
pub struct Chunk {
    coord: ChunkCoord,
    blocks: Box<[BlockType]>,
    /// Mutated since the last mesh build.
    dirty: bool,
    /// Diverges from freshly generated terrain. Sticky once set.
    modified: bool,
    /// Holds edits that have not been written to storage yet.
    unsaved: bool,
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        Chunk {
            coord,
            blocks: vec![BlockType::Air; CHUNK_VOLUME].into_boxed_slice(),
            dirty: true,
            modified: false,
            unsaved: false,
        }
    }

    /// Rebuilds a chunk from a saved, y-major block array.
    pub fn from_saved(coord: ChunkCoord, blocks: Vec<BlockType>) -> Result<Self, WorldError> {
        if blocks.len() != CHUNK_VOLUME {
            return Err(PersistenceError::Corrupt(format!(
                "chunk {:?} has {} blocks, expected {}",
                coord,
                blocks.len(),
                CHUNK_VOLUME
            ))
            .into());
        }
        Ok(Chunk {
            coord,
            blocks: blocks.into_boxed_slice(),
            dirty: true,
            modified: true,
            unsaved: false,
        })
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        if in_bounds(x, y, z) {
            self.blocks[index(x, y, z)]
        } else {
            BlockType::Air
        }
    }

    /// Writes a block, silently ignoring out-of-range coordinates.
    /// Returns whether the stored value changed.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        self.try_set_block(x, y, z, block).unwrap_or(false)
    }

    pub fn try_set_block(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        block: BlockType,
    ) -> Result<bool, WorldError> {
        if !in_bounds(x, y, z) {
            return Err(WorldError::OutOfBounds { x, y, z });
        }
        let slot = &mut self.blocks[index(x, y, z)];
        if *slot == block {
            return Ok(false);
        }
        *slot = block;
        self.dirty = true;
        self.modified = true;
        self.unsaved = true;
        Ok(true)
    }

    /// Generator-side write: does not flag the chunk as diverging from generation.
    pub(crate) fn fill(&mut self, x: i32, y: i32, z: i32, block: BlockType) {
        if in_bounds(x, y, z) {
            self.blocks[index(x, y, z)] = block;
        }
    }

    /// Block array in y-major order (`y`, then `z`, then `x`).
    pub fn blocks(&self) -> &[BlockType] {
        &self.blocks
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn mark_saved(&mut self) {
        self.unsaved = false;
    }

    /// Highest non-air y in a local column, if any.
    pub fn surface_y(&self, x: i32, z: i32) -> Option<i32> {
        (0..CHUNK_HEIGHT)
            .rev()
            .find(|&y| !self.get_block(x, y, z).is_air())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_handles_negative_coordinates() {
        assert_eq!(resolve(0, 0), (ChunkCoord::new(0, 0), 0, 0));
        assert_eq!(resolve(-1, -1), (ChunkCoord::new(-1, -1), 15, 15));
        assert_eq!(resolve(-16, 17), (ChunkCoord::new(-1, 1), 0, 1));
        assert_eq!(ChunkCoord::from_world(-0.5, 15.99), ChunkCoord::new(-1, 0));
    }

    #[test]
    fn coordinates_at_the_i32_edge() {
        let (top, _, _) = resolve(i32::MAX, i32::MIN);
        assert_eq!(top, ChunkCoord::new(ChunkCoord::MAX_AXIS, ChunkCoord::MIN_AXIS));
        assert!(top.is_addressable());
        assert_eq!(top.base_x() + (CHUNK_SIZE - 1), i32::MAX);
        assert_eq!(top.base_z(), i32::MIN);
        assert_eq!(ChunkCoord::from_world(3.0e9, -3.0e9), top);

        assert!(!ChunkCoord::new(ChunkCoord::MAX_AXIS + 1, 0).is_addressable());
        assert_eq!(ChunkCoord::new(i32::MAX, 0).base_x(), i32::MAX);
        let far = ChunkCoord::new(i32::MIN, i32::MAX);
        assert_eq!(far.chebyshev(ChunkCoord::new(i32::MAX, 0)), i32::MAX);
        assert_eq!(far.distance_sq(far), 0);
    }

    #[test]
    fn out_of_range_reads_are_air() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.fill(0, 0, 0, BlockType::Bedrock);
        assert_eq!(chunk.get_block(0, 0, 0), BlockType::Bedrock);
        assert_eq!(chunk.get_block(-1, 0, 0), BlockType::Air);
        assert_eq!(chunk.get_block(0, CHUNK_HEIGHT, 0), BlockType::Air);
        assert_eq!(chunk.get_block(0, 0, CHUNK_SIZE), BlockType::Air);
    }

    #[test]
    fn out_of_range_writes() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        assert!(!chunk.set_block(16, 0, 0, BlockType::Stone));
        assert!(matches!(
            chunk.try_set_block(0, -1, 0, BlockType::Stone),
            Err(WorldError::OutOfBounds { x: 0, y: -1, z: 0 })
        ));
        assert!(!chunk.is_modified());
    }

    #[test]
    fn unchanged_write_leaves_flags_alone() {
        let mut chunk = Chunk::new(ChunkCoord::new(2, 3));
        chunk.fill(4, 10, 4, BlockType::Stone);
        chunk.clear_dirty();

        assert!(!chunk.set_block(4, 10, 4, BlockType::Stone));
        assert!(!chunk.is_dirty());
        assert!(!chunk.is_modified());
        assert!(!chunk.has_unsaved_changes());

        assert!(chunk.set_block(4, 10, 4, BlockType::Dirt));
        assert!(chunk.is_dirty());
        assert!(chunk.is_modified());
        assert!(chunk.has_unsaved_changes());

        chunk.mark_saved();
        assert!(chunk.is_modified());
        assert!(!chunk.has_unsaved_changes());
    }

    #[test]
    fn from_saved_rejects_wrong_length() {
        assert!(Chunk::from_saved(ChunkCoord::new(0, 0), vec![BlockType::Air; 10]).is_err());
        let chunk = Chunk::from_saved(ChunkCoord::new(0, 0), vec![BlockType::Dirt; CHUNK_VOLUME])
            .unwrap();
        assert!(chunk.is_modified());
        assert!(!chunk.has_unsaved_changes());
        assert_eq!(chunk.surface_y(3, 3), Some(CHUNK_HEIGHT - 1));
    }
}
