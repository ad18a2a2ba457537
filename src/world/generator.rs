//! Deterministic terrain generation using FastNoiseLite
//!
//! Every output is a pure function of the seed and the coordinates, so a
//! generator can be rebuilt on any thread and produce the same world.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

use crate::constants::*;
use crate::core::biome::Biome;
use crate::core::block::BlockType;
use crate::core::chunk::{Chunk, ChunkCoord};

const TREE_CELL: i32 = 5;
const LEAF_RADIUS: i32 = 2;
const MIN_SURFACE: i32 = 4;
const MAX_SURFACE: i32 = CHUNK_HEIGHT - 16;

/// One generated block column before surface features are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    /// Number of terrain blocks; the top terrain block sits at `height - 1`.
    pub height: i32,
    pub biome: Biome,
    pub blocks: [BlockType; CHUNK_HEIGHT as usize],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Tree {
    x: i32,
    z: i32,
    base_y: i32,
    trunk: i32,
}

pub struct TerrainGenerator {
    noise_terrain: FastNoiseLite,
    noise_detail: FastNoiseLite,
    noise_biome: FastNoiseLite,
    noise_coal: FastNoiseLite,
    noise_iron: FastNoiseLite,
    seed: u32,
}

impl TerrainGenerator {
    pub fn new(seed: u32) -> Self {
        TerrainGenerator {
            noise_terrain: Self::create_fbm_noise(seed, 0.008),
            noise_detail: Self::create_fbm_noise(seed.wrapping_add(1), 0.04),
            noise_biome: Self::create_noise(seed.wrapping_add(2), 0.0025),
            noise_coal: Self::create_noise(seed.wrapping_add(3), 0.09),
            noise_iron: Self::create_noise(seed.wrapping_add(4), 0.11),
            seed,
        }
    }

    fn create_noise(seed: u32, frequency: f32) -> FastNoiseLite {
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(frequency));
        noise
    }

    fn create_fbm_noise(seed: u32, frequency: f32) -> FastNoiseLite {
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_fractal_type(Some(FractalType::FBm));
        noise.set_fractal_octaves(Some(4));
        noise.set_fractal_lacunarity(Some(2.0));
        noise.set_fractal_gain(Some(0.5));
        noise.set_frequency(Some(frequency));
        noise
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn biome_at(&self, x: i32, z: i32) -> Biome {
        Biome::from_noise(self.noise_biome.get_noise_2d(x as f32, z as f32))
    }

    /// Number of terrain blocks in the column at `(x, z)`, floored to whole blocks.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let fx = x as f32;
        let fz = z as f32;
        let selector = self.noise_biome.get_noise_2d(fx, fz);
        let terrain = self.noise_terrain.get_noise_2d(fx, fz);
        let detail = self.noise_detail.get_noise_2d(fx, fz);

        let height = BASE_TERRAIN_HEIGHT as f32
            + terrain * Biome::height_amplitude(selector)
            + detail * 2.0;
        (height.floor() as i32).clamp(MIN_SURFACE, MAX_SURFACE)
    }

    /// Generates the terrain column at world `(x, z)`, without trees.
    pub fn column_at(&self, x: i32, z: i32) -> Column {
        let height = self.surface_height(x, z);
        let biome = self.biome_at(x, z);
        let dirt_depth = 3 + (self.position_hash(x, z) % 2) as i32;

        let mut blocks = [BlockType::Air; CHUNK_HEIGHT as usize];
        for y in 0..height {
            blocks[y as usize] = self.layer_block(x, y, z, height, dirt_depth);
        }
        debug_assert!(height >= MIN_SURFACE && height <= MAX_SURFACE);

        Column {
            height,
            biome,
            blocks,
        }
    }

    fn layer_block(&self, x: i32, y: i32, z: i32, height: i32, dirt_depth: i32) -> BlockType {
        if y == 0 {
            return BlockType::Bedrock;
        }
        if y <= 2 {
            let bedrock_chance = (3 - y) as u32 * 30;
            if self.position_hash_3d(x, y, z) % 100 < bedrock_chance {
                return BlockType::Bedrock;
            }
        }

        let depth_from_surface = height - y;
        if depth_from_surface == 1 {
            BlockType::Grass
        } else if depth_from_surface <= dirt_depth {
            BlockType::Dirt
        } else {
            self.ore_at(x, y, z).unwrap_or(BlockType::Stone)
        }
    }

    fn ore_at(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
        let (fx, fy, fz) = (x as f32, y as f32, z as f32);
        if y < 32 && self.noise_iron.get_noise_3d(fx, fy, fz) > 0.8 {
            return Some(BlockType::IronOre);
        }
        if y < 64 && self.noise_coal.get_noise_3d(fx, fy, fz) > 0.72 {
            return Some(BlockType::CoalOre);
        }
        None
    }

    /// Generates a complete chunk: terrain columns, then trees. Chunks past
    /// the `i32` block range stay empty.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::new(coord);
        if !coord.is_addressable() {
            return chunk;
        }
        let base_x = coord.base_x();
        let base_z = coord.base_z();

        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let column = self.column_at(base_x + lx, base_z + lz);
                for y in 0..column.height {
                    chunk.fill(lx, y, lz, column.blocks[y as usize]);
                }
            }
        }

        self.place_trees(&mut chunk, coord);
        chunk
    }

    /// Trees are rooted on a coarse grid so that every chunk sees the same set of
    /// trees near its borders. Leaves go down first and trunks last, which makes
    /// the result independent of the order trees are visited in.
    fn place_trees(&self, chunk: &mut Chunk, coord: ChunkCoord) {
        let min_x = coord.base_x().saturating_sub(LEAF_RADIUS);
        let min_z = coord.base_z().saturating_sub(LEAF_RADIUS);
        let max_x = (coord.base_x() + (CHUNK_SIZE - 1)).saturating_add(LEAF_RADIUS);
        let max_z = (coord.base_z() + (CHUNK_SIZE - 1)).saturating_add(LEAF_RADIUS);

        let mut trees = Vec::new();
        for cell_x in min_x.div_euclid(TREE_CELL)..=max_x.div_euclid(TREE_CELL) {
            for cell_z in min_z.div_euclid(TREE_CELL)..=max_z.div_euclid(TREE_CELL) {
                if let Some(tree) = self.tree_in_cell(cell_x, cell_z) {
                    if tree.x >= min_x && tree.x <= max_x && tree.z >= min_z && tree.z <= max_z {
                        trees.push(tree);
                    }
                }
            }
        }

        for tree in &trees {
            self.place_leaves(chunk, coord, tree);
        }
        for tree in &trees {
            for dy in 0..tree.trunk {
                chunk.fill(
                    tree.x - coord.base_x(),
                    tree.base_y + dy,
                    tree.z - coord.base_z(),
                    BlockType::Wood,
                );
            }
        }
    }

    fn tree_in_cell(&self, cell_x: i32, cell_z: i32) -> Option<Tree> {
        let hash = self.position_hash(cell_x.wrapping_mul(7919), cell_z.wrapping_mul(104729));
        // Cells on the edge of the i32 range can root a tree past it.
        let x = cell_x
            .checked_mul(TREE_CELL)?
            .checked_add(1 + (hash % 3) as i32)?;
        let z = cell_z
            .checked_mul(TREE_CELL)?
            .checked_add(1 + ((hash >> 8) % 3) as i32)?;

        let biome = self.biome_at(x, z);
        if (hash >> 16) % 100 >= biome.tree_chance() {
            return None;
        }

        let base_y = self.surface_height(x, z);
        let trunk = 4 + ((hash >> 24) % 2) as i32;
        if base_y + trunk + 2 >= CHUNK_HEIGHT {
            return None;
        }
        Some(Tree {
            x,
            z,
            base_y,
            trunk,
        })
    }

    fn place_leaves(&self, chunk: &mut Chunk, coord: ChunkCoord, tree: &Tree) {
        let top = tree.base_y + tree.trunk;
        for y in (top - 2)..=top {
            let radius = if y == top { 1 } else { LEAF_RADIUS };
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    let (Some(wx), Some(wz)) = (tree.x.checked_add(dx), tree.z.checked_add(dz))
                    else {
                        continue;
                    };
                    // Trim the corners on the wide layers.
                    if radius == LEAF_RADIUS
                        && dx.abs() == radius
                        && dz.abs() == radius
                        && self.position_hash_3d(wx, y, wz) % 2 == 0
                    {
                        continue;
                    }
                    let lx = wx - coord.base_x();
                    let lz = wz - coord.base_z();
                    if chunk.get_block(lx, y, lz).is_air() {
                        chunk.fill(lx, y, lz, BlockType::Leaves);
                    }
                }
            }
        }
    }

    /// A standing position near the default spawn that is clear of terrain.
    pub fn spawn_position(&self) -> [f32; 3] {
        let [x, y, z] = SPAWN_POSITION;
        let surface = self.surface_height(x.floor() as i32, z.floor() as i32);
        [x, y.max(surface as f32 + 1.0), z]
    }

    fn position_hash(&self, x: i32, z: i32) -> u32 {
        let mut hash = self.seed;
        hash = hash.wrapping_add(x as u32).wrapping_mul(73856093);
        hash = hash.wrapping_add(z as u32).wrapping_mul(19349663);
        hash ^ (hash >> 16)
    }

    fn position_hash_3d(&self, x: i32, y: i32, z: i32) -> u32 {
        let mut hash = self.seed;
        hash = hash.wrapping_add(x as u32).wrapping_mul(73856093);
        hash = hash.wrapping_add(y as u32).wrapping_mul(19349663);
        hash = hash.wrapping_add(z as u32).wrapping_mul(83492791);
        hash ^ (hash >> 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_layers() {
        let generator = TerrainGenerator::new(42);
        for (x, z) in [(0, 0), (-37, 91), (1000, -1000)] {
            let column = generator.column_at(x, z);
            let h = column.height;
            assert_eq!(column.blocks[0], BlockType::Bedrock);
            assert_eq!(column.blocks[(h - 1) as usize], BlockType::Grass);
            assert_eq!(column.blocks[(h - 2) as usize], BlockType::Dirt);
            assert!(column.blocks[h as usize..].iter().all(|b| b.is_air()));
            for y in 3..(h - 5) {
                assert!(matches!(
                    column.blocks[y as usize],
                    BlockType::Stone | BlockType::CoalOre | BlockType::IronOre
                ));
            }
        }
    }

    #[test]
    fn chunk_matches_columns_below_surface() {
        let generator = TerrainGenerator::new(7);
        let coord = ChunkCoord::new(-2, 3);
        let chunk = generator.generate_chunk(coord);
        assert!(!chunk.is_modified());
        for lx in [0, 7, 15] {
            for lz in [0, 9, 15] {
                let column = generator.column_at(coord.base_x() + lx, coord.base_z() + lz);
                for y in 0..column.height {
                    let block = chunk.get_block(lx, y, lz);
                    // A trunk may stand on the surface; terrain itself never changes.
                    assert_eq!(block, column.blocks[y as usize]);
                }
            }
        }
    }

    #[test]
    fn trees_are_repeatable_and_rooted_on_grass() {
        let generator = TerrainGenerator::new(1234);
        let first = generator.generate_chunk(ChunkCoord::new(1, 0));
        let again = generator.generate_chunk(ChunkCoord::new(1, 0));
        assert_eq!(first.blocks(), again.blocks());

        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                for y in 1..CHUNK_HEIGHT {
                    let below = first.get_block(lx, y - 1, lz);
                    if first.get_block(lx, y, lz) == BlockType::Wood && below != BlockType::Wood {
                        assert_eq!(below, BlockType::Grass);
                    }
                }
            }
        }
    }

    #[test]
    fn canopy_crossing_a_border_matches_in_both_chunks() {
        let generator = TerrainGenerator::new(99);
        let mut checked = 0;
        // Cells at x = 80k + 15..19 root trees just east of a chunk border.
        for k in 0..10 {
            for cell_z in 0..50 {
                let Some(tree) = generator.tree_in_cell(3 + 16 * k, cell_z) else {
                    continue;
                };
                if tree.x.rem_euclid(CHUNK_SIZE) > 1 {
                    continue;
                }
                let west =
                    ChunkCoord::from_block(tree.x - 1 - tree.x.rem_euclid(CHUNK_SIZE), tree.z);
                let leaf_y = tree.base_y + tree.trunk - 1;
                let border_x = west.base_x() + CHUNK_SIZE - 1;
                if generator.surface_height(border_x, tree.z) > leaf_y {
                    continue;
                }
                let chunk = generator.generate_chunk(west);
                let lz = tree.z - west.base_z();
                assert_eq!(chunk.get_block(CHUNK_SIZE - 1, leaf_y, lz), BlockType::Leaves);
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn chunks_at_the_i32_edge_generate() {
        let generator = TerrainGenerator::new(11);
        let edges = [
            ChunkCoord::new(ChunkCoord::MAX_AXIS, 0),
            ChunkCoord::new(ChunkCoord::MIN_AXIS, 0),
            ChunkCoord::new(ChunkCoord::MAX_AXIS, ChunkCoord::MIN_AXIS),
            ChunkCoord::new(ChunkCoord::MIN_AXIS, ChunkCoord::MAX_AXIS),
        ];
        for coord in edges {
            let chunk = generator.generate_chunk(coord);
            assert_eq!(chunk.get_block(0, 0, 0), BlockType::Bedrock);
            assert_eq!(chunk.get_block(CHUNK_SIZE - 1, 0, CHUNK_SIZE - 1), BlockType::Bedrock);
            assert_eq!(
                chunk.blocks(),
                generator.generate_chunk(coord).blocks(),
                "{:?}",
                coord
            );
        }

        let outside = generator.generate_chunk(ChunkCoord::new(i32::MAX, i32::MIN));
        assert!(outside.blocks().iter().all(|b| b.is_air()));
    }

    #[test]
    fn different_seeds_differ() {
        let a = TerrainGenerator::new(1);
        let b = TerrainGenerator::new(2);
        let differs =
            (0..64).any(|i| a.surface_height(i * 13, i * 7) != b.surface_height(i * 13, i * 7));
        assert!(differs);
    }

    #[test]
    fn spawn_is_above_ground() {
        let generator = TerrainGenerator::new(42);
        let [x, y, z] = generator.spawn_position();
        assert!(y >= generator.surface_height(x as i32, z as i32) as f32);
    }
}
