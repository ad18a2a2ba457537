//! Core data structures for the world
//! Contains the block palette, the block table, biomes and chunks.

pub mod biome;
pub mod block;
pub mod chunk;
pub mod registry;

// Re-export commonly used types
pub use biome::Biome;
pub use block::{BlockId, BlockType, Tool, ToolKind, ToolTier};
pub use chunk::{Chunk, ChunkCoord};
pub use registry::{BlockInfo, BlockRegistry};
