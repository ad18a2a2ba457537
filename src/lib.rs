// Core module with fundamental types
pub mod core;

// World module with generation, streaming and the world facade
pub mod world;

// Persistence
pub mod save;
pub mod storage;

// Player-side state
pub mod autosave;
pub mod inventory;

// Other modules
pub mod config;
pub mod constants;
pub mod error;

// Re-exports
pub use autosave::Autosave;
pub use config::{AutosaveConfig, StreamingConfig, WorldConfig};
pub use constants::*;
pub use self::core::{
    Biome, BlockId, BlockRegistry, BlockType, Chunk, ChunkCoord, Tool, ToolKind, ToolTier,
};
pub use error::{ConfigError, PersistenceError, WorldError};
pub use inventory::{Inventory, ItemStack};
pub use save::{PlayerSnapshot, SaveRecord, SavedChunk};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use world::{ChunkSource, StreamStats, TerrainGenerator, World, WorldEvent};
