//! World generation and management modules
//! Contains terrain generation, chunk streaming, and the world facade.

pub mod generator;
pub mod loader;
pub mod store;
pub mod streaming;
pub mod terrain;

// Re-export commonly used types
pub use generator::{Column, TerrainGenerator};
pub use loader::{ChunkGenResult, ChunkLoader};
pub use store::ChunkStore;
pub use streaming::{StreamStats, StreamingController};
pub use terrain::{ChunkSource, World, WorldEvent};
