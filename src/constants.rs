// World constants
pub const CHUNK_SIZE: i32 = 16;
pub const CHUNK_HEIGHT: i32 = 128;
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_HEIGHT) as usize;
pub const BASE_TERRAIN_HEIGHT: i32 = 28;

// Streaming constants
pub const STREAM_RADIUS: i32 = 4;
pub const STREAM_HYSTERESIS: i32 = 1;
pub const INNER_RING_RADIUS: i32 = 1;
pub const WORKER_RESULTS_PER_TICK: usize = 16;

// Player / session constants
pub const INVENTORY_SLOTS: usize = 36;
pub const HOTBAR_SLOTS: usize = 9;
pub const AUTOSAVE_INTERVAL_SECS: f32 = 30.0;
pub const SPAWN_POSITION: [f32; 3] = [8.0, 40.0, 20.0];
