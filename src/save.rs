//! Save format.
//!
//! Every blob is framed as `magic | version (u32 LE) | length (u64 LE) | bincode`.
//! The world is stored as one `meta` blob (seed, player, index of persisted
//! chunks) plus one blob per chunk, so a single chunk can be restored without
//! touching the rest of the save.

use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::core::block::{BlockId, BlockType};
use crate::core::chunk::{Chunk, ChunkCoord};
use crate::error::PersistenceError;
use crate::inventory::{Inventory, ItemStack};

const MAGIC_META: &[u8; 4] = b"CWMT";
const MAGIC_CHUNK: &[u8; 4] = b"CWCK";
pub const VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 8;

pub const META_KEY: &str = "meta";

pub fn chunk_key(coord: ChunkCoord) -> String {
    format!("chunk.{}.{}", coord.cx, coord.cz)
}

/// Inverse of `chunk_key`; `None` for any other key.
pub fn parse_chunk_key(key: &str) -> Option<ChunkCoord> {
    let rest = key.strip_prefix("chunk.")?;
    let (cx, cz) = rest.split_once('.')?;
    Some(ChunkCoord::new(cx.parse().ok()?, cz.parse().ok()?))
}

/// Player state handed to `World::save_world` and returned by `load_world`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub inventory: Vec<ItemStack>,
}

impl PlayerSnapshot {
    pub fn new(position: Vec3, inventory: &Inventory) -> Self {
        PlayerSnapshot {
            position,
            inventory: inventory.slots().to_vec(),
        }
    }

    /// Fresh player at the default spawn with an empty inventory.
    pub fn spawn() -> Self {
        PlayerSnapshot {
            position: Vec3::from_array(SPAWN_POSITION),
            inventory: vec![ItemStack::EMPTY; INVENTORY_SLOTS],
        }
    }
}

/// A persisted chunk, decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedChunk {
    pub coord: ChunkCoord,
    /// Y-major block array, `CHUNK_VOLUME` entries.
    pub blocks: Vec<BlockType>,
}

impl SavedChunk {
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        if !(0..CHUNK_SIZE).contains(&x)
            || !(0..CHUNK_HEIGHT).contains(&y)
            || !(0..CHUNK_SIZE).contains(&z)
        {
            return BlockType::Air;
        }
        self.blocks[((y * CHUNK_SIZE + z) * CHUNK_SIZE + x) as usize]
    }
}

/// The durable snapshot of player and world-edit state.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveRecord {
    pub version: u32,
    pub seed: u32,
    pub saved_at: Option<DateTime<Utc>>,
    pub player: PlayerSnapshot,
    pub chunks: Vec<SavedChunk>,
}

#[derive(Serialize, Deserialize)]
struct SavedSlot {
    id: BlockId,
    count: u32,
}

#[derive(Serialize, Deserialize)]
struct MetaPayload {
    seed: u32,
    saved_at_ms: i64,
    player_position: [f32; 3],
    inventory: Vec<SavedSlot>,
    chunk_index: Vec<ChunkCoord>,
}

#[derive(Serialize, Deserialize)]
struct ChunkPayload {
    /// Seed of the world that wrote the blob.
    seed: u32,
    coord: ChunkCoord,
    /// Run-length encoded block ids: (id, run length).
    runs: Vec<(BlockId, u32)>,
}

/// Header fields of the `meta` blob.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldMeta {
    pub seed: u32,
    pub saved_at: Option<DateTime<Utc>>,
    pub player: PlayerSnapshot,
    pub chunk_index: Vec<ChunkCoord>,
}

fn frame(magic: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(magic);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn unframe<'a>(magic: &[u8; 4], bytes: &'a [u8]) -> Result<&'a [u8], PersistenceError> {
    if bytes.len() < HEADER_LEN {
        return Err(PersistenceError::Corrupt("blob shorter than header".to_string()));
    }
    if &bytes[0..4] != magic {
        return Err(PersistenceError::BadMagic);
    }

    let mut version_bytes = [0u8; 4];
    version_bytes.copy_from_slice(&bytes[4..8]);
    let version = u32::from_le_bytes(version_bytes);
    if version != VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }

    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&bytes[8..16]);
    let size = u64::from_le_bytes(size_bytes) as usize;

    let payload = &bytes[HEADER_LEN..];
    if payload.len() != size {
        return Err(PersistenceError::Corrupt(format!(
            "payload is {} bytes, header says {}",
            payload.len(),
            size
        )));
    }
    Ok(payload)
}

fn block_from_id(id: BlockId) -> Result<BlockType, PersistenceError> {
    BlockType::from_id(id)
        .ok_or_else(|| PersistenceError::Corrupt(format!("unknown block id {}", id)))
}

pub fn encode_meta(
    seed: u32,
    player: &PlayerSnapshot,
    chunk_index: &[ChunkCoord],
) -> Result<Vec<u8>, PersistenceError> {
    let payload = MetaPayload {
        seed,
        saved_at_ms: Utc::now().timestamp_millis(),
        player_position: player.position.to_array(),
        inventory: player
            .inventory
            .iter()
            .map(|stack| SavedSlot {
                id: stack.item.id(),
                count: stack.count,
            })
            .collect(),
        chunk_index: chunk_index.to_vec(),
    };
    Ok(frame(MAGIC_META, &bincode::serialize(&payload)?))
}

pub fn decode_meta(bytes: &[u8]) -> Result<WorldMeta, PersistenceError> {
    let payload: MetaPayload = bincode::deserialize(unframe(MAGIC_META, bytes)?)?;
    let inventory = payload
        .inventory
        .iter()
        .map(|slot| {
            let item = block_from_id(slot.id)?;
            Ok(ItemStack::new(item, slot.count))
        })
        .collect::<Result<Vec<_>, PersistenceError>>()?;

    Ok(WorldMeta {
        seed: payload.seed,
        saved_at: DateTime::from_timestamp_millis(payload.saved_at_ms),
        player: PlayerSnapshot {
            position: Vec3::from_array(payload.player_position),
            inventory,
        },
        chunk_index: payload.chunk_index,
    })
}

pub fn encode_chunk(seed: u32, chunk: &Chunk) -> Result<Vec<u8>, PersistenceError> {
    let mut runs: Vec<(BlockId, u32)> = Vec::new();
    for block in chunk.blocks() {
        let id = block.id();
        match runs.last_mut() {
            Some((last, len)) if *last == id => *len += 1,
            _ => runs.push((id, 1)),
        }
    }
    let payload = ChunkPayload {
        seed,
        coord: chunk.coord(),
        runs,
    };
    Ok(frame(MAGIC_CHUNK, &bincode::serialize(&payload)?))
}

/// Decodes a chunk blob written by the world with `seed`. Blobs left behind by
/// another world are rejected.
pub fn decode_chunk(
    expected: ChunkCoord,
    seed: u32,
    bytes: &[u8],
) -> Result<SavedChunk, PersistenceError> {
    let payload: ChunkPayload = bincode::deserialize(unframe(MAGIC_CHUNK, bytes)?)?;
    if payload.seed != seed {
        return Err(PersistenceError::SeedMismatch {
            expected: seed,
            found: payload.seed,
        });
    }
    if payload.coord != expected {
        return Err(PersistenceError::Corrupt(format!(
            "blob for {:?} holds chunk {:?}",
            expected, payload.coord
        )));
    }

    let mut blocks = Vec::with_capacity(CHUNK_VOLUME);
    for (id, len) in payload.runs {
        let block = block_from_id(id)?;
        if blocks.len() + len as usize > CHUNK_VOLUME {
            return Err(PersistenceError::Corrupt(format!(
                "chunk {:?} overflows its volume",
                expected
            )));
        }
        blocks.extend(std::iter::repeat_n(block, len as usize));
    }
    if blocks.len() != CHUNK_VOLUME {
        return Err(PersistenceError::Corrupt(format!(
            "chunk {:?} has {} blocks",
            expected,
            blocks.len()
        )));
    }
    Ok(SavedChunk {
        coord: expected,
        blocks,
    })
}
