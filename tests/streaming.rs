use std::thread;
use std::time::{Duration, Instant};

use cubeworld::{
    BlockType, ChunkCoord, MemoryStorage, StreamingConfig, TerrainGenerator, World, WorldEvent,
};
use glam::Vec3;
use std::sync::{Arc, Mutex};

fn assert_window(world: &World, position: Vec3) {
    let config = world.streaming_config().clone();
    let center = ChunkCoord::from_world(position.x, position.z);
    for cx in (center.cx - config.radius)..=(center.cx + config.radius) {
        for cz in (center.cz - config.radius)..=(center.cz + config.radius) {
            assert!(
                world.is_resident(ChunkCoord::new(cx, cz)),
                "chunk ({}, {}) missing around {:?}",
                cx,
                cz,
                center
            );
        }
    }
    for coord in world.loaded_coords() {
        assert!(
            coord.chebyshev(center) <= config.evict_distance(),
            "chunk {:?} should have been evicted around {:?}",
            coord,
            center
        );
    }
}

#[test]
fn radius_is_covered_along_a_walk() {
    let mut world = World::new(7, MemoryStorage::new());
    let path = [
        Vec3::new(0.0, 40.0, 0.0),
        Vec3::new(17.0, 40.0, 3.0),
        Vec3::new(40.0, 40.0, -20.0),
        Vec3::new(-90.0, 40.0, -20.0),
        Vec3::new(-90.5, 40.0, 300.25),
        Vec3::new(-0.01, 40.0, -0.01),
    ];
    for position in path {
        world.update(position);
        assert_window(&world, position);
        assert!(world.is_chunk_loaded(position.x, position.z));
    }
}

#[test]
fn hysteresis_keeps_chunks_just_outside_the_radius() {
    let mut world = World::new(7, MemoryStorage::new());
    world.update(Vec3::new(8.0, 40.0, 8.0));
    assert!(world.is_resident(ChunkCoord::new(-4, 0)));

    // One chunk east: (-4, 0) is now at distance 5, inside the margin.
    world.update(Vec3::new(24.0, 40.0, 8.0));
    assert!(world.is_resident(ChunkCoord::new(-4, 0)));

    // Two chunks east: distance 6, gone.
    world.update(Vec3::new(40.0, 40.0, 8.0));
    assert!(!world.is_resident(ChunkCoord::new(-4, 0)));
}

#[test]
fn edits_survive_eviction_and_return() {
    let storage = MemoryStorage::new();
    let mut world = World::new(42, storage.clone());
    let home = Vec3::new(8.0, 40.0, 8.0);

    world.update(home);
    assert!(world.is_chunk_loaded(8.0, 8.0));
    // Clear first so the edit registers even where the column is stone already.
    world.set_block(8, 39, 8, BlockType::Air);
    world.set_block(8, 39, 8, BlockType::Stone);
    assert_eq!(world.get_block(8, 39, 8), BlockType::Stone);

    world.update(Vec3::new(1008.0, 40.0, 8.0));
    assert!(!world.is_chunk_loaded(8.0, 8.0));
    assert_eq!(world.get_block(8, 39, 8), BlockType::Air);
    assert!(storage.contains("chunk.0.0"));

    world.update(home);
    assert_eq!(world.get_block(8, 39, 8), BlockType::Stone);
    let chunk = world.chunk(ChunkCoord::new(0, 0)).unwrap();
    assert!(chunk.is_modified());
    assert!(!chunk.has_unsaved_changes());
    assert!(world.stats().restored >= 1);
}

#[test]
fn untouched_chunks_are_not_written_on_eviction() {
    let storage = MemoryStorage::new();
    let mut world = World::new(42, storage.clone());
    world.update(Vec3::ZERO);
    world.update(Vec3::new(2000.0, 40.0, 0.0));
    assert!(storage.is_empty());
    assert_eq!(world.stats().flushed, 0);
}

#[test]
fn eviction_events_are_reported() {
    let mut world = World::new(5, MemoryStorage::new());
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = evicted.clone();
    world.set_observer(move |event| {
        if let WorldEvent::ChunkEvicted(coord) = event {
            sink.lock().unwrap().push(*coord);
        }
    });

    world.update(Vec3::ZERO);
    world.update(Vec3::new(16.0 * 20.0, 40.0, 0.0));
    let evicted = evicted.lock().unwrap();
    assert_eq!(evicted.len(), 81);
    assert!(evicted.contains(&ChunkCoord::new(0, 0)));
}

#[test]
fn worker_generation_converges_to_inline_terrain() {
    let config = StreamingConfig {
        max_chunks_per_tick: Some(4),
        workers: 2,
        ..StreamingConfig::default()
    };
    let mut world = World::with_config(99, config, MemoryStorage::new());
    let position = Vec3::new(-40.0, 40.0, 70.0);

    let deadline = Instant::now() + Duration::from_secs(60);
    loop {
        world.update(position);
        if world.loaded_chunk_count() == 81 || Instant::now() > deadline {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
    assert_window(&world, position);

    let generator = TerrainGenerator::new(99);
    for coord in world.loaded_coords() {
        let expected = generator.generate_chunk(coord);
        assert_eq!(world.chunk(coord).unwrap().blocks(), expected.blocks());
    }
}

#[test]
fn positions_past_the_i32_range_stream_the_edge_chunks() {
    let mut world = World::new(13, MemoryStorage::new());
    for position in [Vec3::new(3.0e9, 40.0, 0.0), Vec3::new(-3.0e9, 40.0, 0.0)] {
        world.update(position);
        assert!(world.is_chunk_loaded(position.x, position.z));
        // The window is cut off at the last addressable column of chunks.
        assert_eq!(world.loaded_chunk_count(), 45);
        assert!(world.loaded_coords().iter().all(|coord| coord.is_addressable()));
    }

    world.update(Vec3::new(8.0, 40.0, 8.0));
    assert_window(&world, Vec3::new(8.0, 40.0, 8.0));
}
