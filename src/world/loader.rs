//! Background chunk generation
//!
//! Offloads terrain generation to worker threads so a burst of movement does
//! not stall the tick. Uses crossbeam channels for inter-thread communication;
//! the chunk store itself never leaves the tick thread.

use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use rustc_hash::FxHashSet;

use crate::core::chunk::{Chunk, ChunkCoord};
use crate::world::generator::TerrainGenerator;

const REQUEST_QUEUE: usize = 256;
const RESULT_QUEUE: usize = 64;

/// Result of background chunk generation
pub struct ChunkGenResult {
    pub coord: ChunkCoord,
    pub chunk: Chunk,
}

/// Manages background chunk generation with worker threads
pub struct ChunkLoader {
    request_tx: Sender<ChunkCoord>,
    result_rx: Receiver<ChunkGenResult>,
    pending: FxHashSet<ChunkCoord>,
    worker_count: usize,
}

impl ChunkLoader {
    pub fn new(num_workers: usize, seed: u32) -> Self {
        // Bounded channels prevent unbounded memory growth
        let (request_tx, request_rx) = bounded::<ChunkCoord>(REQUEST_QUEUE);
        let (result_tx, result_rx) = bounded::<ChunkGenResult>(RESULT_QUEUE);

        let mut spawned = 0;
        for worker_id in 0..num_workers.max(1) {
            let rx = request_rx.clone();
            let tx = result_tx.clone();

            let handle = thread::Builder::new()
                .name(format!("chunk-gen-{}", worker_id))
                .spawn(move || {
                    // Each worker owns its generator; same seed, same output.
                    let generator = TerrainGenerator::new(seed);
                    while let Ok(coord) = rx.recv() {
                        let chunk = generator.generate_chunk(coord);
                        if tx.send(ChunkGenResult { coord, chunk }).is_err() {
                            break;
                        }
                    }
                });
            match handle {
                Ok(_) => spawned += 1,
                Err(e) => tracing::warn!("failed to spawn chunk worker {}: {}", worker_id, e),
            }
        }
        tracing::debug!("chunk loader started with {} workers (seed {})", spawned, seed);

        ChunkLoader {
            request_tx,
            result_rx,
            pending: FxHashSet::default(),
            worker_count: spawned,
        }
    }

    /// Queues a chunk for generation. Returns false if the queue is full, in
    /// which case the request is not tracked and can be retried next tick.
    pub fn request_chunk(&mut self, coord: ChunkCoord) -> bool {
        if self.pending.contains(&coord) {
            return true;
        }
        if self.worker_count == 0 {
            return false;
        }
        match self.request_tx.try_send(coord) {
            Ok(()) => {
                self.pending.insert(coord);
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns up to `max_results` completed chunks without blocking.
    pub fn poll_results(&mut self, max_results: usize) -> Vec<ChunkGenResult> {
        let mut results = Vec::with_capacity(max_results.min(RESULT_QUEUE));

        for _ in 0..max_results {
            match self.result_rx.try_recv() {
                Ok(result) => {
                    self.pending.remove(&result.coord);
                    results.push(result);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        results
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}
