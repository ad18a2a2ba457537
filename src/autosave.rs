use crate::config::AutosaveConfig;
use crate::save::PlayerSnapshot;
use crate::world::World;

/// Periodic save timer driven by the simulation tick.
pub struct Autosave {
    interval: f32,
    elapsed: f32,
    enabled: bool,
}

impl Autosave {
    pub fn new(interval_secs: f32) -> Self {
        Autosave {
            interval: interval_secs.max(0.0),
            elapsed: 0.0,
            enabled: true,
        }
    }

    pub fn from_config(config: &AutosaveConfig) -> Self {
        Autosave {
            enabled: config.enabled,
            ..Self::new(config.interval_secs)
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advances the timer and saves once the interval has passed. A failed save
    /// keeps the timer expired so the next tick tries again. Returns true when a
    /// save succeeded.
    pub fn tick(&mut self, dt: f32, world: &mut World, player: &PlayerSnapshot) -> bool {
        if !self.enabled {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return false;
        }

        match world.save_world(player) {
            Ok(chunks) => {
                tracing::debug!("autosave wrote {} chunks", chunks);
                self.elapsed = 0.0;
                true
            }
            Err(e) => {
                tracing::warn!("autosave failed, retrying next tick: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::BlockType;
    use crate::save::META_KEY;
    use crate::storage::MemoryStorage;
    use glam::Vec3;

    #[test]
    fn saves_after_interval_and_retries_on_failure() {
        let storage = MemoryStorage::new();
        let mut world = World::new(11, storage.clone());
        world.update(Vec3::ZERO);
        assert!(world.set_block(1, 100, 1, BlockType::Planks));
        let player = PlayerSnapshot::spawn();

        let mut autosave = Autosave::new(1.0);
        assert!(!autosave.tick(0.6, &mut world, &player));
        assert!(!storage.contains(META_KEY));

        storage.set_fail_writes(true);
        assert!(!autosave.tick(0.6, &mut world, &player));
        assert!(autosave.elapsed() >= 1.0);
        assert!(world.has_unsaved_changes());

        storage.set_fail_writes(false);
        assert!(autosave.tick(0.01, &mut world, &player));
        assert_eq!(autosave.elapsed(), 0.0);
        assert!(storage.contains(META_KEY));
        assert!(!world.has_unsaved_changes());
    }

    #[test]
    fn disabled_never_saves() {
        let storage = MemoryStorage::new();
        let mut world = World::new(11, storage.clone());
        let mut autosave = Autosave::from_config(&AutosaveConfig {
            enabled: false,
            interval_secs: 0.0,
        });
        assert!(!autosave.tick(100.0, &mut world, &PlayerSnapshot::spawn()));
        assert!(storage.is_empty());
    }
}
