#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Biome {
    #[default]
    Plains,
    Forest,
    Hills,
}

impl Biome {
    /// Picks a biome from the low-frequency selector noise in [-1, 1].
    pub fn from_noise(value: f32) -> Biome {
        if value < -0.25 {
            Biome::Plains
        } else if value < 0.35 {
            Biome::Forest
        } else {
            Biome::Hills
        }
    }

    /// Height amplitude for a selector value. Continuous across biome borders so
    /// neighbouring columns never form cliffs where the biome switches.
    pub fn height_amplitude(value: f32) -> f32 {
        let t = ((value + 1.0) * 0.5).clamp(0.0, 1.0);
        4.0 + t * t * 14.0
    }

    /// Percent chance that a tree grid cell holds a tree.
    pub fn tree_chance(&self) -> u32 {
        match self {
            Biome::Plains => 8,
            Biome::Forest => 70,
            Biome::Hills => 25,
        }
    }
}
