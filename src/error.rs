use thiserror::Error;

/// Failures surfaced by the world facade.
#[derive(Debug, Error)]
pub enum WorldError {
    /// No snapshot exists; the caller should start a new game.
    #[error("no saved world found")]
    NoSaveFound,
    /// A local chunk coordinate fell outside the chunk extent.
    #[error("local block coordinate ({x}, {y}, {z}) is outside the chunk")]
    OutOfBounds { x: i32, y: i32, z: i32 },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Storage and codec failures. Always recoverable from the world's point of view.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode save data: {0}")]
    Encode(#[from] bincode::Error),
    #[error("blob has an unexpected header")]
    BadMagic,
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
    #[error("chunk was written by world seed {found}, expected {expected}")]
    SeedMismatch { expected: u32, found: u32 },
    #[error("corrupt save data: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
