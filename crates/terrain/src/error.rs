use thiserror::Error;

/// Failures the streaming core can report to its host.
///
/// Duplicate generation requests are deliberately *not* represented here:
/// they are idempotent no-ops, logged at debug level.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// A generation request whose chunk footprint (`origin + chunk_size - 1`)
    /// leaves the representable 32-bit coordinate range. Rejected with no
    /// side effects.
    #[error("chunk origin ({x}, {y}) puts the chunk outside the representable coordinate range")]
    InvalidCoordinate { x: i32, y: i32 },

    /// Configuration that can never produce a chunk; fatal at startup.
    #[error("invalid terrain configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The OS refused to start a chunk worker thread.
    #[error("failed to spawn chunk worker")]
    WorkerSpawn(#[from] std::io::Error),
}
