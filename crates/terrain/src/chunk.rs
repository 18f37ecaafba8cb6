use glam::{IVec2, Vec3};

use crate::config::BiomeParams;

/// Registry key for a chunk, derived from its world-quad origin.
///
/// The packing is bijective over all `(i32, i32)` pairs: the two origin
/// components are reinterpreted as `u32` and concatenated, so distinct
/// origins can never collide and the origin is recoverable from the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(u64);

impl ChunkId {
    /// Id for the chunk whose world-quad origin is `(x, y)`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn from_origin(x: i32, y: i32) -> Self {
        Self((u64::from(x as u32) << 32) | u64::from(y as u32))
    }

    /// Inverse of [`ChunkId::from_origin`].
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn origin(self) -> IVec2 {
        IVec2::new(((self.0 >> 32) as u32) as i32, (self.0 as u32) as i32)
    }
}

/// Lifecycle of a chunk from request to removal.
///
/// Destruction of a `Generating` chunk is deferred: it is flagged
/// `PendingDestruction` and removed when its worker's completion is drained,
/// never force-aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Registered, worker not yet running.
    Requested,
    /// A background worker is computing the heightfield.
    Generating,
    /// Vertex data merged into the registry; eligible for display.
    Resident,
    /// Destroy was requested mid-generation; drop on completion.
    PendingDestruction,
}

/// One heightfield sample in world space: `(x, y, height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
}

/// A square terrain patch, the unit of generation, residency and
/// destruction. Owned exclusively by the [`TerrainGenerator`] registry; a
/// worker only ever holds a private vertex buffer that is moved in whole
/// into `vertices` when its completion is drained.
///
/// [`TerrainGenerator`]: crate::generator::TerrainGenerator
#[derive(Debug)]
pub struct Chunk {
    pub id: ChunkId,
    /// Origin in world-quad units (chunk-grid coordinate times
    /// `chunk_size - 1`).
    pub origin: IVec2,
    /// Edge length in vertices.
    pub size: u32,
    pub state: ChunkState,
    /// Row-major heightfield, `size * size` entries once `Resident`,
    /// empty before that.
    pub vertices: Vec<Vertex>,
    /// Opaque biome inputs the request was made with, kept for the host's
    /// material pipeline.
    pub biome: BiomeParams,
}

impl Chunk {
    #[must_use]
    pub fn new(origin: IVec2, size: u32, biome: BiomeParams) -> Self {
        Self {
            id: ChunkId::from_origin(origin.x, origin.y),
            origin,
            size,
            state: ChunkState::Requested,
            vertices: Vec::new(),
            biome,
        }
    }
}

/// Number of chunks in the initial `(2R+1)²` square around the origin.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn initial_chunk_count(render_distance: i32) -> u32 {
    let side = (2 * render_distance.max(0) + 1) as u32;
    side * side
}
