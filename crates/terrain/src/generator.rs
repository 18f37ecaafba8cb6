use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender, unbounded};
use glam::IVec2;

use crate::chunk::{Chunk, ChunkId, ChunkState};
use crate::config::{BiomeParams, NoiseParams, TerrainConfig};
use crate::error::TerrainError;
use crate::mesh::{ChunkMesh, build_chunk_mesh};
use crate::worker::{self, ChunkComplete, GenerationJob, WorkerHandle};

/// Owns the authoritative chunk registry and the in-flight workers.
///
/// The registry is mutated only from the thread that owns the generator
/// (the coordinating thread), so it needs no lock; workers hand their
/// results back over a channel that [`TerrainGenerator::drain_completions`]
/// consumes once per tick. Completions may arrive in any order relative to
/// issuance.
pub struct TerrainGenerator {
    registry: HashMap<ChunkId, Chunk>,
    workers: HashMap<ChunkId, WorkerHandle>,
    completion_tx: Sender<ChunkComplete>,
    completion_rx: Receiver<ChunkComplete>,
    meshes: HashMap<ChunkId, ChunkMesh>,
    world_scale: f32,
    height_scale: f32,
}

impl TerrainGenerator {
    #[must_use]
    pub fn new(config: &TerrainConfig) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self {
            registry: HashMap::new(),
            workers: HashMap::new(),
            completion_tx,
            completion_rx,
            meshes: HashMap::new(),
            world_scale: config.world_scale,
            height_scale: config.height_scale,
        }
    }

    /// True iff the id is registered, in any state from `Requested` on.
    /// Never reflects partially constructed chunks: registration happens
    /// before the worker starts, removal happens only on the owning thread.
    #[must_use]
    pub fn has_chunk(&self, id: ChunkId) -> bool {
        self.registry.contains_key(&id)
    }

    /// Registers a chunk at world-quad origin `(x, y)` and dispatches a
    /// background worker for it. A request for an already-registered id is
    /// a silent no-op, so callers may re-request freely.
    ///
    /// # Errors
    ///
    /// [`TerrainError::InvalidCoordinate`] if the chunk's far edge
    /// (`origin + size - 1`) leaves i32 range — rejected with no side
    /// effects — and [`TerrainError::WorkerSpawn`] if the worker thread
    /// cannot be started, in which case the registration is rolled back.
    #[allow(clippy::cast_possible_wrap)]
    pub fn generate_chunk(
        &mut self,
        x: i32,
        y: i32,
        size: u32,
        noise: NoiseParams,
        biome: BiomeParams,
    ) -> Result<(), TerrainError> {
        let reach = (size.saturating_sub(1)) as i32;
        if x.checked_add(reach).is_none() || y.checked_add(reach).is_none() {
            return Err(TerrainError::InvalidCoordinate { x, y });
        }

        let id = ChunkId::from_origin(x, y);
        if self.registry.contains_key(&id) {
            log::debug!("duplicate generation request for chunk at ({x}, {y}) ignored");
            return Ok(());
        }

        let origin = IVec2::new(x, y);
        self.registry.insert(id, Chunk::new(origin, size, biome));

        let job = GenerationJob {
            id,
            origin,
            size,
            noise,
            world_scale: self.world_scale,
            height_scale: self.height_scale,
        };
        match worker::spawn(job, self.completion_tx.clone()) {
            Ok(handle) => {
                self.workers.insert(id, handle);
                if let Some(chunk) = self.registry.get_mut(&id) {
                    chunk.state = ChunkState::Generating;
                }
                log::trace!("chunk ({x}, {y}) generating");
                Ok(())
            }
            Err(err) => {
                self.registry.remove(&id);
                Err(err)
            }
        }
    }

    /// Removes a chunk and its geometry. A chunk still `Generating` is
    /// flagged `PendingDestruction` instead and its worker is asked to
    /// stop; the entry disappears when the worker's completion is drained.
    /// Unknown ids are ignored.
    pub fn destroy_chunk(&mut self, id: ChunkId) {
        let Some(state) = self.registry.get(&id).map(|chunk| chunk.state) else {
            log::trace!("destroy request for unknown chunk {id:?} ignored");
            return;
        };
        match state {
            ChunkState::Generating => {
                if let Some(chunk) = self.registry.get_mut(&id) {
                    chunk.state = ChunkState::PendingDestruction;
                }
                if let Some(handle) = self.workers.get(&id) {
                    handle.request_shutdown();
                }
                log::debug!("chunk {id:?} destruction deferred until its worker completes");
            }
            ChunkState::PendingDestruction => {}
            ChunkState::Requested | ChunkState::Resident => {
                self.registry.remove(&id);
                self.meshes.remove(&id);
            }
        }
    }

    /// Consumes every queued worker completion and returns the completed
    /// ids, each exactly once, in arrival order.
    ///
    /// Chunks flagged `PendingDestruction` are dropped here instead of
    /// becoming `Resident`; their ids are still reported so the manager's
    /// counters stay correct. Everything else receives its vertex buffer
    /// and becomes `Resident`.
    pub fn drain_completions(&mut self) -> Vec<ChunkId> {
        let mut completed = Vec::new();
        while let Ok(message) = self.completion_rx.try_recv() {
            let ChunkComplete { id, vertices } = message;
            if let Some(handle) = self.workers.remove(&id) {
                handle.join();
            }
            let drop_on_completion = match self.registry.get_mut(&id) {
                Some(chunk) if chunk.state == ChunkState::PendingDestruction => true,
                Some(chunk) => {
                    chunk.vertices = vertices;
                    chunk.state = ChunkState::Resident;
                    false
                }
                // Registry entry vanished through destroy; nothing to merge.
                None => false,
            };
            if drop_on_completion {
                self.registry.remove(&id);
                self.meshes.remove(&id);
                log::debug!("chunk {id:?} dropped on completion");
            }
            completed.push(id);
        }
        completed
    }

    /// Builds (or returns the cached) renderable geometry for a `Resident`
    /// chunk. `None` for unknown chunks and chunks that are not resident
    /// yet.
    pub fn display_chunk(&mut self, id: ChunkId) -> Option<&ChunkMesh> {
        let chunk = self.registry.get(&id)?;
        if chunk.state != ChunkState::Resident {
            return None;
        }
        if !self.meshes.contains_key(&id) {
            let mesh = build_chunk_mesh(chunk.size, &chunk.vertices);
            self.meshes.insert(id, mesh);
        }
        self.meshes.get(&id)
    }

    /// Cached geometry for a chunk, if [`TerrainGenerator::display_chunk`]
    /// has produced it.
    #[must_use]
    pub fn mesh(&self, id: ChunkId) -> Option<&ChunkMesh> {
        self.meshes.get(&id)
    }

    #[must_use]
    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        self.registry.get(&id)
    }

    #[must_use]
    pub fn chunk_state(&self, id: ChunkId) -> Option<ChunkState> {
        self.registry.get(&id).map(|chunk| chunk.state)
    }

    /// Ids and world-quad origins of every registered chunk.
    #[must_use]
    pub fn chunks(&self) -> impl Iterator<Item = (ChunkId, IVec2)> + '_ {
        self.registry.iter().map(|(&id, chunk)| (id, chunk.origin))
    }

    /// Registered chunks in any state.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.registry.len()
    }

    /// Chunks whose data is fully merged and displayable.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.registry
            .values()
            .filter(|chunk| chunk.state == ChunkState::Resident)
            .count()
    }

    /// Workers still computing.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for TerrainGenerator {
    /// Ask every live worker to stop and reap it, so dropping the generator
    /// never leaks computation threads.
    fn drop(&mut self) {
        for handle in self.workers.values() {
            handle.request_shutdown();
        }
        for (_, handle) in self.workers.drain() {
            handle.join();
        }
    }
}
