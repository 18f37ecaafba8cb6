use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use glam::{IVec2, Vec3};

use crate::chunk::{ChunkId, Vertex};
use crate::config::NoiseParams;
use crate::error::TerrainError;
use crate::noise_field::NoiseField;

/// Vertices computed between cooperative pauses. A throttle so a burst of
/// workers does not starve the rest of the process, not a correctness
/// requirement.
const BATCH_SIZE: u32 = 30;

/// Length of the per-batch pause.
const BATCH_PAUSE: Duration = Duration::from_millis(1);

/// Everything a worker needs, passed by value. Workers share nothing with
/// the coordinating thread except the completion channel and their shutdown
/// flag.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: ChunkId,
    /// World-quad origin of the chunk.
    pub origin: IVec2,
    /// Edge length in vertices.
    pub size: u32,
    pub noise: NoiseParams,
    pub world_scale: f32,
    pub height_scale: f32,
}

/// Handoff message: ownership of the computed vertex buffer moves to the
/// coordinating thread in a single send. Exactly one is delivered per
/// worker, shut down or not.
#[derive(Debug)]
pub struct ChunkComplete {
    pub id: ChunkId,
    /// Row-major vertices; shorter than `size * size` only if the worker
    /// was asked to shut down mid-computation.
    pub vertices: Vec<Vertex>,
}

/// Owning handle to one in-flight chunk computation.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Best-effort cancellation: the worker stops producing vertices at its
    /// next batch boundary and still sends its completion message.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Reaps the worker thread. Cheap once its completion has been drained.
    /// A worker that panicked is already accounted for by the missing
    /// completion, so the join result is ignored.
    pub fn join(self) {
        let _ = self.thread.join();
    }
}

/// Starts one background worker for `job`. One worker per in-flight chunk;
/// no worker state is shared across chunks.
///
/// # Errors
///
/// Returns [`TerrainError::WorkerSpawn`] if the OS cannot start the thread.
pub fn spawn(job: GenerationJob, completions: Sender<ChunkComplete>) -> Result<WorkerHandle, TerrainError> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let thread = thread::Builder::new()
        .name(format!("chunk-worker-{}-{}", job.origin.x, job.origin.y))
        .spawn(move || run(&job, &flag, &completions))?;
    Ok(WorkerHandle { shutdown, thread })
}

/// Worker body: row-major sweep over the chunk footprint, heights sampled
/// at world grid coordinates so shared border rows match the neighbors
/// exactly. Accumulates into a worker-local buffer, then sends it whole.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
fn run(job: &GenerationJob, shutdown: &AtomicBool, completions: &Sender<ChunkComplete>) {
    let field = NoiseField::new(&job.noise);
    let mut vertices = Vec::with_capacity((job.size * job.size) as usize);
    let mut processed: u32 = 0;

    'sweep: for local_y in 0..job.size {
        for local_x in 0..job.size {
            let world_x = job.origin.x + local_x as i32;
            let world_y = job.origin.y + local_y as i32;
            let height = field.height(world_x, world_y) * f64::from(job.height_scale);
            vertices.push(Vertex {
                position: Vec3::new(
                    world_x as f32 * job.world_scale,
                    world_y as f32 * job.world_scale,
                    height as f32,
                ),
            });

            processed += 1;
            if processed % BATCH_SIZE == 0 {
                if shutdown.load(Ordering::Relaxed) {
                    log::debug!("chunk worker for {:?} shutting down early", job.id);
                    break 'sweep;
                }
                thread::sleep(BATCH_PAUSE);
            }
        }
    }

    // The receiver dropping just means the generator is gone; nothing left
    // to hand the buffer to.
    let _ = completions.send(ChunkComplete {
        id: job.id,
        vertices,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(origin: IVec2, size: u32) -> GenerationJob {
        GenerationJob {
            id: ChunkId::from_origin(origin.x, origin.y),
            origin,
            size,
            noise: NoiseParams::default(),
            world_scale: 100.0,
            height_scale: 100.0,
        }
    }

    #[test]
    fn worker_delivers_full_heightfield_once() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = spawn(job(IVec2::new(31, -31), 8), tx).unwrap();

        let done = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(done.id, ChunkId::from_origin(31, -31));
        assert_eq!(done.vertices.len(), 64);
        handle.join();
        assert!(rx.try_recv().is_err(), "exactly one completion per worker");
    }

    #[test]
    fn vertices_are_row_major_world_positions() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = spawn(job(IVec2::new(3, 7), 4), tx).unwrap();
        let done = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join();

        // First row: y fixed at origin.y, x increasing.
        let first = done.vertices[0].position;
        assert!((first.x - 300.0).abs() < f32::EPSILON);
        assert!((first.y - 700.0).abs() < f32::EPSILON);
        let second = done.vertices[1].position;
        assert!((second.x - 400.0).abs() < f32::EPSILON);
        assert!((second.y - 700.0).abs() < f32::EPSILON);
        // Start of second row.
        let row = done.vertices[4].position;
        assert!((row.x - 300.0).abs() < f32::EPSILON);
        assert!((row.y - 800.0).abs() < f32::EPSILON);
    }

    #[test]
    fn two_runs_are_byte_identical() {
        let (tx, rx) = crossbeam_channel::unbounded();
        spawn(job(IVec2::new(-31, 0), 8), tx.clone()).unwrap().join();
        spawn(job(IVec2::new(-31, 0), 8), tx).unwrap().join();

        let a = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let b = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(a.vertices, b.vertices);
    }

    #[test]
    fn border_rows_match_across_neighbors() {
        // Chunks at quad origins 0 and 31 with size 32 share the column
        // x = 31; seamlessness demands identical heights there.
        let (tx, rx) = crossbeam_channel::unbounded();
        spawn(job(IVec2::new(0, 0), 32), tx.clone()).unwrap().join();
        spawn(job(IVec2::new(31, 0), 32), tx).unwrap().join();

        let mut left = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let mut right = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        if left.id != ChunkId::from_origin(0, 0) {
            std::mem::swap(&mut left, &mut right);
        }

        for row in 0..32 {
            let border = left.vertices[row * 32 + 31].position;
            let shared = right.vertices[row * 32].position;
            assert_eq!(border, shared, "seam mismatch at row {row}");
        }
    }

    #[test]
    fn shutdown_stops_early_but_still_completes() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = spawn(job(IVec2::ZERO, 64), tx).unwrap();
        handle.request_shutdown();

        let done = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(
            done.vertices.len() < 64 * 64,
            "worker should stop producing vertices after shutdown"
        );
        handle.join();
    }
}
