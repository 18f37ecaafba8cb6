use std::collections::VecDeque;
use std::time::{Duration, Instant};

use glam::{IVec2, Vec3};

use crate::chunk::{ChunkId, initial_chunk_count};
use crate::config::TerrainConfig;
use crate::error::TerrainError;
use crate::generator::TerrainGenerator;

/// Outbound signals for the host's UI and rendering layers. The core never
/// depends on who consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainEvent {
    /// One more initial-grid chunk finished: `(completed, total)`.
    LoadingProgress { completed: u32, total: u32 },
    /// The whole initial grid is resident; steady-state streaming begins.
    InitialLoadComplete,
    /// A chunk reached `Resident` and its geometry is ready to draw.
    ChunkDisplayed(ChunkId),
    /// The last stress-test chunk completed. Reported exactly once per run.
    StressTestComplete {
        chunks: u32,
        elapsed: Duration,
        per_chunk: Duration,
    },
}

/// Drives the load/unload policy around a moving viewer.
///
/// Once per [`ChunkManager::tick`] it drains worker completions, then — in
/// steady state — converts the viewer position to a chunk-grid cell and, on
/// a cell change, enqueues generation for every in-range coordinate not yet
/// registered and destruction for every registered chunk outside range.
/// Both queues are FIFO and drained at most one generation plus one
/// destruction per throttle interval, so a burst of movement never
/// saturates the worker pool or stalls the control loop.
pub struct ChunkManager {
    generator: TerrainGenerator,
    config: TerrainConfig,
    generation_queue: VecDeque<IVec2>,
    destruction_queue: VecDeque<ChunkId>,
    /// Chunk-grid cell the viewer occupied at the last check.
    viewer_cell: Option<IVec2>,
    since_last_op: f32,
    initial_total: u32,
    initial_remaining: u32,
    initial_complete: bool,
    stress_total: u32,
    stress_remaining: u32,
    stress_started: Option<Instant>,
}

impl ChunkManager {
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] for configurations that can
    /// never produce a chunk; nothing can be streamed from a broken config,
    /// so this is fatal at startup.
    pub fn new(config: TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        Ok(Self {
            generator: TerrainGenerator::new(&config),
            config,
            generation_queue: VecDeque::new(),
            destruction_queue: VecDeque::new(),
            viewer_cell: Some(IVec2::ZERO),
            since_last_op: 0.0,
            initial_total: 0,
            initial_remaining: 0,
            initial_complete: false,
            stress_total: 0,
            stress_remaining: 0,
            stress_started: None,
        })
    }

    /// Issues the whole `(2R+1)²` startup grid centered on the origin —
    /// origin chunk first, then the rest — bypassing the throttle, and arms
    /// the progress countdown. Steady-state streaming stays disabled until
    /// every one of these chunks has completed.
    pub fn initial_load(&mut self, render_distance: i32) {
        let render_distance = render_distance.max(0);
        self.config.render_distance = render_distance;
        self.initial_total = initial_chunk_count(render_distance);
        self.initial_remaining = self.initial_total;
        self.initial_complete = false;
        log::info!(
            "initial load: {} chunks at render distance {render_distance}",
            self.initial_total
        );

        self.request_generation(IVec2::ZERO);
        for y in -render_distance..=render_distance {
            for x in -render_distance..=render_distance {
                if x == 0 && y == 0 {
                    continue;
                }
                self.request_generation(IVec2::new(x, y));
            }
        }
    }

    /// Issues `count` generation requests back-to-back, bypassing the
    /// throttle, and measures wall-clock time until the last completion.
    /// Diagnostic only; chunks are laid out in a row along +X.
    pub fn stress_test(&mut self, count: u32) {
        if count == 0 {
            return;
        }
        self.stress_total = count;
        self.stress_remaining = count;
        self.stress_started = Some(Instant::now());
        log::info!("stress test: generating {count} chunks");

        for i in 0..count {
            match i32::try_from(i) {
                Ok(x) => self.request_generation(IVec2::new(x, 0)),
                Err(_) => log::warn!("stress test index {i} out of coordinate range, skipped"),
            }
        }
    }

    /// Control-loop entry point, called once per host frame with the frame
    /// delta and the viewer's world-space position (x/y ground plane).
    /// Returns every event this tick produced, in order.
    pub fn tick(&mut self, dt: f32, viewer: Vec3) -> Vec<TerrainEvent> {
        let mut events = Vec::new();

        for id in self.generator.drain_completions() {
            self.note_completion(&mut events);
            if self.generator.display_chunk(id).is_some() {
                events.push(TerrainEvent::ChunkDisplayed(id));
            }
        }

        // Movement tracking and queue draining wait for the initial grid.
        if !self.initial_complete {
            return events;
        }

        let cell = self.viewer_chunk_cell(viewer);
        if self.viewer_cell != Some(cell) {
            self.viewer_cell = Some(cell);
            self.enqueue_missing_in_range(cell);
            self.enqueue_out_of_range(cell);
        }

        self.since_last_op += dt;
        if self.since_last_op >= self.config.throttle_interval {
            self.since_last_op = 0.0;
            if let Some(coord) = self.generation_queue.pop_front() {
                self.request_generation(coord);
            }
            if let Some(id) = self.destruction_queue.pop_front() {
                self.generator.destroy_chunk(id);
            }
        }

        events
    }

    /// Updates the initial-load countdown and stress-test counters for one
    /// drained completion.
    fn note_completion(&mut self, events: &mut Vec<TerrainEvent>) {
        if !self.initial_complete && self.initial_total > 0 {
            self.initial_remaining = self.initial_remaining.saturating_sub(1);
            events.push(TerrainEvent::LoadingProgress {
                completed: self.initial_total - self.initial_remaining,
                total: self.initial_total,
            });
            if self.initial_remaining == 0 {
                self.initial_complete = true;
                log::info!("initial chunk generation complete");
                events.push(TerrainEvent::InitialLoadComplete);
            }
        }

        if let Some(started) = self.stress_started {
            self.stress_remaining = self.stress_remaining.saturating_sub(1);
            if self.stress_remaining == 0 {
                let elapsed = started.elapsed();
                let per_chunk = elapsed / self.stress_total.max(1);
                log::info!(
                    "stress test complete: {} chunks in {elapsed:?} ({per_chunk:?} per chunk)",
                    self.stress_total
                );
                events.push(TerrainEvent::StressTestComplete {
                    chunks: self.stress_total,
                    elapsed,
                    per_chunk,
                });
                self.stress_started = None;
            }
        }
    }

    /// Floor-divides the viewer's ground position by the chunk world span.
    fn viewer_chunk_cell(&self, viewer: Vec3) -> IVec2 {
        let span = self.config.chunk_world_span();
        IVec2::new(
            (viewer.x / span).floor() as i32,
            (viewer.y / span).floor() as i32,
        )
    }

    /// Enqueues generation for every coordinate within render distance of
    /// `cell` that the registry does not already know. FIFO, no priorities.
    fn enqueue_missing_in_range(&mut self, cell: IVec2) {
        let r = self.config.render_distance;
        for y in cell.y - r..=cell.y + r {
            for x in cell.x - r..=cell.x + r {
                let coord = IVec2::new(x, y);
                match self.quad_origin(coord) {
                    Some(origin) => {
                        if !self.generator.has_chunk(ChunkId::from_origin(origin.x, origin.y)) {
                            self.generation_queue.push_back(coord);
                        }
                    }
                    None => {
                        log::warn!("chunk coordinate ({x}, {y}) out of range, not generated");
                    }
                }
            }
        }
    }

    /// Enqueues destruction for every registered chunk whose per-axis
    /// world-quad distance from the viewer's cell exceeds the render
    /// distance.
    fn enqueue_out_of_range(&mut self, cell: IVec2) {
        let span = i64::from(self.config.chunk_quad_span());
        let limit = i64::from(self.config.render_distance) * span;
        let viewer_quad_x = i64::from(cell.x) * span;
        let viewer_quad_y = i64::from(cell.y) * span;

        for (id, origin) in self.generator.chunks() {
            if (i64::from(origin.x) - viewer_quad_x).abs() > limit
                || (i64::from(origin.y) - viewer_quad_y).abs() > limit
            {
                self.destruction_queue.push_back(id);
            }
        }
    }

    /// Chunk-grid coordinate to world-quad origin, or `None` when the
    /// multiplication leaves i32 range.
    fn quad_origin(&self, coord: IVec2) -> Option<IVec2> {
        let span = self.config.chunk_quad_span();
        Some(IVec2::new(
            coord.x.checked_mul(span)?,
            coord.y.checked_mul(span)?,
        ))
    }

    /// Issues one generation request for the chunk-grid coordinate.
    /// Rejections are logged, never fatal; duplicates are no-ops inside the
    /// generator.
    fn request_generation(&mut self, coord: IVec2) {
        let Some(origin) = self.quad_origin(coord) else {
            log::warn!(
                "chunk coordinate ({}, {}) out of range, not generated",
                coord.x,
                coord.y
            );
            return;
        };
        if let Err(err) = self.generator.generate_chunk(
            origin.x,
            origin.y,
            self.config.chunk_size,
            self.config.noise.clone(),
            self.config.biome.clone(),
        ) {
            log::warn!("generation request for ({}, {}) rejected: {err}", coord.x, coord.y);
        }
    }

    /// Whether the startup grid has fully completed.
    #[must_use]
    pub fn initial_load_complete(&self) -> bool {
        self.initial_complete
    }

    /// Generation requests waiting behind the throttle.
    #[must_use]
    pub fn pending_generation(&self) -> usize {
        self.generation_queue.len()
    }

    /// Destruction requests waiting behind the throttle.
    #[must_use]
    pub fn pending_destruction(&self) -> usize {
        self.destruction_queue.len()
    }

    #[must_use]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    #[must_use]
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut TerrainGenerator {
        &mut self.generator
    }
}
