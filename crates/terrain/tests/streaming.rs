//! End-to-end streaming scenarios.
//!
//! These run the real pipeline — manager, generator, worker threads —
//! with small chunks and, where queue contents must stay observable, a
//! throttle long enough that nothing drains mid-assertion. Everything here
//! is eventually consistent: helpers tick the control loop until a
//! predicate holds or a generous deadline passes.

use std::thread;
use std::time::{Duration, Instant};

use glam::Vec3;

use terrain::chunk::ChunkId;
use terrain::config::TerrainConfig;
use terrain::manager::{ChunkManager, TerrainEvent};

/// Small, fast chunks: a 4-vertex edge spans 3 quads of 100 world units.
fn config(throttle_interval: f32) -> TerrainConfig {
    TerrainConfig {
        chunk_size: 4,
        throttle_interval,
        ..TerrainConfig::default()
    }
}

const QUAD_SPAN: i32 = 3;
const WORLD_SPAN: f32 = 300.0;

/// Ticks at 60 Hz with a fixed viewer until `done` holds, collecting every
/// event. Panics after ten seconds.
fn tick_until(
    manager: &mut ChunkManager,
    viewer: Vec3,
    mut done: impl FnMut(&ChunkManager, &[TerrainEvent]) -> bool,
) -> Vec<TerrainEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    loop {
        events.extend(manager.tick(0.016, viewer));
        if done(manager, &events) {
            return events;
        }
        assert!(Instant::now() < deadline, "scenario timed out; events: {events:?}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Id of the chunk at chunk-grid coordinate `(x, y)`.
fn id_at(x: i32, y: i32) -> ChunkId {
    ChunkId::from_origin(x * QUAD_SPAN, y * QUAD_SPAN)
}

#[test]
fn initial_load_reports_monotonic_progress_and_completes() {
    let mut manager = ChunkManager::new(config(0.1)).unwrap();
    manager.initial_load(1);
    assert_eq!(manager.generator().chunk_count(), 9, "3x3 grid requested");

    let events = tick_until(&mut manager, Vec3::ZERO, |m, _| m.initial_load_complete());

    let progress: Vec<(u32, u32)> = events
        .iter()
        .filter_map(|e| match e {
            TerrainEvent::LoadingProgress { completed, total } => Some((*completed, *total)),
            _ => None,
        })
        .collect();
    let expected: Vec<(u32, u32)> = (1..=9).map(|i| (i, 9)).collect();
    assert_eq!(progress, expected);

    let completes = events
        .iter()
        .filter(|e| matches!(e, TerrainEvent::InitialLoadComplete))
        .count();
    assert_eq!(completes, 1);

    // Every grid chunk ended up displayed.
    let displayed = events
        .iter()
        .filter(|e| matches!(e, TerrainEvent::ChunkDisplayed(_)))
        .count();
    assert_eq!(displayed, 9);
    assert_eq!(manager.generator().resident_count(), 9);
}

#[test]
fn crossing_a_cell_streams_the_new_column_in_and_the_far_column_out() {
    let mut manager = ChunkManager::new(config(0.0)).unwrap();
    manager.initial_load(1);
    tick_until(&mut manager, Vec3::ZERO, |m, _| m.initial_load_complete());

    // Step into cell (1, 0) and let both queues drain completely.
    let viewer = Vec3::new(1.5 * WORLD_SPAN, 0.0, 0.0);
    tick_until(&mut manager, viewer, |m, _| {
        m.pending_generation() == 0
            && m.pending_destruction() == 0
            && m.generator().in_flight_count() == 0
    });

    // The x = 2 column came into range.
    for y in -1..=1 {
        assert!(
            manager.generator().has_chunk(id_at(2, y)),
            "expected chunk at (2, {y})"
        );
    }
    // The x = -1 column fell out of range and was destroyed.
    for y in -1..=1 {
        assert!(
            !manager.generator().has_chunk(id_at(-1, y)),
            "expected chunk at (-1, {y}) to be gone"
        );
    }
}

#[test]
fn walking_a_straight_line_keeps_exactly_the_window_resident() {
    let mut manager = ChunkManager::new(config(0.0)).unwrap();
    manager.initial_load(1);
    tick_until(&mut manager, Vec3::ZERO, |m, _| m.initial_load_complete());

    // One cell per step, draining fully between steps so stale queue
    // entries cannot linger past the next eviction pass.
    for cell in 1..=3 {
        #[allow(clippy::cast_precision_loss)]
        let viewer = Vec3::new((cell as f32 + 0.5) * WORLD_SPAN, 0.0, 0.0);
        tick_until(&mut manager, viewer, |m, _| {
            m.pending_generation() == 0
                && m.pending_destruction() == 0
                && m.generator().in_flight_count() == 0
        });
    }

    // Window around cell (3, 0): x in [2, 4], y in [-1, 1].
    assert_eq!(manager.generator().chunk_count(), 9);
    for y in -1..=1 {
        for x in 2..=4 {
            assert!(
                manager.generator().has_chunk(id_at(x, y)),
                "expected chunk at ({x}, {y})"
            );
        }
    }
}

#[test]
fn stress_test_reports_metrics_exactly_once() {
    let mut manager = ChunkManager::new(config(0.1)).unwrap();
    manager.stress_test(100);
    assert_eq!(manager.generator().chunk_count(), 100, "requests bypass the throttle");

    let events = tick_until(&mut manager, Vec3::ZERO, |_, events| {
        events
            .iter()
            .any(|e| matches!(e, TerrainEvent::StressTestComplete { .. }))
    });

    let reports: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            TerrainEvent::StressTestComplete {
                chunks,
                elapsed,
                per_chunk,
            } => Some((*chunks, *elapsed, *per_chunk)),
            _ => None,
        })
        .collect();
    assert_eq!(reports.len(), 1);
    let (chunks, elapsed, per_chunk) = reports[0];
    assert_eq!(chunks, 100);
    assert!(elapsed >= per_chunk);

    // A few more ticks must not produce a second report.
    for _ in 0..5 {
        let extra = manager.tick(0.016, Vec3::ZERO);
        assert!(
            !extra
                .iter()
                .any(|e| matches!(e, TerrainEvent::StressTestComplete { .. })),
            "stress metrics reported twice"
        );
    }
    assert_eq!(manager.generator().resident_count(), 100);
}

#[test]
fn out_of_order_completions_settle_every_chunk_independently() {
    // Mixed sizes make completion order scramble: big chunks take ~35
    // batch pauses, small ones almost none.
    let mut manager = ChunkManager::new(config(0.1)).unwrap();
    let noise = manager.config().noise.clone();
    let biome = manager.config().biome.clone();
    let generator = manager.generator_mut();

    for (i, size) in [(0, 33), (1, 4), (2, 33), (3, 4)] {
        generator
            .generate_chunk(i * 100, 0, size, noise.clone(), biome.clone())
            .unwrap();
    }

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut completed = Vec::new();
    while completed.len() < 4 {
        assert!(Instant::now() < deadline, "completions timed out");
        completed.extend(manager.generator_mut().drain_completions());
        thread::sleep(Duration::from_millis(1));
    }

    for (i, size) in [(0_i32, 33_u32), (1, 4), (2, 33), (3, 4)] {
        let id = ChunkId::from_origin(i * 100, 0);
        let chunk = manager.generator().chunk(id).unwrap();
        assert_eq!(chunk.vertices.len(), (size * size) as usize, "chunk {i}");
        let first = chunk.vertices[0].position;
        #[allow(clippy::cast_precision_loss)]
        let expected_x = (i * 100) as f32 * 100.0;
        assert!((first.x - expected_x).abs() < f32::EPSILON, "chunk {i}");
    }
}
