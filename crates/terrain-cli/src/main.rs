//! Host stand-in for the terrain streaming core.
//!
//! Runs the control loop the way a game frame loop would: an initial load
//! around the origin, then a 60 Hz tick while a simulated viewer walks
//! along +X, logging progress and displayed chunks. `--stress N` instead
//! issues N back-to-back generation requests and reports the timing
//! metrics, mirroring a developer-console diagnostic.

use std::thread;
use std::time::Duration;

use clap::Parser;
use glam::Vec3;

use terrain::config::{NoiseParams, TerrainConfig};
use terrain::error::TerrainError;
use terrain::manager::{ChunkManager, TerrainEvent};

const DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(version, about = "Procedural terrain chunk streaming demo")]
struct Args {
    /// Render distance in chunks around the viewer.
    #[arg(long, default_value_t = 2)]
    render_distance: i32,

    /// Chunk edge length in vertices.
    #[arg(long, default_value_t = 32)]
    chunk_size: u32,

    /// Noise seed.
    #[arg(long, default_value_t = 1337)]
    seed: u32,

    /// Control-loop ticks to run after startup.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Viewer speed in world units per second.
    #[arg(long, default_value_t = 400.0)]
    speed: f32,

    /// Run a stress test of N chunks instead of the streaming walk.
    #[arg(long, value_name = "N")]
    stress: Option<u32>,
}

fn main() -> Result<(), TerrainError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = TerrainConfig {
        chunk_size: args.chunk_size,
        render_distance: args.render_distance,
        noise: NoiseParams {
            seed: args.seed,
            ..NoiseParams::default()
        },
        ..TerrainConfig::default()
    };
    let mut manager = ChunkManager::new(config)?;

    if let Some(count) = args.stress {
        run_stress(&mut manager, count);
    } else {
        manager.initial_load(args.render_distance);
        run_walk(&mut manager, args.ticks, args.speed);
    }

    tracing::info!(
        resident = manager.generator().resident_count(),
        registered = manager.generator().chunk_count(),
        "shutting down"
    );
    Ok(())
}

/// Ticks the manager while the viewer walks along +X. The viewer stands
/// still until the initial grid is in, matching how a host would hold the
/// player on a loading screen.
fn run_walk(manager: &mut ChunkManager, ticks: u32, speed: f32) {
    let mut viewer = Vec3::ZERO;
    for _ in 0..ticks {
        if manager.initial_load_complete() {
            viewer.x += speed * DT;
        }
        log_events(&manager.tick(DT, viewer));
        thread::sleep(Duration::from_secs_f32(DT));
    }
}

/// Issues the stress batch and ticks until its metrics report arrives.
fn run_stress(manager: &mut ChunkManager, count: u32) {
    manager.stress_test(count);
    loop {
        let events = manager.tick(DT, Vec3::ZERO);
        let done = events
            .iter()
            .any(|event| matches!(event, TerrainEvent::StressTestComplete { .. }));
        log_events(&events);
        if done {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

fn log_events(events: &[TerrainEvent]) {
    for event in events {
        match event {
            TerrainEvent::LoadingProgress { completed, total } => {
                tracing::info!("loading chunks: {completed}/{total}");
            }
            TerrainEvent::InitialLoadComplete => tracing::info!("initial chunks complete"),
            TerrainEvent::ChunkDisplayed(id) => tracing::debug!("displayed chunk {id:?}"),
            TerrainEvent::StressTestComplete {
                chunks,
                elapsed,
                per_chunk,
            } => {
                tracing::info!(
                    "stress test complete: {chunks} chunks in {elapsed:?} ({per_chunk:?} per chunk)"
                );
            }
        }
    }
}
