//! Procedural terrain chunk streaming.
//!
//! Space is partitioned into fixed-size square chunks whose heightfields
//! are computed on background workers from deterministic fractal noise and
//! converted into renderable triangle geometry once resident. The host
//! drives everything through [`manager::ChunkManager`]: call
//! [`initial_load`](manager::ChunkManager::initial_load) once at startup,
//! then [`tick`](manager::ChunkManager::tick) every frame with the viewer
//! position, and consume the returned [`manager::TerrainEvent`]s.
//!
//! The coordinating thread owns the chunk registry outright; workers share
//! nothing with it except a completion channel and a shutdown flag, so the
//! registry needs no locking and tolerates completions arriving in any
//! order.

pub mod chunk;
pub mod config;
pub mod error;
pub mod generator;
pub mod manager;
pub mod mesh;
pub mod noise_field;
pub mod worker;
