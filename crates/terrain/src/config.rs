use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// Parameters for fractal octave noise. Two [`NoiseField`]s built from equal
/// params produce identical heights, which is what keeps chunk borders
/// seamless across independent generations.
///
/// [`NoiseField`]: crate::noise_field::NoiseField
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Number of octaves summed per sample.
    pub octaves: u32,
    /// Amplitude falloff per octave, usually in (0, 1).
    pub persistence: f64,
    /// Base sample frequency applied to world coordinates.
    pub frequency: f64,
    /// Seed for the underlying gradient noise.
    pub seed: u32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            octaves: 4,
            persistence: 0.5,
            frequency: 0.01,
            seed: 1337,
        }
    }
}

/// Biome selection inputs, carried by value into every generation request
/// and stored on the finished chunk for the host's material pipeline.
/// The core never interprets these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeParams {
    /// Biome identifier understood by the host.
    pub name: String,
    /// Blend weights, passed through untouched.
    pub weights: Vec<f32>,
}

/// Configuration for the whole streaming core.
///
/// Defaults mirror the shipped tuning: 32-vertex chunk edges, a render
/// distance of 2 chunks, one generate/destroy dequeue per 100 ms, and
/// 100 world units per grid quad.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Chunk edge length in vertices. Adjacent chunks share a border
    /// row/column, so a chunk spans `chunk_size - 1` grid quads.
    pub chunk_size: u32,
    /// Radius, in chunks, that must stay resident around the viewer.
    pub render_distance: i32,
    /// Minimum seconds between successive generate/destroy dequeues.
    pub throttle_interval: f32,
    /// World units per grid quad.
    pub world_scale: f32,
    /// Multiplier applied to raw noise output (roughly [-1, 1]) to get a
    /// world-space height.
    pub height_scale: f32,
    pub noise: NoiseParams,
    pub biome: BiomeParams,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            render_distance: 2,
            throttle_interval: 0.1,
            world_scale: 100.0,
            height_scale: 100.0,
            noise: NoiseParams::default(),
            biome: BiomeParams::default(),
        }
    }
}

impl TerrainConfig {
    /// Checks the configuration before any chunk can be produced from it.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] if the chunk edge is shorter
    /// than two vertices, the render distance is negative, or a scale or
    /// interval is non-finite or out of range.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.chunk_size < 2 {
            return Err(TerrainError::InvalidConfig {
                reason: format!("chunk_size must be at least 2, got {}", self.chunk_size),
            });
        }
        if self.render_distance < 0 {
            return Err(TerrainError::InvalidConfig {
                reason: format!("render_distance must be >= 0, got {}", self.render_distance),
            });
        }
        if !self.throttle_interval.is_finite() || self.throttle_interval < 0.0 {
            return Err(TerrainError::InvalidConfig {
                reason: format!(
                    "throttle_interval must be finite and >= 0, got {}",
                    self.throttle_interval
                ),
            });
        }
        if !self.world_scale.is_finite() || self.world_scale <= 0.0 {
            return Err(TerrainError::InvalidConfig {
                reason: format!("world_scale must be finite and > 0, got {}", self.world_scale),
            });
        }
        if !self.height_scale.is_finite() {
            return Err(TerrainError::InvalidConfig {
                reason: format!("height_scale must be finite, got {}", self.height_scale),
            });
        }
        Ok(())
    }

    /// World-space length of one chunk along an axis: `chunk_size - 1` quads
    /// (the border row/column is shared with the neighbor) times the quad
    /// scale.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn chunk_world_span(&self) -> f32 {
        (self.chunk_size - 1) as f32 * self.world_scale
    }

    /// Chunk span in grid quads.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn chunk_quad_span(&self) -> i32 {
        (self.chunk_size - 1) as i32
    }
}
