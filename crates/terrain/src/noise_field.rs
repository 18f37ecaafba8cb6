use noise::{NoiseFn, Perlin};

use crate::config::NoiseParams;

/// Deterministic fractal height function over integer grid coordinates.
///
/// Stateless after construction and `Send + Sync`, so every [`ChunkWorker`]
/// can own its own field (or share one) without coordination. Samples are
/// taken at *world* grid coordinates, never chunk-local ones, which makes
/// heights identical along the border row/column that adjacent chunks share.
///
/// [`ChunkWorker`]: crate::worker
#[derive(Debug, Clone)]
pub struct NoiseField {
    perlin: Perlin,
    octaves: u32,
    persistence: f64,
    frequency: f64,
}

impl NoiseField {
    #[must_use]
    pub fn new(params: &NoiseParams) -> Self {
        Self {
            perlin: Perlin::new(params.seed),
            octaves: params.octaves,
            persistence: params.persistence,
            frequency: params.frequency,
        }
    }

    /// Height at world grid coordinate `(x, y)`, normalised to roughly
    /// [-1, 1] by the total octave weight. Zero octaves yield a flat zero
    /// field.
    #[must_use]
    pub fn height(&self, x: i32, y: i32) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut weight = 0.0;

        for _ in 0..self.octaves {
            total += self.perlin.get([f64::from(x) * frequency, f64::from(y) * frequency])
                * amplitude;
            weight += amplitude;
            amplitude *= self.persistence;
            frequency *= 2.0;
        }

        if weight > 0.0 { total / weight } else { 0.0 }
    }
}
