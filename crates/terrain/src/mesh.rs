use glam::Vec3;

use crate::chunk::Vertex;

/// The four grid-adjacency indices around one interior cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareIndices {
    pub bottom_left: u32,
    pub bottom_right: u32,
    pub top_left: u32,
    pub top_right: u32,
}

/// Indices of the cell whose bottom-left grid point is `(x, y)` in a
/// row-major `grid_size * grid_size` vertex grid. Purely combinatorial;
/// identical for any edge size.
#[inline]
#[must_use]
pub const fn square_indices(x: u32, y: u32, grid_size: u32) -> SquareIndices {
    SquareIndices {
        bottom_left: x + y * grid_size,
        bottom_right: (x + 1) + y * grid_size,
        top_left: x + (y + 1) * grid_size,
        top_right: (x + 1) + (y + 1) * grid_size,
    }
}

/// Renderable geometry for one chunk: positions, per-vertex normals and a
/// triangle index buffer, all in the chunk's row-major vertex order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    /// Number of triangles in the index buffer.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Converts a finalized `size * size` heightfield into triangle geometry.
///
/// Every interior cell contributes two triangles (`bl, br, tl` and
/// `br, tr, tl`), counter-clockwise seen from +Z, so a chunk of edge `size`
/// yields `(size - 1)²` quads. Normals are the normalised sum of adjacent
/// triangle face normals, a pure function of the vertex array.
///
/// # Panics
///
/// Panics if `vertices.len() != size * size`; the generator only builds
/// meshes for `Resident` chunks, whose buffers are complete by definition.
#[must_use]
pub fn build_chunk_mesh(size: u32, vertices: &[Vertex]) -> ChunkMesh {
    assert_eq!(
        vertices.len(),
        (size * size) as usize,
        "heightfield must hold size * size vertices"
    );

    let positions: Vec<Vec3> = vertices.iter().map(|v| v.position).collect();

    let quads = size.saturating_sub(1);
    let mut indices = Vec::with_capacity((quads * quads * 6) as usize);
    for y in 0..quads {
        for x in 0..quads {
            let square = square_indices(x, y, size);
            indices.extend_from_slice(&[
                square.bottom_left,
                square.bottom_right,
                square.top_left,
                square.bottom_right,
                square.top_right,
                square.top_left,
            ]);
        }
    }

    let normals = vertex_normals(&positions, &indices);

    ChunkMesh {
        positions,
        normals,
        indices,
    }
}

/// Per-vertex normals accumulated from adjacent triangle face normals.
/// Vertices without any adjacent triangle (degenerate 1x1 grids) fall back
/// to +Z.
fn vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    normals
        .into_iter()
        .map(|n| if n == Vec3::ZERO { Vec3::Z } else { n.normalize() })
        .collect()
}
