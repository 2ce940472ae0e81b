//! # Procedural Geometry Generation
//!
//! Built-in shapes that do not come from a file: the light marker sphere,
//! a unit cube used throughout the tests, and the ground grid line list.
//!
//! ## Usage
//!
//! ```rust
//! use objview::gfx::geometry::{generate_cube, generate_sphere};
//!
//! // Generate a unit cube
//! let cube_data = generate_cube();
//!
//! // Generate a sphere of radius 0.5 with 32 segments
//! let sphere_data = generate_sphere(0.5, 32, 16);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::ingest::{RawGeometry, RawShape};
use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaved position + normal buffer with the generated normals.
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices: Vec<Vertex3D> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, position)| {
                Vertex3D::new(*position, self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]))
            })
            .collect();

        (vertices, self.indices.clone())
    }

    /// The shape as raw ingestion input (normals dropped, one shape).
    pub fn to_raw(&self, name: &str) -> RawGeometry {
        RawGeometry {
            positions: self.vertices.iter().flatten().copied().collect(),
            shapes: vec![RawShape {
                name: name.to_string(),
                indices: self.indices.clone(),
            }],
            materials: Vec::new(),
        }
    }
}
