//! # Primitive Shape Generation
//!
//! This module contains functions to generate common 3D primitive shapes.

use super::GeometryData;
use crate::gfx::scene::vertex::LineVertex;
use std::f32::consts::PI;

/// Generate a unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes.
/// Each face has its own four vertices with an outward normal.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    #[rustfmt::skip]
    let positions = [
        // Front face
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // Left face
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    data.normals = face_normals.iter().flat_map(|n| [*n; 4]).collect();

    // Two counter-clockwise triangles per face
    data.indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    data
}

/// Generate a UV sphere centered at the origin
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
pub fn generate_sphere(radius: f32, longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32; // 0 to PI
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32; // 0 to 2*PI
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.vertices
                .push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
            data.normals.push(normal);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            data.indices.extend_from_slice(&[first, first + 1, second]);
            data.indices.extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    data
}

/// Ground grid as a world-space line list in the plane `y = height`.
///
/// `divisions` major lines per axis span `size`; each cell is split again by
/// `subdivisions - 1` minor lines.
pub fn generate_grid_lines(
    size: f32,
    divisions: u32,
    subdivisions: u32,
    height: f32,
    color: [f32; 3],
) -> Vec<LineVertex> {
    let divisions = divisions.max(1);
    let subdivisions = subdivisions.max(1);
    let half = size / 2.0;
    let step = size / divisions as f32;
    let sub_step = step / subdivisions as f32;

    let mut coords: Vec<f32> = (0..=divisions).map(|i| -half + i as f32 * step).collect();
    for i in 0..divisions {
        for j in 1..subdivisions {
            coords.push(-half + i as f32 * step + j as f32 * sub_step);
        }
    }

    coords
        .iter()
        .flat_map(|&c| {
            [
                LineVertex::new([c, height, -half], color),
                LineVertex::new([c, height, half], color),
                LineVertex::new([-half, height, c], color),
                LineVertex::new([half, height, c], color),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::ingest::{self, ShadingMode};

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        // Flat ingestion recomputes normals from winding; they must agree with the stored ones.
        let cube = generate_cube();
        let (vertices, _) = ingest::build_buffers(&cube.to_raw("cube"), ShadingMode::Flat).unwrap();
        for (tri, chunk) in cube.indices.chunks(3).zip(vertices.chunks(3)) {
            assert_eq!(chunk[0].normal, cube.normals[tri[0] as usize]);
        }
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(2.0, 8, 6);
        assert_eq!(sphere.vertices.len(), 9 * 7);
        assert_eq!(sphere.triangle_count(), 8 * 6 * 2);
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        for v in &sphere.vertices {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((r - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_grid_line_count_and_height() {
        let grid = generate_grid_lines(20.0, 20, 5, -0.5, [0.7; 3]);
        // 21 major + 20 * 4 minor coordinates, two lines of two vertices each.
        assert_eq!(grid.len(), (21 + 80) * 4);
        assert!(grid.iter().all(|v| v.position[1] == -0.5));
        assert!(grid.iter().all(|v| v.position[0].abs() <= 10.0 && v.position[2].abs() <= 10.0));
    }
}
