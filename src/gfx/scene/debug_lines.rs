//! Debug line overlays for a single object.
//!
//! Normal lines and box edges are built in local space from the live vertex
//! buffer and cached until the geometry changes (a bake). Each frame the
//! cached segments are pushed through the current model matrix.

use cgmath::{Matrix4, Point3, Transform};

use super::bounds::Aabb;
use super::vertex::{LineVertex, Vertex3D};

/// Length of a drawn vertex normal.
pub const NORMAL_LINE_LENGTH: f32 = 0.1;

/// Segment endpoints for the twelve box edges (24 points).
pub fn box_edges(aabb: &Aabb) -> Vec<Point3<f32>> {
    let c = aabb.corners();
    // Corner index bits: x = 4, y = 2, z = 1.
    const EDGES: [(usize, usize); 12] = [
        (0, 4), (4, 6), (6, 2), (2, 0),
        (1, 5), (5, 7), (7, 3), (3, 1),
        (0, 1), (4, 5), (6, 7), (2, 3),
    ];
    EDGES.iter().flat_map(|&(a, b)| [c[a], c[b]]).collect()
}

/// One segment per vertex, from the position along its normal.
pub fn normal_segments(vertices: &[Vertex3D], length: f32) -> Vec<Point3<f32>> {
    vertices
        .iter()
        .flat_map(|v| {
            let p = Point3::from(v.position);
            let tip = Point3::new(
                p.x + v.normal[0] * length,
                p.y + v.normal[1] * length,
                p.z + v.normal[2] * length,
            );
            [p, tip]
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct DebugLineCache {
    normals: Option<Vec<Point3<f32>>>,
    bounds: Option<Vec<Point3<f32>>>,
}

impl DebugLineCache {
    pub fn invalidate(&mut self) {
        self.normals = None;
        self.bounds = None;
    }

    pub fn is_cached(&self) -> bool {
        self.normals.is_some() || self.bounds.is_some()
    }

    pub fn normal_lines(
        &mut self,
        vertices: &[Vertex3D],
        model: &Matrix4<f32>,
        color: [f32; 3],
    ) -> Vec<LineVertex> {
        let segments = self
            .normals
            .get_or_insert_with(|| normal_segments(vertices, NORMAL_LINE_LENGTH));
        to_world(segments, model, color)
    }

    pub fn bounds_lines(
        &mut self,
        vertices: &[Vertex3D],
        model: &Matrix4<f32>,
        color: [f32; 3],
    ) -> Vec<LineVertex> {
        let segments = self
            .bounds
            .get_or_insert_with(|| box_edges(&Aabb::from_vertices(vertices)));
        to_world(segments, model, color)
    }
}

fn to_world(points: &[Point3<f32>], model: &Matrix4<f32>, color: [f32; 3]) -> Vec<LineVertex> {
    points
        .iter()
        .map(|p| LineVertex::new(model.transform_point(*p).into(), color))
        .collect()
}
