//! # Mesh Ingestion
//!
//! Turns a raw triangle soup (a flat position array plus per-shape index
//! triplets and an optional material list) into a renderable
//! [`SceneObject`](super::object::SceneObject).
//!
//! Two shading variants exist and they do not produce interchangeable
//! buffers:
//!
//! - [`ShadingMode::Flat`] emits three fresh vertices per triangle, each
//!   carrying the face normal, and a trivial `0..N` index buffer.
//! - [`ShadingMode::Smooth`] keeps one vertex per position index, sums the
//!   face normals of every triangle touching it and re-normalizes. Positions
//!   are welded by index only, so two numerically distinct copies of the same
//!   point stay separate. Positions that no triangle references are dropped,
//!   so stray points never widen the bounds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cgmath::{InnerSpace, Vector3};
use serde::{Deserialize, Serialize};

use super::bounds::Aabb;
use super::object::SceneObject;
use super::vertex::Vertex3D;

/// Color used when the source has no material.
pub const DEFAULT_COLOR: [f32; 3] = [0.7, 0.7, 0.7];

/// Normal assigned to zero-area triangles.
const DEGENERATE_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to load mesh '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("shape '{shape}' references vertex {index} but only {vertex_count} positions exist")]
    IndexOutOfRange {
        shape: String,
        index: u32,
        vertex_count: usize,
    },
    #[error("shape '{shape}' has {count} indices, which is not a whole number of triangles")]
    MalformedShape { shape: String, count: usize },
    #[error("position array length {0} is not a multiple of 3")]
    MalformedPositions(usize),
    #[error("mesh contains no triangles")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    #[default]
    Flat,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestOptions {
    /// Fit the mesh into a unit cube centered at the origin.
    pub normalize: bool,
    pub shading: ShadingMode,
    /// Color for meshes whose source has no material.
    pub default_color: [f32; 3],
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            shading: ShadingMode::Flat,
            default_color: DEFAULT_COLOR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawShape {
    pub name: String,
    /// Triangle list of indices into [`RawGeometry::positions`] (in vertices, not floats).
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMaterial {
    pub name: String,
    pub diffuse: Option<[f32; 3]>,
}

/// Unprocessed mesh data as read from a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGeometry {
    /// Flat `x, y, z` array shared by all shapes.
    pub positions: Vec<f32>,
    pub shapes: Vec<RawShape>,
    pub materials: Vec<RawMaterial>,
}

impl RawGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn position(&self, index: u32) -> Vector3<f32> {
        let i = index as usize * 3;
        Vector3::new(self.positions[i], self.positions[i + 1], self.positions[i + 2])
    }

    /// Merges a `tobj` load into one shared position array.
    ///
    /// Each model carries its own positions, so its indices are rebased by
    /// the number of positions already appended.
    pub fn from_tobj(models: &[tobj::Model], materials: &[tobj::Material]) -> Self {
        let mut geometry = RawGeometry::default();

        for model in models {
            let base = geometry.vertex_count() as u32;
            geometry.positions.extend_from_slice(&model.mesh.positions);
            geometry.shapes.push(RawShape {
                name: model.name.clone(),
                indices: model.mesh.indices.iter().map(|i| i + base).collect(),
            });
        }

        geometry.materials = materials
            .iter()
            .map(|m| RawMaterial {
                name: m.name.clone(),
                diffuse: m.diffuse,
            })
            .collect();

        geometry
    }

    /// Checks index ranges and triangle counts.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.positions.len() % 3 != 0 {
            return Err(IngestError::MalformedPositions(self.positions.len()));
        }

        let vertex_count = self.vertex_count();
        let mut triangles = 0;
        for shape in &self.shapes {
            if shape.indices.len() % 3 != 0 {
                return Err(IngestError::MalformedShape {
                    shape: shape.name.clone(),
                    count: shape.indices.len(),
                });
            }
            if let Some(&index) = shape.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(IngestError::IndexOutOfRange {
                    shape: shape.name.clone(),
                    index,
                    vertex_count,
                });
            }
            triangles += shape.indices.len() / 3;
        }

        if triangles == 0 {
            return Err(IngestError::Empty);
        }
        Ok(())
    }

    /// Object color: first material's diffuse, or `fallback`.
    pub fn base_color(&self, fallback: [f32; 3]) -> [f32; 3] {
        self.materials
            .first()
            .and_then(|m| m.diffuse)
            .unwrap_or(fallback)
    }

    /// One geometry per shape, each with only the positions it references.
    ///
    /// Indices are compacted in first-use order; materials are shared.
    pub fn split_shapes(&self) -> Vec<RawGeometry> {
        self.shapes
            .iter()
            .map(|shape| {
                let mut remap = HashMap::new();
                let mut positions = Vec::new();
                let indices = shape
                    .indices
                    .iter()
                    .map(|&i| {
                        *remap.entry(i).or_insert_with(|| {
                            let start = i as usize * 3;
                            positions.extend_from_slice(
                                self.positions.get(start..start + 3).unwrap_or(&[0.0; 3][..]),
                            );
                            (positions.len() / 3 - 1) as u32
                        })
                    })
                    .collect();
                RawGeometry {
                    positions,
                    shapes: vec![RawShape {
                        name: shape.name.clone(),
                        indices,
                    }],
                    materials: self.materials.clone(),
                }
            })
            .collect()
    }

    fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.shapes
            .iter()
            .flat_map(|s| s.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]))
    }
}

/// Reads an OBJ file with `tobj`, triangulating polygons.
///
/// A missing or broken MTL file is not fatal; the mesh falls back to the
/// default color.
pub fn load_obj(path: impl AsRef<Path>) -> Result<RawGeometry, IngestError> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )
    .map_err(|source| IngestError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::debug!("No usable MTL for {}: {}", path.display(), err);
        Vec::new()
    });

    Ok(RawGeometry::from_tobj(&models, &materials))
}

/// `normalize(cross(b - a, c - a))`, or +Y for a zero-area triangle.
pub fn face_normal(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Vector3<f32> {
    let n = (b - a).cross(c - a);
    let len2 = n.magnitude2();
    if len2 <= f32::MIN_POSITIVE || !len2.is_finite() {
        return Vector3::from(DEGENERATE_NORMAL);
    }
    n / len2.sqrt()
}

fn flat_buffers(raw: &RawGeometry) -> (Vec<Vertex3D>, Vec<u32>) {
    let mut vertices = Vec::new();
    for [i0, i1, i2] in raw.triangles() {
        let (a, b, c) = (raw.position(i0), raw.position(i1), raw.position(i2));
        let n: [f32; 3] = face_normal(a, b, c).into();
        vertices.push(Vertex3D::new(a.into(), n));
        vertices.push(Vertex3D::new(b.into(), n));
        vertices.push(Vertex3D::new(c.into(), n));
    }
    let indices = (0..vertices.len() as u32).collect();
    (vertices, indices)
}

fn smooth_buffers(raw: &RawGeometry) -> (Vec<Vertex3D>, Vec<u32>) {
    // Positions no triangle touches are dropped; the rest keep their order.
    let mut remap: Vec<Option<u32>> = vec![None; raw.vertex_count()];
    for i in raw.triangles().flatten() {
        remap[i as usize] = Some(0);
    }
    let mut used = Vec::new();
    for (i, slot) in remap.iter_mut().enumerate() {
        if slot.is_some() {
            *slot = Some(used.len() as u32);
            used.push(i as u32);
        }
    }

    let mut accumulated = vec![Vector3::new(0.0_f32, 0.0, 0.0); used.len()];
    let mut indices = Vec::new();
    for [i0, i1, i2] in raw.triangles() {
        let n = face_normal(raw.position(i0), raw.position(i1), raw.position(i2));
        for i in [i0, i1, i2] {
            if let Some(compact) = remap[i as usize] {
                accumulated[compact as usize] += n;
                indices.push(compact);
            }
        }
    }

    let vertices = used
        .iter()
        .zip(&accumulated)
        .map(|(&i, sum)| {
            let normal = if sum.magnitude2() > f32::MIN_POSITIVE {
                sum.normalize().into()
            } else {
                DEGENERATE_NORMAL
            };
            Vertex3D::new(raw.position(i).into(), normal)
        })
        .collect();

    (vertices, indices)
}

/// Builds the vertex and index buffers for `raw` without creating an object.
pub fn build_buffers(
    raw: &RawGeometry,
    shading: ShadingMode,
) -> Result<(Vec<Vertex3D>, Vec<u32>), IngestError> {
    raw.validate()?;
    Ok(match shading {
        ShadingMode::Flat => flat_buffers(raw),
        ShadingMode::Smooth => smooth_buffers(raw),
    })
}

/// Rescales and recenters `vertices` so their box fits a unit cube at the origin.
///
/// Returns `false` and leaves the positions untouched when the box has no
/// usable extent.
pub fn normalize(vertices: &mut [Vertex3D]) -> bool {
    let bounds = Aabb::from_vertices(vertices);
    let extent = bounds.max_extent();
    if !extent.is_finite() || extent <= f32::EPSILON {
        log::warn!(
            "Skipping normalization: degenerate bounds (max extent {})",
            extent
        );
        return false;
    }

    let scale = 1.0 / extent;
    let center = bounds.center();
    for v in vertices.iter_mut() {
        v.position = [
            (v.position[0] - center.x) * scale,
            (v.position[1] - center.y) * scale,
            (v.position[2] - center.z) * scale,
        ];
    }
    true
}

/// Converts raw geometry into a scene object.
///
/// The returned object has no GPU buffers yet; the scene uploads them on
/// insert.
pub fn process(
    name: impl Into<String>,
    raw: &RawGeometry,
    options: IngestOptions,
) -> Result<SceneObject, IngestError> {
    let (mut vertices, indices) = build_buffers(raw, options.shading)?;

    if options.normalize {
        normalize(&mut vertices);
    }

    let name = name.into();
    log::debug!(
        "Ingested '{}': {} vertices, {} triangles ({:?})",
        name,
        vertices.len(),
        indices.len() / 3,
        options.shading
    );

    Ok(SceneObject::new(
        name,
        vertices,
        indices,
        raw.base_color(options.default_color),
    ))
}

/// Loads and processes an OBJ file, recording it as the object's source.
pub fn import(path: impl AsRef<Path>, options: IngestOptions) -> Result<SceneObject, IngestError> {
    let path = path.as_ref();
    let raw = load_obj(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string());
    let mut object = process(name, &raw, options)?;
    object.set_source(path.to_path_buf(), options.normalize);
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> RawGeometry {
        // Two triangles sharing the diagonal 0-2 in the XZ plane, facing +Y.
        RawGeometry {
            positions: vec![
                0.0, 0.0, 0.0, //
                0.0, 0.0, 2.0, //
                4.0, 0.0, 2.0, //
                4.0, 0.0, 0.0,
            ],
            shapes: vec![RawShape {
                name: "quad".into(),
                indices: vec![0, 1, 2, 0, 2, 3],
            }],
            materials: Vec::new(),
        }
    }

    fn tetra() -> RawGeometry {
        RawGeometry {
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0,
            ],
            shapes: vec![RawShape {
                name: "tetra".into(),
                indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
            }],
            materials: vec![RawMaterial {
                name: "red".into(),
                diffuse: Some([1.0, 0.0, 0.0]),
            }],
        }
    }

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < 1e-5)
    }

    #[test]
    fn test_flat_shading_duplicates_vertices() {
        let (vertices, indices) = build_buffers(&quad(), ShadingMode::Flat).unwrap();
        assert_eq!(vertices.len(), 6);
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        for v in &vertices {
            assert!(close(v.normal, [0.0, 1.0, 0.0]));
        }
    }

    #[test]
    fn test_flat_face_normal_matches_cross_product() {
        let (vertices, _) = build_buffers(&tetra(), ShadingMode::Flat).unwrap();
        // First face 0,2,1 winds clockwise seen from +Z, so it faces -Z.
        assert!(close(vertices[0].normal, [0.0, 0.0, -1.0]));
        assert_eq!(vertices[0].normal, vertices[1].normal);
        assert_eq!(vertices[1].normal, vertices[2].normal);
    }

    #[test]
    fn test_smooth_shading_shares_vertices() {
        let (vertices, indices) = build_buffers(&tetra(), ShadingMode::Smooth).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices, tetra().shapes[0].indices);

        // Apex at origin touches three axis-aligned faces.
        let expected = -1.0 / 3.0_f32.sqrt();
        assert!(close(vertices[0].normal, [expected, expected, expected]));
        for v in &vertices {
            let len = Vector3::from(v.normal).magnitude();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_smooth_shading_drops_unreferenced_positions() {
        let mut raw = quad();
        // A stray point far outside the quad that no face uses.
        raw.positions = vec![
            0.0, 0.0, 0.0, //
            50.0, 50.0, 50.0, //
            0.0, 0.0, 2.0, //
            4.0, 0.0, 2.0, //
            4.0, 0.0, 0.0,
        ];
        raw.shapes[0].indices = vec![0, 2, 3, 0, 3, 4];

        let (vertices, indices) = build_buffers(&raw, ShadingMode::Smooth).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(vertices.iter().all(|v| v.position[0] <= 4.0));
        assert!(vertices.iter().all(|v| close(v.normal, [0.0, 1.0, 0.0])));

        let options = IngestOptions {
            shading: ShadingMode::Smooth,
            ..IngestOptions::default()
        };
        let object = process("quad", &raw, options).unwrap();
        assert!(close(object.local_bounds().min.into(), [-0.5, 0.0, -0.25]));
    }

    #[test]
    fn test_degenerate_triangle_gets_up_normal() {
        let raw = RawGeometry {
            positions: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0],
            shapes: vec![RawShape {
                name: "line".into(),
                indices: vec![0, 1, 2],
            }],
            materials: Vec::new(),
        };
        let (vertices, _) = build_buffers(&raw, ShadingMode::Flat).unwrap();
        assert!(vertices.iter().all(|v| v.normal == DEGENERATE_NORMAL));
    }

    #[test]
    fn test_material_color_and_default() {
        assert_eq!(tetra().base_color(DEFAULT_COLOR), [1.0, 0.0, 0.0]);
        assert_eq!(quad().base_color(DEFAULT_COLOR), DEFAULT_COLOR);

        let mut no_diffuse = tetra();
        no_diffuse.materials[0].diffuse = None;
        assert_eq!(no_diffuse.base_color(DEFAULT_COLOR), DEFAULT_COLOR);
    }

    #[test]
    fn test_configured_default_color_applies_without_material() {
        let options = IngestOptions {
            default_color: [0.1, 0.2, 0.3],
            ..IngestOptions::default()
        };
        let plain = process("quad", &quad(), options).unwrap();
        assert_eq!(plain.original_color, [0.1, 0.2, 0.3]);

        let red = process("tetra", &tetra(), options).unwrap();
        assert_eq!(red.original_color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_normalize_fits_unit_cube() {
        let object = process("quad", &quad(), IngestOptions::default()).unwrap();
        let bounds = object.local_bounds();
        assert!((bounds.max_extent() - 1.0).abs() < 1e-6);
        assert!(close(bounds.center().into(), [0.0, 0.0, 0.0]));
        assert!(close(bounds.min.into(), [-0.5, 0.0, -0.25]));
        assert_eq!(object.color, DEFAULT_COLOR);
        assert_eq!(object.original_color, DEFAULT_COLOR);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let (mut vertices, _) = build_buffers(&tetra(), ShadingMode::Flat).unwrap();
        assert!(normalize(&mut vertices));
        let once = vertices.clone();
        assert!(normalize(&mut vertices));
        for (a, b) in once.iter().zip(&vertices) {
            assert!(close(a.position, b.position));
        }
    }

    #[test]
    fn test_normalize_skips_single_point() {
        let mut vertices = vec![Vertex3D::new([3.0, 3.0, 3.0], [0.0, 1.0, 0.0]); 3];
        assert!(!normalize(&mut vertices));
        assert!(vertices.iter().all(|v| v.position == [3.0, 3.0, 3.0]));

        let raw = RawGeometry {
            positions: vec![3.0, 3.0, 3.0],
            shapes: vec![RawShape {
                name: "point".into(),
                indices: vec![0, 0, 0],
            }],
            materials: Vec::new(),
        };
        let object = process("point", &raw, IngestOptions::default()).unwrap();
        assert!(object
            .vertices()
            .iter()
            .all(|v| v.position.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn test_without_normalize_keeps_positions() {
        let options = IngestOptions {
            normalize: false,
            ..IngestOptions::default()
        };
        let object = process("quad", &quad(), options).unwrap();
        assert_eq!(object.local_bounds().max.x, 4.0);
        assert_eq!(object.vertices(), object.original_vertices());
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let mut raw = quad();
        raw.shapes[0].indices[4] = 9;
        let err = process("bad", &raw, IngestOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::IndexOutOfRange { index: 9, .. }));
    }

    #[test]
    fn test_rejects_partial_triangle_and_empty() {
        let mut raw = quad();
        raw.shapes[0].indices.pop();
        assert!(matches!(
            raw.validate(),
            Err(IngestError::MalformedShape { count: 5, .. })
        ));

        let empty = RawGeometry::default();
        assert!(matches!(empty.validate(), Err(IngestError::Empty)));
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let err = import("/definitely/not/here.obj", IngestOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::Load { .. }));
    }

    #[test]
    fn test_from_tobj_rebases_indices() {
        let first = tobj::Model::new(
            tobj::Mesh {
                positions: vec![0.0; 9],
                indices: vec![0, 1, 2],
                ..Default::default()
            },
            "a".into(),
        );
        let second = tobj::Model::new(
            tobj::Mesh {
                positions: vec![1.0; 9],
                indices: vec![0, 1, 2],
                ..Default::default()
            },
            "b".into(),
        );

        let raw = RawGeometry::from_tobj(&[first, second], &[]);
        assert_eq!(raw.vertex_count(), 6);
        assert_eq!(raw.shapes[1].indices, vec![3, 4, 5]);
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_split_shapes_compacts_indices() {
        let mut raw = quad();
        raw.shapes = vec![
            RawShape {
                name: "left".into(),
                indices: vec![0, 1, 2],
            },
            RawShape {
                name: "right".into(),
                indices: vec![3, 0, 2],
            },
        ];

        let parts = raw.split_shapes();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].shapes[0].indices, vec![0, 1, 2]);
        assert_eq!(parts[1].positions, vec![4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 0.0, 2.0]);
        assert!(parts.iter().all(|p| p.validate().is_ok()));
    }
}
