//! Scene objects.
//!
//! A [`SceneObject`] owns its geometry twice: the live `vertices` that are
//! uploaded to the GPU and an `original_vertices` snapshot taken at
//! ingestion (or the last bake). World positions are always derived from the
//! snapshot and the current [`Transform`], so repeated edits never
//! accumulate error in the stored geometry.

use std::path::{Path, PathBuf};

use cgmath::{Matrix4, Point3, Transform as _, Vector3};
use serde::{Deserialize, Serialize};

use super::bounds::Aabb;
use super::debug_lines::DebugLineCache;
use super::transform::Transform;
use super::vertex::{LineVertex, Vertex3D};
use crate::gfx::geometry::generate_sphere;
use crate::gfx::rendering::backend::{MeshHandle, RenderBackend, RenderError};

/// Radius of the procedural light marker sphere.
pub const LIGHT_MARKER_RADIUS: f32 = 0.1;

/// What an object represents in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectKind {
    #[default]
    Mesh,
    /// Position handle for the point light; drawn unlit.
    LightMarker,
}

/// Where an imported object's geometry came from, for scene descriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSource {
    pub path: PathBuf,
    pub normalize: bool,
}

#[derive(Debug)]
pub struct SceneObject {
    pub name: String,
    kind: ObjectKind,
    vertices: Vec<Vertex3D>,
    original_vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    pub transform: Transform,
    /// Current render tint.
    pub color: [f32; 3],
    /// Color derived from the material at import time.
    pub original_color: [f32; 3],
    local_bounds: Aabb,
    source: Option<ObjectSource>,
    gpu: Option<MeshHandle>,
    gpu_dirty: bool,
    debug_lines: DebugLineCache,
}

impl SceneObject {
    /// Wraps final vertex/index buffers; the snapshot and local box are taken here.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex3D>,
        indices: Vec<u32>,
        color: [f32; 3],
    ) -> Self {
        let local_bounds = Aabb::from_vertices(&vertices);
        Self {
            name: name.into(),
            kind: ObjectKind::Mesh,
            original_vertices: vertices.clone(),
            vertices,
            indices,
            transform: Transform::identity(),
            color,
            original_color: color,
            local_bounds,
            source: None,
            gpu: None,
            gpu_dirty: false,
            debug_lines: DebugLineCache::default(),
        }
    }

    /// A small white sphere marking the point light, placed at `position`.
    pub fn light_marker(position: Vector3<f32>) -> Self {
        let sphere = generate_sphere(LIGHT_MARKER_RADIUS, 16, 12);
        let (vertices, indices) = sphere.to_scene_format();
        let mut marker = Self::new("Light", vertices, indices, [1.0, 1.0, 1.0]);
        marker.kind = ObjectKind::LightMarker;
        marker.transform.set_position(position);
        marker
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn is_light(&self) -> bool {
        self.kind == ObjectKind::LightMarker
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn original_vertices(&self) -> &[Vertex3D] {
        &self.original_vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.transform.matrix()
    }

    /// Box over the snapshot positions in local space.
    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    /// World box from the eight transformed local corners.
    pub fn world_bounds(&self) -> Aabb {
        self.local_bounds.transformed(&self.transform.matrix())
    }

    /// Exact world box from every transformed snapshot vertex.
    pub fn world_bounds_exact(&self) -> Aabb {
        Aabb::from_transformed_vertices(&self.original_vertices, &self.transform.matrix())
    }

    /// Snapshot positions pushed through the current matrix.
    pub fn world_positions(&self) -> Vec<[f32; 3]> {
        let m = self.transform.matrix();
        self.original_vertices
            .iter()
            .map(|v| m.transform_point(Point3::from(v.position)).into())
            .collect()
    }

    pub fn source(&self) -> Option<&ObjectSource> {
        self.source.as_ref()
    }

    pub fn set_source(&mut self, path: impl AsRef<Path>, normalize: bool) {
        self.source = Some(ObjectSource {
            path: path.as_ref().to_path_buf(),
            normalize,
        });
    }

    /// Absorbs the current transform into the geometry.
    ///
    /// Positions become `M * original`, the snapshot and local box are
    /// rebuilt from them and the transform resets to identity. Normals are
    /// copied unchanged, so lighting on a rotated mesh is off after a bake.
    ///
    /// A bake that moves the geometry detaches the object from its source
    /// file, since re-importing that file would no longer reproduce it.
    pub fn bake(&mut self) {
        if !self.transform.is_identity() && self.source.take().is_some() {
            log::debug!("'{}' baked; source file no longer describes it", self.name);
        }
        let m = self.transform.matrix();
        for (live, original) in self.vertices.iter_mut().zip(&self.original_vertices) {
            live.position = m.transform_point(Point3::from(original.position)).into();
            live.normal = original.normal;
        }
        self.original_vertices.clone_from(&self.vertices);
        self.local_bounds = Aabb::from_vertices(&self.vertices);
        self.transform.reset();
        self.gpu_dirty = true;
        self.debug_lines.invalidate();
    }

    pub fn mesh_handle(&self) -> Option<MeshHandle> {
        self.gpu
    }

    /// Whether the live vertices differ from what was last uploaded.
    pub fn needs_gpu_sync(&self) -> bool {
        self.gpu_dirty
    }

    /// Allocates GPU buffers unless the object already owns some.
    pub fn upload<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> MeshHandle {
        if let Some(handle) = self.gpu {
            return handle;
        }
        let handle = backend.upload_mesh(&self.vertices, &self.indices);
        self.gpu = Some(handle);
        self.gpu_dirty = false;
        handle
    }

    /// Pushes baked vertices to the GPU if they changed.
    pub fn sync_gpu<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), RenderError> {
        match self.gpu {
            Some(handle) if self.gpu_dirty => {
                backend.update_vertices(handle, &self.vertices)?;
                self.gpu_dirty = false;
            }
            Some(_) => {}
            None => {
                self.upload(backend);
            }
        }
        Ok(())
    }

    /// Frees the object's GPU buffers. Safe to call more than once.
    pub fn release_gpu<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(handle) = self.gpu.take() {
            backend.release_mesh(handle);
        }
    }

    pub fn normal_lines(&mut self, color: [f32; 3]) -> Vec<LineVertex> {
        let model = self.transform.matrix();
        self.debug_lines.normal_lines(&self.vertices, &model, color)
    }

    pub fn bounds_lines(&mut self, color: [f32; 3]) -> Vec<LineVertex> {
        let model = self.transform.matrix();
        self.debug_lines.bounds_lines(&self.vertices, &model, color)
    }

    pub fn has_cached_debug_lines(&self) -> bool {
        self.debug_lines.is_cached()
    }
}
