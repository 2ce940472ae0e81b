//! # Object Picking System
//!
//! Resolves which scene object sits under the cursor. Two strategies exist
//! and they can disagree at silhouette edges, so exactly one is active at a
//! time:
//!
//! - [`PickStrategy::Analytic`] (the default) casts a ray from the camera eye
//!   through the cursor and slab-tests it against each object's world box.
//!   The **first** object in scene order whose box is hit wins, not the
//!   nearest one; overlapping boxes always resolve to the lower index.
//! - [`PickStrategy::ColorId`] renders object ids into an off-screen target
//!   and reads back the pixel under the cursor, see [`color_id`].
//!
//! ## Usage
//!
//! ```no_run
//! use objview::gfx::picking::ObjectPicker;
//! # use objview::gfx::{camera::OrbitCamera, scene::Scene};
//! # let camera: OrbitCamera = unimplemented!();
//! # let scene = Scene::new();
//!
//! let picker = ObjectPicker::new();
//! if let Some(index) = picker.pick_at([400.0, 300.0], [800, 600], &camera, &scene) {
//!     println!("Selected object: {}", index);
//! }
//! ```

pub mod color_id;

use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use crate::gfx::{camera::OrbitCamera, scene::bounds::Aabb, scene::Scene};

pub use color_id::ColorIdPicker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PickStrategy {
    #[default]
    Analytic,
    ColorId,
}

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Point3<f32>,
    /// Ray direction (normalized unless zero)
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        let len = direction.magnitude();
        let direction = if len > 0.0 { direction / len } else { direction };
        Self { origin, direction }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Slab test against `aabb`.
    ///
    /// Returns the entry distance (clamped to 0 when the origin is inside),
    /// or `None` on a miss. A zero direction component divides to ±infinity,
    /// which orders correctly; the one NaN case (origin exactly on a slab
    /// plane with a parallel ray) counts as inside that slab. Boxes entirely
    /// behind the origin are misses.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let t1 = (aabb.min[axis] - self.origin[axis]) / self.direction[axis];
            let t2 = (aabb.max[axis] - self.origin[axis]) / self.direction[axis];
            if t1.is_nan() || t2.is_nan() {
                continue;
            }
            let (entry, exit) = if t1 > t2 { (t2, t1) } else { (t1, t2) };
            t_near = t_near.max(entry);
            t_far = t_far.min(exit);
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some(t_near.max(0.0))
        } else {
            None
        }
    }
}

/// Analytic ray/box picker.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectPicker;

impl ObjectPicker {
    pub fn new() -> Self {
        Self
    }

    /// Builds the world-space ray under `cursor` (window pixels, origin top-left).
    ///
    /// The clip-space point `(x, y, -1, 1)` is taken back through the inverse
    /// projection, turned into an eye-space direction `(x, y, -1, 0)` and then
    /// through the inverse view. The origin is the camera eye.
    pub fn screen_to_ray(
        cursor: [f32; 2],
        window_size: [u32; 2],
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
        eye: Point3<f32>,
    ) -> Option<Ray> {
        if window_size[0] == 0 || window_size[1] == 0 {
            return None;
        }

        let ndc_x = (2.0 * cursor[0]) / window_size[0] as f32 - 1.0;
        let ndc_y = 1.0 - (2.0 * cursor[1]) / window_size[1] as f32;

        let clip = Vector4::new(ndc_x, ndc_y, -1.0, 1.0);
        let eye_space = projection.invert()? * clip;
        let eye_dir = Vector4::new(eye_space.x, eye_space.y, -1.0, 0.0);
        let world = view.invert()? * eye_dir;

        Some(Ray::new(eye, world.truncate()))
    }

    pub fn camera_ray(cursor: [f32; 2], window_size: [u32; 2], camera: &OrbitCamera) -> Option<Ray> {
        Self::screen_to_ray(
            cursor,
            window_size,
            &camera.view_matrix(),
            &camera.projection_matrix(),
            Point3::new(camera.eye.x, camera.eye.y, camera.eye.z),
        )
    }

    /// Index of the first object in scene order whose world box `ray` hits.
    pub fn pick(&self, ray: &Ray, scene: &Scene) -> Option<usize> {
        scene
            .objects()
            .iter()
            .position(|object| ray.intersect_aabb(&object.world_bounds()).is_some())
    }

    pub fn pick_at(
        &self,
        cursor: [f32; 2],
        window_size: [u32; 2],
        camera: &OrbitCamera,
        scene: &Scene,
    ) -> Option<usize> {
        let ray = Self::camera_ray(cursor, window_size, camera)?;
        let hit = self.pick(&ray, scene);
        log::debug!("Ray pick at {:?}: {:?}", cursor, hit);
        hit
    }
}
