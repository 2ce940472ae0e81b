//! Per-object transform components.
//!
//! An object's placement is held as three independent components, position,
//! Euler rotation in degrees and non-uniform scale, and the 4x4 matrix is
//! recomposed from them on every change. The matrix is never edited directly.

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3, Zero};

/// Smallest scale component allowed after an interactive edit.
pub const MIN_SCALE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles in degrees, applied Y, then X, then Z.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
    matrix: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            matrix: Matrix4::identity(),
        }
    }

    /// Builds a transform from components and composes its matrix.
    pub fn from_components(
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        let mut transform = Self {
            position,
            rotation,
            scale,
            matrix: Matrix4::identity(),
        };
        transform.update_matrix();
        transform
    }

    /// The composed model matrix.
    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    /// Recomposes `T * Ry * Rx * Rz * S` from the current components.
    pub fn update_matrix(&mut self) {
        let t = Matrix4::from_translation(self.position);
        let ry = Matrix4::from_angle_y(Deg(self.rotation.y));
        let rx = Matrix4::from_angle_x(Deg(self.rotation.x));
        let rz = Matrix4::from_angle_z(Deg(self.rotation.z));
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        self.matrix = t * ry * rx * rz * s;
    }

    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.position += delta;
        self.update_matrix();
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.update_matrix();
    }

    /// Adds `delta` degrees to the Euler angles.
    pub fn rotate(&mut self, delta: Vector3<f32>) {
        self.rotation += delta;
        self.update_matrix();
    }

    pub fn set_rotation(&mut self, rotation: Vector3<f32>) {
        self.rotation = rotation;
        self.update_matrix();
    }

    /// Sets the scale, clamping each component to at least [`MIN_SCALE`].
    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.clamp_scale(MIN_SCALE, f32::MAX);
        self.update_matrix();
    }

    /// Adds `delta` to the scale and clamps every component into `[min, max]`.
    ///
    /// `min` is raised to [`MIN_SCALE`] so the matrix stays invertible.
    pub fn scale_by(&mut self, delta: Vector3<f32>, min: f32, max: f32) {
        self.scale += delta;
        self.clamp_scale(min, max);
        self.update_matrix();
    }

    fn clamp_scale(&mut self, min: f32, max: f32) {
        let min = min.max(MIN_SCALE);
        let max = max.max(min);
        self.scale.x = self.scale.x.clamp(min, max);
        self.scale.y = self.scale.y.clamp(min, max);
        self.scale.z = self.scale.z.clamp(min, max);
    }

    /// Resets every component to identity and recomposes the matrix.
    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix4::identity()
    }
}
