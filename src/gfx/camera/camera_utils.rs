use cgmath::{Matrix4, Point3};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};
use crate::input::FrameInput;

pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Runs one tick of camera navigation.
    pub fn update(&mut self, input: &FrameInput) {
        self.controller.update(input, &mut self.camera);
    }

    /// Drops any drag in progress, e.g. when an object becomes selected.
    pub fn end_interaction(&mut self) {
        self.controller.end_drag();
    }

    /// Get the view projection matrix from the camera
    pub fn get_view_proj_matrix(&self) -> Matrix4<f32> {
        self.camera.build_view_projection_matrix()
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;

    fn eye_position(&self) -> Point3<f32>;
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}
