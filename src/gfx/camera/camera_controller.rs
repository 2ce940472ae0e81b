use winit::keyboard::KeyCode;

use super::orbit_camera::OrbitCamera;
use crate::input::FrameInput;

/// State of one left-button orbit drag, alive from press to release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub last_cursor: [f32; 2],
}

/// Orbit and dolly navigation, active while no object is selected.
pub struct CameraController {
    /// Degrees of orbit per pixel dragged.
    pub rotate_speed: f32,
    /// Distance moved per frame while Up/Down is held.
    pub dolly_speed: f32,
    drag: Option<DragSession>,
}

impl CameraController {
    pub fn new(rotate_speed: f32, dolly_speed: f32) -> Self {
        Self {
            rotate_speed,
            dolly_speed,
            drag: None,
        }
    }

    pub fn update(&mut self, input: &FrameInput, camera: &mut OrbitCamera) {
        if !input.left_held {
            self.drag = None;
        } else if let Some(session) = self.drag.as_mut() {
            let dx = input.cursor[0] - session.last_cursor[0];
            let dy = input.cursor[1] - session.last_cursor[1];
            session.last_cursor = input.cursor;
            if dx != 0.0 || dy != 0.0 {
                camera.add_yaw((dx * self.rotate_speed).to_radians());
                camera.add_pitch((dy * self.rotate_speed).to_radians());
            }
        } else {
            // The first frame only anchors the cursor.
            self.drag = Some(DragSession {
                last_cursor: input.cursor,
            });
        }

        let dolly = input.axis(KeyCode::ArrowUp, KeyCode::ArrowDown);
        if dolly != 0.0 {
            camera.dolly(dolly * self.dolly_speed);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.drag.is_some()
    }
}
