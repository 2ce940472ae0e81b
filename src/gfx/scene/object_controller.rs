//! Keyboard and mouse editing of the selected object.
//!
//! Translation and scale are per-frame steps while keys are held; rotation
//! runs while Ctrl is held and maps cursor motion to yaw (x) and pitch (y).

use cgmath::Vector3;
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

use super::object::SceneObject;
use crate::input::FrameInput;

/// Per-frame step sizes and limits for object edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSpeeds {
    pub translate_step: f32,
    pub scale_step: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Degrees of rotation per pixel of cursor motion.
    pub rotate_sensitivity: f32,
}

impl Default for EditSpeeds {
    fn default() -> Self {
        Self {
            translate_step: 0.002,
            scale_step: 0.001,
            min_scale: 0.01,
            max_scale: 10.0,
            rotate_sensitivity: 0.3,
        }
    }
}

/// Rotation gesture state, alive while Ctrl is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSession {
    pub last_cursor: [f32; 2],
}

#[derive(Debug, Default)]
pub struct ObjectController {
    pub speeds: EditSpeeds,
    rotation: Option<RotationSession>,
}

impl ObjectController {
    pub fn new(speeds: EditSpeeds) -> Self {
        Self {
            speeds,
            rotation: None,
        }
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation.is_some()
    }

    pub fn end_rotation(&mut self) {
        self.rotation = None;
    }

    /// Applies this frame's edits to `object`. Returns `true` if anything changed.
    pub fn update(&mut self, input: &FrameInput, object: &mut SceneObject) -> bool {
        let translated = self.translate(input, object);
        let scaled = self.scale(input, object);
        let rotated = self.rotate(input, object);
        translated || scaled || rotated
    }

    fn translate(&self, input: &FrameInput, object: &mut SceneObject) -> bool {
        let step = self.speeds.translate_step;
        let delta = Vector3::new(
            input.axis(KeyCode::KeyD, KeyCode::KeyA),
            input.axis(KeyCode::KeyW, KeyCode::KeyS),
            input.axis(KeyCode::KeyE, KeyCode::KeyQ),
        ) * step;

        if delta == Vector3::new(0.0, 0.0, 0.0) {
            return false;
        }
        object.transform.translate(delta);
        true
    }

    fn scale(&self, input: &FrameInput, object: &mut SceneObject) -> bool {
        let step = self.speeds.scale_step;
        let delta = Vector3::new(
            input.axis(KeyCode::KeyJ, KeyCode::KeyG),
            input.axis(KeyCode::KeyY, KeyCode::KeyH),
            input.axis(KeyCode::KeyU, KeyCode::KeyT),
        ) * step;

        if delta == Vector3::new(0.0, 0.0, 0.0) {
            return false;
        }
        object
            .transform
            .scale_by(delta, self.speeds.min_scale, self.speeds.max_scale);
        true
    }

    fn rotate(&mut self, input: &FrameInput, object: &mut SceneObject) -> bool {
        if !input.ctrl_held() {
            self.rotation = None;
            return false;
        }

        let (dx, dy) = match self.rotation.as_mut() {
            Some(session) => {
                let delta = (
                    input.cursor[0] - session.last_cursor[0],
                    input.cursor[1] - session.last_cursor[1],
                );
                session.last_cursor = input.cursor;
                delta
            }
            None => {
                self.rotation = Some(RotationSession {
                    last_cursor: input.cursor,
                });
                return false;
            }
        };
        if dx == 0.0 && dy == 0.0 {
            return false;
        }

        let sensitivity = self.speeds.rotate_sensitivity;
        object
            .transform
            .rotate(Vector3::new(dy * sensitivity, dx * sensitivity, 0.0));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;

    fn cube() -> SceneObject {
        let (vertices, indices) = generate_cube().to_scene_format();
        SceneObject::new("cube", vertices, indices, [0.7; 3])
    }

    #[test]
    fn test_wasdqe_translate() {
        let mut controller = ObjectController::default();
        let mut object = cube();
        let input = FrameInput::default()
            .with_held(KeyCode::KeyW)
            .with_held(KeyCode::KeyA)
            .with_held(KeyCode::KeyE);

        assert!(controller.update(&input, &mut object));
        let p = object.transform.position;
        assert!((p.y - 0.002).abs() < 1e-7);
        assert!((p.x + 0.002).abs() < 1e-7);
        assert!((p.z - 0.002).abs() < 1e-7);
    }

    #[test]
    fn test_scale_keys_clamp() {
        let mut controller = ObjectController::new(EditSpeeds {
            scale_step: 5.0,
            ..EditSpeeds::default()
        });
        let mut object = cube();

        controller.update(&FrameInput::default().with_held(KeyCode::KeyY), &mut object);
        assert_eq!(object.transform.scale.y, 6.0);
        controller.update(&FrameInput::default().with_held(KeyCode::KeyY), &mut object);
        assert_eq!(object.transform.scale.y, 10.0);

        for _ in 0..5 {
            controller.update(&FrameInput::default().with_held(KeyCode::KeyG), &mut object);
        }
        assert_eq!(object.transform.scale.x, 0.01);
    }

    #[test]
    fn test_ctrl_drag_rotates_after_anchor() {
        let mut controller = ObjectController::default();
        let mut object = cube();

        let anchor = FrameInput::default()
            .with_held(KeyCode::ControlLeft)
            .with_cursor([10.0, 10.0], [0.0, 0.0]);
        assert!(!controller.update(&anchor, &mut object));
        assert!(controller.is_rotating());

        let moved = FrameInput::default()
            .with_held(KeyCode::ControlLeft)
            .with_cursor([20.0, 30.0], [10.0, 20.0]);
        assert!(controller.update(&moved, &mut object));
        assert!((object.transform.rotation.y - 3.0).abs() < 1e-5);
        assert!((object.transform.rotation.x - 6.0).abs() < 1e-5);

        controller.update(&FrameInput::default(), &mut object);
        assert!(!controller.is_rotating());
    }

    #[test]
    fn test_idle_frame_changes_nothing() {
        let mut controller = ObjectController::default();
        let mut object = cube();
        assert!(!controller.update(&FrameInput::default(), &mut object));
        assert!(object.transform.is_identity());
    }
}
