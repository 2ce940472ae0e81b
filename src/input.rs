//! Per-frame input snapshot.
//!
//! [`InputState`] collects winit window events as they arrive; once per tick
//! the app calls [`InputState::begin_frame`] to get an immutable
//! [`FrameInput`] that the viewer and controllers query. Cursor positions and
//! window sizes are in logical pixels, the framebuffer size in physical ones.

use std::collections::HashSet;

use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Cursor in logical window coordinates, origin top-left.
    pub cursor: [f32; 2],
    /// Cursor movement since the previous frame.
    pub cursor_delta: [f32; 2],
    /// Logical window size.
    pub window_size: [u32; 2],
    /// Physical framebuffer size.
    pub framebuffer_size: [u32; 2],
    /// Keys currently down.
    pub held: HashSet<KeyCode>,
    /// Keys that went down during this frame.
    pub pressed: HashSet<KeyCode>,
    pub left_held: bool,
    /// Left button went down during this frame.
    pub left_clicked: bool,
}

impl FrameInput {
    pub fn new(window_size: [u32; 2], framebuffer_size: [u32; 2]) -> Self {
        Self {
            window_size,
            framebuffer_size,
            ..Default::default()
        }
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn ctrl_held(&self) -> bool {
        self.is_held(KeyCode::ControlLeft) || self.is_held(KeyCode::ControlRight)
    }

    /// `1.0` for `positive`, `-1.0` for `negative`, `0.0` for both or neither.
    pub fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_held(positive) {
            value += 1.0;
        }
        if self.is_held(negative) {
            value -= 1.0;
        }
        value
    }

    pub fn with_held(mut self, key: KeyCode) -> Self {
        self.held.insert(key);
        self
    }

    pub fn with_pressed(mut self, key: KeyCode) -> Self {
        self.held.insert(key);
        self.pressed.insert(key);
        self
    }

    pub fn with_cursor(mut self, cursor: [f32; 2], delta: [f32; 2]) -> Self {
        self.cursor = cursor;
        self.cursor_delta = delta;
        self
    }

    pub fn with_click(mut self) -> Self {
        self.left_held = true;
        self.left_clicked = true;
        self
    }
}

/// Accumulates window events between frames.
#[derive(Debug)]
pub struct InputState {
    scale_factor: f64,
    physical_size: PhysicalSize<u32>,
    cursor: [f32; 2],
    last_frame_cursor: Option<[f32; 2]>,
    held: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    left_held: bool,
    left_clicked: bool,
}

impl InputState {
    pub fn new(physical_size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        Self {
            scale_factor,
            physical_size,
            cursor: [0.0, 0.0],
            last_frame_cursor: None,
            held: HashSet::new(),
            pressed: HashSet::new(),
            left_held: false,
            left_clicked: false,
        }
    }

    /// Feeds one window event. Returns `true` when the event was consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                match state {
                    ElementState::Pressed => {
                        if !repeat {
                            self.pressed.insert(*code);
                        }
                        self.held.insert(*code);
                    }
                    ElementState::Released => {
                        self.held.remove(code);
                    }
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.set_cursor(*position);
                true
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                let pressed = *state == ElementState::Pressed;
                if pressed && !self.left_held {
                    self.left_clicked = true;
                }
                self.left_held = pressed;
                true
            }
            WindowEvent::Resized(size) => {
                self.physical_size = *size;
                false
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = *scale_factor;
                false
            }
            WindowEvent::Focused(false) => {
                self.held.clear();
                self.left_held = false;
                false
            }
            _ => false,
        }
    }

    fn set_cursor(&mut self, position: PhysicalPosition<f64>) {
        let logical = position.to_logical::<f64>(self.scale_factor);
        self.cursor = [logical.x as f32, logical.y as f32];
    }

    pub fn logical_size(&self) -> [u32; 2] {
        let logical = self.physical_size.to_logical::<f64>(self.scale_factor);
        [logical.width.round() as u32, logical.height.round() as u32]
    }

    /// Snapshots the accumulated state and clears the per-frame edges.
    pub fn begin_frame(&mut self) -> FrameInput {
        let last = self.last_frame_cursor.unwrap_or(self.cursor);
        let frame = FrameInput {
            cursor: self.cursor,
            cursor_delta: [self.cursor[0] - last[0], self.cursor[1] - last[1]],
            window_size: self.logical_size(),
            framebuffer_size: [self.physical_size.width, self.physical_size.height],
            held: self.held.clone(),
            pressed: std::mem::take(&mut self.pressed),
            left_held: self.left_held,
            left_clicked: std::mem::replace(&mut self.left_clicked, false),
        };
        self.last_frame_cursor = Some(self.cursor);
        frame
    }
}
