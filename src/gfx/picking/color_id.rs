//! GPU color-id picking.
//!
//! Each object is drawn in a flat color encoding `index + 1` in the low 24
//! bits of RGB (R low byte, G middle, B high). The id `0` is the cleared
//! background. After the off-screen pass the pixel under the cursor is read
//! back and decoded; anything that does not name a current object is a miss.

use cgmath::Matrix4;

use crate::gfx::rendering::backend::{PickDraw, PickFrame, RenderBackend, RenderError};
use crate::gfx::scene::Scene;

/// Largest object index that still fits in 24 bits after the `+1` shift.
pub const MAX_ENCODABLE_INDEX: usize = (1 << 24) - 2;

/// Encodes an object index as an RGB id color, or `None` if it does not fit.
pub fn encode_index(index: usize) -> Option<[u8; 3]> {
    if index > MAX_ENCODABLE_INDEX {
        return None;
    }
    let id = (index + 1) as u32;
    Some([
        (id & 0xFF) as u8,
        ((id >> 8) & 0xFF) as u8,
        ((id >> 16) & 0xFF) as u8,
    ])
}

/// Decodes an id color back to an object index; background decodes to `None`.
pub fn decode_pixel(rgb: [u8; 3]) -> Option<usize> {
    let id = rgb[0] as usize + rgb[1] as usize * 256 + rgb[2] as usize * 65536;
    id.checked_sub(1)
}

/// Decodes a read-back pixel and bounds-checks it against the scene size.
pub fn resolve(rgba: [u8; 4], object_count: usize) -> Option<usize> {
    let index = decode_pixel([rgba[0], rgba[1], rgba[2]])?;
    if index < object_count {
        Some(index)
    } else {
        log::warn!(
            "Pick read-back decoded index {} but scene has {} objects",
            index,
            object_count
        );
        None
    }
}

/// Maps a logical window cursor to a framebuffer pixel.
///
/// Returns `None` when the cursor lies outside the window or either size is zero.
pub fn window_to_framebuffer(
    cursor: [f32; 2],
    window_size: [u32; 2],
    framebuffer_size: [u32; 2],
) -> Option<[u32; 2]> {
    if window_size.contains(&0) || framebuffer_size.contains(&0) {
        return None;
    }
    if cursor[0] < 0.0
        || cursor[1] < 0.0
        || cursor[0] >= window_size[0] as f32
        || cursor[1] >= window_size[1] as f32
    {
        return None;
    }

    let sx = framebuffer_size[0] as f32 / window_size[0] as f32;
    let sy = framebuffer_size[1] as f32 / window_size[1] as f32;
    let x = ((cursor[0] * sx) as u32).min(framebuffer_size[0] - 1);
    let y = ((cursor[1] * sy) as u32).min(framebuffer_size[1] - 1);
    Some([x, y])
}

/// Builds the id-pass draw list for every object that has GPU buffers.
pub fn pick_frame(scene: &Scene, view_proj: Matrix4<f32>) -> PickFrame {
    let items = scene
        .objects()
        .iter()
        .enumerate()
        .filter_map(|(index, object)| {
            let mesh = object.mesh_handle()?;
            let id_color = encode_index(index)?;
            Some(PickDraw {
                mesh,
                model: object.model_matrix(),
                id_color,
            })
        })
        .collect();
    PickFrame { view_proj, items }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ColorIdPicker;

impl ColorIdPicker {
    pub fn new() -> Self {
        Self
    }

    /// Runs the id pass and returns the object under `cursor`, if any.
    pub fn pick<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        scene: &Scene,
        view_proj: Matrix4<f32>,
        cursor: [f32; 2],
        window_size: [u32; 2],
        framebuffer_size: [u32; 2],
    ) -> Result<Option<usize>, RenderError> {
        let Some(pixel) = window_to_framebuffer(cursor, window_size, framebuffer_size) else {
            return Ok(None);
        };

        let frame = pick_frame(scene, view_proj);
        let rgba = backend.read_pick_pixel(&frame, pixel)?;
        let hit = resolve(rgba, scene.len());
        log::debug!("Color-id pick at {:?} read {:?}: {:?}", pixel, rgba, hit);
        Ok(hit)
    }
}
