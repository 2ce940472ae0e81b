//! Global uniform bindings for camera and light data
//!
//! Bound to group 0 in every pipeline.

use cgmath::{Matrix4, Point3};

use crate::gfx::camera::camera_utils::convert_matrix4_to_array;
use crate::wgpu_utils::{binding_types, uniform_buffer::UniformBuffer};

/// Per-frame global data. Must match `Globals` in the shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
}
// 64 + 16 + 16 + 16 = 112 bytes

impl GlobalUBOContent {
    pub fn new(
        view_proj: Matrix4<f32>,
        eye: Point3<f32>,
        light_position: [f32; 3],
        light_color: [f32; 3],
    ) -> Self {
        let [lx, ly, lz] = light_position;
        let [r, g, b] = light_color;
        Self {
            view_proj: convert_matrix4_to_array(view_proj),
            eye: [eye.x, eye.y, eye.z, 1.0],
            light_position: [lx, ly, lz, 1.0],
            light_color: [r, g, b, 1.0],
        }
    }

    pub fn with_view_proj(view_proj: Matrix4<f32>) -> Self {
        Self::new(view_proj, Point3::new(0.0, 0.0, 0.0), [0.0; 3], [1.0; 3])
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// The global uniform buffer with its layout and bind group.
pub struct GlobalBindings {
    ubo: GlobalUBO,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let ubo = GlobalUBO::new(device);
        let layout = binding_types::uniform_layout(device, &format!("{} Layout", label));
        let bind_group =
            binding_types::uniform_bind_group(device, &layout, ubo.binding_resource(), label);
        Self {
            ubo,
            layout,
            bind_group,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, content: GlobalUBOContent) {
        self.ubo.update_content(queue, content);
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_layout_is_uniform_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 112);
        assert_eq!(std::mem::size_of::<GlobalUBOContent>() % 16, 0);
    }

    #[test]
    fn test_vectors_are_padded_homogeneous() {
        let content = GlobalUBOContent::new(
            Matrix4::identity(),
            Point3::new(0.0, 1.5, 3.0),
            [1.2, 1.0, 2.0],
            [1.0, 1.0, 1.0],
        );
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&content));
        assert_eq!(&floats[16..20], &[0.0, 1.5, 3.0, 1.0]);
        assert_eq!(&floats[20..24], &[1.2, 1.0, 2.0, 1.0]);
    }
}
