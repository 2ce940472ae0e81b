//! Per-draw object uniform: model matrix, normal matrix and color.
//!
//! The same layout serves the lit pass and the color-id pass. In the lit
//! pass `color.w` flags unlit drawing; in the id pass `color.rgb` carries the
//! encoded id bytes scaled to `[0, 1]`.

use cgmath::{Matrix, Matrix4, SquareMatrix};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUBOContent {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Inverse transpose of `model`, or `model` itself when it is singular.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix4<f32> {
    model.invert().map(|m| m.transpose()).unwrap_or(*model)
}

impl ObjectUBOContent {
    pub fn lit(model: Matrix4<f32>, color: [f32; 3], unlit: bool) -> Self {
        let [r, g, b] = color;
        Self {
            model: model.into(),
            normal_matrix: normal_matrix(&model).into(),
            color: [r, g, b, if unlit { 1.0 } else { 0.0 }],
        }
    }

    pub fn pick(model: Matrix4<f32>, id_color: [u8; 3]) -> Self {
        let [r, g, b] = id_color.map(|c| c as f32 / 255.0);
        Self {
            model: model.into(),
            normal_matrix: Matrix4::identity().into(),
            color: [r, g, b, 1.0],
        }
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3, Vector4};

    #[test]
    fn test_pick_color_round_trips_through_unorm_bytes() {
        let content = ObjectUBOContent::pick(Matrix4::identity(), [1, 128, 255]);
        let bytes = content.color().map(|c| (c * 255.0).round() as u8);
        assert_eq!(bytes, [1, 128, 255, 255]);
    }

    #[test]
    fn test_unlit_flag_in_alpha() {
        assert_eq!(ObjectUBOContent::lit(Matrix4::identity(), [1.0; 3], true).color()[3], 1.0);
        assert_eq!(ObjectUBOContent::lit(Matrix4::identity(), [1.0; 3], false).color()[3], 0.0);
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let model = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let n = normal_matrix(&model) * Vector4::new(1.0, 1.0, 0.0, 0.0);
        // A normal on a face stretched in x tilts towards y.
        assert!((n.truncate() - Vector3::new(0.5, 1.0, 0.0)).magnitude2() < 1e-10);
    }
}
