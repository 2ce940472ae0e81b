//! Render backend interface
//!
//! The scene core never talks to wgpu directly. Everything it needs from a
//! GPU is expressed here: mesh buffers identified by opaque handles, a
//! per-frame draw list built from final matrices, and a color-id pick pass
//! that reads back a single pixel.

use cgmath::{Matrix4, Point3};

use crate::gfx::scene::vertex::{LineVertex, Vertex3D};

/// Opaque handle to a mesh's GPU buffers (vertex, index and per-object uniform).
///
/// Owned exclusively by one scene object; never shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub(crate) u64);

impl std::fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("failed to map pick read-back buffer: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
    #[error("pick read-back channel closed before the map callback ran")]
    ReadbackCancelled,
    #[error("unknown mesh handle {0}")]
    UnknownMesh(MeshHandle),
    #[error("pick pixel ({x}, {y}) lies outside the {width}x{height} pick target")]
    PixelOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// One lit or unlit mesh draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub mesh: MeshHandle,
    pub model: Matrix4<f32>,
    pub color: [f32; 3],
    /// Light markers are drawn in flat color without shading.
    pub unlit: bool,
}

/// Everything the backend needs to draw one visible frame.
#[derive(Debug, Clone)]
pub struct FrameDraws {
    pub view_proj: Matrix4<f32>,
    pub eye: Point3<f32>,
    pub light_position: [f32; 3],
    pub light_color: [f32; 3],
    pub clear_color: [f32; 3],
    pub items: Vec<DrawItem>,
    /// World-space line list (grid and debug overlays).
    pub lines: Vec<LineVertex>,
}

/// One mesh draw in the color-id pass.
#[derive(Debug, Clone, Copy)]
pub struct PickDraw {
    pub mesh: MeshHandle,
    pub model: Matrix4<f32>,
    /// Encoded object id, see [`crate::gfx::picking::color_id`].
    pub id_color: [u8; 3],
}

/// Draw list of the off-screen color-id pass.
#[derive(Debug, Clone)]
pub struct PickFrame {
    pub view_proj: Matrix4<f32>,
    pub items: Vec<PickDraw>,
}

/// GPU collaborator consumed by the scene core.
pub trait RenderBackend {
    /// Allocates vertex and index buffers for a mesh.
    fn upload_mesh(&mut self, vertices: &[Vertex3D], indices: &[u32]) -> MeshHandle;

    /// Overwrites the vertex buffer of an existing mesh (same vertex count).
    fn update_vertices(&mut self, mesh: MeshHandle, vertices: &[Vertex3D])
        -> Result<(), RenderError>;

    /// Releases every buffer owned by `mesh`. Unknown handles are ignored.
    fn release_mesh(&mut self, mesh: MeshHandle);

    /// Number of meshes whose buffers are currently allocated.
    fn live_meshes(&self) -> usize;

    fn draw_frame(&mut self, frame: &FrameDraws) -> Result<(), RenderError>;

    /// Renders `frame` into the off-screen id target and returns the RGBA
    /// bytes of the pixel at `pixel` (framebuffer coordinates, origin top-left).
    fn read_pick_pixel(&mut self, frame: &PickFrame, pixel: [u32; 2])
        -> Result<[u8; 4], RenderError>;
}
