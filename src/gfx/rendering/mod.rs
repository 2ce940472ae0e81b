//! Core rendering functionality
//!
//! The scene talks to the GPU only through [`RenderBackend`]. [`RenderEngine`]
//! implements it on wgpu; [`HeadlessBackend`] implements it without a device.

pub mod backend;
pub mod headless;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use backend::{
    DrawItem, FrameDraws, MeshHandle, PickDraw, PickFrame, RenderBackend, RenderError,
};
pub use headless::HeadlessBackend;
pub use pipeline_manager::{PipelineConfig, PipelineError, PipelineManager, VertexLayout};
pub use render_engine::{EngineInitError, RenderEngine};
