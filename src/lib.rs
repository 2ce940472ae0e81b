//! objview
//!
//! Interactive OBJ scene viewer built on wgpu and winit: mesh import with
//! normalization, per-object transforms and baking, bounding volumes,
//! platform collision and two object picking strategies.

pub mod app;
pub mod config;
pub mod gfx;
pub mod input;
pub mod performance;
pub mod viewer;
pub mod wgpu_utils;

#[cfg(test)]
mod test_util;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::ViewerConfig;
pub use viewer::Viewer;
