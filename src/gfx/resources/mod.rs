//! GPU resource management
//!
//! Uniform layouts shared by the mesh, line and pick pipelines, plus depth
//! and off-screen color targets.

pub mod global_bindings;
pub mod object_uniform;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{GlobalBindings, GlobalUBO, GlobalUBOContent};
pub use object_uniform::ObjectUBOContent;
pub use texture_resource::TextureResource;
