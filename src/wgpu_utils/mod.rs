//! WGPU utility functions and helpers
//!
//! Small wrappers for typed uniform buffers and single-uniform bind groups.

pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use binding_types::*;
pub use uniform_buffer::UniformBuffer;
