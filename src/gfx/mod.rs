//! # Graphics Module
//!
//! Everything between an OBJ file and a frame on screen.
//!
//! - **Scene** ([`scene`]) - objects, transforms, bounds, ingestion and persistence
//! - **Picking** ([`picking`]) - ray/box and color-id object selection
//! - **Camera** ([`camera`]) - orbit camera and its mouse/keyboard controller
//! - **Geometry** ([`geometry`]) - procedural cube, sphere and grid lines
//! - **Rendering** ([`rendering`]) - the backend trait, the wgpu engine and a headless backend
//! - **Resources** ([`resources`]) - uniform layouts and render targets
//!
//! The scene never touches wgpu. It hands buffers and matrices to a
//! [`RenderBackend`]:
//!
//! ```no_run
//! use objview::gfx::{rendering::HeadlessBackend, scene::{Scene, SceneObject}};
//! use objview::gfx::geometry::generate_cube;
//!
//! let mut backend = HeadlessBackend::new();
//! let mut scene = Scene::new();
//! let (vertices, indices) = generate_cube().to_scene_format();
//! scene.insert(SceneObject::new("cube", vertices, indices, [0.7; 3]), &mut backend);
//! ```
//!
//! [`RenderBackend`]: rendering::RenderBackend

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
