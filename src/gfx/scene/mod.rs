//! # Scene Management Module
//!
//! The ordered object collection and everything that mutates it: mesh
//! ingestion, per-object transforms and baking, bounding boxes, platform
//! collision, interactive editing and persistence.
//!
//! ## Key Components
//!
//! - [`Scene`] - ordered objects plus the current [`Selection`]; owns GPU buffers
//! - [`SceneObject`] - geometry, pristine snapshot, transform and colors
//! - [`Transform`] - position / Euler rotation (degrees) / scale, composed as `T·Ry·Rx·Rz·S`
//! - [`Aabb`] - local and world-space axis-aligned boxes
//! - [`ingest`] - OBJ loading, face normals and unit-cube normalization
//!
//! ## Usage
//!
//! ```no_run
//! use objview::gfx::rendering::headless::HeadlessBackend;
//! use objview::gfx::scene::{ingest, IngestOptions, Scene};
//!
//! let mut backend = HeadlessBackend::new();
//! let mut scene = Scene::new();
//! let object = ingest::import("model.obj", IngestOptions::default()).unwrap();
//! scene.insert(object, &mut backend);
//! scene.resolve_collisions(-0.5);
//! ```

pub mod bounds;
pub mod collision;
pub mod debug_lines;
pub mod ingest;
pub mod obj_export;
pub mod object;
pub mod object_controller;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod serialization;
pub mod transform;
pub mod vertex;

// Re-export main types
pub use bounds::Aabb;
pub use ingest::{IngestError, IngestOptions, ShadingMode};
pub use object::{ObjectKind, SceneObject};
pub use object_controller::{EditSpeeds, ObjectController};
pub use scene::{Scene, SceneStatistics, Selection};
pub use serialization::PersistenceError;
pub use transform::Transform;
pub use vertex::{LineVertex, Vertex3D};
