//! JSON scene descriptions.
//!
//! A description stores, per object, where its geometry came from plus the
//! transform components and color. Loading re-ingests every referenced mesh
//! with the normalize flag it was imported with, then restores the rest.
//! Objects without a source file (loaded from a baked export, or built in
//! code) cannot be described this way and are skipped with a warning.

use std::path::{Path, PathBuf};

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use super::ingest::{self, IngestError, IngestOptions, ShadingMode};
use super::object::{ObjectKind, SceneObject};
use super::transform::Transform;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mesh ingestion failed: {0}")]
    Ingest(#[from] IngestError),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

pub const SCENE_FORMAT_VERSION: u32 = 1;

fn default_normalize() -> bool {
    true
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    #[serde(default)]
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation_deg: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    pub color: [f32; 3],
}

impl ObjectRecord {
    fn from_object(object: &SceneObject) -> Option<Self> {
        let path = match (object.kind(), object.source()) {
            (ObjectKind::LightMarker, _) => None,
            (ObjectKind::Mesh, Some(source)) => Some(source.path.clone()),
            (ObjectKind::Mesh, None) => {
                log::warn!("'{}' has no source file; not saved", object.name);
                return None;
            }
        };
        let t = &object.transform;
        // A baked marker carries its placement in the geometry, not the transform.
        let position = match object.kind() {
            ObjectKind::LightMarker => object.world_bounds().center().into(),
            ObjectKind::Mesh => t.position.into(),
        };
        Some(Self {
            name: object.name.clone(),
            kind: object.kind(),
            path,
            normalize: object.source().map_or(true, |s| s.normalize),
            position,
            rotation_deg: t.rotation.into(),
            scale: t.scale.into(),
            color: object.original_color,
        })
    }

    fn build(&self, shading: ShadingMode) -> Result<SceneObject> {
        let mut object = match (self.kind, &self.path) {
            (ObjectKind::LightMarker, _) => SceneObject::light_marker(Vector3::from(self.position)),
            (ObjectKind::Mesh, Some(path)) => ingest::import(
                path,
                IngestOptions {
                    normalize: self.normalize,
                    shading,
                    ..IngestOptions::default()
                },
            )?,
            (ObjectKind::Mesh, None) => {
                return Err(PersistenceError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("mesh record '{}' has no path", self.name),
                )))
            }
        };

        object.name = self.name.clone();
        object.transform = Transform::from_components(
            Vector3::from(self.position),
            Vector3::from(self.rotation_deg),
            Vector3::from(self.scale),
        );
        object.color = self.color;
        object.original_color = self.color;
        Ok(object)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

impl SceneDescription {
    pub fn from_objects(objects: &[SceneObject]) -> Self {
        Self {
            version: SCENE_FORMAT_VERSION,
            objects: objects.iter().filter_map(ObjectRecord::from_object).collect(),
        }
    }

    /// Rebuilds every object. Fails on the first record that cannot be rebuilt.
    pub fn build_objects(&self, shading: ShadingMode) -> Result<Vec<SceneObject>> {
        self.objects.iter().map(|r| r.build(shading)).collect()
    }
}

pub fn save_scene_to_file(objects: &[SceneObject], path: &Path) -> Result<usize> {
    let description = SceneDescription::from_objects(objects);
    let json = serde_json::to_string_pretty(&description)?;
    std::fs::write(path, json)?;
    log::info!(
        "Saved {} of {} objects to {}",
        description.objects.len(),
        objects.len(),
        path.display()
    );
    Ok(description.objects.len())
}

pub fn load_scene_from_file(path: &Path, shading: ShadingMode) -> Result<Vec<SceneObject>> {
    let json = std::fs::read_to_string(path)?;
    let description: SceneDescription = serde_json::from_str(&json)?;
    if description.version > SCENE_FORMAT_VERSION {
        log::warn!(
            "{} has format version {}; reading as version {}",
            path.display(),
            description.version,
            SCENE_FORMAT_VERSION
        );
    }
    let objects = description.build_objects(shading)?;
    log::info!("Loaded {} objects from {}", objects.len(), path.display());
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::temp_path;
    use cgmath::{InnerSpace, Point3};

    const TETRA_OBJ: &str = "\
v 0 0 0
v 2 0 0
v 0 2 0
v 0 0 2
f 1 3 2
f 1 2 4
f 1 4 3
f 2 3 4
";

    #[test]
    fn test_empty_description_round_trip() {
        let json = serde_json::to_string_pretty(&SceneDescription::from_objects(&[])).unwrap();
        let loaded: SceneDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.version, SCENE_FORMAT_VERSION);
        assert!(loaded.objects.is_empty());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let loaded: SceneDescription =
            serde_json::from_str(r#"{"objects":[{"name":"L","kind":"LightMarker","color":[1,1,1]}]}"#)
                .unwrap();
        let record = &loaded.objects[0];
        assert_eq!(record.scale, [1.0, 1.0, 1.0]);
        assert_eq!(record.position, [0.0, 0.0, 0.0]);
        assert!(record.normalize);
        assert_eq!(record.path, None);
    }

    #[test]
    fn test_save_and_load_restores_components() {
        let mesh_path = temp_path("tetra", "obj");
        std::fs::write(&mesh_path, TETRA_OBJ).unwrap();

        let mut mesh = ingest::import(&mesh_path, IngestOptions::default()).unwrap();
        mesh.transform = Transform::from_components(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(10.0, 20.0, 30.0),
            Vector3::new(0.5, 1.5, 2.0),
        );
        mesh.original_color = [0.2, 0.4, 0.6];
        mesh.color = [1.0, 0.0, 0.0];
        let light = SceneObject::light_marker(Vector3::new(1.2, 1.0, 2.0));
        let built_in = SceneObject::new("procedural", mesh.vertices().to_vec(), mesh.indices().to_vec(), [0.7; 3]);

        let scene_path = temp_path("scene", "json");
        let saved = save_scene_to_file(&[mesh, light, built_in], &scene_path).unwrap();
        assert_eq!(saved, 2);

        let loaded = load_scene_from_file(&scene_path, ShadingMode::Flat).unwrap();
        let _ = std::fs::remove_file(&scene_path);
        let _ = std::fs::remove_file(&mesh_path);

        assert_eq!(loaded.len(), 2);
        let mesh = &loaded[0];
        assert_eq!(mesh.transform.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.transform.rotation, Vector3::new(10.0, 20.0, 30.0));
        assert_eq!(mesh.transform.scale, Vector3::new(0.5, 1.5, 2.0));
        assert_eq!(mesh.color, [0.2, 0.4, 0.6]);
        // Re-ingested with normalization, as originally imported.
        assert!((mesh.local_bounds().max_extent() - 1.0).abs() < 1e-6);
        assert!(mesh.source().is_some());

        assert!(loaded[1].is_light());
        let light = loaded[1].transform.position;
        assert!((light - Vector3::new(1.2, 1.0, 2.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_baked_objects_keep_their_placement() {
        let mesh_path = temp_path("baked_tetra", "obj");
        std::fs::write(&mesh_path, TETRA_OBJ).unwrap();

        let mut moved = ingest::import(&mesh_path, IngestOptions::default()).unwrap();
        moved.transform.translate(Vector3::new(5.0, 0.0, 0.0));
        moved.bake();
        let mut untouched = ingest::import(&mesh_path, IngestOptions::default()).unwrap();
        untouched.bake();
        let mut light = SceneObject::light_marker(Vector3::new(1.2, 1.0, 2.0));
        light.bake();

        let scene_path = temp_path("baked_scene", "json");
        let saved = save_scene_to_file(&[moved, untouched, light], &scene_path).unwrap();
        let loaded = load_scene_from_file(&scene_path, ShadingMode::Flat).unwrap();
        let _ = std::fs::remove_file(&scene_path);
        let _ = std::fs::remove_file(&mesh_path);

        // The moved mesh no longer matches its file, so it is left out rather
        // than reloaded at its import pose.
        assert_eq!(saved, 2);
        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].source().is_some());
        assert!(loaded[0].world_bounds().center().x.abs() < 1e-5);
        assert!(loaded[1].is_light());
        let center = loaded[1].world_bounds().center();
        assert!((center - Point3::new(1.2, 1.0, 2.0)).magnitude() < 1e-4);
    }

    #[test]
    fn test_unreadable_mesh_fails_the_load() {
        let scene_path = temp_path("broken", "json");
        std::fs::write(
            &scene_path,
            r#"{"version":1,"objects":[{"name":"gone","path":"/definitely/not/here.obj","color":[1,1,1]}]}"#,
        )
        .unwrap();
        let err = load_scene_from_file(&scene_path, ShadingMode::Flat).unwrap_err();
        let _ = std::fs::remove_file(&scene_path);
        assert!(matches!(err, PersistenceError::Ingest(IngestError::Load { .. })));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let scene_path = temp_path("garbage", "json");
        std::fs::write(&scene_path, "{ not json").unwrap();
        let err = load_scene_from_file(&scene_path, ShadingMode::Flat).unwrap_err();
        let _ = std::fs::remove_file(&scene_path);
        assert!(matches!(err, PersistenceError::Json(_)));
    }
}
