//! Baked mesh export.
//!
//! Writes every mesh object as OBJ text in world space: one `o` block per
//! object with its `v` and `vn` lines and `f a//a b//b c//c` faces, indices
//! offset by the vertices written before it. Reading such a file back gives
//! one object per block, re-ingested with the configured shading and no
//! normalization.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::ingest::{self, IngestOptions};
use super::object::SceneObject;
use super::serialization::{PersistenceError, Result};

/// Writes `objects` to `out`. Light markers are skipped. Returns how many were written.
pub fn write_obj<W: Write>(objects: &[SceneObject], out: &mut W) -> std::io::Result<usize> {
    writeln!(out, "# objview baked scene")?;
    writeln!(out, "# v/vn per object, faces indexed across the whole file")?;

    let mut offset = 0usize;
    let mut written = 0;
    for object in objects.iter().filter(|o| !o.is_light()) {
        writeln!(out, "o {}", object.name)?;
        for p in object.world_positions() {
            writeln!(out, "v {} {} {}", p[0], p[1], p[2])?;
        }
        for v in object.vertices() {
            writeln!(out, "vn {} {} {}", v.normal[0], v.normal[1], v.normal[2])?;
        }
        for tri in object.indices().chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize + 1 + offset);
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        }
        offset += object.vertex_count();
        written += 1;
    }
    Ok(written)
}

/// Writes the baked scene to `path`.
pub fn export_to_file(objects: &[SceneObject], path: &Path) -> Result<usize> {
    let mut out = BufWriter::new(File::create(path)?);
    let written = write_obj(objects, &mut out)?;
    out.flush()?;
    log::info!("Exported {} objects to {}", written, path.display());
    Ok(written)
}

/// Reads a baked export back as one object per `o` block.
///
/// Baked positions are already in world space, so `options.normalize` is ignored.
pub fn load_baked(path: &Path, options: IngestOptions) -> Result<Vec<SceneObject>> {
    let raw = ingest::load_obj(path)?;
    if raw.shapes.iter().all(|s| s.indices.is_empty()) {
        log::warn!("{} contains no faces", path.display());
        return Ok(Vec::new());
    }
    raw.validate()?;

    let options = IngestOptions {
        normalize: false,
        ..options
    };
    let objects = raw
        .split_shapes()
        .iter()
        .filter(|part| !part.shapes[0].indices.is_empty())
        .map(|part| ingest::process(part.shapes[0].name.clone(), part, options))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(PersistenceError::from)?;

    log::info!("Loaded {} objects from {}", objects.len(), path.display());
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use crate::test_util::temp_path;
    use cgmath::Vector3;

    fn cube(name: &str) -> SceneObject {
        let (vertices, indices) = generate_cube().to_scene_format();
        SceneObject::new(name, vertices, indices, [0.7; 3])
    }

    #[test]
    fn test_faces_use_running_offset() {
        let objects = vec![cube("a"), cube("b"), SceneObject::light_marker(Vector3::new(0.0, 1.0, 0.0))];
        let mut out = Vec::new();
        let written = write_obj(&objects, &mut out).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(out).unwrap();
        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces.len(), 24);
        assert_eq!(faces[0], "f 1//1 2//2 3//3");
        assert_eq!(faces[12], "f 25//25 26//26 27//27");
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 48);
        assert_eq!(text.lines().filter(|l| l.starts_with("o ")).count(), 2);
    }

    #[test]
    fn test_export_writes_world_space_and_loads_per_object() {
        let mut moved = cube("moved");
        moved.transform.set_position(Vector3::new(2.0, 0.5, -1.0));
        moved.transform.set_scale(Vector3::new(2.0, 2.0, 2.0));
        let objects = vec![cube("still"), moved];
        let expected = objects[1].world_bounds_exact();

        let path = temp_path("export", "obj");
        assert_eq!(export_to_file(&objects, &path).unwrap(), 2);
        let loaded = load_baked(&path, IngestOptions::default()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "still");
        assert_eq!(loaded[1].name, "moved");
        assert!(loaded[1].transform.is_identity());

        let bounds = loaded[1].local_bounds();
        for (a, b) in [(bounds.min, expected.min), (bounds.max, expected.max)] {
            assert!((a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5 && (a.z - b.z).abs() < 1e-5);
        }
        assert_eq!(loaded[1].triangle_count(), 12);
    }

    #[test]
    fn test_missing_export_is_an_ingest_error() {
        let err = load_baked(Path::new("/definitely/not/here.obj"), IngestOptions::default()).unwrap_err();
        assert!(matches!(err, PersistenceError::Ingest(_)));
    }
}
