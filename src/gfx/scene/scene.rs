use crate::gfx::rendering::backend::{DrawItem, RenderBackend, RenderError};

use super::collision;
use super::object::SceneObject;

/// Default light position when the scene has no light marker.
pub const DEFAULT_LIGHT_POSITION: [f32; 3] = [1.2, 1.0, 2.0];

/// Which object, if any, the user has picked.
///
/// Objects have no stable id, so any change to the collection drops back to
/// [`Selection::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Selected(usize),
}

impl Selection {
    pub fn index(self) -> Option<usize> {
        match self {
            Selection::None => None,
            Selection::Selected(i) => Some(i),
        }
    }
}

/// Ordered collection of scene objects plus the current selection.
///
/// The scene owns every object's GPU buffers: inserting uploads them and
/// every removal path releases them.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    selection: Selection,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    pub fn get_object(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    pub fn get_object_mut(&mut self, index: usize) -> Option<&mut SceneObject> {
        self.objects.get_mut(index)
    }

    pub fn get_object_names(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.name.clone()).collect()
    }

    /// Appends `object`, uploading its buffers. Returns its index.
    pub fn insert<B: RenderBackend + ?Sized>(
        &mut self,
        mut object: SceneObject,
        backend: &mut B,
    ) -> usize {
        object.name = self.ensure_unique_name(&object.name);
        object.upload(backend);
        self.objects.push(object);
        self.selection = Selection::None;

        let index = self.objects.len() - 1;
        log::info!(
            "Added '{}' at index {} ({} objects)",
            self.objects[index].name,
            index,
            self.objects.len()
        );
        index
    }

    /// Removes the object at `index` and frees its buffers.
    ///
    /// Out-of-range indices are ignored. Selection is reset either way when
    /// something was removed.
    pub fn remove<B: RenderBackend + ?Sized>(
        &mut self,
        index: usize,
        backend: &mut B,
    ) -> Option<SceneObject> {
        if index >= self.objects.len() {
            log::warn!(
                "Ignoring delete of index {} (scene has {} objects)",
                index,
                self.objects.len()
            );
            return None;
        }

        let mut object = self.objects.remove(index);
        object.release_gpu(backend);
        self.selection = Selection::None;
        log::info!(
            "Deleted '{}' ({} meshes still allocated)",
            object.name,
            backend.live_meshes()
        );
        Some(object)
    }

    /// Deletes the selected object, if any.
    pub fn delete_selected<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Option<SceneObject> {
        let index = self.selection.index()?;
        self.remove(index, backend)
    }

    /// Frees every object's buffers and empties the scene. Returns how many were removed.
    pub fn clear<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let count = self.objects.len();
        for object in &mut self.objects {
            object.release_gpu(backend);
        }
        self.objects.clear();
        self.selection = Selection::None;
        log::info!(
            "Cleared {} objects ({} meshes still allocated)",
            count,
            backend.live_meshes()
        );
        count
    }

    /// Swaps the whole collection for `objects`, releasing the old buffers first.
    pub fn replace<B: RenderBackend + ?Sized>(
        &mut self,
        objects: Vec<SceneObject>,
        backend: &mut B,
    ) -> usize {
        self.clear(backend);
        for object in objects {
            self.insert(object, backend);
        }
        self.objects.len()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selection.index()
    }

    /// Applies a pick result. Indices outside the collection clear the selection.
    pub fn select(&mut self, hit: Option<usize>) -> Selection {
        self.selection = match hit {
            Some(i) if i < self.objects.len() => Selection::Selected(i),
            Some(i) => {
                log::warn!("Pick returned stale index {}; treating as miss", i);
                Selection::None
            }
            None => Selection::None,
        };
        self.selection
    }

    pub fn deselect(&mut self) {
        self.selection = Selection::None;
    }

    pub fn selected(&self) -> Option<&SceneObject> {
        self.selection.index().and_then(|i| self.objects.get(i))
    }

    pub fn selected_mut(&mut self) -> Option<&mut SceneObject> {
        self.selection.index().and_then(|i| self.objects.get_mut(i))
    }

    /// Sets render colors: selection color for the selected object, `override_color`
    /// (or each object's own color) for the rest.
    pub fn apply_selection_tint(
        &mut self,
        selection_color: [f32; 3],
        override_color: Option<[f32; 3]>,
    ) {
        let selected = self.selection.index();
        for (i, object) in self.objects.iter_mut().enumerate() {
            object.color = if Some(i) == selected {
                selection_color
            } else {
                override_color.unwrap_or(object.original_color)
            };
        }
    }

    /// Clamps every object onto the platform.
    pub fn resolve_collisions(&mut self, plane_height: f32) {
        for object in &mut self.objects {
            collision::resolve(object, plane_height);
        }
    }

    pub fn bake_all(&mut self) {
        for object in &mut self.objects {
            object.bake();
        }
    }

    pub fn bake_selected(&mut self) -> bool {
        match self.selected_mut() {
            Some(object) => {
                object.bake();
                true
            }
            None => false,
        }
    }

    /// Position of the first light marker, or the default light position.
    pub fn light_position(&self) -> [f32; 3] {
        self.objects
            .iter()
            .find(|o| o.is_light())
            .map(|o| o.world_bounds().center().into())
            .unwrap_or(DEFAULT_LIGHT_POSITION)
    }

    pub fn has_light(&self) -> bool {
        self.objects.iter().any(|o| o.is_light())
    }

    /// Pushes baked geometry to the GPU for objects that changed.
    pub fn sync_gpu<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), RenderError> {
        for object in &mut self.objects {
            object.sync_gpu(backend)?;
        }
        Ok(())
    }

    /// Draw list in scene order.
    pub fn draw_items(&self) -> Vec<DrawItem> {
        self.objects
            .iter()
            .filter_map(|o| {
                o.mesh_handle().map(|mesh| DrawItem {
                    mesh,
                    model: o.model_matrix(),
                    color: o.color,
                    unlit: o.is_light(),
                })
            })
            .collect()
    }

    pub fn get_statistics(&self) -> SceneStatistics {
        SceneStatistics {
            object_count: self.objects.len(),
            light_count: self.objects.iter().filter(|o| o.is_light()).count(),
            total_triangles: self.objects.iter().map(|o| o.triangle_count()).sum(),
            total_vertices: self.objects.iter().map(|o| o.vertex_count()).sum(),
        }
    }

    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut test_name = desired_name.to_string();

        while self.objects.iter().any(|obj| obj.name == test_name) {
            counter += 1;
            test_name = format!("{} ({})", desired_name, counter);
        }

        test_name
    }
}

/// Scene statistics for logging and the window title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub light_count: usize,
    pub total_triangles: usize,
    pub total_vertices: usize,
}
