//! Frame-driven viewer state.
//!
//! One [`Viewer::tick`] runs the whole update for a frame:
//!
//! 1. scene commands (import, bake, save/load, delete, clear, background),
//! 2. object editing when something is selected, camera navigation otherwise,
//! 3. platform collision for every object,
//! 4. picking, on the frame the left button went down,
//! 5. selection tint.
//!
//! Rendering is left to the caller: [`Viewer::frame_draws`] returns the draw
//! list for whatever [`RenderBackend`] is in use.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use cgmath::{Deg, Rad, Vector3};
use winit::keyboard::KeyCode;

use crate::config::ViewerConfig;
use crate::gfx::camera::{Camera, CameraController, CameraManager, OrbitCamera};
use crate::gfx::geometry::generate_grid_lines;
use crate::gfx::picking::{ColorIdPicker, ObjectPicker, PickStrategy};
use crate::gfx::rendering::backend::{FrameDraws, RenderBackend};
use crate::gfx::scene::obj_export;
use crate::gfx::scene::scene::DEFAULT_LIGHT_POSITION;
use crate::gfx::scene::serialization::{self, PersistenceError};
use crate::gfx::scene::vertex::LineVertex;
use crate::gfx::scene::{ingest, IngestError, ObjectController, Scene, SceneObject};
use crate::input::FrameInput;

pub const GRID_SIZE: f32 = 20.0;
pub const GRID_DIVISIONS: u32 = 20;
pub const GRID_SUBDIVISIONS: u32 = 5;

/// Background colors on keys 1 to 8.
pub const BACKGROUND_PALETTE: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [0.46, 0.46, 0.46],
    [0.46, 0.0, 0.0],
    [0.0, 0.46, 0.0],
    [0.0, 0.0, 0.46],
    [0.46, 0.46, 0.0],
    [0.46, 0.0, 0.46],
    [0.0, 0.46, 0.46],
];

const BACKGROUND_KEYS: [KeyCode; 8] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
];

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit,
}

pub struct Viewer {
    pub config: ViewerConfig,
    pub scene: Scene,
    pub camera: CameraManager,
    object_controller: ObjectController,
    picker: ObjectPicker,
    color_picker: ColorIdPicker,
    import_queue: VecDeque<PathBuf>,
    clear_color: [f32; 3],
    grid: Vec<LineVertex>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let cam = &config.camera;
        let aspect = config.window.width.max(1) as f32 / config.window.height.max(1) as f32;
        let mut camera = OrbitCamera::looking_at(
            Vector3::from(cam.eye),
            Vector3::from(cam.target),
            aspect,
        );
        camera.fovy = Rad::from(Deg(cam.fov_deg));
        camera.znear = cam.near;
        camera.zfar = cam.far;
        let controller = CameraController::new(cam.rotate_speed, cam.dolly_speed);

        let grid = generate_grid_lines(
            GRID_SIZE,
            GRID_DIVISIONS,
            GRID_SUBDIVISIONS,
            config.platform_height,
            config.colors.grid,
        );

        Self {
            scene: Scene::new(),
            camera: CameraManager::new(camera, controller),
            object_controller: ObjectController::new(config.edit),
            picker: ObjectPicker::new(),
            color_picker: ColorIdPicker::new(),
            import_queue: VecDeque::new(),
            clear_color: config.colors.background,
            grid,
            config,
        }
    }

    /// Adds a file to be imported by the next press of O.
    pub fn queue_import(&mut self, path: impl Into<PathBuf>) {
        self.import_queue.push_back(path.into());
    }

    pub fn pending_imports(&self) -> usize {
        self.import_queue.len()
    }

    pub fn clear_color(&self) -> [f32; 3] {
        self.clear_color
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.camera.resize_projection(width, height);
    }

    /// Imports one mesh. On failure the scene is left as it was.
    pub fn import<B: RenderBackend + ?Sized>(
        &mut self,
        path: &Path,
        backend: &mut B,
    ) -> Result<usize, IngestError> {
        let object = ingest::import(path, self.config.ingest_options())?;
        Ok(self.scene.insert(object, backend))
    }

    /// Imports the next queued path, if any.
    pub fn import_next<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Option<usize> {
        let Some(path) = self.import_queue.pop_front() else {
            log::info!("Import queue is empty");
            return None;
        };
        match self.import(&path, backend) {
            Ok(index) => Some(index),
            Err(e) => {
                log::error!("Import of {} failed: {}", path.display(), e);
                None
            }
        }
    }

    /// Adds the light marker unless the scene already has one.
    pub fn add_light<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Option<usize> {
        if self.scene.has_light() {
            log::info!("Scene already has a light marker");
            return None;
        }
        let marker = SceneObject::light_marker(Vector3::from(DEFAULT_LIGHT_POSITION));
        Some(self.scene.insert(marker, backend))
    }

    /// Bakes every object and writes the baked OBJ export.
    pub fn bake_and_export<B: RenderBackend + ?Sized>(
        &mut self,
        path: &Path,
        backend: &mut B,
    ) -> Result<usize, PersistenceError> {
        self.scene.bake_all();
        if let Err(e) = self.scene.sync_gpu(backend) {
            log::warn!("Failed to upload baked geometry: {}", e);
        }
        obj_export::export_to_file(self.scene.objects(), path)
    }

    /// Replaces the scene with the objects of a baked OBJ export.
    pub fn load_baked<B: RenderBackend + ?Sized>(
        &mut self,
        path: &Path,
        backend: &mut B,
    ) -> Result<usize, PersistenceError> {
        let objects = obj_export::load_baked(path, self.config.ingest_options())?;
        Ok(self.scene.replace(objects, backend))
    }

    pub fn save_scene(&self, path: &Path) -> Result<usize, PersistenceError> {
        serialization::save_scene_to_file(self.scene.objects(), path)
    }

    /// Replaces the scene with a JSON description. On failure the scene is left as it was.
    pub fn load_scene<B: RenderBackend + ?Sized>(
        &mut self,
        path: &Path,
        backend: &mut B,
    ) -> Result<usize, PersistenceError> {
        let objects = serialization::load_scene_from_file(path, self.config.shading)?;
        Ok(self.scene.replace(objects, backend))
    }

    pub fn tick<B: RenderBackend + ?Sized>(
        &mut self,
        input: &FrameInput,
        backend: &mut B,
    ) -> TickOutcome {
        if self.handle_commands(input, backend) == TickOutcome::Exit {
            return TickOutcome::Exit;
        }

        match self.scene.selected_mut() {
            Some(object) => {
                self.object_controller.update(input, object);
            }
            None => {
                self.object_controller.end_rotation();
                self.camera.update(input);
            }
        }

        self.scene.resolve_collisions(self.config.platform_height);

        if input.left_clicked {
            self.pick(input, backend);
        }

        self.scene
            .apply_selection_tint(self.config.colors.selection, self.config.colors.override_color);

        if let Err(e) = self.scene.sync_gpu(backend) {
            log::warn!("GPU sync failed: {}", e);
        }
        TickOutcome::Continue
    }

    fn handle_commands<B: RenderBackend + ?Sized>(
        &mut self,
        input: &FrameInput,
        backend: &mut B,
    ) -> TickOutcome {
        if input.was_pressed(KeyCode::Escape) {
            return TickOutcome::Exit;
        }

        if input.was_pressed(KeyCode::KeyO) {
            self.import_next(backend);
        }
        if input.was_pressed(KeyCode::KeyL) {
            self.add_light(backend);
        }
        if input.was_pressed(KeyCode::KeyB) && !self.scene.bake_selected() {
            log::info!("Nothing selected to bake");
        }
        if input.was_pressed(KeyCode::KeyM) {
            let path = self.config.export_file.clone();
            if let Err(e) = self.bake_and_export(&path, backend) {
                log::error!("Export to {} failed: {}", path.display(), e);
            }
        }
        if input.was_pressed(KeyCode::KeyN) {
            let path = self.config.export_file.clone();
            if let Err(e) = self.load_baked(&path, backend) {
                log::error!("Loading {} failed: {}", path.display(), e);
            }
        }
        if input.was_pressed(KeyCode::F5) {
            if let Err(e) = self.save_scene(&self.config.scene_file) {
                log::error!("Saving {} failed: {}", self.config.scene_file.display(), e);
            }
        }
        if input.was_pressed(KeyCode::F9) {
            let path = self.config.scene_file.clone();
            if let Err(e) = self.load_scene(&path, backend) {
                log::error!("Loading {} failed: {}", path.display(), e);
            }
        }
        if input.was_pressed(KeyCode::Delete) {
            self.scene.delete_selected(backend);
        }
        if input.was_pressed(KeyCode::KeyC) {
            self.scene.clear(backend);
        }

        if let Some(i) = BACKGROUND_KEYS.iter().position(|&k| input.was_pressed(k)) {
            self.clear_color = BACKGROUND_PALETTE[i];
        }

        TickOutcome::Continue
    }

    fn pick<B: RenderBackend + ?Sized>(&mut self, input: &FrameInput, backend: &mut B) {
        let hit = match self.config.pick_strategy {
            PickStrategy::Analytic => {
                self.picker
                    .pick_at(input.cursor, input.window_size, &self.camera.camera, &self.scene)
            }
            PickStrategy::ColorId => self
                .color_picker
                .pick(
                    backend,
                    &self.scene,
                    self.camera.get_view_proj_matrix(),
                    input.cursor,
                    input.window_size,
                    input.framebuffer_size,
                )
                .unwrap_or_else(|e| {
                    log::warn!("Color-id pick failed: {}", e);
                    None
                }),
        };

        let previous = self.scene.selected_index();
        let selection = self.scene.select(hit);
        if selection.index() != previous {
            self.camera.end_interaction();
            self.object_controller.end_rotation();
            match self.scene.selected() {
                Some(object) => log::info!("Selected '{}'", object.name),
                None => log::info!("Selection cleared"),
            }
        }
    }

    /// Draw list for the current state: meshes, grid and debug overlays.
    pub fn frame_draws(&mut self) -> FrameDraws {
        let camera = &self.camera.camera;
        let debug = self.config.debug;
        let colors = self.config.colors;

        let mut lines = if debug.show_grid {
            self.grid.clone()
        } else {
            Vec::new()
        };
        if debug.show_normals {
            for object in self.scene.objects_mut().iter_mut().filter(|o| !o.is_light()) {
                lines.extend(object.normal_lines(colors.normals));
            }
        }
        if debug.show_bounding_box {
            if let Some(object) = self.scene.selected_mut() {
                lines.extend(object.bounds_lines(colors.bounding_box));
            }
        }

        FrameDraws {
            view_proj: self.camera.get_view_proj_matrix(),
            eye: camera.eye_position(),
            light_position: self.scene.light_position(),
            light_color: colors.light,
            clear_color: self.clear_color,
            items: self.scene.draw_items(),
            lines,
        }
    }

    /// Window title with frame statistics appended.
    pub fn title(&self, fps_summary: &str) -> String {
        let stats = self.scene.get_statistics();
        format!(
            "{} - {} - {} objects, {} triangles",
            self.config.window.title, fps_summary, stats.object_count, stats.total_triangles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use crate::gfx::rendering::headless::HeadlessBackend;
    use crate::gfx::scene::Selection;
    use crate::test_util::temp_path;

    const TETRA_OBJ: &str = "v 0 0 0\nv 2 0 0\nv 0 2 0\nv 0 0 2\nf 1 3 2\nf 1 2 4\nf 1 4 3\nf 2 3 4\n";

    fn frame() -> FrameInput {
        FrameInput::new([800, 600], [800, 600])
    }

    fn viewer_with_cube(backend: &mut HeadlessBackend) -> Viewer {
        let mut viewer = Viewer::new(ViewerConfig::default());
        let (vertices, indices) = generate_cube().to_scene_format();
        viewer
            .scene
            .insert(SceneObject::new("cube", vertices, indices, [0.7; 3]), backend);
        viewer
    }

    fn click_center() -> FrameInput {
        frame().with_cursor([400.0, 300.0], [0.0, 0.0]).with_click()
    }

    #[test]
    fn test_click_selects_and_tints() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);

        viewer.tick(&click_center(), &mut backend);
        assert_eq!(viewer.scene.selection(), Selection::Selected(0));
        assert_eq!(viewer.scene.objects()[0].color, [1.0, 0.0, 0.0]);

        let corner = frame().with_cursor([2.0, 2.0], [0.0, 0.0]).with_click();
        viewer.tick(&corner, &mut backend);
        assert_eq!(viewer.scene.selection(), Selection::None);
        assert_eq!(viewer.scene.objects()[0].color, [0.7; 3]);
    }

    #[test]
    fn test_color_id_strategy_reads_backend_pixel() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);
        viewer.config.pick_strategy = PickStrategy::ColorId;

        backend.push_pick_pixel([1, 0, 0, 255]);
        viewer.tick(&click_center(), &mut backend);
        assert_eq!(viewer.scene.selection(), Selection::Selected(0));
        assert_eq!(backend.last_pick(), Some((1, [400, 300])));

        // Stale id beyond the object count is a miss.
        backend.push_pick_pixel([9, 0, 0, 255]);
        viewer.tick(&click_center(), &mut backend);
        assert_eq!(viewer.scene.selection(), Selection::None);
    }

    #[test]
    fn test_edit_moves_selection_not_camera() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);
        viewer.tick(&click_center(), &mut backend);
        let eye = viewer.camera.camera.eye;

        let lift = frame().with_held(KeyCode::KeyW).with_held(KeyCode::ArrowUp);
        for _ in 0..10 {
            viewer.tick(&lift, &mut backend);
        }
        let y = viewer.scene.objects()[0].transform.position.y;
        assert!((y - 0.02).abs() < 1e-5);
        assert_eq!(viewer.camera.camera.eye, eye);
    }

    #[test]
    fn test_camera_moves_without_selection() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);
        let distance = viewer.camera.camera.distance;

        viewer.tick(&frame().with_held(KeyCode::ArrowUp), &mut backend);
        assert!(viewer.camera.camera.distance != distance);
    }

    #[test]
    fn test_collision_keeps_objects_on_platform() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);
        viewer.tick(&click_center(), &mut backend);

        let sink = frame().with_held(KeyCode::KeyS);
        for _ in 0..100 {
            viewer.tick(&sink, &mut backend);
        }
        let min_y = viewer.scene.objects()[0].world_bounds().min.y;
        assert!((min_y - viewer.config.platform_height).abs() < 1e-4);
    }

    #[test]
    fn test_delete_and_clear_release_buffers() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);
        viewer.tick(&frame().with_pressed(KeyCode::KeyL), &mut backend);
        assert_eq!(backend.live_meshes(), 2);

        viewer.tick(&click_center(), &mut backend);
        viewer.tick(&frame().with_pressed(KeyCode::Delete), &mut backend);
        assert_eq!(viewer.scene.len(), 1);
        assert_eq!(backend.live_meshes(), 1);
        assert_eq!(viewer.scene.selection(), Selection::None);

        viewer.tick(&frame().with_pressed(KeyCode::KeyC), &mut backend);
        assert!(viewer.scene.is_empty());
        assert_eq!(backend.live_meshes(), 0);
    }

    #[test]
    fn test_light_is_added_once() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = Viewer::new(ViewerConfig::default());
        assert!(viewer.add_light(&mut backend).is_some());
        assert!(viewer.add_light(&mut backend).is_none());
        assert_eq!(viewer.scene.light_position(), DEFAULT_LIGHT_POSITION);
    }

    #[test]
    fn test_import_queue_skips_failures() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = Viewer::new(ViewerConfig::default());
        let good = temp_path("viewer_tetra", "obj");
        std::fs::write(&good, TETRA_OBJ).unwrap();
        viewer.queue_import("/definitely/not/here.obj");
        viewer.queue_import(&good);

        let open = frame().with_pressed(KeyCode::KeyO);
        viewer.tick(&open, &mut backend);
        assert!(viewer.scene.is_empty());
        assert_eq!(viewer.pending_imports(), 1);

        viewer.tick(&open, &mut backend);
        let _ = std::fs::remove_file(&good);
        assert_eq!(viewer.scene.len(), 1);
        assert!(viewer.scene.objects()[0].name.starts_with("objview_viewer_tetra"));
        assert_eq!(backend.live_meshes(), 1);
    }

    #[test]
    fn test_background_keys() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = Viewer::new(ViewerConfig::default());
        viewer.tick(&frame().with_pressed(KeyCode::Digit3), &mut backend);
        assert_eq!(viewer.clear_color(), [0.46, 0.0, 0.0]);
        viewer.tick(&frame().with_pressed(KeyCode::Digit1), &mut backend);
        assert_eq!(viewer.frame_draws().clear_color, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_escape_exits() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = Viewer::new(ViewerConfig::default());
        assert_eq!(viewer.tick(&frame(), &mut backend), TickOutcome::Continue);
        assert_eq!(
            viewer.tick(&frame().with_pressed(KeyCode::Escape), &mut backend),
            TickOutcome::Exit
        );
    }

    #[test]
    fn test_frame_draws_overlays() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);
        let grid_len = viewer.frame_draws().lines.len();
        assert!(grid_len > 0);
        assert_eq!(viewer.frame_draws().items.len(), 1);

        viewer.tick(&click_center(), &mut backend);
        assert_eq!(viewer.frame_draws().lines.len(), grid_len + 24);

        viewer.config.debug.show_grid = false;
        viewer.config.debug.show_bounding_box = false;
        viewer.config.debug.show_normals = true;
        let draws = viewer.frame_draws();
        assert_eq!(draws.lines.len(), 2 * viewer.scene.objects()[0].vertex_count());
        backend.draw_frame(&draws).unwrap();
        assert_eq!(backend.last_frame_items(), 1);
    }

    #[test]
    fn test_bake_export_and_reload() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);
        viewer.add_light(&mut backend);
        let export = temp_path("viewer_baked", "obj");
        viewer.config.export_file = export.clone();

        viewer.tick(&click_center(), &mut backend);
        let lift = frame().with_held(KeyCode::KeyW);
        for _ in 0..50 {
            viewer.tick(&lift, &mut backend);
        }
        let before = viewer.scene.objects()[0].world_bounds();

        viewer.tick(&frame().with_pressed(KeyCode::KeyM), &mut backend);
        assert!(viewer.scene.objects()[0].transform.is_identity());

        viewer.tick(&frame().with_pressed(KeyCode::KeyN), &mut backend);
        let _ = std::fs::remove_file(&export);

        assert_eq!(viewer.scene.len(), 1);
        assert_eq!(backend.live_meshes(), 1);
        let after = viewer.scene.objects()[0].world_bounds();
        assert!((after.min.y - before.min.y).abs() < 1e-4);
        assert!((after.max.y - before.max.y).abs() < 1e-4);
    }

    #[test]
    fn test_failed_scene_load_keeps_scene() {
        let mut backend = HeadlessBackend::new();
        let mut viewer = viewer_with_cube(&mut backend);
        viewer.config.scene_file = PathBuf::from("/definitely/not/here.json");
        viewer.tick(&frame().with_pressed(KeyCode::F9), &mut backend);
        assert_eq!(viewer.scene.len(), 1);
        assert_eq!(backend.live_meshes(), 1);
    }
}
