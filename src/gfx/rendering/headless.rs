//! Window-less render backend.
//!
//! Keeps CPU-side bookkeeping of mesh allocations so buffer lifetimes can be
//! checked without a GPU, and answers pick read-backs from a scripted queue.
//! Batch export runs on it as well.

use std::collections::{HashMap, VecDeque};

use super::backend::{FrameDraws, MeshHandle, PickFrame, RenderBackend, RenderError};
use crate::gfx::scene::vertex::Vertex3D;

#[derive(Debug, Clone)]
struct HeadlessMesh {
    vertex_count: usize,
    index_count: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    meshes: HashMap<MeshHandle, HeadlessMesh>,
    next_handle: u64,
    total_uploads: usize,
    total_releases: usize,
    vertex_updates: usize,
    frames_drawn: usize,
    last_frame_items: usize,
    pick_pixels: VecDeque<[u8; 4]>,
    last_pick: Option<(usize, [u32; 2])>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the RGBA value returned by the next pick read-back.
    pub fn push_pick_pixel(&mut self, rgba: [u8; 4]) {
        self.pick_pixels.push_back(rgba);
    }

    pub fn total_uploads(&self) -> usize {
        self.total_uploads
    }

    pub fn total_releases(&self) -> usize {
        self.total_releases
    }

    pub fn vertex_updates(&self) -> usize {
        self.vertex_updates
    }

    pub fn frames_drawn(&self) -> usize {
        self.frames_drawn
    }

    pub fn last_frame_items(&self) -> usize {
        self.last_frame_items
    }

    /// Item count and pixel of the most recent pick pass.
    pub fn last_pick(&self) -> Option<(usize, [u32; 2])> {
        self.last_pick
    }

    pub fn is_live(&self, mesh: MeshHandle) -> bool {
        self.meshes.contains_key(&mesh)
    }

    pub fn vertex_count(&self, mesh: MeshHandle) -> Option<usize> {
        self.meshes.get(&mesh).map(|m| m.vertex_count)
    }

    pub fn index_count(&self, mesh: MeshHandle) -> Option<usize> {
        self.meshes.get(&mesh).map(|m| m.index_count)
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload_mesh(&mut self, vertices: &[Vertex3D], indices: &[u32]) -> MeshHandle {
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;
        self.total_uploads += 1;
        self.meshes.insert(
            handle,
            HeadlessMesh {
                vertex_count: vertices.len(),
                index_count: indices.len(),
            },
        );
        handle
    }

    fn update_vertices(
        &mut self,
        mesh: MeshHandle,
        vertices: &[Vertex3D],
    ) -> Result<(), RenderError> {
        let entry = self
            .meshes
            .get_mut(&mesh)
            .ok_or(RenderError::UnknownMesh(mesh))?;
        entry.vertex_count = vertices.len();
        self.vertex_updates += 1;
        Ok(())
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        if self.meshes.remove(&mesh).is_some() {
            self.total_releases += 1;
        }
    }

    fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    fn draw_frame(&mut self, frame: &FrameDraws) -> Result<(), RenderError> {
        if let Some(item) = frame.items.iter().find(|i| !self.meshes.contains_key(&i.mesh)) {
            return Err(RenderError::UnknownMesh(item.mesh));
        }
        self.frames_drawn += 1;
        self.last_frame_items = frame.items.len();
        Ok(())
    }

    fn read_pick_pixel(
        &mut self,
        frame: &PickFrame,
        pixel: [u32; 2],
    ) -> Result<[u8; 4], RenderError> {
        self.last_pick = Some((frame.items.len(), pixel));
        Ok(self.pick_pixels.pop_front().unwrap_or([0, 0, 0, 0]))
    }
}
