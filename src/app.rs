use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::gfx::rendering::{RenderBackend, RenderEngine, RenderError};
use crate::input::InputState;
use crate::performance::PerformanceMonitor;
use crate::viewer::{TickOutcome, Viewer};

pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    input: Option<InputState>,
    viewer: Viewer,
    monitor: PerformanceMonitor,
    startup_scene: Option<PathBuf>,
    fatal: Option<anyhow::Error>,
}

impl ViewerApp {
    pub fn new(viewer: Viewer) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                input: None,
                viewer,
                monitor: PerformanceMonitor::new(),
                startup_scene: None,
                fatal: None,
            },
        })
    }

    /// Scene description to load once the GPU is up.
    pub fn load_scene_on_start(&mut self, path: PathBuf) {
        self.app_state.startup_scene = Some(path);
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated with an error")?;

        match self.app_state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_config = &self.viewer.config.window;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(window_config.title.clone())
                    .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
            )
            .context("failed to create window")?;
        let window_handle = Arc::new(window);

        let PhysicalSize { width, height } = window_handle.inner_size();
        let vsync = window_config.vsync;
        let window_clone = window_handle.clone();
        let mut renderer = pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, vsync).await
        })
        .context("failed to initialise the renderer")?;

        self.viewer.resize(width, height);
        if let Some(path) = self.startup_scene.take() {
            if let Err(e) = self.viewer.load_scene(&path, &mut renderer) {
                log::error!("Loading {} failed: {}", path.display(), e);
            }
        }

        self.input = Some(InputState::new(
            window_handle.inner_size(),
            window_handle.scale_factor(),
        ));
        self.render_engine = Some(renderer);
        self.window = Some(window_handle);
        Ok(())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init_window(event_loop) {
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(render_engine), Some(window), Some(input)) = (
            self.render_engine.as_mut(),
            self.window.as_ref(),
            self.input.as_mut(),
        ) else {
            return;
        };

        if input.handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.viewer.resize(width, height);
                render_engine.resize(width, height);
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.monitor.begin_frame();

                let frame = input.begin_frame();
                if self.viewer.tick(&frame, render_engine) == TickOutcome::Exit {
                    event_loop.exit();
                    return;
                }

                let draws = self.viewer.frame_draws();
                match render_engine.draw_frame(&draws) {
                    Ok(()) => {}
                    Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        self.fatal = Some(anyhow::anyhow!("surface ran out of memory"));
                        event_loop.exit();
                        return;
                    }
                    Err(e) => log::warn!("Frame skipped: {}", e),
                }

                let stats = self.viewer.scene.get_statistics();
                self.monitor
                    .update_render_stats(draws.items.len() as u32, stats.total_vertices as u32);
                if self.monitor.end_frame() {
                    let suffix = self.monitor.get_metrics().title_suffix();
                    window.set_title(&self.viewer.title(&suffix));
                }
                log::trace!("{} meshes live", render_engine.live_meshes());
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
