//! # Frame statistics
//!
//! Counts frames and reports the average FPS once per sampling window
//! (five seconds by default), together with the frame-time spread seen in
//! that window. The viewer shows the result in its window title.
//!
//! ```rust
//! use objview::performance::PerformanceMonitor;
//!
//! let mut monitor = PerformanceMonitor::new();
//! monitor.begin_frame();
//! // ... render frame ...
//! if monitor.end_frame() {
//!     println!("{}", monitor.get_metrics().title_suffix());
//! }
//! ```

use std::time::{Duration, Instant};

pub const DEFAULT_SAMPLE_WINDOW: Duration = Duration::from_secs(5);

/// Metrics for the most recently completed sampling window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceMetrics {
    /// Frames per second averaged over the window
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
    /// Draw items in the last frame
    pub draw_calls: u32,
    /// Vertices held by the scene in the last frame
    pub vertex_count: u32,
}

impl PerformanceMetrics {
    pub fn title_suffix(&self) -> String {
        format!("{:.1} FPS ({:.2} ms)", self.fps, self.frame_time_ms)
    }
}

pub struct PerformanceMonitor {
    sample_window: Duration,
    window_start: Instant,
    frames_in_window: u32,
    min_frame_time: Option<Duration>,
    max_frame_time: Duration,
    frame_start: Option<Instant>,
    current_metrics: PerformanceMetrics,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_SAMPLE_WINDOW)
    }

    pub fn with_window(sample_window: Duration) -> Self {
        Self::starting_at(sample_window, Instant::now())
    }

    fn starting_at(sample_window: Duration, now: Instant) -> Self {
        Self {
            sample_window,
            window_start: now,
            frames_in_window: 0,
            min_frame_time: None,
            max_frame_time: Duration::ZERO,
            frame_start: None,
            current_metrics: PerformanceMetrics::default(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Ends the frame. Returns `true` when a window closed and the metrics changed.
    pub fn end_frame(&mut self) -> bool {
        let now = Instant::now();
        let frame_time = self
            .frame_start
            .take()
            .map_or(Duration::ZERO, |start| now.duration_since(start));
        self.record_frame(frame_time, now)
    }

    fn record_frame(&mut self, frame_time: Duration, now: Instant) -> bool {
        self.frames_in_window += 1;
        self.min_frame_time = Some(self.min_frame_time.map_or(frame_time, |m| m.min(frame_time)));
        self.max_frame_time = self.max_frame_time.max(frame_time);

        let elapsed = now.duration_since(self.window_start);
        if elapsed < self.sample_window {
            return false;
        }

        let seconds = elapsed.as_secs_f32();
        let metrics = &mut self.current_metrics;
        metrics.fps = self.frames_in_window as f32 / seconds;
        metrics.frame_time_ms = seconds * 1000.0 / self.frames_in_window as f32;
        metrics.min_frame_time_ms = self.min_frame_time.unwrap_or_default().as_secs_f32() * 1000.0;
        metrics.max_frame_time_ms = self.max_frame_time.as_secs_f32() * 1000.0;
        log::debug!("{}", metrics.title_suffix());

        self.window_start = now;
        self.frames_in_window = 0;
        self.min_frame_time = None;
        self.max_frame_time = Duration::ZERO;
        true
    }

    pub fn update_render_stats(&mut self, draw_calls: u32, vertex_count: u32) {
        self.current_metrics.draw_calls = draw_calls;
        self.current_metrics.vertex_count = vertex_count;
    }

    pub fn get_metrics(&self) -> &PerformanceMetrics {
        &self.current_metrics
    }

    pub fn reset(&mut self) {
        *self = Self::with_window(self.sample_window);
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}
