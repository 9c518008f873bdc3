//! Viewer: pagination state, pipeline worker and the UI-thread controller

mod controller;
mod controls;
mod request;
mod state;
mod surface;
mod worker;

use std::path::PathBuf;

pub use controller::ViewerController;
pub use controls::{PaginationBar, PaginationControls};
pub use request::{BuildId, PipelineRequest, PipelineResponse, Stage};
pub use state::{Command, Effect, ViewerState};
pub use surface::DrawingSurface;
pub use worker::run_pipeline;

use crate::engine::Viewport;

/// Extra rows below the page reserved for overlays
pub const DEFAULT_OVERLAY_MARGIN: u32 = 20;
pub const DEFAULT_SCALE: f32 = 1.0;
pub const DEFAULT_WORKER_THREAD_NAME: &str = "pdfpane-pipeline";

/// Pipeline worker setup, passed explicitly at controller construction
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerConfig {
    pub thread_name: String,
    /// Directory for blob files; the system temp dir when `None`
    pub blob_dir: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            blob_dir: None,
        }
    }
}

/// Controller configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Rasterization scale, 1.0 renders one pixel per point
    pub scale: f32,
    pub overlay_margin: u32,
    /// Go back to page 1 when a rebuilt document is applied
    pub reset_page_on_rebuild: bool,
    pub worker: WorkerConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            overlay_margin: DEFAULT_OVERLAY_MARGIN,
            reset_page_on_rebuild: false,
            worker: WorkerConfig::default(),
        }
    }
}

/// Completion signals reported by the controller
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    /// The latest build was loaded and applied
    DocumentReady { id: BuildId, page_count: usize },
    /// A superseded build completed and was ignored
    BuildDiscarded { id: BuildId },
    /// The latest build failed; state is unchanged
    BuildFailed { id: BuildId, reason: String },
    /// A page was painted onto the surface
    Rendered { page: usize, viewport: Viewport },
    /// A render request was dropped
    RenderSkipped { page: usize },
    /// Rasterization or painting failed
    RenderFailed { page: usize, reason: String },
}
