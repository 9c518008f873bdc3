pub mod app;
pub mod engine;
pub mod event_source;
pub mod export;
pub mod panic_handler;
pub mod settings;
pub mod surface_view;
pub mod viewer;

pub mod test_utils;

pub use app::{App, AppAction, run_app_with_event_source};
pub use viewer::{ViewerConfig, ViewerController, ViewerEvent, WorkerConfig};
