//! Headless export of rendered pages as PNG files

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::info;

use crate::engine::{DocumentBuilder, DocumentLoader};
use crate::viewer::{ViewerConfig, ViewerController, ViewerEvent};

/// How long a single build or render may take before export gives up
pub const EXPORT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// File name of an exported page
#[must_use]
pub fn page_file_name(page: usize) -> String {
    format!("page-{page}.png")
}

/// Build `content`, render every page through a controller and write
/// `page-<n>.png` files into `out_dir`. Returns the written paths in page order.
pub fn export_pages<B, L>(
    config: ViewerConfig,
    builder: B,
    loader: L,
    content: &str,
    out_dir: &Path,
) -> Result<Vec<PathBuf>>
where
    B: DocumentBuilder + Send + 'static,
    L: DocumentLoader + Send + 'static,
{
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut controller = ViewerController::spawn(config, builder, loader, |_| {})?;
    controller.sync_props(content, true);

    let mut written = Vec::new();
    let mut events = controller.wait_idle(EXPORT_STEP_TIMEOUT);
    let page_count = events
        .iter()
        .find_map(|e| match e {
            ViewerEvent::DocumentReady { page_count, .. } => Some(*page_count),
            _ => None,
        })
        .with_context(|| failure_reason(&events).unwrap_or_else(|| "Build timed out".to_string()))?;

    for page in 1..=page_count {
        if page > 1 {
            controller.go_to_next_page();
            events = controller.wait_idle(EXPORT_STEP_TIMEOUT);
        }

        let rendered = events
            .iter()
            .any(|e| matches!(e, ViewerEvent::Rendered { page: p, .. } if *p == page));
        if !rendered {
            let reason = failure_reason(&events).unwrap_or_else(|| "render timed out".to_string());
            bail!("Page {page} was not rendered: {reason}");
        }

        let path = out_dir.join(page_file_name(page));
        controller.surface().save_png(&path)?;
        info!("Exported page {page}/{page_count} to {}", path.display());
        written.push(path);
    }

    Ok(written)
}

fn failure_reason(events: &[ViewerEvent]) -> Option<String> {
    events.iter().find_map(|e| match e {
        ViewerEvent::BuildFailed { reason, .. } => Some(format!("Build failed: {reason}")),
        ViewerEvent::RenderFailed { page, reason } => {
            Some(format!("Page {page} failed: {reason}"))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeBuilder, FakeLoader};

    #[test]
    fn file_names_are_one_indexed() {
        assert_eq!(page_file_name(1), "page-1.png");
        assert_eq!(page_file_name(12), "page-12.png");
    }

    #[test]
    fn exports_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let paths = export_pages(
            ViewerConfig::default(),
            FakeBuilder::default(),
            FakeLoader::default(),
            "a\u{c}b\u{c}c",
            dir.path(),
        )
        .unwrap();

        assert_eq!(paths.len(), 3);
        for (index, path) in paths.iter().enumerate() {
            assert_eq!(path.file_name().unwrap(), page_file_name(index + 1).as_str());
            assert_eq!(image::image_dimensions(path).unwrap(), (40, 80));
        }
    }

    #[test]
    fn build_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_pages(
            ViewerConfig::default(),
            FakeBuilder::failing(),
            FakeLoader::default(),
            "x",
            dir.path(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Build failed"));
    }

    #[test]
    fn render_failure_names_the_page() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_pages(
            ViewerConfig::default(),
            FakeBuilder::default(),
            FakeLoader::failing_render_on(2),
            "a\u{c}b",
            dir.path(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Page 2"));
    }
}
