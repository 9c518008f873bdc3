use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{PageSize, TextDocumentStyle};
use crate::viewer::{
    DEFAULT_OVERLAY_MARGIN, DEFAULT_SCALE, DEFAULT_WORKER_THREAD_NAME, ViewerConfig, WorkerConfig,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdfpane";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_scale")]
    pub scale: f32,

    #[serde(default = "default_overlay_margin")]
    pub overlay_margin: u32,

    #[serde(default)]
    pub reset_page_on_rebuild: bool,

    #[serde(default)]
    pub page_size: PageSize,

    #[serde(default = "default_header_label")]
    pub header_label: String,

    #[serde(default = "default_body_font_size")]
    pub body_font_size: f64,

    #[serde(default = "default_title")]
    pub title: String,

    /// Directory for blob files; system temp dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_dir: Option<PathBuf>,

    #[serde(default = "default_worker_thread_name")]
    pub worker_thread_name: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_scale() -> f32 {
    DEFAULT_SCALE
}

fn default_overlay_margin() -> u32 {
    DEFAULT_OVERLAY_MARGIN
}

fn default_header_label() -> String {
    TextDocumentStyle::default().header_label
}

fn default_body_font_size() -> f64 {
    TextDocumentStyle::default().body_font_size
}

fn default_title() -> String {
    TextDocumentStyle::default().title
}

fn default_worker_thread_name() -> String {
    DEFAULT_WORKER_THREAD_NAME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            scale: default_scale(),
            overlay_margin: default_overlay_margin(),
            reset_page_on_rebuild: false,
            page_size: PageSize::default(),
            header_label: default_header_label(),
            body_font_size: default_body_font_size(),
            title: default_title(),
            blob_dir: None,
            worker_thread_name: default_worker_thread_name(),
        }
    }
}

impl Settings {
    /// Explicit controller configuration derived from these settings
    #[must_use]
    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            scale: if self.scale > 0.0 {
                self.scale
            } else {
                warn!("Ignoring non-positive scale {}", self.scale);
                DEFAULT_SCALE
            },
            overlay_margin: self.overlay_margin,
            reset_page_on_rebuild: self.reset_page_on_rebuild,
            worker: WorkerConfig {
                thread_name: self.worker_thread_name.clone(),
                blob_dir: self.blob_dir.clone(),
            },
        }
    }

    /// Typography for the text document builder
    #[must_use]
    pub fn document_style(&self) -> TextDocumentStyle {
        TextDocumentStyle {
            page_size: self.page_size,
            title: self.title.clone(),
            header_label: self.header_label.clone(),
            body_font_size: self.body_font_size,
            ..TextDocumentStyle::default()
        }
    }
}

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `path`, or the preferred config path when `None`.
///
/// A missing file is created with defaults. Unreadable or unparsable files are
/// logged and defaults are used.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = match path.map(Path::to_path_buf).or_else(preferred_config_path) {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory, using default settings");
            return Settings::default();
        }
    };

    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        let settings = Settings::default();
        if let Err(e) = save_settings_to_file(&settings, &path) {
            error!("{e}");
        }
        return settings;
    }

    match read_settings_file(&path) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");
            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                if let Err(e) = save_settings_to_file(&settings, &path) {
                    error!("{e}");
                }
            }
            settings
        }
        Err(e) => {
            error!("{e}");
            Settings::default()
        }
    }
}

pub fn read_settings_file(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let content = format!("{SETTINGS_HEADER}{}", serde_yaml::to_string(settings)?);
    fs::write(path, content).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Saved settings to {path:?}");
    Ok(())
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# pdfpane settings
# ============================================================================
# scale:                 rasterization scale, 1.0 = one pixel per point
# overlay_margin:        extra surface rows below each page
# reset_page_on_rebuild: jump back to page 1 after a rebuild
# page_size:             a4 | letter

"#;
