//! Blob bridge: turns document bytes into a locator the loader can open

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Dereferenceable locator for a registered blob
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobUrl(PathBuf);

impl BlobUrl {
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0.display())
    }
}

/// Registry of live blobs, each backed by a temporary file
pub struct BlobStore {
    dir: Option<PathBuf>,
    live: HashMap<BlobUrl, NamedTempFile>,
}

impl BlobStore {
    /// Create a store writing into `dir`, or the system temp dir when `None`
    #[must_use]
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            live: HashMap::new(),
        }
    }

    /// Write `bytes` to a fresh blob and return its locator
    pub fn register(&mut self, bytes: &[u8]) -> std::io::Result<BlobUrl> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pdfpane-").suffix(".pdf");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        let url = BlobUrl(file.path().to_path_buf());
        log::debug!("Registered {url} ({} bytes)", bytes.len());
        self.live.insert(url.clone(), file);
        Ok(url)
    }

    /// Release a blob. Unknown locators are ignored.
    pub fn revoke(&mut self, url: &BlobUrl) {
        let Some(file) = self.live.remove(url) else {
            return;
        };
        match file.close() {
            Ok(()) => log::debug!("Revoked {url}"),
            Err(e) => log::warn!("Failed to remove {url}: {e}"),
        }
    }

    /// Number of blobs registered and not yet revoked
    #[must_use]
    pub fn live(&self) -> usize {
        self.live.len()
    }
}

impl Drop for BlobStore {
    fn drop(&mut self) {
        let urls: Vec<_> = self.live.keys().cloned().collect();
        for url in urls {
            self.revoke(&url);
        }
    }
}
