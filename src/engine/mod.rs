//! Document engines: construction, blob bridging, loading and rasterization

mod blob;
mod builder;
mod layout;
#[cfg(feature = "pdf")]
mod mupdf_loader;

pub use blob::{BlobStore, BlobUrl};
pub use builder::{PageSize, TextDocumentBuilder, TextDocumentStyle, format_page_number};
pub use layout::{LaidOutLine, LaidOutPage, LayoutMetrics, layout_pages};
#[cfg(feature = "pdf")]
pub use mupdf_loader::{MupdfDocument, MupdfLoader};

/// Errors raised by the document engines
#[derive(Debug, thiserror::Error)]
pub enum EngineFault {
    #[error("PDF builder: {0}")]
    Builder(#[from] oxidize_pdf::PdfError),

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("blob storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("{detail}")]
    Generic { detail: String },
}

impl EngineFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Pixel size of a page rasterized at a given scale
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Rasterized page ready to be drawn onto a surface.
///
/// `pixels` holds tightly packed RGBA samples, `viewport.width * 4` bytes per row.
#[derive(Clone)]
pub struct PageFrame {
    pub page: usize,
    pub viewport: Viewport,
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for PageFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFrame")
            .field("page", &self.page)
            .field("viewport", &self.viewport)
            .field("pixels_len", &self.pixels.len())
            .finish_non_exhaustive()
    }
}

/// Turns content into a binary PDF document
pub trait DocumentBuilder {
    fn build(&self, content: &str) -> Result<Vec<u8>, EngineFault>;
}

/// Opens a document from a blob locator
pub trait DocumentLoader {
    type Document: LoadedDocument;

    fn load(&self, url: &BlobUrl) -> Result<Self::Document, EngineFault>;
}

/// A navigable, loaded document. Pages are 1-indexed.
pub trait LoadedDocument {
    fn page_count(&self) -> usize;

    fn render_page(&self, page: usize, scale: f32) -> Result<PageFrame, EngineFault>;
}
