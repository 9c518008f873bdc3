//! Document loader and rasterizer backed by MuPDF

use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::{BlobUrl, DocumentLoader, EngineFault, LoadedDocument, PageFrame, Viewport};

/// Opens blobs with MuPDF
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfLoader;

/// A document opened by MuPDF
pub struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl DocumentLoader for MupdfLoader {
    type Document = MupdfDocument;

    fn load(&self, url: &BlobUrl) -> Result<MupdfDocument, EngineFault> {
        let doc = Document::open(url.as_path().to_string_lossy().as_ref())?;
        let page_count = usize::try_from(doc.page_count()?).unwrap_or(0);
        if page_count == 0 {
            return Err(EngineFault::generic(format!("{url} has no pages")));
        }
        log::debug!("Loaded {url}: {page_count} page(s)");
        Ok(MupdfDocument { doc, page_count })
    }
}

impl LoadedDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render_page(&self, page: usize, scale: f32) -> Result<PageFrame, EngineFault> {
        if page == 0 || page > self.page_count {
            return Err(EngineFault::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }

        let loaded = self.doc.load_page((page - 1) as i32)?;
        let transform = Matrix::new_scale(scale, scale);
        let pixmap = loaded.to_pixmap(&transform, &Colorspace::device_rgb(), false, true)?;
        let pixels = pixmap_to_rgba(&pixmap)?;

        Ok(PageFrame {
            page,
            viewport: Viewport::new(pixmap.width(), pixmap.height()),
            pixels,
        })
    }
}

fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<Vec<u8>, EngineFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(EngineFault::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(EngineFault::generic("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row_start = y * stride;
        for px in samples[row_start..row_start + row_bytes].chunks_exact(n) {
            out.extend_from_slice(&px[..3]);
            out.push(if n > 3 { px[3] } else { u8::MAX });
        }
    }

    Ok(out)
}
