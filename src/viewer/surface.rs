//! Drawing surface the viewer paints rendered pages onto

use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage, imageops};

use crate::engine::{EngineFault, PageFrame, Viewport};

/// RGBA canvas sized to the last rendered viewport plus an overlay margin
#[derive(Clone, Debug)]
pub struct DrawingSurface {
    image: RgbaImage,
    overlay_margin: u32,
}

impl DrawingSurface {
    #[must_use]
    pub fn new(overlay_margin: u32) -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            overlay_margin,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[must_use]
    pub fn overlay_margin(&self) -> u32 {
        self.overlay_margin
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Resize to `viewport` plus the overlay margin; the content is cleared
    pub fn resize(&mut self, viewport: Viewport) {
        self.image = RgbaImage::new(viewport.width, viewport.height + self.overlay_margin);
    }

    /// Resize to the frame's viewport and paint it at the origin
    pub fn draw(&mut self, frame: PageFrame) -> Result<(), EngineFault> {
        let PageFrame {
            page,
            viewport,
            pixels,
        } = frame;
        let Viewport { width, height } = viewport;
        let byte_count = pixels.len();
        let image: RgbaImage = ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
            EngineFault::generic(format!(
                "Frame for page {page} has {byte_count} bytes, expected {}",
                width as usize * height as usize * 4
            ))
        })?;

        self.resize(viewport);
        imageops::replace(&mut self.image, &image, 0, 0);
        Ok(())
    }

    /// Pixel at `(x, y)`, or `None` outside the surface
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    /// Write the surface as a PNG file
    pub fn save_png(&self, path: &Path) -> Result<(), EngineFault> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| EngineFault::generic(format!("Failed to write {}: {e}", path.display())))
    }
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::new(super::DEFAULT_OVERLAY_MARGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> PageFrame {
        PageFrame {
            page: 1,
            viewport: Viewport::new(width, height),
            pixels: rgba.repeat((width * height) as usize),
        }
    }

    #[test]
    fn starts_empty() {
        let surface = DrawingSurface::default();
        assert_eq!(surface.dimensions(), (0, 0));
        assert_eq!(surface.overlay_margin(), 20);
    }

    #[test]
    fn draw_sizes_surface_to_viewport_plus_margin() {
        let mut surface = DrawingSurface::new(20);
        surface.draw(solid_frame(4, 3, [255, 0, 0, 255])).unwrap();

        assert_eq!(surface.dimensions(), (4, 23));
        assert_eq!(surface.pixel(3, 2), Some(Rgba([255, 0, 0, 255])));
        // Margin below the page stays transparent
        assert_eq!(surface.pixel(0, 3), Some(Rgba([0, 0, 0, 0])));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn resize_clears_previous_content() {
        let mut surface = DrawingSurface::new(5);
        surface.draw(solid_frame(2, 2, [9, 9, 9, 255])).unwrap();
        surface.resize(Viewport::new(2, 2));

        assert_eq!(surface.dimensions(), (2, 7));
        assert_eq!(surface.pixel(0, 0), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn rejects_truncated_frames() {
        let mut surface = DrawingSurface::new(20);
        let frame = PageFrame {
            page: 1,
            viewport: Viewport::new(4, 4),
            pixels: vec![0; 10],
        };
        assert!(surface.draw(frame).is_err());
        assert_eq!(surface.dimensions(), (0, 0));
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-1.png");
        let mut surface = DrawingSurface::new(20);
        surface.draw(solid_frame(3, 3, [1, 2, 3, 255])).unwrap();
        surface.save_png(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }
}
