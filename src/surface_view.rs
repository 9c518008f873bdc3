//! Half-block terminal rendering of the drawing surface
//!
//! Each cell shows two vertically stacked pixels: the upper one as the `▀`
//! foreground and the lower one as the background.

use image::{Rgba, RgbaImage};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

const UPPER_HALF: &str = "▀";

/// Draws an RGBA image scaled to fit the area, centered horizontally
#[derive(Clone, Copy, Debug)]
pub struct SurfaceView<'a> {
    image: &'a RgbaImage,
}

impl<'a> SurfaceView<'a> {
    #[must_use]
    pub fn new(image: &'a RgbaImage) -> Self {
        Self { image }
    }

    /// Output size in (columns, pixel rows) for an area
    fn fit(&self, area: Rect) -> (u32, u32) {
        let (width, height) = self.image.dimensions();
        let cols = u32::from(area.width);
        let rows = u32::from(area.height) * 2;
        let scale = (f64::from(cols) / f64::from(width)).min(f64::from(rows) / f64::from(height));
        let out_w = ((f64::from(width) * scale).floor() as u32).clamp(1, cols);
        let out_h = ((f64::from(height) * scale).floor() as u32).clamp(1, rows);
        (out_w, out_h)
    }
}

fn to_color(pixel: Rgba<u8>) -> Color {
    let Rgba([r, g, b, a]) = pixel;
    if a == 0 {
        Color::Reset
    } else {
        Color::Rgb(r, g, b)
    }
}

impl Widget for SurfaceView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 || area.is_empty() {
            return;
        }

        let (out_w, out_h) = self.fit(area);
        let sample = |x: u32, y: u32| {
            let src_x = (x * width / out_w).min(width - 1);
            let src_y = (y * height / out_h).min(height - 1);
            to_color(*self.image.get_pixel(src_x, src_y))
        };

        let x_offset = (u32::from(area.width) - out_w) / 2;
        for row in 0..out_h.div_ceil(2) {
            for col in 0..out_w {
                let top = sample(col, row * 2);
                let bottom = if row * 2 + 1 < out_h {
                    sample(col, row * 2 + 1)
                } else {
                    Color::Reset
                };

                let x = area.x + (x_offset + col) as u16;
                let y = area.y + row as u16;
                let cell = &mut buf[(x, y)];
                if top == Color::Reset && bottom == Color::Reset {
                    cell.set_symbol(" ");
                } else {
                    cell.set_symbol(UPPER_HALF).set_fg(top).set_bg(bottom);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |_, y| {
            if y < height / 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn empty_image_draws_nothing() {
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        SurfaceView::new(&RgbaImage::new(0, 0)).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }

    #[test]
    fn pixels_map_to_half_blocks() {
        let image = two_tone(2, 4);
        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        SurfaceView::new(&image).render(area, &mut buf);

        let top = &buf[(0, 0)];
        assert_eq!(top.symbol(), UPPER_HALF);
        assert_eq!(top.fg, Color::Rgb(255, 0, 0));
        assert_eq!(top.bg, Color::Rgb(255, 0, 0));

        let bottom = &buf[(1, 1)];
        assert_eq!(bottom.fg, Color::Rgb(0, 0, 255));
        assert_eq!(bottom.bg, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn keeps_aspect_ratio_and_centers() {
        // 10x20 pixels into 20 columns by 10 rows (20 pixel rows): 10 columns wide
        let image = two_tone(10, 20);
        let area = Rect::new(0, 0, 20, 10);
        let mut buf = Buffer::empty(area);
        SurfaceView::new(&image).render(area, &mut buf);

        assert_eq!(buf[(4, 0)].symbol(), " ");
        assert_eq!(buf[(5, 0)].symbol(), UPPER_HALF);
        assert_eq!(buf[(14, 9)].symbol(), UPPER_HALF);
        assert_eq!(buf[(15, 9)].symbol(), " ");
    }

    #[test]
    fn transparent_pixels_stay_blank() {
        let image = RgbaImage::new(2, 2);
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        SurfaceView::new(&image).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(0, 0)].fg, Color::Reset);
    }
}
