//! Text document builder backed by oxidize-pdf

use oxidize_pdf::{Document, Font, Page, measure_text};
use serde::{Deserialize, Serialize};

use super::layout::{LaidOutPage, LayoutMetrics, layout_pages};
use super::{DocumentBuilder, EngineFault};

const HEADER_FONT: Font = Font::Helvetica;
const BODY_FONT: Font = Font::TimesRoman;
const FOOTER_FONT: Font = Font::Helvetica;

/// Physical page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Width and height in points
    #[must_use]
    pub const fn dimensions(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

/// Geometry and typography of generated documents
#[derive(Debug, Clone, PartialEq)]
pub struct TextDocumentStyle {
    pub page_size: PageSize,
    pub title: String,
    pub header_label: String,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub padding_horizontal: f64,
    pub header_font_size: f64,
    pub header_margin_bottom: f64,
    pub body_font_size: f64,
    pub body_margin: f64,
    pub line_height: f64,
    pub footer_font_size: f64,
    /// Baseline of the page-number footer, measured from the bottom edge
    pub footer_offset: f64,
}

impl Default for TextDocumentStyle {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            title: "pdfpane document".to_string(),
            header_label: "~ Created with pdfpane ~".to_string(),
            padding_top: 35.0,
            padding_bottom: 65.0,
            padding_horizontal: 35.0,
            header_font_size: 12.0,
            header_margin_bottom: 20.0,
            body_font_size: 14.0,
            body_margin: 12.0,
            line_height: 1.2,
            footer_font_size: 12.0,
            footer_offset: 30.0,
        }
    }
}

impl TextDocumentStyle {
    fn header_baseline(&self) -> f64 {
        let (_, height) = self.page_size.dimensions();
        height - self.padding_top - self.header_font_size
    }

    fn body_top(&self) -> f64 {
        self.header_baseline() - self.header_margin_bottom - self.body_margin
    }

    fn body_bottom(&self) -> f64 {
        self.padding_bottom + self.body_margin
    }

    fn body_left(&self) -> f64 {
        self.padding_horizontal + self.body_margin
    }

    fn leading(&self) -> f64 {
        self.body_font_size * self.line_height
    }

    /// Column geometry derived from the page box
    #[must_use]
    pub fn layout_metrics(&self) -> LayoutMetrics {
        let (width, _) = self.page_size.dimensions();
        let usable = (self.body_top() - self.body_bottom()).max(0.0);
        LayoutMetrics {
            content_width: width - 2.0 * self.body_left(),
            lines_per_page: (usable / self.leading()).floor() as usize,
        }
    }
}

/// Page-number footer text, resolved once the page total is known
#[must_use]
pub fn format_page_number(current: usize, total: usize) -> String {
    format!("{current} / {total}")
}

/// Builds a paginated document: fixed header, justified body, page-number footer
#[derive(Debug, Clone, Default)]
pub struct TextDocumentBuilder {
    style: TextDocumentStyle,
}

impl TextDocumentBuilder {
    #[must_use]
    pub fn new(style: TextDocumentStyle) -> Self {
        Self { style }
    }

    #[must_use]
    pub fn style(&self) -> &TextDocumentStyle {
        &self.style
    }

    /// Lay out `content` without producing any PDF objects
    #[must_use]
    pub fn layout(&self, content: &str) -> Vec<LaidOutPage> {
        let size = self.style.body_font_size;
        layout_pages(content, &self.style.layout_metrics(), |text| {
            measure_text(text, BODY_FONT, size)
        })
    }

    fn write_centered(
        &self,
        page: &mut Page,
        text: &str,
        font: Font,
        size: f64,
        baseline: f64,
    ) -> Result<(), EngineFault> {
        let (width, _) = self.style.page_size.dimensions();
        let x = (width - measure_text(text, font.clone(), size)) / 2.0;
        page.text().set_font(font, size).at(x, baseline).write(text)?;
        Ok(())
    }

    fn write_body(&self, page: &mut Page, laid_out: &LaidOutPage) -> Result<(), EngineFault> {
        let style = &self.style;
        let column = style.layout_metrics().content_width;
        let left = style.body_left();
        let mut baseline = style.body_top() - style.body_font_size;

        for line in &laid_out.lines {
            if !line.text.is_empty() {
                let text = page.text();
                text.set_font(BODY_FONT, style.body_font_size);
                let gaps = line.text.matches(' ').count();
                if line.justify && gaps > 0 {
                    text.set_word_spacing((column - line.width) / gaps as f64);
                    text.at(left, baseline).write(&line.text)?;
                    text.set_word_spacing(0.0);
                } else {
                    text.at(left, baseline).write(&line.text)?;
                }
            }
            baseline -= style.leading();
        }
        Ok(())
    }
}

impl DocumentBuilder for TextDocumentBuilder {
    fn build(&self, content: &str) -> Result<Vec<u8>, EngineFault> {
        let style = &self.style;
        let (width, height) = style.page_size.dimensions();
        let pages = self.layout(content);
        let total = pages.len();

        let mut doc = Document::new();
        doc.set_title(style.title.clone());
        doc.set_creator("pdfpane");

        for (index, laid_out) in pages.iter().enumerate() {
            let mut page = Page::new(width, height);
            self.write_centered(
                &mut page,
                &style.header_label,
                HEADER_FONT,
                style.header_font_size,
                style.header_baseline(),
            )?;
            self.write_body(&mut page, laid_out)?;
            self.write_centered(
                &mut page,
                &format_page_number(index + 1, total),
                FOOTER_FONT,
                style.footer_font_size,
                style.footer_offset,
            )?;
            doc.add_page(page);
        }

        let mut bytes = Vec::new();
        doc.write(&mut bytes)?;
        log::debug!("Built {total} page(s), {} bytes", bytes.len());
        Ok(bytes)
    }
}
