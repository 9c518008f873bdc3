//! Greedy line breaking and pagination of plain text

use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;

/// Column geometry used for line breaking
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
    /// Width available to a line, in points
    pub content_width: f64,
    /// Number of body lines that fit on one page
    pub lines_per_page: usize,
}

/// A single line placed on a page
#[derive(Clone, Debug, PartialEq)]
pub struct LaidOutLine {
    pub text: String,
    /// Natural width of `text`, in points
    pub width: f64,
    /// Whether the line should be stretched to the full column width
    pub justify: bool,
}

/// Body lines assigned to one page
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaidOutPage {
    pub lines: Vec<LaidOutLine>,
}

/// Break `content` into lines no wider than the column and group them into pages.
///
/// Every `\n` starts a new paragraph, so blank lines survive. The last line of a
/// paragraph is never justified. The result always holds at least one page.
pub fn layout_pages(
    content: &str,
    metrics: &LayoutMetrics,
    measure: impl Fn(&str) -> f64,
) -> Vec<LaidOutPage> {
    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        wrap_paragraph(
            paragraph.trim_end_matches('\r'),
            metrics.content_width,
            &measure,
            &mut lines,
        );
    }

    let per_page = metrics.lines_per_page.max(1);
    let mut pages: Vec<LaidOutPage> = Vec::with_capacity(lines.len().div_ceil(per_page));
    let mut current = LaidOutPage::default();
    for line in lines {
        if current.lines.len() == per_page {
            pages.push(std::mem::take(&mut current));
        }
        current.lines.push(line);
    }
    pages.push(current);
    pages
}

/// A word, or a column-wide piece of an overlong word, measured in points
#[derive(Debug)]
struct Word<'a> {
    text: &'a str,
    width: f64,
    /// Width of the space that follows, zero inside a broken word
    space: f64,
}

impl Fragment for Word<'_> {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        self.space
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

fn wrap_paragraph(
    paragraph: &str,
    max_width: f64,
    measure: &impl Fn(&str) -> f64,
    out: &mut Vec<LaidOutLine>,
) {
    let space = measure(" ");
    let mut words = Vec::new();
    for word in paragraph.split_whitespace() {
        let width = measure(word);
        if width > max_width {
            split_word(word, max_width, space, measure, &mut words);
        } else {
            words.push(Word { text: word, width, space });
        }
    }

    if words.is_empty() {
        push_line(out, String::new(), measure, false);
        return;
    }

    let lines = wrap_first_fit(&words, &[max_width]);
    let last = lines.len() - 1;
    for (index, line) in lines.into_iter().enumerate() {
        let mut text = String::new();
        let mut glue = false;
        for word in line {
            if glue {
                text.push(' ');
            }
            text.push_str(word.text);
            glue = word.space > 0.0;
        }
        push_line(out, text, measure, index < last);
    }
}

/// Split an overlong word into pieces no wider than the column
fn split_word<'a>(
    word: &'a str,
    max_width: f64,
    space: f64,
    measure: &impl Fn(&str) -> f64,
    out: &mut Vec<Word<'a>>,
) {
    let mut start = 0;
    for (offset, ch) in word.char_indices() {
        let end = offset + ch.len_utf8();
        if offset > start && measure(&word[start..end]) > max_width {
            let text = &word[start..offset];
            out.push(Word {
                text,
                width: measure(text),
                space: 0.0,
            });
            start = offset;
        }
    }
    let text = &word[start..];
    out.push(Word {
        text,
        width: measure(text),
        space,
    });
}

fn push_line(out: &mut Vec<LaidOutLine>, text: String, measure: &impl Fn(&str) -> f64, justify: bool) {
    let width = measure(&text);
    out.push(LaidOutLine {
        justify: justify && text.contains(' '),
        text,
        width,
    });
}
