//! Previous/next pagination controls

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Snapshot of the pagination controls derived from viewer state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationControls {
    pub current_page: usize,
    pub page_count: usize,
    pub previous_disabled: bool,
    pub next_disabled: bool,
}

impl PaginationControls {
    #[must_use]
    pub fn new(current_page: usize, page_count: usize) -> Self {
        Self {
            current_page,
            page_count,
            previous_disabled: current_page == 1,
            next_disabled: current_page == page_count,
        }
    }

    /// Text shown between the buttons, e.g. `2 / 5`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} / {}", self.current_page, self.page_count)
    }
}

/// One-line bar: `[< Previous]  2 / 5  [Next >]`
#[derive(Clone, Copy, Debug)]
pub struct PaginationBar {
    controls: PaginationControls,
}

impl PaginationBar {
    #[must_use]
    pub fn new(controls: PaginationControls) -> Self {
        Self { controls }
    }

    fn button(label: &'static str, disabled: bool) -> Span<'static> {
        let style = if disabled {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Span::styled(label, style)
    }

    #[must_use]
    pub fn line(&self) -> Line<'static> {
        Line::from(vec![
            Self::button("[< Previous]", self.controls.previous_disabled),
            Span::raw(format!("  {}  ", self.controls.label())),
            Self::button("[Next >]", self.controls.next_disabled),
        ])
        .centered()
    }
}

impl Widget for PaginationBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.line().render(area, buf);
    }
}
