//! Fake engines and terminal helpers shared by unit and integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::{
    BlobUrl, DocumentBuilder, DocumentLoader, EngineFault, LoadedDocument, PageFrame, Viewport,
};

/// Pages in fake documents are separated by form feeds
pub const PAGE_BREAK: char = '\u{c}';

/// Width and height of a fake page at scale 1.0
pub const FAKE_PAGE_SIZE: (u32, u32) = (40, 60);

/// Builder that passes content through as the document bytes
#[derive(Clone, Debug, Default)]
pub struct FakeBuilder {
    fail: bool,
    fail_on: Option<String>,
    builds: Arc<AtomicUsize>,
}

impl FakeBuilder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Fails only when the content equals `content`
    pub fn failing_on(content: &str) -> Self {
        Self {
            fail_on: Some(content.to_string()),
            ..Self::default()
        }
    }

    /// Shared counter of `build` calls
    pub fn build_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.builds)
    }
}

impl DocumentBuilder for FakeBuilder {
    fn build(&self, content: &str) -> Result<Vec<u8>, EngineFault> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.fail || self.fail_on.as_deref() == Some(content) {
            return Err(EngineFault::generic("fake build failure"));
        }
        Ok(content.as_bytes().to_vec())
    }
}

/// Loader that reads the blob back and splits it into pages on `PAGE_BREAK`
#[derive(Clone, Debug, Default)]
pub struct FakeLoader {
    fail_load: bool,
    fail_render_on: Option<usize>,
    seen: Arc<Mutex<Vec<BlobUrl>>>,
}

impl FakeLoader {
    pub fn failing() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    pub fn failing_render_on(page: usize) -> Self {
        Self {
            fail_render_on: Some(page),
            ..Self::default()
        }
    }

    /// Every url passed to `load`, in order
    pub fn seen_urls(&self) -> Arc<Mutex<Vec<BlobUrl>>> {
        Arc::clone(&self.seen)
    }
}

impl DocumentLoader for FakeLoader {
    type Document = FakeDocument;

    fn load(&self, url: &BlobUrl) -> Result<FakeDocument, EngineFault> {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(url.clone());
        if self.fail_load {
            return Err(EngineFault::generic("fake load failure"));
        }

        let bytes = std::fs::read(url.as_path())?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(FakeDocument {
            pages: text.split(PAGE_BREAK).map(str::to_string).collect(),
            fail_render_on: self.fail_render_on,
        })
    }
}

/// Document produced by `FakeLoader`
#[derive(Debug)]
pub struct FakeDocument {
    pages: Vec<String>,
    fail_render_on: Option<usize>,
}

impl FakeDocument {
    pub fn page_text(&self, page: usize) -> Option<&str> {
        self.pages.get(page.checked_sub(1)?).map(String::as_str)
    }
}

impl LoadedDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pixels are filled with the page number so tests can tell pages apart
    fn render_page(&self, page: usize, scale: f32) -> Result<PageFrame, EngineFault> {
        if page == 0 || page > self.pages.len() {
            return Err(EngineFault::PageOutOfRange {
                page,
                page_count: self.pages.len(),
            });
        }
        if self.fail_render_on == Some(page) {
            return Err(EngineFault::generic(format!("fake render failure on page {page}")));
        }

        let width = (FAKE_PAGE_SIZE.0 as f32 * scale).round() as u32;
        let height = (FAKE_PAGE_SIZE.1 as f32 * scale).round() as u32;
        let shade = u8::try_from(page).unwrap_or(u8::MAX);
        Ok(PageFrame {
            page,
            viewport: Viewport::new(width, height),
            pixels: [shade, shade, shade, u8::MAX].repeat((width * height) as usize),
        })
    }
}

pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        /// Add a non-character key press
        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events.push(SimulatedEventSource::key(code));
            self
        }

        /// Go to the next page (press 'l')
        pub fn next_page(self) -> Self {
            self.press_char('l')
        }

        /// Go to the previous page (press 'h')
        pub fn previous_page(self) -> Self {
            self.press_char('h')
        }

        /// Request a rebuild (press 'r')
        pub fn rebuild(self) -> Self {
            self.press_char('r')
        }

        /// Quit the application (press 'q')
        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }

        lines.join("\n")
    }
}
