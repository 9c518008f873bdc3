use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, error};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::Paragraph,
};

use crate::engine::{DocumentBuilder, DocumentLoader, EngineFault};
use crate::event_source::{Event, EventSource, KeyCode, KeyEvent, KeyEventKind};
use crate::surface_view::SurfaceView;
use crate::viewer::{PaginationBar, ViewerConfig, ViewerController, ViewerEvent};

const HELP: &str = "h/← previous  l/→ next  r rebuild  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Terminal host for a single viewer
pub struct App {
    controller: ViewerController,
    content: String,
    /// File the content is re-read from on rebuild
    source: Option<PathBuf>,
    /// Host-owned render request flag; the controller clears it
    render_content: Rc<Cell<bool>>,
    status: Option<String>,
}

impl App {
    /// Spawn the viewer and request the first build
    pub fn new<B, L>(
        config: ViewerConfig,
        builder: B,
        loader: L,
        content: String,
        source: Option<PathBuf>,
    ) -> Result<Self, EngineFault>
    where
        B: DocumentBuilder + Send + 'static,
        L: DocumentLoader + Send + 'static,
    {
        let render_content = Rc::new(Cell::new(true));
        let flag = Rc::clone(&render_content);
        let controller =
            ViewerController::spawn(config, builder, loader, move |value| flag.set(value))?;

        let mut app = Self {
            controller,
            content,
            source,
            render_content,
            status: None,
        };
        app.sync();
        Ok(app)
    }

    pub fn controller(&self) -> &ViewerController {
        &self.controller
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn render_content(&self) -> bool {
        self.render_content.get()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn sync(&mut self) {
        self.controller
            .sync_props(&self.content, self.render_content.get());
    }

    /// Re-read the source file, if any, and ask for a new build
    pub fn request_rebuild(&mut self) {
        if let Some(path) = &self.source {
            match fs::read_to_string(path) {
                Ok(content) => self.content = content,
                Err(e) => {
                    error!("Failed to re-read {path:?}: {e}");
                    self.status = Some(format!("Cannot read {}: {e}", path.display()));
                    return;
                }
            }
        }

        // An unchanged (content, true) pair would not count as a change
        self.render_content.set(false);
        self.sync();
        self.render_content.set(true);
        self.sync();
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.controller.go_to_previous_page(),
            KeyCode::Char('l') | KeyCode::Right => self.controller.go_to_next_page(),
            KeyCode::Char('r') => self.request_rebuild(),
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            _ => {}
        }
        None
    }

    /// Apply finished pipeline work; returns true if anything changed
    pub fn poll_viewer(&mut self) -> bool {
        let events = self.controller.poll_events();
        self.apply_events(&events);
        !events.is_empty()
    }

    /// Block until the viewer is idle or `timeout` elapses
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<ViewerEvent> {
        let events = self.controller.wait_idle(timeout);
        self.apply_events(&events);
        events
    }

    fn apply_events(&mut self, events: &[ViewerEvent]) {
        for event in events {
            match event {
                ViewerEvent::DocumentReady { .. } => self.status = None,
                ViewerEvent::BuildFailed { reason, .. } => {
                    self.status = Some(format!("Build failed: {reason}"));
                }
                ViewerEvent::RenderFailed { page, reason } => {
                    self.status = Some(format!("Page {page} failed: {reason}"));
                }
                ViewerEvent::BuildDiscarded { .. }
                | ViewerEvent::Rendered { .. }
                | ViewerEvent::RenderSkipped { .. } => {}
            }
        }
        // Echo the flag back so the next change is observed against it
        self.sync();
    }

    fn status_line(&self) -> Line<'static> {
        if let Some(status) = &self.status {
            return Line::styled(status.clone(), Style::default().fg(Color::Red));
        }
        if self.controller.state().is_building {
            return Line::styled("Building…", Style::default().add_modifier(Modifier::ITALIC));
        }
        Line::styled(HELP, Style::default().add_modifier(Modifier::DIM))
    }

    pub fn draw(&self, f: &mut Frame) {
        let [page_area, bar_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(f.area());

        f.render_widget(SurfaceView::new(self.controller.surface().image()), page_area);
        f.render_widget(PaginationBar::new(self.controller.controls()), bar_area);
        f.render_widget(Paragraph::new(self.status_line()).centered(), status_area);
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            needs_redraw = false;
        }

        if event_source.poll(tick_rate)? {
            match event_source.read()? {
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        debug!("Quit requested");
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }

        if app.poll_viewer() {
            needs_redraw = true;
        }
    }

    Ok(())
}
