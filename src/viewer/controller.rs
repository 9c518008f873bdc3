//! Viewer controller - drives the pipeline from the UI thread

use std::mem;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};

use super::request::{BuildId, PipelineRequest, PipelineResponse, Stage};
use super::state::{Command, Effect, ViewerState};
use super::surface::DrawingSurface;
use super::worker::run_pipeline;
use super::{PaginationControls, ViewerConfig, ViewerEvent};
use crate::engine::{BlobStore, DocumentBuilder, DocumentLoader, EngineFault, PageFrame};

/// Owns the pagination state and the drawing surface, and talks to the
/// pipeline worker over channels.
pub struct ViewerController {
    state: ViewerState,
    config: ViewerConfig,
    surface: DrawingSurface,
    /// Last `(content, render_content)` pair seen by `sync_props`
    synced: Option<(String, bool)>,
    set_render_content: Box<dyn FnMut(bool)>,
    request_tx: Sender<PipelineRequest>,
    response_rx: Receiver<PipelineResponse>,
    events: Vec<ViewerEvent>,
    worker: Option<JoinHandle<()>>,
}

impl ViewerController {
    /// Start the pipeline worker and create a controller with no document.
    ///
    /// `set_render_content(false)` is called each time a build result is applied.
    pub fn spawn<B, L>(
        config: ViewerConfig,
        builder: B,
        loader: L,
        set_render_content: impl FnMut(bool) + 'static,
    ) -> Result<Self, EngineFault>
    where
        B: DocumentBuilder + Send + 'static,
        L: DocumentLoader + Send + 'static,
    {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let store = BlobStore::new(config.worker.blob_dir.clone());
        let worker = std::thread::Builder::new()
            .name(config.worker.thread_name.clone())
            .spawn(move || run_pipeline(builder, loader, store, request_rx, response_tx))?;

        log::debug!("Started pipeline worker '{}'", config.worker.thread_name);

        Ok(Self {
            state: ViewerState::new(config.reset_page_on_rebuild),
            surface: DrawingSurface::new(config.overlay_margin),
            config,
            synced: None,
            set_render_content: Box::new(set_render_content),
            request_tx,
            response_rx,
            events: Vec::new(),
            worker: Some(worker),
        })
    }

    #[must_use]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    #[must_use]
    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    #[must_use]
    pub fn controls(&self) -> PaginationControls {
        PaginationControls::new(self.state.current_page, self.state.page_count)
    }

    /// Observe host props. A build starts when the pair changed since the last
    /// call and `render_content` is set.
    pub fn sync_props(&mut self, content: &str, render_content: bool) {
        let changed = self
            .synced
            .as_ref()
            .is_none_or(|(c, r)| c != content || *r != render_content);
        if !changed {
            return;
        }

        self.synced = Some((content.to_string(), render_content));
        if render_content {
            self.apply(Command::RequestBuild {
                content: content.to_string(),
            });
        }
    }

    pub fn go_to_previous_page(&mut self) {
        self.apply(Command::PreviousPage);
    }

    pub fn go_to_next_page(&mut self) {
        self.apply(Command::NextPage);
    }

    /// Apply pending worker responses and return accumulated events
    pub fn poll_events(&mut self) -> Vec<ViewerEvent> {
        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response);
        }
        mem::take(&mut self.events)
    }

    /// Like `poll_events`, but blocks up to `timeout` until at least one event
    pub fn wait_events(&mut self, timeout: Duration) -> Vec<ViewerEvent> {
        let deadline = Instant::now() + timeout;
        while self.events.is_empty() {
            match self.response_rx.recv_deadline(deadline) {
                Ok(response) => self.handle_response(response),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("Pipeline worker disconnected");
                    break;
                }
            }
        }
        self.poll_events()
    }

    /// No build or render is in flight
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.state.is_building && !self.state.is_rendering
    }

    /// Collect events until the controller is idle or `timeout` elapses
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<ViewerEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.poll_events();
        while !self.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!("Viewer still busy after {timeout:?}");
                break;
            }
            events.extend(self.wait_events(remaining));
        }
        events
    }

    fn apply(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::BuildDocument { id, content } => {
                    log::debug!("Requesting build {id} ({} bytes of content)", content.len());
                    if self
                        .request_tx
                        .send(PipelineRequest::Build { id, content })
                        .is_err()
                    {
                        self.apply(Command::BuildFailed {
                            id,
                            reason: "pipeline worker is not running".to_string(),
                        });
                    }
                }

                Effect::DiscardBuild(id) => {
                    log::debug!("Discarding result of superseded build {id}");
                    self.events.push(ViewerEvent::BuildDiscarded { id });
                }

                Effect::ReleaseDocument(document) => {
                    let _ = self.request_tx.send(PipelineRequest::Release { document });
                }

                Effect::ClearRenderRequest => (self.set_render_content)(false),

                Effect::DocumentReady { id, page_count } => {
                    log::debug!("Applied build {id}: {page_count} page(s)");
                    self.events
                        .push(ViewerEvent::DocumentReady { id, page_count });
                }

                Effect::ReportBuildFailure { id, reason } => {
                    log::error!("Build {id} failed: {reason}");
                    self.events.push(ViewerEvent::BuildFailed { id, reason });
                }

                Effect::RenderPage { document, page } => {
                    log::debug!("Rendering page {page} of build {document}");
                    let request = PipelineRequest::Render {
                        document,
                        page,
                        scale: self.config.scale,
                    };
                    if self.request_tx.send(request).is_err() {
                        self.render_failed(page, "pipeline worker is not running".to_string());
                    }
                }

                Effect::SkipRender { page } => {
                    log::debug!("Render of page {page} skipped: another render is in flight");
                    self.events.push(ViewerEvent::RenderSkipped { page });
                }
            }
        }
    }

    fn handle_response(&mut self, response: PipelineResponse) {
        match response {
            PipelineResponse::Loaded { id, page_count } => {
                self.apply(Command::DocumentLoaded { id, page_count });
            }

            PipelineResponse::Rendered { document, frame } => {
                if self.state.document == Some(document) {
                    self.paint(frame);
                } else {
                    self.render_stale(document, frame.page);
                }
            }

            PipelineResponse::Stale { document, page } => {
                self.render_stale(document, page);
            }

            PipelineResponse::Failed {
                id,
                stage: Stage::Build,
                error,
            } => {
                self.apply(Command::BuildFailed {
                    id,
                    reason: error.to_string(),
                });
            }

            PipelineResponse::Failed {
                id,
                stage: Stage::Render { page },
                error,
            } => {
                log::debug!("Render failure belongs to build {id}");
                self.render_failed(page, error.to_string());
            }
        }
    }

    fn paint(&mut self, frame: PageFrame) {
        let (page, viewport) = (frame.page, frame.viewport);
        match self.surface.draw(frame) {
            Ok(()) => {
                self.apply(Command::RenderFinished);
                self.events.push(ViewerEvent::Rendered { page, viewport });
            }
            Err(e) => self.render_failed(page, e.to_string()),
        }
    }

    fn render_failed(&mut self, page: usize, reason: String) {
        log::error!("Render of page {page} failed: {reason}");
        self.apply(Command::RenderFinished);
        self.events.push(ViewerEvent::RenderFailed { page, reason });
    }

    fn render_stale(&mut self, document: BuildId, page: usize) {
        log::debug!("Render of page {page} dropped: build {document} is no longer loaded");
        self.events.push(ViewerEvent::RenderSkipped { page });
        self.apply(Command::RenderStale { document });
    }

    /// Stop the worker and wait for it to finish the current request
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.send(PipelineRequest::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Pipeline worker panicked");
            }
        }
    }
}

impl Drop for ViewerController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
