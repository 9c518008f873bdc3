//! Pagination and pipeline state for the viewer

use super::request::BuildId;

/// Current state of the viewer.
///
/// Pages are 1-indexed. Once a document is applied `1 <= current_page <= page_count`;
/// before that navigation is inert.
#[derive(Clone, Debug)]
pub struct ViewerState {
    /// Current page (1-indexed)
    pub current_page: usize,

    /// Page count of the applied document, 0 before the first load
    pub page_count: usize,

    /// Render-in-flight guard
    pub is_rendering: bool,

    /// The latest build has not completed yet
    pub is_building: bool,

    /// Build whose document is currently applied
    pub document: Option<BuildId>,

    latest_build: Option<BuildId>,
    next_build: BuildId,
    reset_page_on_rebuild: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ViewerState {
    #[must_use]
    pub fn new(reset_page_on_rebuild: bool) -> Self {
        Self {
            current_page: 1,
            page_count: 0,
            is_rendering: false,
            is_building: false,
            document: None,
            latest_build: None,
            next_build: BuildId::new(1),
            reset_page_on_rebuild,
        }
    }

    /// Most recently issued build, applied or not
    #[must_use]
    pub fn latest_build(&self) -> Option<BuildId> {
        self.latest_build
    }

    #[must_use]
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::RequestBuild { content } => {
                let id = self.next_build;
                self.next_build = id.next();
                self.latest_build = Some(id);
                self.is_building = true;
                vec![Effect::BuildDocument { id, content }]
            }

            Command::DocumentLoaded { id, page_count } => {
                if self.latest_build != Some(id) {
                    return vec![Effect::DiscardBuild(id), Effect::ReleaseDocument(id)];
                }

                self.is_building = false;
                let previous = self.document.replace(id);
                self.page_count = page_count;
                self.current_page = if self.reset_page_on_rebuild {
                    1
                } else {
                    self.current_page.clamp(1, page_count.max(1))
                };

                let mut effects = vec![
                    Effect::ClearRenderRequest,
                    Effect::DocumentReady { id, page_count },
                ];
                effects.extend(previous.map(Effect::ReleaseDocument));
                effects.extend(self.render_current_page());
                effects
            }

            Command::BuildFailed { id, reason } => {
                if self.latest_build == Some(id) {
                    self.is_building = false;
                    vec![Effect::ReportBuildFailure { id, reason }]
                } else {
                    vec![Effect::DiscardBuild(id)]
                }
            }

            Command::PreviousPage => {
                let target = self.current_page.saturating_sub(1).max(1);
                self.go_to(target)
            }

            Command::NextPage => {
                let target = (self.current_page + 1).min(self.page_count);
                self.go_to(target)
            }

            Command::RenderFinished => {
                self.is_rendering = false;
                vec![]
            }

            Command::RenderStale { document } => {
                self.is_rendering = false;
                if self.document == Some(document) {
                    return vec![];
                }
                // The handle changed while this render was in flight
                self.render_current_page().into_iter().collect()
            }
        }
    }

    fn go_to(&mut self, page: usize) -> Vec<Effect> {
        if !self.has_document() || page == self.current_page {
            return vec![];
        }
        self.current_page = page;
        self.render_current_page().into_iter().collect()
    }

    fn render_current_page(&mut self) -> Option<Effect> {
        let document = self.document?;
        if self.is_rendering {
            return Some(Effect::SkipRender {
                page: self.current_page,
            });
        }
        self.is_rendering = true;
        Some(Effect::RenderPage {
            document,
            page: self.current_page,
        })
    }
}

/// Commands that modify viewer state
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// The host asked for a rebuild from `content`
    RequestBuild { content: String },
    /// The worker loaded the document of build `id`
    DocumentLoaded { id: BuildId, page_count: usize },
    /// Build `id` failed to build or load
    BuildFailed { id: BuildId, reason: String },
    /// Go one page back
    PreviousPage,
    /// Go one page forward
    NextPage,
    /// The in-flight render completed or failed
    RenderFinished,
    /// The in-flight render targeted a document that is no longer held
    RenderStale { document: BuildId },
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Send a build request to the worker
    BuildDocument { id: BuildId, content: String },
    /// A superseded build completed; its result is dropped
    DiscardBuild(BuildId),
    /// The worker may drop the handle loaded by this build
    ReleaseDocument(BuildId),
    /// Tell the host its render request was consumed
    ClearRenderRequest,
    /// A new document handle was applied
    DocumentReady { id: BuildId, page_count: usize },
    /// The latest build failed
    ReportBuildFailure { id: BuildId, reason: String },
    /// Rasterize `page` of `document` onto the surface
    RenderPage { document: BuildId, page: usize },
    /// A render was requested while another was in flight
    SkipRender { page: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(page_count: usize) -> ViewerState {
        let mut state = ViewerState::default();
        let _ = state.apply(Command::RequestBuild {
            content: "Hello".to_string(),
        });
        let _ = state.apply(Command::DocumentLoaded {
            id: BuildId::new(1),
            page_count,
        });
        let _ = state.apply(Command::RenderFinished);
        state
    }

    #[test]
    fn request_build_allocates_increasing_ids() {
        let mut state = ViewerState::default();
        let first = state.apply(Command::RequestBuild {
            content: "a".to_string(),
        });
        let second = state.apply(Command::RequestBuild {
            content: "b".to_string(),
        });

        assert_eq!(
            first,
            vec![Effect::BuildDocument {
                id: BuildId::new(1),
                content: "a".to_string()
            }]
        );
        assert_eq!(
            second,
            vec![Effect::BuildDocument {
                id: BuildId::new(2),
                content: "b".to_string()
            }]
        );
        assert_eq!(state.latest_build(), Some(BuildId::new(2)));
        assert!(state.is_building);
    }

    #[test]
    fn first_load_clears_request_and_renders_page_one() {
        let mut state = ViewerState::default();
        let _ = state.apply(Command::RequestBuild {
            content: "Hello".to_string(),
        });
        let effects = state.apply(Command::DocumentLoaded {
            id: BuildId::new(1),
            page_count: 3,
        });

        assert_eq!(
            effects,
            vec![
                Effect::ClearRenderRequest,
                Effect::DocumentReady {
                    id: BuildId::new(1),
                    page_count: 3
                },
                Effect::RenderPage {
                    document: BuildId::new(1),
                    page: 1
                },
            ]
        );
        assert_eq!(state.current_page, 1);
        assert_eq!(state.page_count, 3);
        assert!(state.is_rendering);
    }

    #[test]
    fn navigation_before_load_is_inert() {
        let mut state = ViewerState::default();
        assert!(state.apply(Command::NextPage).is_empty());
        assert!(state.apply(Command::PreviousPage).is_empty());
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn next_and_previous_are_clamped() {
        for page_count in 1..=6 {
            for start in 1..=page_count {
                let mut state = loaded(page_count);
                state.current_page = start;
                let _ = state.apply(Command::NextPage);
                assert_eq!(state.current_page, (start + 1).min(page_count));

                let mut state = loaded(page_count);
                state.current_page = start;
                let _ = state.apply(Command::PreviousPage);
                assert_eq!(state.current_page, start.saturating_sub(1).max(1));
            }
        }
    }

    #[test]
    fn next_on_last_page_is_noop() {
        let mut state = loaded(3);
        state.current_page = 3;
        assert!(state.apply(Command::NextPage).is_empty());
        assert_eq!(state.current_page, 3);
    }

    #[test]
    fn previous_on_first_page_is_noop() {
        let mut state = loaded(3);
        assert!(state.apply(Command::PreviousPage).is_empty());
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn page_change_renders_when_idle() {
        let mut state = loaded(3);
        let effects = state.apply(Command::NextPage);
        assert_eq!(
            effects,
            vec![Effect::RenderPage {
                document: BuildId::new(1),
                page: 2
            }]
        );
        assert!(state.is_rendering);
    }

    #[test]
    fn page_change_during_render_is_skipped() {
        let mut state = loaded(3);
        let _ = state.apply(Command::NextPage);

        let effects = state.apply(Command::NextPage);
        assert_eq!(effects, vec![Effect::SkipRender { page: 3 }]);
        assert_eq!(state.current_page, 3);

        let _ = state.apply(Command::RenderFinished);
        assert!(!state.is_rendering);
        // Nothing queued behind the finished render
        assert!(state.apply(Command::RenderFinished).is_empty());
    }

    #[test]
    fn stale_build_is_discarded() {
        let mut state = ViewerState::default();
        let _ = state.apply(Command::RequestBuild {
            content: "old".to_string(),
        });
        let _ = state.apply(Command::RequestBuild {
            content: "new".to_string(),
        });

        let effects = state.apply(Command::DocumentLoaded {
            id: BuildId::new(2),
            page_count: 2,
        });
        assert!(effects.contains(&Effect::ClearRenderRequest));

        let effects = state.apply(Command::DocumentLoaded {
            id: BuildId::new(1),
            page_count: 9,
        });
        assert_eq!(
            effects,
            vec![
                Effect::DiscardBuild(BuildId::new(1)),
                Effect::ReleaseDocument(BuildId::new(1))
            ]
        );
        assert_eq!(state.page_count, 2);
        assert_eq!(state.document, Some(BuildId::new(2)));
        assert!(!state.is_building);
    }

    #[test]
    fn rebuild_keeps_current_page_clamped() {
        let mut state = loaded(5);
        state.current_page = 4;

        let _ = state.apply(Command::RequestBuild {
            content: "shorter".to_string(),
        });
        let _ = state.apply(Command::DocumentLoaded {
            id: BuildId::new(2),
            page_count: 5,
        });
        assert_eq!(state.current_page, 4);

        let _ = state.apply(Command::RenderFinished);
        let _ = state.apply(Command::RequestBuild {
            content: "shortest".to_string(),
        });
        let _ = state.apply(Command::DocumentLoaded {
            id: BuildId::new(3),
            page_count: 2,
        });
        assert_eq!(state.current_page, 2);
    }

    #[test]
    fn rebuild_resets_page_when_configured() {
        let mut state = ViewerState::new(true);
        let _ = state.apply(Command::RequestBuild {
            content: "a".to_string(),
        });
        let _ = state.apply(Command::DocumentLoaded {
            id: BuildId::new(1),
            page_count: 4,
        });
        let _ = state.apply(Command::RenderFinished);
        let _ = state.apply(Command::NextPage);
        let _ = state.apply(Command::RenderFinished);
        assert_eq!(state.current_page, 2);

        let _ = state.apply(Command::RequestBuild {
            content: "b".to_string(),
        });
        let _ = state.apply(Command::DocumentLoaded {
            id: BuildId::new(2),
            page_count: 4,
        });
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn applied_rebuild_releases_previous_handle() {
        let mut state = loaded(2);
        let _ = state.apply(Command::RequestBuild {
            content: "b".to_string(),
        });
        let effects = state.apply(Command::DocumentLoaded {
            id: BuildId::new(2),
            page_count: 3,
        });

        assert_eq!(
            effects,
            vec![
                Effect::ClearRenderRequest,
                Effect::DocumentReady {
                    id: BuildId::new(2),
                    page_count: 3
                },
                Effect::ReleaseDocument(BuildId::new(1)),
                Effect::RenderPage {
                    document: BuildId::new(2),
                    page: 1
                },
            ]
        );
    }

    #[test]
    fn discarded_then_failed_builds_keep_applied_document() {
        let mut state = loaded(2);
        for content in ["x", "broken"] {
            let _ = state.apply(Command::RequestBuild {
                content: content.to_string(),
            });
        }
        let _ = state.apply(Command::DocumentLoaded {
            id: BuildId::new(2),
            page_count: 1,
        });
        let _ = state.apply(Command::BuildFailed {
            id: BuildId::new(3),
            reason: "boom".to_string(),
        });

        assert_eq!(state.document, Some(BuildId::new(1)));
        assert_eq!(
            state.apply(Command::NextPage),
            vec![Effect::RenderPage {
                document: BuildId::new(1),
                page: 2
            }]
        );
    }

    #[test]
    fn rebuild_while_rendering_skips_the_new_handle_render() {
        let mut state = loaded(2);
        let _ = state.apply(Command::NextPage);
        let _ = state.apply(Command::RequestBuild {
            content: "b".to_string(),
        });

        let effects = state.apply(Command::DocumentLoaded {
            id: BuildId::new(2),
            page_count: 2,
        });
        assert_eq!(effects.last(), Some(&Effect::SkipRender { page: 2 }));
    }

    #[test]
    fn failed_latest_build_leaves_state_untouched() {
        let mut state = loaded(3);
        let _ = state.apply(Command::RequestBuild {
            content: "broken".to_string(),
        });
        let effects = state.apply(Command::BuildFailed {
            id: BuildId::new(2),
            reason: "boom".to_string(),
        });

        assert_eq!(
            effects,
            vec![Effect::ReportBuildFailure {
                id: BuildId::new(2),
                reason: "boom".to_string()
            }]
        );
        assert_eq!(state.document, Some(BuildId::new(1)));
        assert_eq!(state.page_count, 3);
        assert!(!state.is_building);
    }

    #[test]
    fn failed_stale_build_is_discarded() {
        let mut state = ViewerState::default();
        let _ = state.apply(Command::RequestBuild {
            content: "a".to_string(),
        });
        let _ = state.apply(Command::RequestBuild {
            content: "b".to_string(),
        });
        let effects = state.apply(Command::BuildFailed {
            id: BuildId::new(1),
            reason: "boom".to_string(),
        });
        assert_eq!(effects, vec![Effect::DiscardBuild(BuildId::new(1))]);
    }

    #[test]
    fn stale_render_of_current_document_just_releases_guard() {
        let mut state = loaded(2);
        let _ = state.apply(Command::NextPage);
        let effects = state.apply(Command::RenderStale {
            document: BuildId::new(1),
        });
        assert!(effects.is_empty());
        assert!(!state.is_rendering);
    }

    #[test]
    fn stale_render_of_replaced_document_catches_up() {
        let mut state = loaded(2);
        let _ = state.apply(Command::NextPage);
        let _ = state.apply(Command::RequestBuild {
            content: "b".to_string(),
        });
        let _ = state.apply(Command::DocumentLoaded {
            id: BuildId::new(2),
            page_count: 2,
        });

        let effects = state.apply(Command::RenderStale {
            document: BuildId::new(1),
        });
        assert_eq!(
            effects,
            vec![Effect::RenderPage {
                document: BuildId::new(2),
                page: 2
            }]
        );
        assert!(state.is_rendering);
    }
}
