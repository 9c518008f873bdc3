//! Pipeline request and response types

use crate::engine::{EngineFault, PageFrame};

/// Sequence number tagging each build request
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildId(pub u64);

impl BuildId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pipeline stage that produced a fault
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Build,
    Render { page: usize },
}

/// Request sent to the pipeline worker
#[derive(Debug)]
pub enum PipelineRequest {
    /// Build, bridge and load a document from content
    Build { id: BuildId, content: String },

    /// Rasterize a page of the document produced by `document`
    Render {
        document: BuildId,
        page: usize,
        scale: f32,
    },

    /// Drop the handle loaded by `document`
    Release { document: BuildId },

    /// Stop the worker
    Shutdown,
}

/// Response from the pipeline worker
#[derive(Debug)]
pub enum PipelineResponse {
    /// Document loaded and held by the worker
    Loaded { id: BuildId, page_count: usize },

    /// Page rasterized
    Rendered { document: BuildId, frame: PageFrame },

    /// The worker no longer holds the requested document
    Stale { document: BuildId, page: usize },

    /// A build or render failed
    Failed {
        id: BuildId,
        stage: Stage,
        error: EngineFault,
    },
}
