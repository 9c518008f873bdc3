//! Pipeline worker - builds, loads and rasterizes on its own thread

use flume::{Receiver, Sender};

use super::request::{BuildId, PipelineRequest, PipelineResponse, Stage};
use crate::engine::{BlobStore, DocumentBuilder, DocumentLoader, EngineFault, LoadedDocument};

/// Document handle held by the worker, tagged with the build that produced it
struct HeldDocument<D> {
    id: BuildId,
    doc: D,
}

/// Serve pipeline requests in FIFO order until `Shutdown` or the channel closes.
///
/// Every loaded handle is kept until the controller releases it, so the
/// controller alone decides which document renders are served from.
pub fn run_pipeline<B, L>(
    builder: B,
    loader: L,
    mut store: BlobStore,
    requests: Receiver<PipelineRequest>,
    responses: Sender<PipelineResponse>,
) where
    B: DocumentBuilder,
    L: DocumentLoader,
{
    let mut held: Vec<HeldDocument<L::Document>> = Vec::new();

    for request in requests {
        let response = match request {
            PipelineRequest::Build { id, content } => {
                match build_and_load(&builder, &loader, &mut store, &content) {
                    Ok(doc) => {
                        let page_count = doc.page_count();
                        held.push(HeldDocument { id, doc });
                        PipelineResponse::Loaded { id, page_count }
                    }
                    Err(error) => PipelineResponse::Failed {
                        id,
                        stage: Stage::Build,
                        error,
                    },
                }
            }

            PipelineRequest::Render {
                document,
                page,
                scale,
            } => match held.iter().find(|h| h.id == document) {
                Some(h) => match h.doc.render_page(page, scale) {
                    Ok(frame) => PipelineResponse::Rendered { document, frame },
                    Err(error) => PipelineResponse::Failed {
                        id: document,
                        stage: Stage::Render { page },
                        error,
                    },
                },
                None => PipelineResponse::Stale { document, page },
            },

            PipelineRequest::Release { document } => {
                held.retain(|h| h.id != document);
                log::debug!("Released build {document}; {} handle(s) held", held.len());
                continue;
            }

            PipelineRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            break;
        }
    }

    log::debug!("Pipeline worker stopped");
}

/// Build bytes, bridge them through a blob and load the handle.
/// The blob is revoked whether or not loading succeeds.
fn build_and_load<B, L>(
    builder: &B,
    loader: &L,
    store: &mut BlobStore,
    content: &str,
) -> Result<L::Document, EngineFault>
where
    B: DocumentBuilder,
    L: DocumentLoader,
{
    let bytes = builder.build(content)?;
    let url = store.register(&bytes)?;
    let loaded = loader.load(&url);
    store.revoke(&url);
    loaded
}
