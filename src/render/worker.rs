//! Render worker - runs in a dedicated thread

use flume::{Receiver, Sender};

use super::engine::PdfEngine;
use super::request::{RenderRequest, RenderResponse};

/// Main worker function.
///
/// Owns the PDF engine for its whole lifetime. Signals readiness
/// exactly once on `ready` (a channel distinct from the RPC responses:
/// the request surface is only valid to use after the engine exists),
/// then serves requests until `Shutdown` or until the service side
/// hangs up.
pub fn render_worker(
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
    ready: Sender<()>,
) {
    let mut engine = PdfEngine::new();

    if ready.send(()).is_err() {
        log::debug!("render worker: service dropped before readiness, exiting");
        return;
    }

    for request in requests {
        let response = match request {
            RenderRequest::LoadDocument { id, bytes } => match engine.load(&bytes) {
                Ok(page_count) => {
                    log::debug!("render worker: loaded document with {page_count} pages");
                    RenderResponse::Loaded { id }
                }
                Err(fault) => RenderResponse::Error { id, fault },
            },

            RenderRequest::PageCount { id } => match engine.page_count() {
                Ok(count) => RenderResponse::PageCount { id, count },
                Err(fault) => RenderResponse::Error { id, fault },
            },

            RenderRequest::RenderPage { id, page, scale } => {
                match engine.render_page(page, scale) {
                    Ok(png) => RenderResponse::Page { id, page, png },
                    Err(fault) => RenderResponse::Error { id, fault },
                }
            }

            RenderRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            break;
        }
    }

    log::debug!("render worker: shutting down");
}
