//! PDF rendering pipeline
//!
//! A single worker thread owns the PDF engine; the main side talks to
//! it through stamped request/response messages and a one-shot
//! readiness signal.

mod engine;
mod request;
mod service;
mod worker;

pub use engine::PdfEngine;
pub use request::{RenderRequest, RenderResponse, RequestId, WorkerFault};
pub use service::RenderService;
pub use worker::render_worker;

/// Default scale multiplier over a page's native raster resolution
pub const DEFAULT_RENDER_SCALE: f32 = 1.0;
