//! Render request and response types

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Load (or replace) the document from raw bytes
    LoadDocument { id: RequestId, bytes: Vec<u8> },

    /// Query the page count of the loaded document
    PageCount { id: RequestId },

    /// Render a page to a PNG image
    RenderPage {
        id: RequestId,
        page: usize,
        scale: f32,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from the render worker
#[derive(Debug, thiserror::Error)]
pub enum WorkerFault {
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("PNG encoding: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("no document loaded")]
    NoDocument,

    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("scale must be a positive finite number, got {scale}")]
    InvalidScale { scale: f32 },

    #[error("{detail}")]
    Generic { detail: String },
}

impl WorkerFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Document was parsed and replaced the previous one
    Loaded { id: RequestId },

    /// Page count of the loaded document
    PageCount { id: RequestId, count: usize },

    /// Rendered page image (PNG bytes)
    Page {
        id: RequestId,
        page: usize,
        png: Vec<u8>,
    },

    /// Error while serving a request
    Error { id: RequestId, fault: WorkerFault },
}
