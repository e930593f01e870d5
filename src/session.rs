//! Document session - owns the worker lifecycle and the displayed page
//!
//! One session per mounted viewer. The session serializes document
//! loads, stamps every page-render request with the id the worker will
//! echo back, and discards responses that no longer match the latest
//! request, so a slow render for an old page can never overwrite a
//! newer one.

use crate::render::{
    DEFAULT_RENDER_SCALE, RenderResponse, RenderService, RequestId, WorkerFault,
};

/// Errors surfaced by session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("render worker is not ready")]
    WorkerNotReady,

    #[error("no document loaded")]
    DocumentNotLoaded,

    #[error("page index {index} out of range (document has {page_count} pages)")]
    InvalidPageIndex { index: usize, page_count: usize },

    #[error("failed to parse document: {0}")]
    Parse(#[source] WorkerFault),

    #[error("render failed: {0}")]
    Fault(#[source] WorkerFault),

    #[error("render worker disconnected")]
    WorkerGone,
}

/// A displayable rendered page: PNG bytes plus the page index they
/// came from. Exclusively owned by the session; replacing the current
/// image releases the superseded one.
#[derive(Debug)]
pub struct PageImage {
    page: usize,
    bytes: Vec<u8>,
}

impl PageImage {
    /// Zero-based index of the page this image shows
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// PNG bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the handle, keeping the bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Main-side orchestrator for one document
pub struct DocumentSession {
    service: RenderService,
    document_loaded: bool,
    page_count: usize,
    current_page: usize,
    current_image: Option<PageImage>,
    pending_render: Option<(RequestId, usize)>,
    render_scale: f32,
    torn_down: bool,
}

impl DocumentSession {
    /// Start the render worker for a new session.
    ///
    /// The worker is not usable until it signals readiness; check with
    /// [`is_ready`](Self::is_ready) or block on
    /// [`wait_ready`](Self::wait_ready).
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: RenderService::start(),
            document_loaded: false,
            page_count: 0,
            current_page: 0,
            current_image: None,
            pending_render: None,
            render_scale: DEFAULT_RENDER_SCALE,
            torn_down: false,
        }
    }

    /// Whether the worker has signalled readiness (one-way flip)
    pub fn is_ready(&mut self) -> bool {
        self.service.poll_ready()
    }

    /// Block until the worker is ready
    pub fn wait_ready(&mut self) -> Result<(), SessionError> {
        if self.service.wait_ready() {
            Ok(())
        } else {
            Err(SessionError::WorkerGone)
        }
    }

    #[must_use]
    pub fn document_loaded(&self) -> bool {
        self.document_loaded
    }

    /// Page count; valid only after a successful [`load`](Self::load)
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Zero-based index of the most recently displayed page
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// The most recently produced page image, if any
    #[must_use]
    pub fn current_image(&self) -> Option<&PageImage> {
        self.current_image.as_ref()
    }

    /// Whether a stamped render request is still outstanding
    #[must_use]
    pub fn has_pending_render(&self) -> bool {
        self.pending_render.is_some()
    }

    #[must_use]
    pub fn render_scale(&self) -> f32 {
        self.render_scale
    }

    /// Scale applied to every subsequent render. Choosing a value
    /// appropriate to the display density is the caller's business.
    pub fn set_render_scale(&mut self, scale: f32) {
        self.render_scale = scale;
    }

    /// Load a document from raw bytes, replacing any previous one.
    ///
    /// Serialized round-trip: the load completes (success or failure)
    /// before anything else is issued, then the page count is queried.
    /// On success the page state resets and the previous image is
    /// released; on failure the document state is left as it was.
    /// Either way any in-flight render is abandoned - its response is
    /// consumed during the round-trip and must not count as
    /// outstanding afterwards.
    pub fn load(&mut self, bytes: Vec<u8>) -> Result<usize, SessionError> {
        if !self.service.poll_ready() {
            return Err(SessionError::WorkerNotReady);
        }

        // A reload supersedes whatever render is still in flight.
        self.pending_render = None;

        let load_id = self.service.request_load(bytes);
        self.await_response(load_id, |response| match response {
            RenderResponse::Loaded { .. } => Ok(()),
            RenderResponse::Error { fault, .. } => Err(SessionError::Parse(fault)),
            other => Err(unexpected(load_id, &other)),
        })?;

        let count_id = self.service.request_page_count();
        let count = self.await_response(count_id, |response| match response {
            RenderResponse::PageCount { count, .. } => Ok(count),
            RenderResponse::Error { fault, .. } => Err(SessionError::Fault(fault)),
            other => Err(unexpected(count_id, &other)),
        })?;

        // Commit: pages rendered from the old handle are stale now.
        self.document_loaded = true;
        self.page_count = count;
        self.current_page = 0;
        drop(self.current_image.take());

        Ok(count)
    }

    /// Request a page render without blocking.
    ///
    /// Stamps the request; a later [`process_responses`]
    /// (or [`wait_pending`](Self::wait_pending)) commits the result
    /// only if no newer request has superseded it. Out-of-range
    /// indices fail here, before anything is sent - no clamping.
    ///
    /// [`process_responses`]: Self::process_responses
    pub fn show_page(&mut self, index: usize) -> Result<RequestId, SessionError> {
        if !self.document_loaded {
            return Err(SessionError::DocumentNotLoaded);
        }
        if index >= self.page_count {
            return Err(SessionError::InvalidPageIndex {
                index,
                page_count: self.page_count,
            });
        }

        let id = self.service.request_page(index, self.render_scale);
        self.pending_render = Some((id, index));
        Ok(id)
    }

    /// Drain completed responses without blocking.
    ///
    /// Returns whether the displayed image changed. A render fault for
    /// the pending request surfaces as an error; stale responses are
    /// logged and dropped.
    pub fn process_responses(&mut self) -> Result<bool, SessionError> {
        let mut updated = false;
        for response in self.service.poll_responses() {
            if self.apply_response(response)? {
                updated = true;
            }
        }
        Ok(updated)
    }

    /// Block until the outstanding render request resolves.
    pub fn wait_pending(&mut self) -> Result<(), SessionError> {
        while self.pending_render.is_some() {
            let response = self
                .service
                .recv_response()
                .ok_or(SessionError::WorkerGone)?;
            self.apply_response(response)?;
        }
        Ok(())
    }

    /// Request a page and block until its image is displayed.
    pub fn show_page_blocking(&mut self, index: usize) -> Result<(), SessionError> {
        self.show_page(index)?;
        self.wait_pending()
    }

    /// Terminate the worker and release the current image.
    ///
    /// Called from `Drop` as well; extra calls are no-ops.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        drop(self.current_image.take());
        self.pending_render = None;
        self.document_loaded = false;
        self.service.shutdown();
    }

    /// Commit a response if it matches the latest stamped request.
    /// Returns whether the displayed image changed.
    fn apply_response(&mut self, response: RenderResponse) -> Result<bool, SessionError> {
        match response {
            RenderResponse::Page { id, page, png } => match self.pending_render {
                Some((pending_id, _)) if pending_id == id => {
                    // Release the superseded image before installing
                    // the new one.
                    drop(self.current_image.take());
                    self.current_image = Some(PageImage { page, bytes: png });
                    self.current_page = page;
                    self.pending_render = None;
                    Ok(true)
                }
                _ => {
                    log::debug!("discarding stale render response for page {page}");
                    Ok(false)
                }
            },

            RenderResponse::Error { id, fault } => match self.pending_render {
                Some((pending_id, _)) if pending_id == id => {
                    self.pending_render = None;
                    Err(SessionError::Fault(fault))
                }
                _ => {
                    log::debug!("discarding stale render fault: {fault}");
                    Ok(false)
                }
            },

            // Load/page-count responses are consumed inside `load`;
            // one showing up here belongs to an abandoned call.
            other => {
                log::debug!("discarding out-of-band response: {other:?}");
                Ok(false)
            }
        }
    }

    /// Block until the response stamped `id` arrives and map it
    /// through `handle`. Responses with other ids are dropped.
    fn await_response<T>(
        &mut self,
        id: RequestId,
        handle: impl FnOnce(RenderResponse) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        loop {
            let response = self
                .service
                .recv_response()
                .ok_or(SessionError::WorkerGone)?;
            if response_id(&response) == id {
                return handle(response);
            }
            log::debug!("discarding stale response while awaiting {id:?}");
        }
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn response_id(response: &RenderResponse) -> RequestId {
    match response {
        RenderResponse::Loaded { id }
        | RenderResponse::PageCount { id, .. }
        | RenderResponse::Page { id, .. }
        | RenderResponse::Error { id, .. } => *id,
    }
}

fn unexpected(id: RequestId, response: &RenderResponse) -> SessionError {
    SessionError::Fault(WorkerFault::generic(format!(
        "unexpected response {response:?} for request {id:?}"
    )))
}
