//! Render service - main-side handle to the worker thread

use flume::{Receiver, Sender};

use super::request::{RenderRequest, RenderResponse, RequestId};
use super::worker::render_worker;

/// Spawns and talks to the render worker.
///
/// Every request is stamped with a monotonically increasing
/// [`RequestId`] which the worker echoes back in its response; ids are
/// never reused, so callers can match responses to requests and drop
/// anything stale.
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    ready_rx: Receiver<()>,
    ready: bool,
    next_request_id: u64,
}

impl RenderService {
    /// Spawn the worker thread and return the handle to it.
    #[must_use]
    pub fn start() -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        let (ready_tx, ready_rx) = flume::bounded(1);

        std::thread::spawn(move || render_worker(request_rx, response_tx, ready_tx));

        Self {
            request_tx,
            response_rx,
            ready_rx,
            ready: false,
            next_request_id: 1,
        }
    }

    /// Check readiness without blocking. Once true, stays true.
    pub fn poll_ready(&mut self) -> bool {
        if !self.ready && self.ready_rx.try_recv().is_ok() {
            self.ready = true;
        }
        self.ready
    }

    /// Block until the worker signals readiness.
    ///
    /// Returns false if the worker died before signalling.
    pub fn wait_ready(&mut self) -> bool {
        if !self.ready {
            match self.ready_rx.recv() {
                Ok(()) => self.ready = true,
                Err(_) => return false,
            }
        }
        true
    }

    /// Send a document-load request
    pub fn request_load(&mut self, bytes: Vec<u8>) -> RequestId {
        let id = self.next_id();
        let _ = self
            .request_tx
            .send(RenderRequest::LoadDocument { id, bytes });
        id
    }

    /// Send a page-count query
    pub fn request_page_count(&mut self) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(RenderRequest::PageCount { id });
        id
    }

    /// Send a page-render request
    pub fn request_page(&mut self, page: usize, scale: f32) -> RequestId {
        let id = self.next_id();
        let _ = self
            .request_tx
            .send(RenderRequest::RenderPage { id, page, scale });
        id
    }

    /// Drain all completed responses without blocking
    pub fn poll_responses(&mut self) -> Vec<RenderResponse> {
        let mut responses = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            responses.push(response);
        }
        responses
    }

    /// Block for the next response. `None` means the worker is gone.
    pub fn recv_response(&mut self) -> Option<RenderResponse> {
        self.response_rx.recv().ok()
    }

    /// Ask the worker to exit
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_pdf;

    #[test]
    fn worker_signals_readiness_once() {
        let mut service = RenderService::start();
        assert!(service.wait_ready());
        // Latched: polling stays true with nothing left on the channel
        assert!(service.poll_ready());
        service.shutdown();
    }

    #[test]
    fn request_ids_are_monotonic() {
        let mut service = RenderService::start();
        let a = service.request_page_count();
        let b = service.request_page_count();
        assert!(b.0 > a.0);
        service.shutdown();
    }

    #[test]
    fn load_then_page_count_round_trip() {
        let mut service = RenderService::start();
        assert!(service.wait_ready());

        let load_id = service.request_load(sample_pdf(4));
        match service.recv_response() {
            Some(RenderResponse::Loaded { id }) => assert_eq!(id, load_id),
            other => panic!("expected Loaded, got {other:?}"),
        }

        let count_id = service.request_page_count();
        match service.recv_response() {
            Some(RenderResponse::PageCount { id, count }) => {
                assert_eq!(id, count_id);
                assert_eq!(count, 4);
            }
            other => panic!("expected PageCount, got {other:?}"),
        }

        service.shutdown();
    }

    #[test]
    fn page_count_before_load_is_a_fault() {
        let mut service = RenderService::start();
        assert!(service.wait_ready());

        let id = service.request_page_count();
        match service.recv_response() {
            Some(RenderResponse::Error { id: got, .. }) => assert_eq!(got, id),
            other => panic!("expected Error, got {other:?}"),
        }

        service.shutdown();
    }
}
