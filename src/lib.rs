//! PDF page viewer core.
//!
//! Rendering runs on a dedicated worker thread behind a stamped
//! request/response protocol; the [`session::DocumentSession`] owns
//! the worker and the currently displayed page image, and the
//! [`overlay::OverlayModel`] keeps draggable, resizable annotation
//! markers in the page's coordinate space.

pub mod input;
pub mod overlay;
pub mod render;
pub mod session;

pub mod test_utils;

pub use input::{ActiveGesture, InputRouter, PointerTarget};
pub use overlay::{
    DEFAULT_MARKER_SIZE, Dimensions, EditTarget, Gesture, Marker, MarkerForm, MarkerId,
    OverlayError, OverlayModel, PendingEdit, Point,
};
pub use render::{RenderService, RequestId, WorkerFault};
pub use session::{DocumentSession, PageImage, SessionError};
