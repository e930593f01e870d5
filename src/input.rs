//! Pointer and pagination event routing
//!
//! Maps raw viewer-surface events onto the overlay model and the
//! document session. Hit-testing walks markers topmost-first, and the
//! resize handle beats the marker body, which beats the canvas: once
//! the most specific target handled an event, nothing below it sees
//! the event.

use crate::overlay::{Dimensions, Marker, MarkerId, OverlayError, OverlayModel, Point};
use crate::render::RequestId;
use crate::session::{DocumentSession, SessionError};

/// Edge of the square resize handle in a marker's bottom-right corner
pub const DEFAULT_RESIZE_HANDLE: f32 = 12.0;

/// Smallest extent a resize gesture can leave a marker with
const MIN_MARKER_EXTENT: f32 = 1.0;

/// What a pointer event landed on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    /// The resize handle of a marker (takes precedence over the body)
    ResizeHandle(MarkerId),
    /// The body of a marker
    Marker(MarkerId),
    /// Empty canvas, or the page image - neither is an annotation
    /// target
    Canvas,
}

/// A gesture started by `pointer_down`, finished by `pointer_up`
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActiveGesture {
    Drag {
        id: MarkerId,
        /// Pointer offset from the marker origin at grab time
        grab: Point,
    },
    Resize {
        id: MarkerId,
    },
}

/// Routes pointer and pagination events to the two models
pub struct InputRouter {
    resize_handle: f32,
}

impl InputRouter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            resize_handle: DEFAULT_RESIZE_HANDLE,
        }
    }

    #[must_use]
    pub fn with_handle_size(resize_handle: f32) -> Self {
        Self { resize_handle }
    }

    /// Find the topmost target under `point`
    #[must_use]
    pub fn hit_test(&self, overlay: &OverlayModel, point: Point) -> PointerTarget {
        for marker in overlay.markers().iter().rev() {
            if self.in_resize_handle(marker, point) {
                return PointerTarget::ResizeHandle(marker.id);
            }
            if contains(marker, point) {
                return PointerTarget::Marker(marker.id);
            }
        }
        PointerTarget::Canvas
    }

    /// Secondary click: open the edit form on a marker, the create
    /// form anywhere else.
    pub fn context_menu(&self, overlay: &mut OverlayModel, point: Point) {
        match self.hit_test(overlay, point) {
            PointerTarget::Marker(id) | PointerTarget::ResizeHandle(id) => {
                if overlay.open_edit_form(id, point).is_err() {
                    // Hit-test raced a deletion; treat it as canvas.
                    overlay.open_create_form(point);
                }
            }
            PointerTarget::Canvas => overlay.open_create_form(point),
        }
    }

    /// Primary press: begin a resize on the handle, a drag on the
    /// body. Returns `None` on the canvas, or when the marker is busy
    /// with another gesture (the gesture in progress wins).
    pub fn pointer_down(&self, overlay: &mut OverlayModel, point: Point) -> Option<ActiveGesture> {
        match self.hit_test(overlay, point) {
            PointerTarget::ResizeHandle(id) => {
                overlay.begin_resize(id).ok()?;
                Some(ActiveGesture::Resize { id })
            }
            PointerTarget::Marker(id) => {
                let origin = overlay.get(id)?.position;
                overlay.begin_drag(id).ok()?;
                Some(ActiveGesture::Drag {
                    id,
                    grab: Point {
                        x: point.x - origin.x,
                        y: point.y - origin.y,
                    },
                })
            }
            PointerTarget::Canvas => None,
        }
    }

    /// Release: commit the gesture into the model.
    pub fn pointer_up(
        &self,
        overlay: &mut OverlayModel,
        gesture: ActiveGesture,
        point: Point,
    ) -> Result<(), OverlayError> {
        match gesture {
            ActiveGesture::Drag { id, grab } => overlay.end_drag(
                id,
                Point {
                    x: point.x - grab.x,
                    y: point.y - grab.y,
                },
            ),
            ActiveGesture::Resize { id } => {
                let origin = overlay
                    .get(id)
                    .ok_or(OverlayError::UnknownMarker(id))?
                    .position;
                overlay.end_resize(
                    id,
                    Dimensions {
                        width: (point.x - origin.x).max(MIN_MARKER_EXTENT),
                        height: (point.y - origin.y).max(MIN_MARKER_EXTENT),
                    },
                )
            }
        }
    }

    /// Pagination event: show the requested page.
    pub fn navigate(
        &self,
        session: &mut DocumentSession,
        index: usize,
    ) -> Result<RequestId, SessionError> {
        session.show_page(index)
    }

    fn in_resize_handle(&self, marker: &Marker, point: Point) -> bool {
        if !contains(marker, point) {
            return false;
        }
        let Dimensions { width, height } = marker.dimensions;
        point.x >= marker.position.x + (width - self.resize_handle).max(0.0)
            && point.y >= marker.position.y + (height - self.resize_handle).max(0.0)
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn contains(marker: &Marker, point: Point) -> bool {
    point.x >= marker.position.x
        && point.x <= marker.position.x + marker.dimensions.width
        && point.y >= marker.position.y
        && point.y <= marker.position.y + marker.dimensions.height
}
