//! Annotation overlay - positioned, resizable markers over the page
//!
//! The collection is owned here and mutated only through these
//! operations. Append order is z-order: later markers draw on top.
//! Drag and resize are mutually exclusive per marker, enforced by an
//! explicit state machine (`Idle -> Dragging -> Idle`,
//! `Idle -> Resizing -> Idle`).

use std::collections::HashMap;

/// Size a marker gets when the form's size field has no leading
/// digits to parse.
pub const DEFAULT_MARKER_SIZE: u32 = 44;

/// Unique identifier for markers. Never reused after deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

impl MarkerId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// A point in viewer-surface coordinates (same frame as the page
/// image)
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Rendered extent of a marker
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

/// One user-created annotation marker.
///
/// `size` is the descriptive field entered through the form;
/// `dimensions` is the rendered extent. They are related only at
/// creation time - resizing changes `dimensions`, editing the form
/// changes `size`, and neither touches the other.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub name: String,
    pub kind: String,
    pub size: u32,
    pub position: Point,
    pub dimensions: Dimensions,
}

/// Raw values coming out of the edit form. `size` stays text until
/// commit normalizes it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerForm {
    pub name: String,
    pub kind: String,
    pub size: String,
}

/// What an open edit form is editing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditTarget {
    /// A marker that doesn't exist yet
    New,
    /// An existing marker, edited in place
    Existing(MarkerId),
}

/// Transient state of the open edit form
#[derive(Clone, Debug)]
pub struct PendingEdit {
    pub target: EditTarget,
    /// Where the form should appear, and where a new marker lands
    pub anchor: Point,
    /// Pre-filled field values
    pub fields: MarkerForm,
}

/// Per-marker gesture state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging,
    Resizing,
}

/// Errors from overlay operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OverlayError {
    #[error("no marker with id {0:?}")]
    UnknownMarker(MarkerId),

    #[error("no edit form is open")]
    NoFormOpen,

    #[error("cannot delete a marker that was never committed")]
    UncommittedMarker,

    #[error("marker {0:?} is busy with another gesture")]
    GestureConflict(MarkerId),
}

/// The marker collection plus the pending-edit form state
pub struct OverlayModel {
    markers: Vec<Marker>,
    gestures: HashMap<MarkerId, Gesture>,
    next_id: u64,
    pending: Option<PendingEdit>,
}

impl OverlayModel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            markers: Vec::new(),
            gestures: HashMap::new(),
            next_id: 1,
            pending: None,
        }
    }

    /// Markers in z-order (first = bottom)
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// The open edit form, if any
    #[must_use]
    pub fn pending_edit(&self) -> Option<&PendingEdit> {
        self.pending.as_ref()
    }

    /// Current gesture state of a marker
    #[must_use]
    pub fn gesture(&self, id: MarkerId) -> Gesture {
        self.gestures.get(&id).copied().unwrap_or_default()
    }

    /// Open a blank create form anchored at `anchor`
    pub fn open_create_form(&mut self, anchor: Point) {
        self.pending = Some(PendingEdit {
            target: EditTarget::New,
            anchor,
            fields: MarkerForm::default(),
        });
    }

    /// Open an edit form pre-filled from an existing marker
    pub fn open_edit_form(&mut self, id: MarkerId, anchor: Point) -> Result<(), OverlayError> {
        let marker = self.get(id).ok_or(OverlayError::UnknownMarker(id))?;
        self.pending = Some(PendingEdit {
            target: EditTarget::Existing(id),
            anchor,
            fields: MarkerForm {
                name: marker.name.clone(),
                kind: marker.kind.clone(),
                size: marker.size.to_string(),
            },
        });
        Ok(())
    }

    /// Close the form without touching the collection
    pub fn cancel_form(&mut self) {
        self.pending = None;
    }

    /// Commit the open form.
    ///
    /// A `New` target appends a marker at the form's anchor with a
    /// fresh id; an `Existing` target merges the descriptive fields in
    /// place, leaving position and dimensions alone. The size field is
    /// parsed up to its first non-digit; a field with no leading
    /// digits falls back to [`DEFAULT_MARKER_SIZE`] instead of
    /// failing. Closes the form on success.
    pub fn commit(&mut self, form: MarkerForm) -> Result<MarkerId, OverlayError> {
        let pending = self.pending.take().ok_or(OverlayError::NoFormOpen)?;

        match pending.target {
            EditTarget::New => {
                let size = parse_size(&form.size);
                let id = MarkerId::new(self.next_id);
                self.next_id += 1;

                let side = size as f32;
                self.markers.push(Marker {
                    id,
                    name: form.name,
                    kind: form.kind,
                    size,
                    position: pending.anchor,
                    dimensions: Dimensions {
                        width: side,
                        height: side,
                    },
                });
                Ok(id)
            }

            EditTarget::Existing(id) => {
                let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) else {
                    // Keep the form open: the commit mutated nothing.
                    self.pending = Some(pending);
                    return Err(OverlayError::UnknownMarker(id));
                };
                marker.name = form.name;
                marker.kind = form.kind;
                marker.size = parse_size(&form.size);
                Ok(id)
            }
        }
    }

    /// Delete the marker the open form is editing.
    ///
    /// Rejected when no form is open or the form targets a marker that
    /// was never committed; in either case nothing changes.
    pub fn delete_current(&mut self) -> Result<MarkerId, OverlayError> {
        let pending = self.pending.take().ok_or(OverlayError::NoFormOpen)?;

        match pending.target {
            EditTarget::New => {
                self.pending = Some(pending);
                Err(OverlayError::UncommittedMarker)
            }
            EditTarget::Existing(id) => {
                let Some(index) = self.markers.iter().position(|m| m.id == id) else {
                    self.pending = Some(pending);
                    return Err(OverlayError::UnknownMarker(id));
                };
                self.markers.remove(index);
                self.gestures.remove(&id);
                Ok(id)
            }
        }
    }

    /// Start dragging a marker. Fails while the marker is mid-gesture.
    pub fn begin_drag(&mut self, id: MarkerId) -> Result<(), OverlayError> {
        self.begin_gesture(id, Gesture::Dragging)
    }

    /// Finish a drag, committing the new position.
    pub fn end_drag(&mut self, id: MarkerId, position: Point) -> Result<(), OverlayError> {
        self.end_gesture(id, Gesture::Dragging)?;
        if let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) {
            marker.position = position;
        }
        Ok(())
    }

    /// Start resizing a marker. Fails while the marker is mid-gesture.
    pub fn begin_resize(&mut self, id: MarkerId) -> Result<(), OverlayError> {
        self.begin_gesture(id, Gesture::Resizing)
    }

    /// Finish a resize, committing the new dimensions.
    pub fn end_resize(&mut self, id: MarkerId, dimensions: Dimensions) -> Result<(), OverlayError> {
        self.end_gesture(id, Gesture::Resizing)?;
        if let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) {
            marker.dimensions = dimensions;
        }
        Ok(())
    }

    fn begin_gesture(&mut self, id: MarkerId, gesture: Gesture) -> Result<(), OverlayError> {
        if self.get(id).is_none() {
            return Err(OverlayError::UnknownMarker(id));
        }
        if self.gesture(id) != Gesture::Idle {
            return Err(OverlayError::GestureConflict(id));
        }
        self.gestures.insert(id, gesture);
        Ok(())
    }

    fn end_gesture(&mut self, id: MarkerId, expected: Gesture) -> Result<(), OverlayError> {
        if self.get(id).is_none() {
            return Err(OverlayError::UnknownMarker(id));
        }
        if self.gesture(id) != expected {
            return Err(OverlayError::GestureConflict(id));
        }
        self.gestures.remove(&id);
        Ok(())
    }
}

impl Default for OverlayModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the leading digits of the size field, ignoring whatever
/// follows them ("12.5" is 12, "30px" is 30). No digits at all means
/// [`DEFAULT_MARKER_SIZE`].
fn parse_size(raw: &str) -> u32 {
    let trimmed = raw.trim();
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    digits.parse().unwrap_or(DEFAULT_MARKER_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_marker(model: &mut OverlayModel, anchor: Point, size: &str) -> MarkerId {
        model.open_create_form(anchor);
        model
            .commit(MarkerForm {
                name: "marker".into(),
                kind: "note".into(),
                size: size.into(),
            })
            .unwrap()
    }

    #[test]
    fn create_places_marker_at_anchor() {
        let mut model = OverlayModel::new();
        let anchor = Point { x: 100.0, y: 100.0 };
        let id = create_marker(&mut model, anchor, "30");

        let marker = model.get(id).unwrap();
        assert_eq!(marker.position, anchor);
        assert_eq!(marker.size, 30);
        assert_eq!(
            marker.dimensions,
            Dimensions {
                width: 30.0,
                height: 30.0
            }
        );
        assert!(model.pending_edit().is_none());
    }

    #[test]
    fn size_parses_leading_digits_only() {
        let mut model = OverlayModel::new();
        for (raw, expected) in [("30", 30), ("12.5", 12), ("30px", 30), (" 7 ", 7)] {
            let id = create_marker(&mut model, Point::default(), raw);
            assert_eq!(model.get(id).unwrap().size, expected, "{raw:?}");
        }
    }

    #[test]
    fn non_numeric_size_falls_back_to_default() {
        let mut model = OverlayModel::new();
        for raw in ["abc", "", "  ", "-3"] {
            let id = create_marker(&mut model, Point::default(), raw);
            assert_eq!(model.get(id).unwrap().size, DEFAULT_MARKER_SIZE, "{raw:?}");
        }
    }

    #[test]
    fn ids_stay_unique_across_delete_and_create() {
        let mut model = OverlayModel::new();
        let mut seen = std::collections::HashSet::new();

        for round in 0..5 {
            let id = create_marker(&mut model, Point::default(), "10");
            assert!(seen.insert(id), "id reused in round {round}");

            model.open_edit_form(id, Point::default()).unwrap();
            model.delete_current().unwrap();
        }
        assert!(model.is_empty());
    }

    #[test]
    fn edit_form_is_prefilled() {
        let mut model = OverlayModel::new();
        model.open_create_form(Point { x: 1.0, y: 2.0 });
        model
            .commit(MarkerForm {
                name: "X".into(),
                kind: "note".into(),
                size: "30".into(),
            })
            .unwrap();
        let id = model.markers()[0].id;

        model.open_edit_form(id, Point { x: 5.0, y: 5.0 }).unwrap();
        let pending = model.pending_edit().unwrap();
        assert_eq!(pending.target, EditTarget::Existing(id));
        assert_eq!(
            pending.fields,
            MarkerForm {
                name: "X".into(),
                kind: "note".into(),
                size: "30".into(),
            }
        );
    }

    #[test]
    fn edit_never_moves_or_resizes() {
        let mut model = OverlayModel::new();
        let id = create_marker(&mut model, Point { x: 7.0, y: 9.0 }, "20");
        model.begin_resize(id).unwrap();
        model
            .end_resize(
                id,
                Dimensions {
                    width: 80.0,
                    height: 40.0,
                },
            )
            .unwrap();

        model.open_edit_form(id, Point::default()).unwrap();
        model
            .commit(MarkerForm {
                name: "renamed".into(),
                kind: "other".into(),
                size: "99".into(),
            })
            .unwrap();

        let marker = model.get(id).unwrap();
        assert_eq!(marker.name, "renamed");
        assert_eq!(marker.size, 99);
        assert_eq!(marker.position, Point { x: 7.0, y: 9.0 });
        assert_eq!(
            marker.dimensions,
            Dimensions {
                width: 80.0,
                height: 40.0
            }
        );
    }

    #[test]
    fn deleted_marker_stays_deleted() {
        let mut model = OverlayModel::new();
        let id = create_marker(&mut model, Point::default(), "10");

        model.open_edit_form(id, Point::default()).unwrap();
        assert_eq!(model.delete_current(), Ok(id));
        assert!(model.is_empty());

        assert_eq!(
            model.open_edit_form(id, Point::default()),
            Err(OverlayError::UnknownMarker(id))
        );
        assert_eq!(model.begin_drag(id), Err(OverlayError::UnknownMarker(id)));
    }

    #[test]
    fn delete_on_uncommitted_form_is_rejected() {
        let mut model = OverlayModel::new();
        model.open_create_form(Point::default());
        assert_eq!(model.delete_current(), Err(OverlayError::UncommittedMarker));
        // The form is still open and a commit still works.
        assert!(model.pending_edit().is_some());
        model.commit(MarkerForm::default()).unwrap();
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn commit_without_form_fails() {
        let mut model = OverlayModel::new();
        assert_eq!(
            model.commit(MarkerForm::default()),
            Err(OverlayError::NoFormOpen)
        );
        assert_eq!(model.delete_current(), Err(OverlayError::NoFormOpen));
    }

    #[test]
    fn cancel_closes_form_without_changes() {
        let mut model = OverlayModel::new();
        model.open_create_form(Point::default());
        model.cancel_form();
        assert!(model.pending_edit().is_none());
        assert!(model.is_empty());
    }

    #[test]
    fn drag_commits_position_at_gesture_end() {
        let mut model = OverlayModel::new();
        let id = create_marker(&mut model, Point { x: 0.0, y: 0.0 }, "10");

        model.begin_drag(id).unwrap();
        // Nothing committed mid-gesture
        assert_eq!(model.get(id).unwrap().position, Point { x: 0.0, y: 0.0 });
        model.end_drag(id, Point { x: 30.0, y: 40.0 }).unwrap();
        assert_eq!(model.get(id).unwrap().position, Point { x: 30.0, y: 40.0 });
        assert_eq!(model.gesture(id), Gesture::Idle);
    }

    #[test]
    fn drag_is_rejected_while_resizing() {
        let mut model = OverlayModel::new();
        let id = create_marker(&mut model, Point::default(), "10");

        model.begin_resize(id).unwrap();
        assert_eq!(model.begin_drag(id), Err(OverlayError::GestureConflict(id)));

        model
            .end_resize(
                id,
                Dimensions {
                    width: 20.0,
                    height: 20.0,
                },
            )
            .unwrap();
        assert!(model.begin_drag(id).is_ok());
    }

    #[test]
    fn resize_is_rejected_while_dragging() {
        let mut model = OverlayModel::new();
        let id = create_marker(&mut model, Point::default(), "10");

        model.begin_drag(id).unwrap();
        assert_eq!(
            model.begin_resize(id),
            Err(OverlayError::GestureConflict(id))
        );
    }

    #[test]
    fn gestures_on_distinct_markers_are_independent() {
        let mut model = OverlayModel::new();
        let a = create_marker(&mut model, Point::default(), "10");
        let b = create_marker(&mut model, Point { x: 50.0, y: 0.0 }, "10");

        model.begin_resize(a).unwrap();
        assert!(model.begin_drag(b).is_ok());
    }

    #[test]
    fn end_without_begin_fails() {
        let mut model = OverlayModel::new();
        let id = create_marker(&mut model, Point::default(), "10");

        assert_eq!(
            model.end_drag(id, Point::default()),
            Err(OverlayError::GestureConflict(id))
        );
        assert_eq!(
            model.end_resize(
                id,
                Dimensions {
                    width: 1.0,
                    height: 1.0
                }
            ),
            Err(OverlayError::GestureConflict(id))
        );
    }

    #[test]
    fn z_order_is_append_order() {
        let mut model = OverlayModel::new();
        let a = create_marker(&mut model, Point::default(), "10");
        let b = create_marker(&mut model, Point::default(), "10");

        let order: Vec<MarkerId> = model.markers().iter().map(|m| m.id).collect();
        assert_eq!(order, vec![a, b]);
    }
}
