//! Pointer and keyboard handling for the annotation canvas.
//!
//! The frontend translates raw input into image-space [`Event`]s. The
//! [`Interaction`] machine interprets each event against the current gesture
//! and the store, yields the resulting [`Intent`]s and applies them. Only one
//! gesture runs at a time.

use crate::annotation::{AnnotationId, Source, Tag};
use crate::geometry::{meets_minimum_size, normalize, BoundingBox, Point, Vector, MIN_SIZE};
use crate::store::AnnotationStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Delete,
    Escape,
}

/// Grab points on the outline of the selected box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Right,
        ResizeHandle::BottomRight,
        ResizeHandle::Bottom,
        ResizeHandle::BottomLeft,
        ResizeHandle::Left,
    ];

    pub fn position(&self, rect: BoundingBox) -> Point {
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        match self {
            ResizeHandle::TopLeft => Point::new(rect.x, rect.y),
            ResizeHandle::Top => Point::new(cx, rect.y),
            ResizeHandle::TopRight => Point::new(rect.right(), rect.y),
            ResizeHandle::Right => Point::new(rect.right(), cy),
            ResizeHandle::BottomRight => Point::new(rect.right(), rect.bottom()),
            ResizeHandle::Bottom => Point::new(cx, rect.bottom()),
            ResizeHandle::BottomLeft => Point::new(rect.x, rect.bottom()),
            ResizeHandle::Left => Point::new(rect.x, cy),
        }
    }

    /// Handle of `rect` within `radius` of `p`, if any.
    pub fn hit(rect: BoundingBox, p: Point, radius: f32) -> Option<Self> {
        Self::ALL.into_iter().find(|handle| {
            let h = handle.position(rect);
            (h.x - p.x).abs() <= radius && (h.y - p.y).abs() <= radius
        })
    }

    fn moves_left(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::Left | ResizeHandle::BottomLeft
        )
    }

    fn moves_right(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopRight | ResizeHandle::Right | ResizeHandle::BottomRight
        )
    }

    fn moves_top(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::Top | ResizeHandle::TopRight
        )
    }

    fn moves_bottom(&self) -> bool {
        matches!(
            self,
            ResizeHandle::BottomLeft | ResizeHandle::Bottom | ResizeHandle::BottomRight
        )
    }

    /// Drags this handle of `origin` to `pointer`. The opposite edges stay
    /// put and neither side shrinks below [`MIN_SIZE`].
    pub fn resize(&self, origin: BoundingBox, pointer: Point) -> BoundingBox {
        let mut rect = origin;
        if self.moves_left() {
            let right = origin.right();
            rect.x = pointer.x.min(right - MIN_SIZE);
            rect.width = right - rect.x;
        } else if self.moves_right() {
            rect.width = (pointer.x - origin.x).max(MIN_SIZE);
        }
        if self.moves_top() {
            let bottom = origin.bottom();
            rect.y = pointer.y.min(bottom - MIN_SIZE);
            rect.height = bottom - rect.y;
        } else if self.moves_bottom() {
            rect.height = (pointer.y - origin.y).max(MIN_SIZE);
        }
        rect
    }
}

/// Input on the canvas, already in image pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Press on empty canvas.
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    PointerLeave,
    RecordClicked(AnnotationId),
    RecordDoubleClicked(AnnotationId),
    DragStart(AnnotationId),
    DragBy { id: AnnotationId, delta: Vector },
    DragEnd,
    ResizeStart { id: AnnotationId, handle: ResizeHandle },
    ResizeTo { id: AnnotationId, pointer: Point },
    ResizeEnd,
    Key(Key),
}

/// What an event asks of the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    StartDraw(Point),
    ResizeDraw(BoundingBox),
    CommitDraw(BoundingBox),
    DiscardDraw,
    Select(AnnotationId),
    Deselect,
    Move { id: AnnotationId, rect: BoundingBox },
    Resize { id: AnnotationId, rect: BoundingBox },
    Delete(AnnotationId),
}

#[derive(Clone, Debug, PartialEq)]
enum Gesture {
    Idle,
    /// Rubber band; unnormalized and unclamped until commit.
    Drawing(BoundingBox),
    Dragging {
        id: AnnotationId,
        origin: BoundingBox,
        offset: Vector,
    },
    Resizing {
        id: AnnotationId,
        handle: ResizeHandle,
        origin: BoundingBox,
    },
}

/// Tracks the gesture in progress on the canvas and feeds its effects to the store.
pub struct Interaction {
    gesture: Gesture,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
        }
    }

    /// Drops any gesture in progress; used when the image changes.
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.gesture, Gesture::Drawing(_))
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.gesture, Gesture::Resizing { .. })
    }

    /// The in-progress rubber band, as drawn so far.
    pub fn drawing_preview(&self) -> Option<BoundingBox> {
        match self.gesture {
            Gesture::Drawing(rect) => Some(rect),
            _ => None,
        }
    }

    /// Record being dragged or resized.
    pub fn active_record(&self) -> Option<&AnnotationId> {
        match &self.gesture {
            Gesture::Dragging { id, .. } | Gesture::Resizing { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Interprets `event` and applies the outcome to `store`.
    pub fn handle(&mut self, event: Event, store: &mut AnnotationStore) -> Vec<Intent> {
        let intents = self.interpret(event, store);
        for intent in &intents {
            apply(intent, store);
        }
        intents
    }

    fn interpret(&mut self, event: Event, store: &AnnotationStore) -> Vec<Intent> {
        match event {
            Event::PointerDown(p) => {
                if !self.is_idle() {
                    return Vec::new();
                }
                log::debug!("Drawing from ({:.1}, {:.1})", p.x, p.y);
                self.gesture = Gesture::Drawing(BoundingBox::at(p));
                vec![Intent::StartDraw(p), Intent::Deselect]
            }
            Event::PointerMove(p) => match &mut self.gesture {
                Gesture::Drawing(rect) => {
                    rect.width = p.x - rect.x;
                    rect.height = p.y - rect.y;
                    vec![Intent::ResizeDraw(*rect)]
                }
                _ => Vec::new(),
            },
            Event::PointerUp(p) => {
                if let Gesture::Drawing(rect) = &mut self.gesture {
                    rect.width = p.x - rect.x;
                    rect.height = p.y - rect.y;
                }
                self.finish_drawing()
            }
            Event::PointerLeave => self.finish_drawing(),
            Event::RecordClicked(id) => {
                if !self.is_idle() || !store.contains(&id) {
                    return Vec::new();
                }
                if store.selected() == Some(&id) {
                    vec![Intent::Deselect]
                } else {
                    vec![Intent::Select(id)]
                }
            }
            Event::RecordDoubleClicked(id) => {
                if self.is_drawing() || !store.contains(&id) {
                    return Vec::new();
                }
                vec![Intent::Delete(id)]
            }
            Event::DragStart(id) => {
                let Some(ann) = store.get(&id).filter(|_| self.is_idle()) else {
                    return Vec::new();
                };
                self.gesture = Gesture::Dragging {
                    id: id.clone(),
                    origin: ann.rect,
                    offset: Vector::default(),
                };
                select_for_gesture(store, id)
            }
            Event::DragBy { id, delta } => match &mut self.gesture {
                Gesture::Dragging {
                    id: active,
                    origin,
                    offset,
                } if *active == id => {
                    *offset = *offset + delta;
                    vec![Intent::Move {
                        id,
                        rect: origin.translated(*offset),
                    }]
                }
                _ => Vec::new(),
            },
            Event::ResizeStart { id, handle } => {
                let Some(ann) = store.get(&id).filter(|_| self.is_idle()) else {
                    return Vec::new();
                };
                self.gesture = Gesture::Resizing {
                    id: id.clone(),
                    handle,
                    origin: ann.rect,
                };
                select_for_gesture(store, id)
            }
            Event::ResizeTo { id, pointer } => match &self.gesture {
                Gesture::Resizing {
                    id: active,
                    handle,
                    origin,
                } if *active == id => {
                    let pointer = store.image_size().clamp_point(pointer);
                    vec![Intent::Resize {
                        id,
                        rect: handle.resize(*origin, pointer),
                    }]
                }
                _ => Vec::new(),
            },
            Event::DragEnd | Event::ResizeEnd => {
                if self.is_dragging() || self.is_resizing() {
                    self.gesture = Gesture::Idle;
                }
                Vec::new()
            }
            Event::Key(Key::Delete) => match store.selected() {
                Some(id) => vec![Intent::Delete(id.clone())],
                None => Vec::new(),
            },
            Event::Key(Key::Escape) => match store.selected() {
                Some(_) => vec![Intent::Deselect],
                None => Vec::new(),
            },
        }
    }

    fn finish_drawing(&mut self) -> Vec<Intent> {
        let Gesture::Drawing(rect) = self.gesture else {
            return Vec::new();
        };
        self.gesture = Gesture::Idle;
        let rect = normalize(rect);
        if meets_minimum_size(rect) {
            vec![Intent::CommitDraw(rect)]
        } else {
            log::debug!("Discarded {:.1}x{:.1} draw", rect.width, rect.height);
            vec![Intent::DiscardDraw]
        }
    }
}

/// Pressing an unselected box to move or resize it selects it; the gesture
/// never toggles the selection off.
fn select_for_gesture(store: &AnnotationStore, id: AnnotationId) -> Vec<Intent> {
    if store.selected() == Some(&id) {
        Vec::new()
    } else {
        vec![Intent::Select(id)]
    }
}

/// Applies a single intent. Drawing intents only affect the machine itself.
pub fn apply(intent: &Intent, store: &mut AnnotationStore) {
    match intent {
        Intent::StartDraw(_) | Intent::ResizeDraw(_) | Intent::DiscardDraw => {}
        Intent::CommitDraw(rect) => {
            if let Some(id) = store.create(*rect, Tag::default(), Source::Manual) {
                log::debug!("Committed {id}");
                store.select(&id);
            }
        }
        Intent::Select(id) => store.select(id),
        Intent::Deselect => store.deselect(),
        Intent::Move { id, rect } | Intent::Resize { id, rect } => store.update(id, *rect),
        Intent::Delete(id) => {
            log::debug!("Deleting {id}");
            store.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ImageSize;

    fn setup() -> (Interaction, AnnotationStore) {
        (
            Interaction::new(),
            AnnotationStore::new(ImageSize::new(800.0, 600.0)),
        )
    }

    fn draw(machine: &mut Interaction, store: &mut AnnotationStore, from: Point, to: Point) {
        machine.handle(Event::PointerDown(from), store);
        machine.handle(Event::PointerMove(to), store);
        machine.handle(Event::PointerUp(to), store);
    }

    fn manual(store: &mut AnnotationStore, rect: BoundingBox) -> AnnotationId {
        store.create(rect, Tag::Button, Source::Manual).unwrap()
    }

    #[test]
    fn draw_commits_and_selects() {
        let (mut machine, mut store) = setup();
        draw(&mut machine, &mut store, Point::new(100.0, 100.0), Point::new(250.0, 180.0));

        assert!(machine.is_idle());
        assert_eq!(store.len(), 1);
        let ann = &store.annotations()[0];
        assert_eq!(ann.rect, BoundingBox::new(100.0, 100.0, 150.0, 80.0));
        assert_eq!(ann.tag, Tag::Button);
        assert_eq!(ann.source(), Source::Manual);
        assert_eq!(store.selected(), Some(ann.id()));
    }

    #[test]
    fn backwards_draw_is_normalized() {
        let (mut machine, mut store) = setup();
        draw(&mut machine, &mut store, Point::new(250.0, 180.0), Point::new(100.0, 100.0));
        assert_eq!(store.annotations()[0].rect, BoundingBox::new(100.0, 100.0, 150.0, 80.0));
    }

    #[test]
    fn tiny_draw_is_discarded() {
        let (mut machine, mut store) = setup();
        machine.handle(Event::PointerDown(Point::new(10.0, 10.0)), &mut store);
        let intents = machine.handle(Event::PointerUp(Point::new(15.0, 13.0)), &mut store);
        assert_eq!(intents, vec![Intent::DiscardDraw]);
        assert!(store.is_empty());
        assert!(machine.is_idle());
    }

    #[test]
    fn preview_is_unclamped_until_commit() {
        let (mut machine, mut store) = setup();
        machine.handle(Event::PointerDown(Point::new(700.0, 500.0)), &mut store);
        machine.handle(Event::PointerMove(Point::new(900.0, 650.0)), &mut store);
        assert_eq!(
            machine.drawing_preview(),
            Some(BoundingBox::new(700.0, 500.0, 200.0, 150.0))
        );

        machine.handle(Event::PointerUp(Point::new(900.0, 650.0)), &mut store);
        assert_eq!(store.annotations()[0].rect, BoundingBox::new(600.0, 450.0, 200.0, 150.0));
    }

    #[test]
    fn preview_keeps_negative_extent() {
        let (mut machine, mut store) = setup();
        machine.handle(Event::PointerDown(Point::new(100.0, 100.0)), &mut store);
        machine.handle(Event::PointerMove(Point::new(40.0, 70.0)), &mut store);
        assert_eq!(
            machine.drawing_preview(),
            Some(BoundingBox::new(100.0, 100.0, -60.0, -30.0))
        );
    }

    #[test]
    fn leaving_canvas_finishes_the_draw() {
        let (mut machine, mut store) = setup();
        machine.handle(Event::PointerDown(Point::new(100.0, 100.0)), &mut store);
        machine.handle(Event::PointerMove(Point::new(160.0, 140.0)), &mut store);
        machine.handle(Event::PointerLeave, &mut store);
        assert!(machine.is_idle());
        assert_eq!(store.annotations()[0].rect, BoundingBox::new(100.0, 100.0, 60.0, 40.0));

        machine.handle(Event::PointerDown(Point::new(300.0, 300.0)), &mut store);
        machine.handle(Event::PointerLeave, &mut store);
        assert!(machine.is_idle());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pointer_down_clears_selection() {
        let (mut machine, mut store) = setup();
        let id = manual(&mut store, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        store.select(&id);
        machine.handle(Event::PointerDown(Point::new(300.0, 300.0)), &mut store);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn click_toggles_selection() {
        let (mut machine, mut store) = setup();
        let a = manual(&mut store, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let b = manual(&mut store, BoundingBox::new(100.0, 0.0, 50.0, 50.0));

        machine.handle(Event::RecordClicked(a.clone()), &mut store);
        assert_eq!(store.selected(), Some(&a));
        machine.handle(Event::RecordClicked(b.clone()), &mut store);
        assert_eq!(store.selected(), Some(&b));
        machine.handle(Event::RecordClicked(b), &mut store);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn clicks_are_ignored_while_drawing() {
        let (mut machine, mut store) = setup();
        let a = manual(&mut store, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        machine.handle(Event::PointerDown(Point::new(300.0, 300.0)), &mut store);

        assert!(machine.handle(Event::RecordClicked(a.clone()), &mut store).is_empty());
        assert!(machine.handle(Event::RecordDoubleClicked(a.clone()), &mut store).is_empty());
        assert!(machine.handle(Event::DragStart(a), &mut store).is_empty());
        assert!(machine.is_drawing());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn double_click_removes_any_record() {
        let (mut machine, mut store) = setup();
        let a = manual(&mut store, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let b = manual(&mut store, BoundingBox::new(100.0, 0.0, 50.0, 50.0));
        store.select(&a);

        machine.handle(Event::RecordDoubleClicked(b.clone()), &mut store);
        assert!(!store.contains(&b));
        assert_eq!(store.selected(), Some(&a));
    }

    #[test]
    fn delete_key_removes_selection() {
        let (mut machine, mut store) = setup();
        let a = manual(&mut store, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        assert!(machine.handle(Event::Key(Key::Delete), &mut store).is_empty());

        store.select(&a);
        machine.handle(Event::Key(Key::Delete), &mut store);
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn escape_deselects_without_touching_drawing() {
        let (mut machine, mut store) = setup();
        let a = manual(&mut store, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        store.select(&a);
        machine.handle(Event::Key(Key::Escape), &mut store);
        assert_eq!(store.selected(), None);

        machine.handle(Event::PointerDown(Point::new(200.0, 200.0)), &mut store);
        machine.handle(Event::PointerMove(Point::new(260.0, 260.0)), &mut store);
        machine.handle(Event::Key(Key::Escape), &mut store);
        assert!(machine.is_drawing());
        machine.handle(Event::PointerUp(Point::new(260.0, 260.0)), &mut store);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn drag_clamps_to_image() {
        let (mut machine, mut store) = setup();
        let id = manual(&mut store, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        store.select(&id);

        machine.handle(Event::DragStart(id.clone()), &mut store);
        machine.handle(
            Event::DragBy {
                id: id.clone(),
                delta: Vector::new(-20.0, -20.0),
            },
            &mut store,
        );
        machine.handle(Event::DragEnd, &mut store);

        assert_eq!(store.get(&id).unwrap().rect, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        assert!(machine.is_idle());
    }

    #[test]
    fn drag_accumulates_from_grab_position() {
        let (mut machine, mut store) = setup();
        let id = manual(&mut store, BoundingBox::new(10.0, 10.0, 50.0, 50.0));

        machine.handle(Event::DragStart(id.clone()), &mut store);
        assert_eq!(store.selected(), Some(&id));
        for delta in [Vector::new(-30.0, 0.0), Vector::new(40.0, 5.0)] {
            machine.handle(Event::DragBy { id: id.clone(), delta }, &mut store);
        }
        // pinned at the edge after the first step, then back to +10
        assert_eq!(store.get(&id).unwrap().rect, BoundingBox::new(20.0, 15.0, 50.0, 50.0));
    }

    #[test]
    fn drag_survives_concurrent_delete() {
        let (mut machine, mut store) = setup();
        let id = manual(&mut store, BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        machine.handle(Event::DragStart(id.clone()), &mut store);
        machine.handle(Event::Key(Key::Delete), &mut store);
        machine.handle(
            Event::DragBy {
                id: id.clone(),
                delta: Vector::new(5.0, 5.0),
            },
            &mut store,
        );
        machine.handle(Event::DragEnd, &mut store);
        assert!(store.is_empty());
        assert!(machine.is_idle());
    }

    #[test]
    fn resize_keeps_opposite_edges() {
        let (mut machine, mut store) = setup();
        let id = manual(&mut store, BoundingBox::new(100.0, 100.0, 100.0, 100.0));

        machine.handle(
            Event::ResizeStart {
                id: id.clone(),
                handle: ResizeHandle::TopLeft,
            },
            &mut store,
        );
        machine.handle(
            Event::ResizeTo {
                id: id.clone(),
                pointer: Point::new(80.0, 150.0),
            },
            &mut store,
        );
        machine.handle(Event::ResizeEnd, &mut store);
        assert_eq!(store.get(&id).unwrap().rect, BoundingBox::new(80.0, 150.0, 120.0, 50.0));
    }

    #[test]
    fn resize_floors_at_minimum_size() {
        let (mut machine, mut store) = setup();
        let id = manual(&mut store, BoundingBox::new(100.0, 100.0, 100.0, 100.0));

        machine.handle(
            Event::ResizeStart {
                id: id.clone(),
                handle: ResizeHandle::BottomRight,
            },
            &mut store,
        );
        machine.handle(
            Event::ResizeTo {
                id: id.clone(),
                pointer: Point::new(20.0, 20.0),
            },
            &mut store,
        );
        assert_eq!(
            store.get(&id).unwrap().rect,
            BoundingBox::new(100.0, 100.0, MIN_SIZE, MIN_SIZE)
        );
    }

    #[test]
    fn resize_stops_at_image_edge() {
        let (mut machine, mut store) = setup();
        let id = manual(&mut store, BoundingBox::new(700.0, 500.0, 50.0, 50.0));

        machine.handle(
            Event::ResizeStart {
                id: id.clone(),
                handle: ResizeHandle::Right,
            },
            &mut store,
        );
        machine.handle(
            Event::ResizeTo {
                id: id.clone(),
                pointer: Point::new(1000.0, 9999.0),
            },
            &mut store,
        );
        assert_eq!(store.get(&id).unwrap().rect, BoundingBox::new(700.0, 500.0, 100.0, 50.0));
    }

    #[test]
    fn gesture_events_for_other_records_are_ignored() {
        let (mut machine, mut store) = setup();
        let a = manual(&mut store, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
        let b = manual(&mut store, BoundingBox::new(100.0, 100.0, 50.0, 50.0));

        machine.handle(Event::DragStart(a), &mut store);
        assert!(machine.handle(Event::DragStart(b.clone()), &mut store).is_empty());
        let intents = machine.handle(
            Event::DragBy {
                id: b.clone(),
                delta: Vector::new(10.0, 10.0),
            },
            &mut store,
        );
        assert!(intents.is_empty());
        assert_eq!(store.get(&b).unwrap().rect, BoundingBox::new(100.0, 100.0, 50.0, 50.0));
    }

    #[test]
    fn handle_hit_testing() {
        let rect = BoundingBox::new(100.0, 100.0, 100.0, 50.0);
        assert_eq!(
            ResizeHandle::hit(rect, Point::new(202.0, 124.0), 4.0),
            Some(ResizeHandle::Right)
        );
        assert_eq!(
            ResizeHandle::hit(rect, Point::new(99.0, 151.0), 4.0),
            Some(ResizeHandle::BottomLeft)
        );
        assert_eq!(ResizeHandle::hit(rect, Point::new(150.0, 125.0), 4.0), None);
    }
}
